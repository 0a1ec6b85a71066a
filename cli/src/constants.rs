// =============================================================================
// Application Identity
// =============================================================================

/// Application name in lowercase (for paths and log filters)
pub const APP_NAME_LOWER: &str = "filtra";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "filtra.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "FILTRA_CONFIG";

// =============================================================================
// Environment Variables
// =============================================================================

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "FILTRA_LOG";

/// Environment variable for the SQL dialect
pub const ENV_DIALECT: &str = "FILTRA_DIALECT";

/// Environment variable for the table name
pub const ENV_TABLE: &str = "FILTRA_TABLE";

// =============================================================================
// Defaults
// =============================================================================

/// Table used when neither config nor flags name one
pub const DEFAULT_TABLE: &str = "records";
