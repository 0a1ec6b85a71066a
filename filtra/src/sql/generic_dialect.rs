//! Generic (ANSI) SQL dialect implementation

use super::SqlDialect;

/// Generic SQL dialect; every rule is the trait default
pub struct GenericDialect;

impl SqlDialect for GenericDialect {
    fn name(&self) -> &'static str {
        "generic"
    }
}
