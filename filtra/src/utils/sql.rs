//! SQL text helpers

/// Escape SQL LIKE metacharacters (%, _, \) in user input
///
/// Filter operands are matched literally, so every pattern built from them
/// goes through this function before the wildcards are added.
///
/// # Example
///
/// ```
/// use filtra::utils::sql::escape_like_pattern;
///
/// let pattern = format!("%{}%", escape_like_pattern("100% match_test"));
/// assert_eq!(pattern, "%100\\% match\\_test%");
/// ```
pub fn escape_like_pattern(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Where the wildcard goes around a LIKE operand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeShape {
    Contains,
    Prefix,
    Suffix,
    Exact,
}

/// Escape `s` and wrap it in `%` according to `shape`
pub fn like_pattern(s: &str, shape: LikeShape) -> String {
    let escaped = escape_like_pattern(s);
    match shape {
        LikeShape::Contains => format!("%{}%", escaped),
        LikeShape::Prefix => format!("{}%", escaped),
        LikeShape::Suffix => format!("%{}", escaped),
        LikeShape::Exact => escaped,
    }
}
