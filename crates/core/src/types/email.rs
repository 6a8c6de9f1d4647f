//! Email normalization.
//!
//! Customers and companies are matched by email case-insensitively, so every
//! comparison goes through [`normalize_email`] on both sides.

/// Trim and lower-case a raw email string without validating it.
///
/// Lookups use this directly: malformed input simply fails to match, and
/// blank input normalizes to an empty string that callers treat as absent.
///
/// ```
/// use wholesale_core::normalize_email;
///
/// assert_eq!(normalize_email("  Jo@Acme.TEST\t"), "jo@acme.test");
/// assert_eq!(normalize_email("   "), "");
/// ```
#[must_use]
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_differing_case_and_whitespace_normalize_equal() {
        assert_eq!(normalize_email("Jane@Acme.test"), normalize_email(" jane@ACME.TEST "));
    }

    #[test]
    fn test_normalize_keeps_malformed_input() {
        assert_eq!(normalize_email("No-At-Symbol"), "no-at-symbol");
        assert_ne!(normalize_email("jo@acme.test.evil"), normalize_email("jo@acme.test"));
    }
}
