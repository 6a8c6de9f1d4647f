//! Merge rules for updating an existing customer from a registration.
//!
//! A registration never removes information from a customer record: tags
//! are unioned and a phone number is only ever added or replaced, never
//! cleared.

/// Union `tag` into `existing`, preserving the existing order.
///
/// Tag comparison ignores ASCII case, matching how Shopify treats tags.
///
/// ```
/// use wholesale_core::union_tags;
///
/// let tags = union_tags(&["vip".to_string()], "wholesale");
/// assert_eq!(tags, vec!["vip", "wholesale"]);
///
/// let tags = union_tags(&["Wholesale".to_string()], "wholesale");
/// assert_eq!(tags, vec!["Wholesale"]);
/// ```
#[must_use]
pub fn union_tags(existing: &[String], tag: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::with_capacity(existing.len() + 1);
    for t in existing {
        let t = t.trim();
        if !t.is_empty() && !tags.iter().any(|seen| seen.eq_ignore_ascii_case(t)) {
            tags.push(t.to_owned());
        }
    }
    if !tags.iter().any(|seen| seen.eq_ignore_ascii_case(tag)) {
        tags.push(tag.to_owned());
    }
    tags
}

/// Phone value to send in an update.
///
/// `None` means "leave the stored phone untouched".
#[must_use]
pub fn merge_phone(submitted: Option<&str>) -> Option<String> {
    submitted
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_union_adds_missing_tag() {
        assert_eq!(
            union_tags(&tags(&["retail", "newsletter"]), "wholesale"),
            tags(&["retail", "newsletter", "wholesale"])
        );
    }

    #[test]
    fn test_union_keeps_existing_tag_once() {
        assert_eq!(
            union_tags(&tags(&["wholesale", "vip"]), "wholesale"),
            tags(&["wholesale", "vip"])
        );
    }

    #[test]
    fn test_union_drops_duplicates_and_blanks() {
        assert_eq!(
            union_tags(&tags(&["vip", " vip ", "", "VIP"]), "wholesale"),
            tags(&["vip", "wholesale"])
        );
    }

    #[test]
    fn test_union_of_empty() {
        assert_eq!(union_tags(&[], "wholesale"), tags(&["wholesale"]));
    }

    #[test]
    fn test_merge_phone_never_blanks() {
        assert_eq!(merge_phone(None), None);
        assert_eq!(merge_phone(Some("")), None);
        assert_eq!(merge_phone(Some("   ")), None);
        assert_eq!(
            merge_phone(Some(" +15555550100 ")),
            Some("+15555550100".to_string())
        );
    }
}
