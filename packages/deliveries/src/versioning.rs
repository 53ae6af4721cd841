// ABOUTME: Revision title versioning
// ABOUTME: The revision number is derived from existing titles rather than stored

/// Marker separating a base title from its revision suffix
pub const REVISION_MARKER: &str = " - Revised";

/// The part of a title before any revision suffix
pub fn base_title(title: &str) -> &str {
    match title.find(REVISION_MARKER) {
        Some(index) => &title[..index],
        None => title,
    }
}

/// Number of titles containing `base` as a substring
pub fn revision_count<'a, I>(base: &str, titles: I) -> usize
where
    I: IntoIterator<Item = &'a str>,
{
    titles
        .into_iter()
        .filter(|title| title.contains(base))
        .count()
}

/// Next title for a fulfilled revision.
///
/// `other_titles` are the titles of every delivery in the versioning scope except the one being
/// revised. A base title that matches none of them yields "Revised 0"; client-facing titles
/// already depend on that numbering.
pub fn next_revision_title<'a, I>(title: &str, other_titles: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let base = base_title(title);
    let count = revision_count(base, other_titles);
    format!("{}{} {}", base, REVISION_MARKER, count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Resume", "Resume")]
    #[case("Resume - Revised 0", "Resume")]
    #[case("Resume - Revised 3 - Revised 4", "Resume")]
    #[case("Cover Letter - Revised", "Cover Letter")]
    #[case("Resume -Revised 1", "Resume -Revised 1")]
    fn test_base_title(#[case] title: &str, #[case] expected: &str) {
        assert_eq!(base_title(title), expected);
    }

    #[test]
    fn test_first_revision_is_numbered_zero() {
        let others: Vec<&str> = vec!["Cover Letter", "LinkedIn Profile"];
        assert_eq!(next_revision_title("Resume", others), "Resume - Revised 0");
    }

    #[test]
    fn test_count_uses_substring_matches() {
        let others = ["Resume", "Resume - Revised 0", "Executive Resume", "Cover Letter"];
        assert_eq!(
            next_revision_title("Resume - Revised 0", others),
            "Resume - Revised 3"
        );
    }

    #[test]
    fn test_next_title_is_deterministic() {
        let others = vec!["Resume".to_string(), "Resume - Revised 0".to_string()];
        let first = next_revision_title("Resume", others.iter().map(String::as_str));
        let second = next_revision_title("Resume", others.iter().map(String::as_str));
        assert_eq!(first, second);
        assert_eq!(first, "Resume - Revised 2");
    }

    #[test]
    fn test_match_is_case_sensitive() {
        assert_eq!(next_revision_title("Resume", ["resume"]), "Resume - Revised 0");
    }
}
