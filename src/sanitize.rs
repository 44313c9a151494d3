//! SQL Sanitizer - strips markdown fences the model adds despite instructions

use lazy_static::lazy_static;
use regex::Regex;

const FENCE: &str = "```";

lazy_static! {
    static ref SQL_FENCE_OPEN: Regex = Regex::new(r"(?i)```sql").unwrap();
}

/// Remove every ```` ```sql ```` and ```` ``` ```` marker, then trim.
///
/// Pure and total. The output never contains a fence, so applying it twice
/// yields the same string.
pub fn sanitize(raw: &str) -> String {
    let without_open = SQL_FENCE_OPEN.replace_all(raw, "");
    without_open.replace(FENCE, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("SELECT COUNT(*) FROM STUDENT;", "SELECT COUNT(*) FROM STUDENT;")]
    #[case("```sql\nSELECT * FROM STUDENT;\n```", "SELECT * FROM STUDENT;")]
    #[case("```SQL\nSELECT * FROM STUDENT;\n```", "SELECT * FROM STUDENT;")]
    #[case("```\nSELECT NAME FROM STUDENT\n```\n", "SELECT NAME FROM STUDENT")]
    #[case("  \n SELECT 1 \t\n", "SELECT 1")]
    #[case("```sql```", "")]
    #[case("", "")]
    fn test_sanitize_cases(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(sanitize(raw), expected);
    }

    #[rstest]
    #[case("``````sqlsql")]
    #[case("`````")]
    #[case("```sql SELECT 1 ``` ```sql SELECT 2 ```")]
    #[case("``\n```sql\n`")]
    fn test_sanitize_leaves_no_fence(#[case] raw: &str) {
        let cleaned = sanitize(raw);
        assert!(!cleaned.contains(FENCE), "fence left in {:?}", cleaned);
    }

    #[rstest]
    #[case("```sql\nSELECT * FROM STUDENT WHERE CLASS LIKE '%Data%';\n```")]
    #[case("``````sqlsql")]
    #[case(" plain text ")]
    fn test_sanitize_is_idempotent(#[case] raw: &str) {
        let once = sanitize(raw);
        assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn test_sanitize_keeps_inner_backticks() {
        assert_eq!(sanitize("SELECT `NAME` FROM STUDENT"), "SELECT `NAME` FROM STUDENT");
    }
}
