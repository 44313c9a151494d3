//! Read-only Guard
//!
//! The prompt asks the model for SELECT statements only; this module checks
//! that the sanitized SQL really is a single query before it reaches the store.
//! Parsing uses the sqlparser crate with the SQLite dialect. Text the parser
//! cannot handle falls back to a leading-keyword check, leaving genuine syntax
//! errors for SQLite to report.

use crate::error::{Text2SqlError, Result};
use sqlparser::ast::Statement;
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;
use tracing::{debug, warn};

/// Leading keywords that always mean a write or a schema/connection change.
const MUTATING_KEYWORDS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "DROP", "ALTER", "CREATE", "REPLACE", "ATTACH", "DETACH",
    "PRAGMA", "VACUUM", "REINDEX",
];

/// Accept `sql` only if it is a single read-only query.
pub fn ensure_read_only(sql: &str) -> Result<()> {
    let dialect = SQLiteDialect {};

    match Parser::parse_sql(&dialect, sql) {
        Ok(statements) => check_statements(&statements),
        Err(e) => {
            warn!("SQL parsing failed: {}, using leading keyword fallback", e);
            check_leading_keyword(sql)
        }
    }
}

fn check_statements(statements: &[Statement]) -> Result<()> {
    match statements {
        [] => Err(Text2SqlError::Rejected("no SQL statement found".to_string())),
        [Statement::Query(_)] => {
            debug!("Read-only guard accepted query");
            Ok(())
        }
        [other] => Err(Text2SqlError::Rejected(format!(
            "only SELECT queries are allowed, got: {}",
            truncate(&other.to_string(), 60)
        ))),
        many => Err(Text2SqlError::Rejected(format!(
            "expected a single statement, got {}",
            many.len()
        ))),
    }
}

fn check_leading_keyword(sql: &str) -> Result<()> {
    let keyword = leading_keyword(sql);

    if MUTATING_KEYWORDS.contains(&keyword.as_str()) {
        return Err(Text2SqlError::Rejected(format!(
            "{} statements are not allowed",
            keyword
        )));
    }

    Ok(())
}

fn leading_keyword(sql: &str) -> String {
    sql.trim_start()
        .split(|c: char| !c.is_ascii_alphabetic())
        .find(|word| !word.is_empty())
        .unwrap_or("")
        .to_uppercase()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("SELECT COUNT(*) FROM STUDENT;")]
    #[case("SELECT * FROM STUDENT WHERE CLASS LIKE '%Data%'")]
    #[case("SELECT NAME, MARKS FROM STUDENT ORDER BY MARKS DESC LIMIT 3;")]
    #[case("WITH high AS (SELECT * FROM STUDENT WHERE MARKS > 80) SELECT NAME FROM high")]
    #[case("select avg(marks) from student where section = 'A'")]
    fn test_accepts_queries(#[case] sql: &str) {
        assert!(ensure_read_only(sql).is_ok(), "rejected {}", sql);
    }

    #[rstest]
    #[case("DROP TABLE STUDENT")]
    #[case("DELETE FROM STUDENT WHERE MARKS < 60")]
    #[case("UPDATE STUDENT SET MARKS = 100")]
    #[case("INSERT INTO STUDENT VALUES ('Eve', 'DEVOPS', 'B', 70)")]
    #[case("CREATE TABLE T (A INT)")]
    #[case("SELECT * FROM STUDENT; DROP TABLE STUDENT;")]
    fn test_rejects_writes(#[case] sql: &str) {
        match ensure_read_only(sql) {
            Err(Text2SqlError::Rejected(msg)) => assert!(!msg.is_empty()),
            other => panic!("expected rejection for {}, got {:?}", sql, other),
        }
    }

    #[test]
    fn test_rejects_empty_input() {
        assert!(matches!(ensure_read_only("   "), Err(Text2SqlError::Rejected(_))));
    }

    #[test]
    fn test_unparseable_select_is_left_to_the_store() {
        assert!(ensure_read_only("SELEC * FROM STUDENT").is_ok());
    }

    #[test]
    fn test_leading_keyword_fallback_rejects_writes() {
        assert!(check_leading_keyword("  delete from STUDENT where ((").is_err());
        assert!(check_leading_keyword("VACUUM").is_err());
        assert!(check_leading_keyword("SELECT garbage ((").is_ok());
    }

    #[test]
    fn test_leading_keyword_skips_punctuation() {
        assert_eq!(leading_keyword("  (select 1)"), "SELECT");
        assert_eq!(leading_keyword(""), "");
    }
}
