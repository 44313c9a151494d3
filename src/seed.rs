//! Student store provisioning
//!
//! Creates the STUDENT table and loads the sample records. This runs once,
//! before any question is asked; the pipeline itself never writes.

use crate::error::{Text2SqlError, Result};
use crate::prompt::TABLE_NAME;
use rusqlite::{params, Connection, Transaction};
use std::path::Path;
use tracing::info;

/// A row of the STUDENT table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentRecord {
    pub name: &'static str,
    pub class: &'static str,
    pub section: &'static str,
    pub marks: i64,
}

pub const SAMPLE_STUDENTS: [StudentRecord; 5] = [
    StudentRecord { name: "Mustafa", class: "Data Science", section: "A", marks: 90 },
    StudentRecord { name: "Ville", class: "Data Science", section: "B", marks: 100 },
    StudentRecord { name: "Mehmet", class: "Data Science", section: "A", marks: 85 },
    StudentRecord { name: "Heike", class: "DEVOPS", section: "A", marks: 50 },
    StudentRecord { name: "Alexi", class: "DEVOPS", section: "A", marks: 50 },
];

/// Create an empty STUDENT table inside `tx`. With `force`, an existing table is dropped first.
pub fn create_student_table(tx: &Transaction, force: bool) -> Result<()> {
    if force {
        tx.execute(&format!("DROP TABLE IF EXISTS {}", TABLE_NAME), [])?;
    }
    let create = format!(
        "CREATE TABLE {} (NAME VARCHAR(22), CLASS VARCHAR(22), SECTION VARCHAR(22), MARKS INT)",
        TABLE_NAME
    );
    tx.execute(&create, []).map_err(|e| {
        Text2SqlError::Execution(format!(
            "failed to create {} table (use --force to recreate): {}",
            TABLE_NAME, e
        ))
    })?;
    Ok(())
}

fn insert_students(tx: &Transaction, students: &[StudentRecord]) -> Result<usize> {
    let mut insert = tx.prepare(&format!("INSERT INTO {} VALUES (?1, ?2, ?3, ?4)", TABLE_NAME))?;
    for student in students {
        insert.execute(params![student.name, student.class, student.section, student.marks])?;
    }
    Ok(students.len())
}

/// Create the STUDENT table and insert the sample records in one transaction.
/// Returns the row count.
pub fn seed_students(path: impl AsRef<Path>, force: bool) -> Result<usize> {
    let path = path.as_ref();
    let mut conn = Connection::open(path)?;
    let tx = conn.transaction()?;
    create_student_table(&tx, force)?;
    let inserted = insert_students(&tx, &SAMPLE_STUDENTS)?;
    tx.commit()?;

    info!("Seeded {} students into {}", inserted, path.display());
    Ok(inserted)
}
