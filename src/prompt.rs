//! Schema Prompt - System prompt describing the STUDENT table
//!
//! The prompt frames the model as a SQLite expert, pins the exact schema,
//! states the output and safety rules, and closes with few-shot examples.

/// Table the prompt describes.
pub const TABLE_NAME: &str = "STUDENT";

/// A literal question/query pair embedded in the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FewShotExample {
    pub question: &'static str,
    pub sql: &'static str,
}

pub const FEW_SHOT_EXAMPLES: [FewShotExample; 5] = [
    FewShotExample {
        question: "How many student records are there?",
        sql: "SELECT COUNT(*) FROM STUDENT;",
    },
    FewShotExample {
        question: "Show students in the Data Science class.",
        sql: "SELECT * FROM STUDENT WHERE CLASS = 'Data Science';",
    },
    FewShotExample {
        question: "Who are the top 3 students by marks?",
        sql: "SELECT NAME, MARKS FROM STUDENT ORDER BY MARKS DESC LIMIT 3;",
    },
    FewShotExample {
        question: "What is the average mark in section A?",
        sql: "SELECT AVG(MARKS) FROM STUDENT WHERE SECTION = 'A';",
    },
    FewShotExample {
        question: "List all students and their details.",
        sql: "SELECT * FROM STUDENT;",
    },
];

const ROLE_AND_SCHEMA: &str = r#"### ROLE
You are a Senior SQLite Expert and Data Analyst. Your mission is to translate natural language questions into highly accurate, executable SQL queries for a specific database.

### DATABASE SCHEMA
Table: STUDENT
Columns:
- NAME (VARCHAR): The full name of the student.
- CLASS (VARCHAR): The department or course name (e.g., 'Data Science', 'DEVOPS').
- SECTION (VARCHAR): The class section or group (e.g., 'A', 'B').
- MARKS (INT): The numerical score or grade of the student.

### CONSTRAINTS & RULES
1. OUTPUT FORMAT: Return ONLY the raw SQL code.
2. NO MARKDOWN: Do not use code blocks (```sql), do not use the word "sql", and do not provide explanations.
3. CASE SENSITIVITY: For string filtering (WHERE clause), use the LIKE operator with '%' for flexible matching if the user is imprecise, or exact strings if clear.
4. SYNTAX: Use standard SQLite syntax.
5. SECURITY: Only generate SELECT statements. Do not allow DROP, DELETE, or UPDATE commands.
"#;

const TASK: &str = r#"### TASK
Based on the rules above, convert the following user question into a SQL query:
"#;

/// Assemble the system prompt sent with every question.
pub fn build_system_prompt() -> String {
    let mut prompt = String::from(ROLE_AND_SCHEMA);

    prompt.push_str("\n### FEW-SHOT EXAMPLES\n");
    for (idx, example) in FEW_SHOT_EXAMPLES.iter().enumerate() {
        prompt.push_str(&format!(
            "Example {} - User: \"{}\"\nQuery: {}\n\n",
            idx + 1,
            example.question,
            example.sql
        ));
    }

    prompt.push_str(TASK);
    prompt
}
