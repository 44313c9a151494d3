//! Question Pipeline
//!
//! question -> completion -> sanitize -> read-only guard -> execute -> render.
//! `process_question` returns typed errors; `report` is the boundary handed to
//! UI shells and turns every failure into an `ErrorReport`.

use crate::config::Config;
use crate::error::{Text2SqlError, Result};
use crate::executor::{QueryExecutor, QueryResult};
use crate::guard::ensure_read_only;
use crate::llm::SqlGenerator;
use crate::prompt::build_system_prompt;
use crate::render::{render, Rendered};
use crate::sanitize::sanitize;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Successful answer to one question.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub question: String,
    pub sql: String,
    pub result: QueryResult,
    pub rendered: Rendered,
    pub elapsed_ms: u64,
    pub answered_at: DateTime<Utc>,
}

/// Human-readable failure for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub kind: String,
    pub message: String,
    pub hint: Option<String>,
    /// SQL that was generated before the failure, if any
    pub sql: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Answer(Answer),
    Error(ErrorReport),
}

impl ErrorReport {
    fn from_error(err: &Text2SqlError, sql: Option<String>) -> Self {
        let hint = match err {
            Text2SqlError::Execution(_) => {
                Some("Make sure the query syntax is correct and the table exists.")
            }
            Text2SqlError::Generation(_) | Text2SqlError::Config(_) => {
                Some("Please check your API key and try again.")
            }
            Text2SqlError::Rejected(_) => Some("Only read-only SELECT queries can be run."),
            Text2SqlError::EmptyQuestion => Some("Please enter a question first."),
            Text2SqlError::Io(_) | Text2SqlError::Json(_) => None,
        };

        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
            hint: hint.map(str::to_string),
            sql,
        }
    }
}

pub struct Pipeline<G: SqlGenerator> {
    generator: G,
    system_prompt: String,
    executor: QueryExecutor,
    read_only_guard: bool,
}

impl<G: SqlGenerator> Pipeline<G> {
    /// Builds the system prompt once; read-only guarding starts enabled.
    pub fn new(generator: G, executor: QueryExecutor) -> Self {
        Self {
            generator,
            system_prompt: build_system_prompt(),
            executor: executor.read_only(true),
            read_only_guard: true,
        }
    }

    pub fn from_config(generator: G, config: &Config) -> Self {
        Self::new(generator, QueryExecutor::new(&config.database_path))
            .with_read_only_guard(config.read_only_guard)
    }

    /// Toggle both the statement guard and the read-only connection.
    pub fn with_read_only_guard(mut self, enabled: bool) -> Self {
        self.read_only_guard = enabled;
        self.executor = self.executor.read_only(enabled);
        self
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn executor(&self) -> &QueryExecutor {
        &self.executor
    }

    pub async fn process_question(&self, question: &str) -> Result<Answer> {
        let request_id = Uuid::new_v4();
        let span = info_span!("question", %request_id);
        self.answer(question).instrument(span).await.map_err(|(err, _)| err)
    }

    /// Never fails: errors come back as an `ErrorReport`.
    pub async fn report(&self, question: &str) -> Outcome {
        let request_id = Uuid::new_v4();
        let span = info_span!("question", %request_id);
        match self.answer(question).instrument(span).await {
            Ok(answer) => Outcome::Answer(answer),
            Err((err, sql)) => {
                warn!("Question failed ({}): {}", err.kind(), err);
                Outcome::Error(ErrorReport::from_error(&err, sql))
            }
        }
    }

    /// Run SQL supplied directly, skipping the model.
    pub fn run_sql(&self, raw_sql: &str) -> Result<(String, QueryResult, Rendered)> {
        let sql = sanitize(raw_sql);
        let result = self.execute_checked(&sql)?;
        let rendered = render(&result.columns, &result.rows);
        Ok((sql, result, rendered))
    }

    async fn answer(&self, question: &str) -> std::result::Result<Answer, (Text2SqlError, Option<String>)> {
        let started = Instant::now();
        let question = question.trim();
        if question.is_empty() {
            return Err((Text2SqlError::EmptyQuestion, None));
        }
        info!("Question: {}", question);

        let raw = self
            .generator
            .generate_sql(question, &self.system_prompt)
            .await
            .map_err(|e| (e, None))?;

        let sql = sanitize(&raw);
        if sql.is_empty() {
            return Err((
                Text2SqlError::Generation("model returned no SQL".to_string()),
                None,
            ));
        }
        info!("Generated SQL: {}", sql);

        let result = self
            .execute_checked(&sql)
            .map_err(|e| (e, Some(sql.clone())))?;
        let rendered = render(&result.columns, &result.rows);

        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!("Answered with {} rows in {}ms", result.row_count(), elapsed_ms);

        Ok(Answer {
            question: question.to_string(),
            sql,
            result,
            rendered,
            elapsed_ms,
            answered_at: Utc::now(),
        })
    }

    fn execute_checked(&self, sql: &str) -> Result<QueryResult> {
        if self.read_only_guard {
            ensure_read_only(sql)?;
        }
        self.executor.execute(sql)
    }
}
