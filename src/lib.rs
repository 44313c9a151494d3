pub mod config;
pub mod error;
pub mod executor;
pub mod guard;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod render;
pub mod sanitize;
pub mod seed;
pub mod server;

pub use error::{Result, Text2SqlError};
pub use pipeline::{Answer, ErrorReport, Outcome, Pipeline};
