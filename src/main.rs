use text2sql::config::Config;
use text2sql::executor::QueryExecutor;
use text2sql::llm::{LlmClient, SqlGenerator};
use text2sql::pipeline::{Answer, Outcome, Pipeline};
use text2sql::prompt::{build_system_prompt, FEW_SHOT_EXAMPLES};
use text2sql::render::Rendered;
use text2sql::seed::seed_students;
use text2sql::Result as Text2SqlResult;

use anyhow::Result;
use async_trait::async_trait;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "text2sql")]
#[command(about = "Ask questions about the student table in plain English")]
#[command(version)]
struct Args {
    /// Path to the SQLite student database (or set TEXT2SQL_DATABASE)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Groq API key (or set GROQ_API_KEY env var)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Model identifier (or set TEXT2SQL_MODEL)
    #[arg(long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Turn a question into SQL, run it and print the result
    Ask {
        /// The question in natural language
        question: String,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Create the STUDENT table and load the sample records
    Seed {
        /// Drop an existing STUDENT table first
        #[arg(long)]
        force: bool,
    },
    /// Print the system prompt and its few-shot examples
    Prompt {
        /// List only the few-shot examples
        #[arg(long)]
        examples: bool,
    },
    /// Run a SQL statement through the guard and renderer without the model
    Query {
        sql: String,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Html,
    Json,
}

/// Stands in for the model when `query` runs SQL directly.
struct NoModel;

#[async_trait]
impl SqlGenerator for NoModel {
    async fn generate_sql(&self, _question: &str, _system_prompt: &str) -> Text2SqlResult<String> {
        Err(text2sql::Text2SqlError::Config(
            "no completion service configured".to_string(),
        ))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = Config::from_env()?;
    if let Some(database) = args.database {
        config.database_path = database;
    }
    if let Some(api_key) = args.api_key {
        config.api_key = Some(api_key);
    }
    if let Some(model) = args.model {
        config.model = model;
    }

    match args.command {
        Commands::Ask { question, format } => ask(&config, &question, format).await,
        Commands::Seed { force } => seed(&config, force),
        Commands::Prompt { examples } => {
            print_prompt(examples);
            Ok(())
        }
        Commands::Query { sql, format } => query(&config, &sql, format),
    }
}

async fn ask(config: &Config, question: &str, format: OutputFormat) -> Result<()> {
    let llm = LlmClient::from_config(config)?;
    let pipeline = Pipeline::from_config(llm, config);

    info!("Using database {}", pipeline.executor().database_path().display());

    match pipeline.report(question).await {
        Outcome::Answer(answer) => {
            print_answer(&answer, format)?;
            Ok(())
        }
        Outcome::Error(report) => {
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                if let Some(sql) = &report.sql {
                    println!("Generated SQL:\n{}\n", sql);
                }
                eprintln!("Error: {}", report.message);
                if let Some(hint) = &report.hint {
                    eprintln!("Tip: {}", hint);
                }
            }
            anyhow::bail!("question failed ({})", report.kind)
        }
    }
}

fn print_answer(answer: &Answer, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(answer)?),
        OutputFormat::Html => println!("{}", answer.rendered.to_html()),
        OutputFormat::Text => {
            println!("Generated SQL:\n{}\n", answer.sql);
            print_rendered(&answer.rendered);
        }
    }
    Ok(())
}

fn print_rendered(rendered: &Rendered) {
    match rendered {
        Rendered::Table(table) => {
            println!("Found {} record(s)\n", table.row_count());
            println!("{}", table.to_text());
        }
        Rendered::NoData => println!("No data found for this query."),
    }
}

fn seed(config: &Config, force: bool) -> Result<()> {
    let inserted = seed_students(&config.database_path, force)?;
    println!(
        "Inserted {} students into {}",
        inserted,
        config.database_path.display()
    );
    Ok(())
}

fn print_prompt(examples_only: bool) {
    if examples_only {
        for (idx, example) in FEW_SHOT_EXAMPLES.iter().enumerate() {
            println!("{}. {}\n   {}", idx + 1, example.question, example.sql);
        }
    } else {
        println!("{}", build_system_prompt());
    }
}

fn query(config: &Config, sql: &str, format: OutputFormat) -> Result<()> {
    let pipeline = Pipeline::new(NoModel, QueryExecutor::new(&config.database_path))
        .with_read_only_guard(config.read_only_guard);
    let (sql, result, rendered) = pipeline.run_sql(sql)?;

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "sql": sql,
                "result": result,
                "rendered": rendered,
            }))?
        ),
        OutputFormat::Html => println!("{}", rendered.to_html()),
        OutputFormat::Text => print_rendered(&rendered),
    }
    Ok(())
}
