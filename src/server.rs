//! HTTP shell for the question page
//! Simple HTTP server using tokio and basic HTTP handling

use crate::error::Result;
use crate::llm::SqlGenerator;
use crate::pipeline::{Outcome, Pipeline};
use serde::Deserialize;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info, warn};

const MAX_REQUEST_BYTES: usize = 1_000_000;

#[derive(Debug, Deserialize)]
struct AskRequest {
    #[serde(default)]
    question: String,
}

pub async fn serve<G>(pipeline: Arc<Pipeline<G>>, bind_addr: &str) -> Result<()>
where
    G: SqlGenerator + 'static,
{
    let listener = TcpListener::bind(bind_addr).await?;
    info!("Server listening on http://{}", listener.local_addr()?);
    serve_listener(pipeline, listener).await
}

/// Accept loop over an already bound listener.
pub async fn serve_listener<G>(pipeline: Arc<Pipeline<G>>, listener: TcpListener) -> Result<()>
where
    G: SqlGenerator + 'static,
{
    loop {
        let (stream, addr) = listener.accept().await?;
        debug!("New connection from: {}", addr);
        let pipeline = pipeline.clone();
        tokio::spawn(async move {
            handle_connection(stream, pipeline).await;
        });
    }
}

async fn handle_connection<G: SqlGenerator>(mut stream: TcpStream, pipeline: Arc<Pipeline<G>>) {
    // Read request with timeout to prevent hanging
    let mut buffer = Vec::new();
    let mut temp_buf = [0; 8192];

    let read_result = timeout(Duration::from_secs(5), async {
        loop {
            match stream.read(&mut temp_buf).await {
                Ok(0) => break,
                Ok(n) => {
                    buffer.extend_from_slice(&temp_buf[..n]);
                    if request_complete(&buffer) || buffer.len() > MAX_REQUEST_BYTES {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Failed to read from stream: {}", e);
                    return Err(e);
                }
            }
        }
        Ok(())
    })
    .await;

    match read_result {
        Err(_) => {
            warn!("Request read timeout");
            return;
        }
        Ok(Err(_)) => return,
        Ok(Ok(())) => {}
    }

    if buffer.is_empty() {
        return;
    }

    let response = match String::from_utf8(buffer) {
        Ok(request) => handle_request(&request, &*pipeline).await,
        Err(_) => create_response(400, "Bad Request", "application/json", r#"{"error":"request is not valid UTF-8"}"#),
    };

    if let Err(e) = stream.write_all(response.as_bytes()).await {
        error!("Failed to write response: {}", e);
    }
}

fn request_complete(buffer: &[u8]) -> bool {
    let text = String::from_utf8_lossy(buffer);
    match text.find("\r\n\r\n") {
        Some(headers_end) => {
            let content_length = extract_content_length(&text).unwrap_or(0);
            buffer.len() >= headers_end + 4 + content_length
        }
        None => false,
    }
}

fn extract_content_length(request: &str) -> Option<usize> {
    for line in request.lines() {
        if line.to_lowercase().starts_with("content-length:") {
            if let Some(value) = line.split(':').nth(1) {
                return value.trim().parse().ok();
            }
        }
    }
    None
}

/// Route one raw HTTP request and build the full response text.
pub async fn handle_request<G: SqlGenerator>(request: &str, pipeline: &Pipeline<G>) -> String {
    let request_line = request.lines().next().unwrap_or("");
    let parts: Vec<&str> = request_line.split_whitespace().collect();
    if parts.len() < 2 {
        return create_response(400, "Bad Request", "application/json", "{}");
    }

    let method = parts[0];
    let full_path = parts[1];
    let path_str = full_path.split('?').next().unwrap_or("/");

    // Normalize path (remove trailing slash except for root)
    let mut path = path_str.trim_end_matches('/');
    if path.is_empty() {
        path = "/";
    }
    debug!("Request: {} {}", method, path);

    match (method, path) {
        ("GET", "/") | ("GET", "/index.html") => {
            create_response(200, "OK", "text/html; charset=utf-8", INDEX_HTML)
        }
        ("GET", "/api/health") => create_response(
            200,
            "OK",
            "application/json",
            r#"{"status":"ok","service":"text2sql"}"#,
        ),
        ("POST", "/api/ask") => {
            let body = request
                .find("\r\n\r\n")
                .map(|idx| &request[idx + 4..])
                .unwrap_or("")
                .trim();

            let ask = match parse_ask(body) {
                Ok(ask) => ask,
                Err(e) => {
                    let error_json = serde_json::json!({ "error": format!("invalid request body: {}", e) });
                    return create_response(400, "Bad Request", "application/json", &error_json.to_string());
                }
            };

            if ask.question.trim().is_empty() {
                return create_response(
                    400,
                    "Bad Request",
                    "application/json",
                    r#"{"error":"Please enter a question first."}"#,
                );
            }

            let outcome = pipeline.report(&ask.question).await;
            create_response(200, "OK", "application/json", &outcome_json(&outcome).to_string())
        }
        ("OPTIONS", _) => create_response(204, "No Content", "text/plain", ""),
        _ => create_response(404, "Not Found", "application/json", r#"{"error":"Not found"}"#),
    }
}

fn parse_ask(body: &str) -> Result<AskRequest> {
    Ok(serde_json::from_str(body)?)
}

/// JSON shape consumed by the page script.
pub fn outcome_json(outcome: &Outcome) -> serde_json::Value {
    match outcome {
        Outcome::Answer(answer) => {
            let rows: Vec<Vec<String>> = answer
                .result
                .rows
                .iter()
                .map(|row| row.iter().map(|cell| cell.to_string()).collect())
                .collect();
            let status = if answer.rendered.is_no_data() { "no_data" } else { "ok" };
            serde_json::json!({
                "status": status,
                "question": answer.question,
                "sql": answer.sql,
                "columns": answer.result.columns,
                "rows": rows,
                "row_count": answer.result.row_count(),
                "html": answer.rendered.to_html(),
                "elapsed_ms": answer.elapsed_ms,
                "error": null,
            })
        }
        Outcome::Error(report) => serde_json::json!({
            "status": "error",
            "sql": report.sql,
            "columns": [],
            "rows": [],
            "row_count": 0,
            "html": "",
            "error": report,
        }),
    }
}

fn create_response(status: u16, status_text: &str, content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {} {}\r\n\
         Content-Type: {}\r\n\
         Access-Control-Allow-Origin: *\r\n\
         Access-Control-Allow-Methods: GET, POST, OPTIONS\r\n\
         Access-Control-Allow-Headers: Content-Type\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {}",
        status,
        status_text,
        content_type,
        body.len(),
        body
    )
}

const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Text to SQL</title>
<style>
  body { font-family: -apple-system, "Segoe UI", Roboto, sans-serif; max-width: 760px; margin: 2rem auto; padding: 0 1rem; color: #222; }
  .main-header { background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); padding: 1.5rem; border-radius: 10px; margin-bottom: 2rem; text-align: center; }
  .main-header h1 { color: white; margin: 0; font-size: 2rem; }
  .main-header p { color: rgba(255,255,255,0.9); margin: 0.5rem 0 0 0; }
  #question { width: 100%; box-sizing: border-box; padding: 0.6rem; border-radius: 8px; border: 1px solid #ccc; font-size: 1rem; }
  button { display: block; margin: 1rem auto; background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; border: none; border-radius: 8px; padding: 0.5rem 2rem; font-weight: 600; cursor: pointer; }
  button:disabled { opacity: 0.6; cursor: wait; }
  pre.sql { background: #1e1e1e; color: #dcdcdc; border-radius: 8px; padding: 1rem; white-space: pre-wrap; }
  .custom-table { width: 100%; border-collapse: collapse; margin: 1rem 0; font-size: 0.95rem; box-shadow: 0 2px 15px rgba(0,0,0,0.1); border-radius: 8px; overflow: hidden; }
  .custom-table thead tr { background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; text-align: left; font-weight: 600; }
  .custom-table th, .custom-table td { padding: 12px 15px; }
  .custom-table tbody tr { border-bottom: 1px solid #dddddd; background-color: #ffffff; color: #333333; }
  .custom-table tbody tr:nth-of-type(even) { background-color: #f9f9f9; }
  .custom-table tbody tr:last-of-type { border-bottom: 2px solid #667eea; }
  .notice { padding: 0.75rem 1rem; border-radius: 8px; margin: 0.5rem 0; }
  .success { background: #e6f4ea; } .warning { background: #fff4e5; } .error { background: #fdecea; } .info { background: #e8f0fe; }
  .hidden { display: none; }
</style>
</head>
<body>
<div class="main-header">
  <h1>Text to SQL Generator</h1>
  <p>Transform natural language into SQL queries</p>
</div>
<h3>Ask Your Question</h3>
<form id="ask-form">
  <input id="question" type="text" placeholder="e.g., Show all students in Data Science class" autocomplete="off">
  <button id="submit" type="submit">Generate Query</button>
</form>
<div id="sql-section" class="hidden">
  <h3>Generated SQL Query</h3>
  <pre class="sql" id="sql"></pre>
</div>
<div id="results"></div>
<details>
  <summary>How to use this app</summary>
  <ol>
    <li><b>Enter your question</b> in natural language (e.g., "Show all students with marks above 80")</li>
    <li><b>Click 'Generate Query'</b> to create the SQL</li>
    <li><b>View the results</b> in the table below</li>
  </ol>
  <p>Example questions: "How many students are there?", "Show students in Data Science class",
  "Who has the highest marks?", "List all students in section A", "What is the average marks?"</p>
</details>
<script>
  const form = document.getElementById("ask-form");
  const results = document.getElementById("results");
  const sqlSection = document.getElementById("sql-section");
  const sqlBlock = document.getElementById("sql");
  const submit = document.getElementById("submit");

  function notice(kind, text) {
    const div = document.createElement("div");
    div.className = "notice " + kind;
    div.textContent = text;
    results.appendChild(div);
  }

  form.addEventListener("submit", async (event) => {
    event.preventDefault();
    const question = document.getElementById("question").value.trim();
    results.innerHTML = "";
    sqlSection.classList.add("hidden");
    if (!question) {
      notice("warning", "Please enter a question first.");
      return;
    }
    submit.disabled = true;
    submit.textContent = "Generating SQL query...";
    try {
      const response = await fetch("/api/ask", {
        method: "POST",
        headers: { "Content-Type": "application/json" },
        body: JSON.stringify({ question }),
      });
      const data = await response.json();
      if (data.sql) {
        sqlBlock.textContent = data.sql;
        sqlSection.classList.remove("hidden");
      }
      if (data.status === "ok") {
        notice("success", "Found " + data.row_count + " record(s)");
        results.insertAdjacentHTML("beforeend", data.html);
      } else if (data.status === "no_data") {
        notice("warning", "No data found for this query.");
      } else {
        const err = data.error || {};
        notice("error", err.message || "An error occurred.");
        if (err.hint) notice("info", err.hint);
      }
    } catch (e) {
      notice("error", "An error occurred: " + e);
    } finally {
      submit.disabled = false;
      submit.textContent = "Generate Query";
    }
  });
</script>
</body>
</html>
"##;
