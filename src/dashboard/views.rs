// src/dashboard/views.rs

use std::fmt::Write as _;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use chrono::Local;
use html_escape::encode_text;
use serde::Deserialize;

use crate::job::JobState;
use crate::types::{format_duration_secs, OutputStream};

use super::DashboardState;

const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    idx: Option<String>,
}

/// `GET /`: one row per job.
pub async fn index_handler(State(state): State<Arc<DashboardState>>) -> Html<String> {
    let mut body = String::from(
        "<table>\n<tr><th>#</th><th>Job</th><th>Interval</th><th>Last run</th>\
         <th>Took</th><th>Status</th></tr>\n",
    );

    for (idx, job) in state.jobs.iter().enumerate() {
        let def = job.definition();
        let _ = writeln!(
            body,
            "<tr><td>{idx}</td><td><a href=\"/logs?idx={idx}\">{}</a></td><td>{}</td>\
             <td>{}</td><td>{}</td><td>{}</td></tr>",
            encode_text(job.name()),
            encode_text(&def.interval),
            last_run_on(job),
            last_time_taken(job),
            status_label(job),
        );
    }
    body.push_str("</table>\n");

    Html(page("Jobs", &body))
}

/// `GET /logs?idx=N`: configuration and last output of one job.
pub async fn logs_handler(
    State(state): State<Arc<DashboardState>>,
    Query(query): Query<LogsQuery>,
) -> Result<Html<String>, (StatusCode, String)> {
    let raw = query
        .idx
        .ok_or((StatusCode::BAD_REQUEST, "missing idx parameter".to_string()))?;
    let idx: usize = raw
        .trim()
        .parse()
        .map_err(|_| (StatusCode::BAD_REQUEST, format!("invalid job index: {raw}")))?;
    let job = state
        .jobs
        .get(idx)
        .ok_or((StatusCode::NOT_FOUND, format!("no job at index {idx}")))?;

    let def = job.definition();
    let outcome = job
        .last_run()
        .map(|r| r.outcome.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let mut body = String::new();
    let _ = writeln!(body, "<h2>{}</h2>", encode_text(job.name()));
    let _ = writeln!(body, "<dl>");
    let _ = writeln!(body, "<dt>Command</dt><dd><code>{}</code></dd>", encode_text(&def.command_line()));
    let _ = writeln!(body, "<dt>Interval</dt><dd>{}</dd>", encode_text(&def.interval));
    if !def.dir.is_empty() {
        let _ = writeln!(body, "<dt>Directory</dt><dd>{}</dd>", encode_text(&def.dir));
    }
    let _ = writeln!(body, "<dt>Status</dt><dd>{}</dd>", status_label(job));
    let _ = writeln!(body, "<dt>Last run</dt><dd>{}</dd>", last_run_on(job));
    let _ = writeln!(body, "<dt>Took</dt><dd>{}</dd>", last_time_taken(job));
    let _ = writeln!(body, "<dt>Outcome</dt><dd>{}</dd>", encode_text(&outcome));
    let _ = writeln!(body, "</dl>");

    for stream in [OutputStream::Stdout, OutputStream::Stderr] {
        let text = job.last_output(stream).unwrap_or_default();
        let _ = writeln!(body, "<h3>{stream}</h3>\n<pre>{}</pre>", encode_text(&text));
    }

    Ok(Html(page(job.name(), &body)))
}

/// `GET /config`: the loaded configuration.
pub async fn config_handler(State(state): State<Arc<DashboardState>>) -> Html<String> {
    let body = format!("<pre>{}</pre>\n", encode_text(&state.config.to_pretty_toml()));
    Html(page("Configuration", &body))
}

fn last_run_on(job: &JobState) -> String {
    job.last_run_time()
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn last_time_taken(job: &JobState) -> String {
    job.last_run_duration()
        .map(format_duration_secs)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn status_label(job: &JobState) -> &'static str {
    if job.is_disabled() {
        "disabled"
    } else if job.is_running() {
        "running"
    } else {
        "idle"
    }
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>tickjob - {title}</title></head>\n\
         <body>\n<nav><a href=\"/\">Jobs</a> | <a href=\"/config\">Config</a></nav>\n{body}</body>\n</html>\n",
        title = encode_text(title),
    )
}
