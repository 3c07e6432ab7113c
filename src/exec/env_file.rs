// src/exec/env_file.rs

//! `KEY=VALUE` environment files.

use std::io;
use std::path::Path;

/// Parse environment file contents.
///
/// One variable per line, split at the first `=`. Blank lines, `#` comments,
/// lines without `=` and lines whose key is empty or contains whitespace are
/// skipped. Values are kept as written.
pub fn parse_env(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .filter_map(|line| {
            let trimmed = line.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                return None;
            }
            let (key, value) = trimmed.split_once('=')?;
            let key = key.trim_end();
            if key.is_empty() || key.contains(char::is_whitespace) {
                return None;
            }
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

/// Read and parse an environment file.
pub async fn load_env_file(path: &Path) -> io::Result<Vec<(String, String)>> {
    let contents = tokio::fs::read_to_string(path).await?;
    Ok(parse_env(&contents))
}
