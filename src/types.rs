// src/types.rs

//! Small shared value types: captured output streams and duration strings.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Which captured stream of a run to read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl FromStr for OutputStream {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stdout" => Ok(OutputStream::Stdout),
            "stderr" => Ok(OutputStream::Stderr),
            other => Err(format!(
                "invalid output stream: {other} (expected \"stdout\" or \"stderr\")"
            )),
        }
    }
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputStream::Stdout => f.write_str("stdout"),
            OutputStream::Stderr => f.write_str("stderr"),
        }
    }
}

/// Parse a duration string such as `"30s"`, `"250ms"`, `"1h30m"` or `"1.5s"`.
///
/// Accepts one or more `<number><unit>` segments with units `ns`, `us`
/// (or `µs`), `ms`, `s`, `m` and `h`. A bare `"0"` is the zero duration.
/// Negative durations are rejected.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let mut rest = s;
    let mut total = Duration::ZERO;

    while !rest.is_empty() {
        let num_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| format!("duration '{s}' is missing a unit suffix"))?;
        let (num_part, tail) = rest.split_at(num_end);
        if num_part.is_empty() || num_part == "." {
            return Err(format!("invalid duration '{s}'"));
        }

        let unit_end = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_end);

        let nanos_per_unit: f64 = match unit {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60.0 * 1e9,
            "h" => 3600.0 * 1e9,
            other => {
                return Err(format!(
                    "unsupported duration unit '{other}' in '{s}'; expected ns, us, ms, s, m or h"
                ));
            }
        };

        let value: f64 = num_part
            .parse()
            .map_err(|e| format!("invalid duration number '{num_part}': {e}"))?;

        let segment = Duration::from_nanos((value * nanos_per_unit).round() as u64);
        total = total
            .checked_add(segment)
            .ok_or_else(|| format!("duration '{s}' overflows"))?;
        rest = next;
    }

    Ok(total)
}

/// Render a duration truncated to whole seconds, e.g. `"0s"`, `"45s"`,
/// `"1m5s"`, `"2h0m0s"`.
pub fn format_duration_secs(d: Duration) -> String {
    let secs = d.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}h{m}m{s}s")
    } else if m > 0 {
        format!("{m}m{s}s")
    } else {
        format!("{s}s")
    }
}
