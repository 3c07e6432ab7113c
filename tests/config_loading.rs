// tests/config_loading.rs

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use tempfile::tempdir;

use tickjob::config::{load_and_validate, load_from_path, validate_config, DEFAULT_TICK};
use tickjob::engine::SchedulerOptions;
use tickjob::errors::TickjobError;
use tickjob_test_utils::builders::{ConfigFileBuilder, JobDefinitionBuilder};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn toml_config_with_defaults() -> TestResult {
    let dir = tempdir()?;
    let path = write(
        dir.path(),
        "tickjob.toml",
        r#"
[[job]]
name = "backup"
interval = "1h"
command = "/usr/local/bin/backup"
args = ["--full", "/srv"]

[[job]]
command = "date"
"#,
    );

    let cfg = load_and_validate(&path)?;

    assert_eq!(cfg.config.tick, "1m");
    assert_eq!(cfg.config.tick_period(), Duration::from_secs(60));
    assert_eq!(cfg.config.scheduler_options(), SchedulerOptions::default());
    assert!(cfg.config.log_file.is_none());
    assert_eq!(cfg.config.dashboard_addr()?, None);

    assert_eq!(cfg.jobs.len(), 2);
    let backup = &cfg.jobs[0];
    assert_eq!(backup.display_name(), "backup");
    assert_eq!(backup.command_line(), "/usr/local/bin/backup --full /srv");
    assert!(!backup.disabled);

    let date = &cfg.jobs[1];
    assert_eq!(date.display_name(), "date");
    assert!(date.interval.is_empty());
    assert!(date.startup_delay.is_none());
    assert!(date.env_file.is_none());
    Ok(())
}

#[test]
fn toml_config_with_every_field() -> TestResult {
    let dir = tempdir()?;
    let path = write(
        dir.path(),
        "full.toml",
        r#"
[config]
tick = "30s"
log_file = "/var/log/tickjob.log"
history_limit = 5
max_concurrent = 2
dashboard = "127.0.0.1:8080"

[[job]]
name = "report"
interval = "15m"
startup_delay = "2m"
command = "report.sh"
dir = "/opt/reports"
env_file = "/etc/report.env"
timeout = "10m"
disabled = true
"#,
    );

    let cfg = load_and_validate(&path)?;

    assert_eq!(cfg.config.tick_period(), Duration::from_secs(30));
    assert_eq!(
        cfg.config.scheduler_options(),
        SchedulerOptions {
            history_limit: 5,
            max_concurrent: 2,
        }
    );
    assert_eq!(
        cfg.config.dashboard_addr()?,
        Some("127.0.0.1:8080".parse::<SocketAddr>()?)
    );

    let job = &cfg.jobs[0];
    assert_eq!(job.startup_delay.as_deref(), Some("2m"));
    assert_eq!(job.dir, "/opt/reports");
    assert_eq!(job.env_file.as_deref(), Some(Path::new("/etc/report.env")));
    assert_eq!(job.timeout.as_deref(), Some("10m"));
    assert!(job.disabled);
    Ok(())
}

#[test]
fn json_config_is_accepted() -> TestResult {
    let dir = tempdir()?;
    let path = write(
        dir.path(),
        "tickjob.json",
        r#"{
  "config": { "tick": "5s" },
  "jobs": [
    { "name": "ping", "interval": "10s", "command": "ping", "args": ["-c", "1", "localhost"] }
  ]
}"#,
    );

    let cfg = load_and_validate(&path)?;

    assert_eq!(cfg.config.tick_period(), Duration::from_secs(5));
    assert_eq!(cfg.jobs.len(), 1);
    assert_eq!(cfg.jobs[0].args, vec!["-c", "1", "localhost"]);
    Ok(())
}

#[test]
fn config_without_jobs_is_rejected() -> TestResult {
    let dir = tempdir()?;
    let path = write(dir.path(), "empty.toml", "[config]\ntick = \"1s\"\n");

    // Deserialization alone succeeds.
    assert!(load_from_path(&path)?.jobs.is_empty());

    match load_and_validate(&path) {
        Err(TickjobError::ConfigError(msg)) => assert!(msg.contains("at least one")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
    Ok(())
}

#[test]
fn invalid_dashboard_address_is_rejected() {
    let mut cfg = ConfigFileBuilder::new()
        .with_job(JobDefinitionBuilder::new("true").build())
        .build();
    cfg.config.dashboard = Some("localhost".to_string());

    assert!(matches!(
        validate_config(&cfg),
        Err(TickjobError::ConfigError(_))
    ));
}

#[test]
fn malformed_toml_is_a_toml_error() -> TestResult {
    let dir = tempdir()?;
    let path = write(dir.path(), "broken.toml", "[[job]\ncommand = ");

    assert!(matches!(
        load_from_path(&path),
        Err(TickjobError::TomlError(_))
    ));
    Ok(())
}

#[test]
fn malformed_json_is_a_json_error() -> TestResult {
    let dir = tempdir()?;
    let path = write(dir.path(), "broken.json", "{ \"jobs\": [ ");

    assert!(matches!(
        load_from_path(&path),
        Err(TickjobError::JsonError(_))
    ));
    Ok(())
}

#[test]
fn missing_file_is_an_io_error() -> TestResult {
    let dir = tempdir()?;

    assert!(matches!(
        load_from_path(dir.path().join("nope.toml")),
        Err(TickjobError::IoError(_))
    ));
    Ok(())
}

#[test]
fn bad_or_zero_tick_falls_back_to_default() {
    for tick in ["whenever", "0", "0s", ""] {
        let cfg = ConfigFileBuilder::new().tick(tick).build();
        assert_eq!(cfg.config.tick_period(), DEFAULT_TICK, "tick = {tick:?}");
    }
}

#[test]
fn invalid_job_durations_do_not_fail_validation() {
    let cfg = ConfigFileBuilder::new()
        .with_job(
            JobDefinitionBuilder::new("true")
                .interval("sometimes")
                .startup_delay("later")
                .build(),
        )
        .build();

    assert!(validate_config(&cfg).is_ok());
}

#[test]
fn pretty_toml_round_trips_through_the_loader() -> TestResult {
    let cfg = ConfigFileBuilder::new()
        .tick("10s")
        .history_limit(7)
        .with_job(
            JobDefinitionBuilder::new("backup")
                .name("nightly")
                .interval("1h")
                .arg("--full")
                .build(),
        )
        .build();

    let rendered = cfg.to_pretty_toml();
    assert!(rendered.contains("[[job]]"));
    assert!(rendered.contains("nightly"));

    let dir = tempdir()?;
    let path = write(dir.path(), "rendered.toml", &rendered);
    let reloaded = load_and_validate(&path)?;
    assert_eq!(reloaded.config.tick, "10s");
    assert_eq!(reloaded.config.history_limit, 7);
    assert_eq!(reloaded.jobs, cfg.jobs);
    Ok(())
}
