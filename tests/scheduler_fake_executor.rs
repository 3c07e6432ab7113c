// tests/scheduler_fake_executor.rs

use std::fs;
use std::sync::atomic::Ordering;

use chrono::{TimeDelta, Utc};
use tempfile::tempdir;

use tickjob::engine::{Scheduler, SchedulerOptions};
use tickjob::exec::LAUNCH_MARKER_VAR;
use tickjob::job::RunOutcome;
use tickjob::runlog::RunLogSink;
use tickjob::types::OutputStream;
use tickjob_test_utils::builders::JobDefinitionBuilder;
use tickjob_test_utils::fake_executor::{FakeExecutor, GatedExecutor};
use tickjob_test_utils::{init_tracing, wait_until, with_timeout};

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::test]
async fn due_jobs_are_dispatched_and_recorded() {
    init_tracing();

    let executor = FakeExecutor::new().with_stdout("done\n");
    let requests = executor.requests();
    let scheduler = Scheduler::new(
        vec![
            JobDefinitionBuilder::new("backup")
                .name("nightly")
                .interval("1h")
                .arg("--full")
                .dir("/srv")
                .timeout("5m")
                .build(),
            JobDefinitionBuilder::new("cleanup").interval("1h").build(),
        ],
        executor,
        RunLogSink::sink(),
        SchedulerOptions::default(),
    );

    let dispatched = scheduler.tick(Utc::now(), true);
    assert_eq!(dispatched, vec![0, 1]);
    with_timeout(scheduler.drain()).await;

    let requests = requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 2);
    let backup = requests
        .iter()
        .find(|r| r.command == "backup")
        .expect("backup request");
    assert_eq!(backup.args, vec!["--full".to_string()]);
    assert_eq!(backup.working_dir.as_deref(), Some(std::path::Path::new("/srv")));
    assert_eq!(backup.deadline, Some(std::time::Duration::from_secs(300)));
    assert!(
        backup
            .env
            .contains(&(LAUNCH_MARKER_VAR.to_string(), "1".to_string()))
    );

    let job = scheduler.job(0).unwrap();
    assert_eq!(job.run_count(), 1);
    assert!(!job.is_running());
    assert_eq!(job.last_output(OutputStream::Stdout).as_deref(), Some("done\n"));

    // Not due again within the interval.
    assert!(scheduler.tick(Utc::now(), false).is_empty());
}

#[tokio::test]
async fn failures_are_recorded_like_any_other_run() {
    init_tracing();

    let executor = FakeExecutor::new().with_outcome(RunOutcome::NonZeroExit(2));
    let scheduler = Scheduler::new(
        vec![JobDefinitionBuilder::new("false").build()],
        executor,
        RunLogSink::sink(),
        SchedulerOptions::default(),
    );

    scheduler.tick(Utc::now(), true);
    with_timeout(scheduler.drain()).await;

    let last = scheduler.job(0).unwrap().last_run().expect("one run");
    assert_eq!(last.outcome, RunOutcome::NonZeroExit(2));
}

#[tokio::test]
async fn running_job_is_not_dispatched_twice() {
    init_tracing();

    let executor = GatedExecutor::new();
    let stats = executor.stats();
    let scheduler = Scheduler::new(
        vec![JobDefinitionBuilder::new("slow").interval("1ms").build()],
        executor.clone(),
        RunLogSink::sink(),
        SchedulerOptions::default(),
    );

    let start = Utc::now();
    assert_eq!(scheduler.tick(start, true), vec![0]);
    wait_until(|| stats.started.load(Ordering::SeqCst) == 1).await;

    for i in 1..20 {
        assert!(scheduler.tick(start + TimeDelta::seconds(i), false).is_empty());
    }
    assert!(scheduler.job(0).unwrap().is_running());

    executor.release(1);
    with_timeout(scheduler.drain()).await;

    assert_eq!(stats.started.load(Ordering::SeqCst), 1);
    assert_eq!(stats.peak.load(Ordering::SeqCst), 1);
    assert_eq!(scheduler.job(0).unwrap().run_count(), 1);

    // Idle again, so the next due tick dispatches.
    assert_eq!(scheduler.tick(Utc::now() + TimeDelta::seconds(1), false), vec![0]);
    executor.release(1);
    with_timeout(scheduler.drain()).await;
    assert_eq!(scheduler.job(0).unwrap().run_count(), 2);
}

#[tokio::test]
async fn slow_job_does_not_block_other_jobs() {
    init_tracing();

    let executor = GatedExecutor::new();
    let stats = executor.stats();
    let scheduler = Scheduler::new(
        vec![
            JobDefinitionBuilder::new("slow").interval("1h").build(),
            JobDefinitionBuilder::new("fast").interval("1ms").build(),
        ],
        executor.clone(),
        RunLogSink::sink(),
        SchedulerOptions::default(),
    );

    assert_eq!(scheduler.tick(Utc::now(), true), vec![0, 1]);
    wait_until(|| stats.started.load(Ordering::SeqCst) == 2).await;
    assert_eq!(stats.peak.load(Ordering::SeqCst), 2);

    executor.release(2);
    with_timeout(scheduler.drain()).await;
}

#[tokio::test]
async fn disabled_jobs_never_reach_the_executor() {
    init_tracing();

    let executor = FakeExecutor::new();
    let requests = executor.requests();
    let scheduler = Scheduler::new(
        vec![
            JobDefinitionBuilder::new("off").disabled(true).build(),
            JobDefinitionBuilder::new("").name("blank").build(),
        ],
        executor,
        RunLogSink::sink(),
        SchedulerOptions::default(),
    );

    let now = Utc::now();
    for i in 0..10 {
        assert!(scheduler.tick(now + TimeDelta::minutes(i), i == 0).is_empty());
    }
    with_timeout(scheduler.drain()).await;
    assert!(requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn env_file_variables_are_added_to_the_request() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let env_path = dir.path().join("job.env");
    fs::write(&env_path, "FOO=bar\nBAZ=qux\n")?;

    let executor = FakeExecutor::new();
    let requests = executor.requests();
    let scheduler = Scheduler::new(
        vec![JobDefinitionBuilder::new("printenv").env_file(&env_path).build()],
        executor,
        RunLogSink::sink(),
        SchedulerOptions::default(),
    );

    scheduler.tick(Utc::now(), true);
    with_timeout(scheduler.drain()).await;

    let requests = requests.lock().unwrap();
    let env = &requests[0].env;
    assert!(env.contains(&("FOO".to_string(), "bar".to_string())));
    assert!(env.contains(&("BAZ".to_string(), "qux".to_string())));
    Ok(())
}

#[tokio::test]
async fn unreadable_env_file_still_runs_with_base_environment() -> TestResult {
    init_tracing();
    let dir = tempdir()?;

    let executor = FakeExecutor::new();
    let requests = executor.requests();
    let scheduler = Scheduler::new(
        vec![
            JobDefinitionBuilder::new("printenv")
                .env_file(dir.path().join("missing.env"))
                .build(),
        ],
        executor,
        RunLogSink::sink(),
        SchedulerOptions::default(),
    );

    scheduler.tick(Utc::now(), true);
    with_timeout(scheduler.drain()).await;

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].env,
        vec![(LAUNCH_MARKER_VAR.to_string(), "1".to_string())]
    );
    Ok(())
}

#[tokio::test]
async fn shutdown_cancels_in_flight_runs_and_records_them() {
    init_tracing();

    let executor = GatedExecutor::new();
    let stats = executor.stats();
    let scheduler = Scheduler::new(
        vec![
            JobDefinitionBuilder::new("a").build(),
            JobDefinitionBuilder::new("b").build(),
        ],
        executor,
        RunLogSink::sink(),
        SchedulerOptions::default(),
    );

    scheduler.tick(Utc::now(), true);
    wait_until(|| stats.started.load(Ordering::SeqCst) == 2).await;

    with_timeout(scheduler.shutdown()).await;

    assert_eq!(scheduler.in_flight(), 0);
    for job in scheduler.jobs() {
        assert!(!job.is_running());
        let last = job.last_run().expect("cancelled run is recorded");
        assert_eq!(last.outcome, RunOutcome::launch_failure("cancelled"));
    }
}

#[tokio::test]
async fn nothing_is_dispatched_after_shutdown() {
    init_tracing();

    let executor = FakeExecutor::new();
    let requests = executor.requests();
    let scheduler = Scheduler::new(
        vec![JobDefinitionBuilder::new("true").build()],
        executor,
        RunLogSink::sink(),
        SchedulerOptions::default(),
    );

    with_timeout(scheduler.shutdown()).await;

    assert!(scheduler.tick(Utc::now(), true).is_empty());
    assert!(!scheduler.job(0).unwrap().is_running());
    assert!(requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn max_concurrent_limits_simultaneous_runs() {
    init_tracing();

    let executor = GatedExecutor::new();
    let stats = executor.stats();
    let scheduler = Scheduler::new(
        (0..4)
            .map(|i| JobDefinitionBuilder::new(&format!("job-{i}")).build())
            .collect(),
        executor.clone(),
        RunLogSink::sink(),
        SchedulerOptions {
            history_limit: 10,
            max_concurrent: 1,
        },
    );

    assert_eq!(scheduler.tick(Utc::now(), true).len(), 4);

    for n in 1..=4 {
        wait_until(|| stats.started.load(Ordering::SeqCst) == n).await;
        executor.release(1);
    }
    with_timeout(scheduler.drain()).await;

    assert_eq!(stats.peak.load(Ordering::SeqCst), 1);
    assert!(scheduler.jobs().iter().all(|j| j.run_count() == 1));
}

#[tokio::test]
async fn history_limit_applies_to_every_job() {
    init_tracing();

    let scheduler = Scheduler::new(
        vec![JobDefinitionBuilder::new("true").build()],
        FakeExecutor::new(),
        RunLogSink::sink(),
        SchedulerOptions {
            history_limit: 2,
            max_concurrent: 0,
        },
    );

    let start = Utc::now();
    for i in 0..5 {
        assert_eq!(scheduler.tick(start + TimeDelta::hours(i), i == 0), vec![0]);
        with_timeout(scheduler.drain()).await;
    }
    assert_eq!(scheduler.job(0).unwrap().run_count(), 2);
}

#[tokio::test]
async fn completed_runs_are_written_to_the_run_log() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let log_path = dir.path().join("runs.log");

    let scheduler = Scheduler::new(
        vec![JobDefinitionBuilder::new("reporter").build()],
        FakeExecutor::new().with_stdout("42 rows\n"),
        RunLogSink::open(Some(log_path.as_path())),
        SchedulerOptions::default(),
    );

    scheduler.tick(Utc::now(), true);
    with_timeout(scheduler.drain()).await;

    let log = fs::read_to_string(&log_path)?;
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("command: reporter"));
    assert!(lines[0].ends_with(r#"stdout: "42 rows\n""#));
    assert!(lines[1].ends_with(r#"stderr: """#));
    Ok(())
}
