use agentsim::runtime::StatePaths;
use agentsim::simulation::{JobRunner, ProcessStepExecutor, StepRequest};
use serde_json::{json, Value};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn write_script(path: &Path, body: &str) {
    fs::write(path, body).expect("write script");
    let mut perms = fs::metadata(path).expect("metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).expect("chmod");
}

fn runner_for(script: &Path) -> JobRunner {
    JobRunner::new(Arc::new(ProcessStepExecutor::new(
        script.display().to_string(),
        Vec::new(),
    )))
}

#[test]
fn seed_step_returns_events_and_stderr_lines() {
    let dir = tempdir().expect("tempdir");
    let script = dir.path().join("sim-flow");
    write_script(
        &script,
        "#!/bin/sh\n\
         echo '[t1] seeded' >&2\n\
         echo '{\"type\":\"seeded\",\"state\":{\"balances\":{\"poolAUsdc\":\"0.5\"}}}'\n",
    );

    let reply = runner_for(&script).execute_step(&StepRequest::new(Some("r1"), Some("seed")));
    assert_eq!(reply.status, 200);
    let body = serde_json::to_value(&reply.body).expect("encode");
    assert_eq!(
        body,
        json!({
            "ok": true,
            "runId": "r1",
            "step": "seed",
            "events": [{"type": "seeded", "state": {"balances": {"poolAUsdc": "0.5"}}}],
            "logs": ["[t1] seeded"]
        })
    );
}

#[test]
fn script_receives_run_step_and_json_flags() {
    let dir = tempdir().expect("tempdir");
    let script = dir.path().join("sim-flow");
    let args_file = dir.path().join("args.txt");
    write_script(
        &script,
        &format!("#!/bin/sh\necho \"$@\" > '{}'\n", args_file.display()),
    );

    let reply = runner_for(&script).execute_step(&StepRequest::new(None, Some("register")));
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body.run_id.as_deref(), Some("default"));
    let args = fs::read_to_string(&args_file).expect("args");
    assert_eq!(args.trim(), "--run default --step register --json");
}

#[test]
fn non_zero_exit_reports_stderr_and_partial_events() {
    let dir = tempdir().expect("tempdir");
    let script = dir.path().join("sim-flow");
    write_script(
        &script,
        "#!/bin/sh\n\
         echo '{\"type\":\"partial\"}'\n\
         echo 'not json'\n\
         echo 'insufficient funds' >&2\n\
         exit 3\n",
    );

    let reply = runner_for(&script).execute_step(&StepRequest::new(Some("r2"), Some("pay")));
    assert_eq!(reply.status, 500);
    assert!(!reply.body.ok);
    assert_eq!(reply.body.error.as_deref(), Some("insufficient funds"));
    let events = reply.body.events.expect("events");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].as_value(), &json!({"type": "partial"}));
}

#[test]
fn invalid_utf8_on_stderr_keeps_error_and_events() {
    let dir = tempdir().expect("tempdir");
    let script = dir.path().join("sim-flow");
    write_script(
        &script,
        "#!/bin/sh\n\
         echo '{\"a\":1}'\n\
         printf 'insufficient funds \\377\\n' >&2\n\
         exit 2\n",
    );

    let reply = runner_for(&script).execute_step(&StepRequest::new(Some("r2"), Some("pay")));
    assert_eq!(reply.status, 500);
    let error = reply.body.error.expect("error");
    assert!(error.starts_with("insufficient funds"), "error: {error}");
    assert!(error.contains('\u{FFFD}'));
    let events = reply.body.events.expect("events");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].as_value(), &json!({"a": 1}));
}

#[test]
fn invalid_utf8_on_stdout_still_parses_valid_lines() {
    let dir = tempdir().expect("tempdir");
    let script = dir.path().join("sim-flow");
    write_script(
        &script,
        "#!/bin/sh\n\
         printf 'npx: \\377\\n'\n\
         echo '{\"type\":\"seeded\"}'\n\
         echo '[t1] seeded' >&2\n",
    );

    let reply = runner_for(&script).execute_step(&StepRequest::new(Some("r1"), Some("seed")));
    assert_eq!(reply.status, 200);
    let body = serde_json::to_value(&reply.body).expect("encode");
    assert_eq!(body["events"], json!([{"type": "seeded"}]));
    assert_eq!(body["logs"], json!(["[t1] seeded"]));
}

#[test]
fn silent_failure_uses_generic_error() {
    let dir = tempdir().expect("tempdir");
    let script = dir.path().join("sim-flow");
    write_script(&script, "#!/bin/sh\nexit 1\n");

    let reply = runner_for(&script).execute_step(&StepRequest::new(None, Some("init")));
    assert_eq!(reply.status, 500);
    assert_eq!(reply.body.error.as_deref(), Some("Sim flow failed"));
    assert_eq!(reply.body.events.as_deref().map(<[_]>::len), Some(0));
}

#[test]
fn invalid_step_is_rejected_without_spawning() {
    let dir = tempdir().expect("tempdir");
    let script = dir.path().join("sim-flow");
    let marker = dir.path().join("spawned");
    write_script(
        &script,
        &format!("#!/bin/sh\ntouch '{}'\n", marker.display()),
    );
    let runner = runner_for(&script);

    let reply = runner.execute_step(&StepRequest::new(None, Some("deploy")));
    assert_eq!(reply.status, 400);
    assert_eq!(reply.body.error.as_deref(), Some("Invalid step"));

    let reply = runner.execute_step(&StepRequest::new(Some("../etc"), Some("init")));
    assert_eq!(reply.status, 400);
    assert_eq!(reply.body.error.as_deref(), Some("Invalid runId"));

    let reply = runner.execute_step(&StepRequest::from_json_body("not json"));
    assert_eq!(reply.status, 400);
    assert!(!marker.exists());
}

#[test]
fn missing_program_is_a_server_error() {
    let dir = tempdir().expect("tempdir");
    let runner = runner_for(&dir.path().join("does-not-exist"));

    let reply = runner.execute_step(&StepRequest::new(None, Some("init")));
    assert_eq!(reply.status, 500);
    assert!(reply.body.events.is_none());
    let error = reply.body.error.expect("error");
    assert!(error.contains("not found"), "{error}");
}

#[test]
fn runtime_log_records_start_and_finish_with_skipped_lines() {
    let dir = tempdir().expect("tempdir");
    let script = dir.path().join("sim-flow");
    write_script(&script, "#!/bin/sh\necho 'noise'\necho '{\"a\":1}'\n");
    let paths = StatePaths::new(dir.path().join("root"));

    let reply = runner_for(&script)
        .with_runtime_log(paths.clone())
        .execute_step(&StepRequest::new(Some("r9"), Some("init")));
    assert_eq!(reply.status, 200);

    let raw = fs::read_to_string(paths.runtime_log_path()).expect("runtime log");
    let records: Vec<Value> = raw
        .lines()
        .map(|line| serde_json::from_str(line).expect("json record"))
        .collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["event"], "step_started");
    assert_eq!(records[1]["event"], "step_finished");
    assert_eq!(records[1]["runId"], "r9");
    assert_eq!(records[1]["skippedLines"], 1);
    assert_eq!(records[1]["events"], 1);
}

#[test]
fn stderr_only_script_yields_logs_and_empty_events() {
    let dir = tempdir().expect("tempdir");
    let script = dir.path().join("sim-flow");
    write_script(&script, "#!/bin/sh\necho '[t1] seeded' >&2\n");

    let reply = runner_for(&script).execute_step(&StepRequest::new(Some("r1"), Some("seed")));
    assert_eq!(reply.status, 200);
    let body = serde_json::to_value(&reply.body).expect("encode");
    assert_eq!(body["ok"], true);
    assert_eq!(body["logs"], json!(["[t1] seeded"]));
    assert_eq!(body["events"], json!([]));
}

#[test]
fn working_dir_and_env_overrides_reach_the_script() {
    let dir = tempdir().expect("tempdir");
    let workdir = dir.path().join("flows");
    fs::create_dir_all(&workdir).expect("workdir");
    let script = dir.path().join("sim-flow");
    write_script(
        &script,
        "#!/bin/sh\necho \"{\\\"network\\\":\\\"$SIM_NETWORK\\\",\\\"cwd\\\":\\\"$(basename \"$(pwd -P)\")\\\"}\"\n",
    );
    let executor = ProcessStepExecutor::new(script.display().to_string(), Vec::new())
        .with_working_dir(&workdir)
        .with_env("SIM_NETWORK", "testnet");

    let reply = JobRunner::new(Arc::new(executor))
        .execute_step(&StepRequest::new(None, Some("init")));
    assert_eq!(reply.status, 200);
    let events = reply.body.events.expect("events");
    assert_eq!(
        events[0].as_value(),
        &json!({"network": "testnet", "cwd": "flows"})
    );
}
