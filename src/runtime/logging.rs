use super::StatePaths;
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;

pub fn append_runtime_log(paths: &StatePaths, level: &str, event: &str, message: &str) {
    append_runtime_record(paths, level, event, message, &[]);
}

/// Appends one JSON line to `logs/runtime.log`. Failures are swallowed.
pub fn append_runtime_record(
    paths: &StatePaths,
    level: &str,
    event: &str,
    message: &str,
    fields: &[(&str, Value)],
) {
    let mut payload = Map::new();
    payload.insert("timestamp".to_string(), Value::from(super::now_secs()));
    payload.insert("level".to_string(), Value::from(level));
    payload.insert("event".to_string(), Value::from(event));
    payload.insert("message".to_string(), Value::from(message));
    for (key, value) in fields {
        payload.insert((*key).to_string(), value.clone());
    }

    let Ok(line) = serde_json::to_string(&payload) else {
        return;
    };

    let path = paths.runtime_log_path();
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(mut file) = fs::OpenOptions::new().create(true).append(true).open(path) else {
        return;
    };
    let _ = writeln!(file, "{line}");
}
