use crate::app::command_support::{ensure_runtime_root, load_settings};
use crate::runtime::append_runtime_record;
use crate::server::{SimRoutes, SimServer};
use crate::simulation::{JobRunner, ProcessStepExecutor, StateStore};
use serde_json::Value;
use std::sync::Arc;

pub fn cmd_serve() -> Result<String, String> {
    let paths = ensure_runtime_root()?;
    let settings = load_settings(&paths)?;

    let executor = ProcessStepExecutor::from_settings(&settings.server.script);
    let command = executor.program().to_string();
    let runner = JobRunner::new(Arc::new(executor)).with_runtime_log(paths.clone());
    let store = StateStore::new(settings.resolve_state_dir(&paths));
    let snapshot_dir = store.dir().display().to_string();
    let routes = SimRoutes::new(runner, store)
        .with_api_key(settings.server.api_key.clone())
        .with_runtime_log(paths.clone());

    let server = SimServer::bind(&settings.server.bind, routes).map_err(|e| e.to_string())?;
    let addr = server
        .local_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| settings.server.bind.clone());
    append_runtime_record(
        &paths,
        "info",
        "server_started",
        &format!("listening on {addr}"),
        &[
            ("program", Value::from(command)),
            ("snapshotDir", Value::from(snapshot_dir)),
            ("auth", Value::from(settings.server.api_key.is_some())),
        ],
    );
    println!("listening on http://{addr}");
    server.serve();
    Ok("server stopped".to_string())
}
