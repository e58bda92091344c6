use crate::app::command_support::{ensure_runtime_root, load_settings};
use crate::client::HttpStepClient;

pub fn cmd_state(args: &[String]) -> Result<String, String> {
    if args.len() > 1 {
        return Err("usage: state [runId]".to_string());
    }
    let paths = ensure_runtime_root()?;
    let settings = load_settings(&paths)?;
    let endpoint = settings
        .client
        .proxy_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| "client.proxy_url is not set".to_string())?;
    let run_id = args
        .first()
        .cloned()
        .unwrap_or_else(|| settings.client.run_id.clone());

    let client = HttpStepClient::new();
    match client
        .fetch_state(endpoint, settings.client.api_key.as_deref(), &run_id)
        .map_err(|e| e.to_string())?
    {
        Some(state) => serde_json::to_string_pretty(&state).map_err(|e| e.to_string()),
        None => Err(format!("state not found for run `{run_id}`")),
    }
}
