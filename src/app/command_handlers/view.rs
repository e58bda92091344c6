use crate::app::command_support::{ensure_runtime_root, load_settings};
use crate::client::persistence::load_view;
use crate::client::{
    format_log_ts, render_log_text, render_segments_markdown, short_address, Party, ViewModel,
};

pub fn cmd_view() -> Result<String, String> {
    let paths = ensure_runtime_root()?;
    let settings = load_settings(&paths)?;
    let view = load_view(&paths.client_view_path()).map_err(|e| e.to_string())?;
    Ok(render_view(&view, &settings.client.explorer_base))
}

fn flag(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// Text form of the diagram: one block per party, the gateway, then the log.
pub fn render_view(view: &ViewModel, explorer_base: &str) -> String {
    let mut lines = Vec::new();
    for party in Party::BOTH {
        let agent = view.party(party);
        lines.push(format!("{}:", party.label()));
        lines.push(format!("  wallet={}", short_address(agent.wallet.as_deref())));
        lines.push(format!(
            "  agent_id={}",
            agent.agent_id.as_deref().unwrap_or("Not set")
        ));
        lines.push(format!(
            "  smart_account={} visible={}",
            short_address(agent.smart_account.as_deref()),
            flag(agent.smart_visible)
        ));
        lines.push(format!(
            "  pool={} visible={} tvl={}",
            short_address(agent.pool.as_deref()),
            flag(agent.pool_visible),
            agent.pool_tvl
        ));
        lines.push(format!("  smart_usdc={}", agent.smart_usdc));
        lines.push(format!("  ready={}", flag(agent.ready)));
    }
    lines.push(format!(
        "services_registered={}",
        flag(view.services_registered)
    ));
    lines.push(format!("gateway_usdc={}", view.gateway_usdc));

    lines.push("log:".to_string());
    if view.log.is_empty() {
        lines.push("  (empty)".to_string());
    }
    for entry in view.log.entries() {
        let text = render_segments_markdown(&render_log_text(&entry.text, explorer_base));
        lines.push(format!("  [{}] {}", format_log_ts(&entry.ts), text));
    }
    lines.join("\n")
}
