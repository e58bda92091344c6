#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliVerb {
    Serve,
    Step,
    State,
    View,
    Help,
    Unknown,
}

pub fn parse_cli_verb(input: &str) -> CliVerb {
    match input {
        "serve" => CliVerb::Serve,
        "step" => CliVerb::Step,
        "state" => CliVerb::State,
        "view" => CliVerb::View,
        "help" | "--help" | "-h" => CliVerb::Help,
        _ => CliVerb::Unknown,
    }
}

pub fn cli_help_lines() -> Vec<String> {
    vec![
        "Commands:".to_string(),
        "  serve                                Serve /sim/step and /sim/state over HTTP".to_string(),
        "  step <step> [--party a|b]            Run one simulation step against the saved view"
            .to_string(),
        "  state [runId]                        Fetch a run snapshot from the configured proxy"
            .to_string(),
        "  view                                 Print the saved client view".to_string(),
        "  help                                 Show this help".to_string(),
    ]
}

pub fn step_help_lines() -> Vec<String> {
    crate::simulation::Step::ALL
        .iter()
        .map(|step| format!("  {}", step.as_str()))
        .collect()
}

pub(crate) fn help_text() -> String {
    let mut lines = cli_help_lines();
    lines.push(String::new());
    lines.push("Steps:".to_string());
    lines.extend(step_help_lines());
    lines.join("\n")
}
