use crate::app::cli::{help_text, parse_cli_verb, CliVerb};

pub mod serve;
pub mod state;
pub mod step;
pub mod view;

pub fn run_cli(args: Vec<String>) -> Result<String, String> {
    if args.is_empty() {
        return Ok(help_text());
    }

    match parse_cli_verb(args[0].as_str()) {
        CliVerb::Serve => serve::cmd_serve(),
        CliVerb::Step => step::cmd_step(&args[1..]),
        CliVerb::State => state::cmd_state(&args[1..]),
        CliVerb::View => view::cmd_view(),
        CliVerb::Help => Ok(help_text()),
        CliVerb::Unknown => Err(format!("unknown command `{}`", args[0])),
    }
}
