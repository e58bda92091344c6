use crate::app::command_handlers::view::render_view;
use crate::app::command_support::{ensure_runtime_root, load_settings, take_flag};
use crate::client::persistence::{load_view, save_view};
use crate::client::{
    BufferedNotifier, DispatchOutcome, DispatcherConfig, HttpStepClient, Notifier, Party,
    RuntimeLogNotifier, StepDispatcher,
};
use crate::simulation::Step;
use std::sync::Arc;

/// Shows notifications after the step and keeps a copy in the runtime log.
struct CliNotifier {
    buffer: BufferedNotifier,
    log: RuntimeLogNotifier,
}

impl Notifier for CliNotifier {
    fn notify(&self, message: &str) {
        self.buffer.notify(message);
        self.log.notify(message);
    }
}

fn describe_outcome(step: Step, outcome: &DispatchOutcome) -> String {
    match outcome {
        DispatchOutcome::Skipped => {
            format!("step={step} outcome=skipped (not runnable from the current view)")
        }
        DispatchOutcome::Demo => format!("step={step} outcome=demo"),
        DispatchOutcome::Applied => format!("step={step} outcome=applied"),
        DispatchOutcome::Failed(message) => format!("step={step} outcome=failed error={message}"),
    }
}

pub fn cmd_step(args: &[String]) -> Result<String, String> {
    let (party, rest) = take_flag(args, "--party")?;
    let [raw_step] = rest.as_slice() else {
        return Err("usage: step <step> [--party a|b]".to_string());
    };
    let step = Step::parse(raw_step).map_err(|e| e.to_string())?;
    let party = match party {
        Some(raw) => Some(
            Party::parse(&raw).ok_or_else(|| format!("invalid party `{raw}`, expected a or b"))?,
        ),
        None => None,
    };

    let paths = ensure_runtime_root()?;
    let settings = load_settings(&paths)?;
    let view_path = paths.client_view_path();
    let view = load_view(&view_path).map_err(|e| e.to_string())?;

    let notifier = Arc::new(CliNotifier {
        buffer: BufferedNotifier::default(),
        log: RuntimeLogNotifier::new(paths.clone()),
    });
    let dispatcher = StepDispatcher::new(
        DispatcherConfig::from_settings(&settings.client),
        view,
        Arc::new(HttpStepClient::new()),
        notifier.clone(),
    );
    let outcome = dispatcher.trigger(step, party);
    let view = dispatcher.view();
    save_view(&view_path, &view).map_err(|e| e.to_string())?;

    let mut lines: Vec<String> = notifier
        .buffer
        .drain()
        .into_iter()
        .map(|message| format!("notice: {message}"))
        .collect();
    lines.push(describe_outcome(step, &outcome));
    lines.push(render_view(&view, &settings.client.explorer_base));
    Ok(lines.join("\n"))
}
