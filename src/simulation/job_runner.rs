use crate::runtime::{append_runtime_record, StatePaths};
use crate::simulation::event_parse::parse_events_report;
use crate::simulation::executor::StepExecutor;
use crate::simulation::response::StepResponse;
use crate::simulation::step::{RunId, Step};
use serde_json::Value;
use std::sync::Arc;

pub const INVALID_STEP_ERROR: &str = "Invalid step";
pub const INVALID_RUN_ID_ERROR: &str = "Invalid runId";
pub const SIM_FLOW_FAILED_ERROR: &str = "Sim flow failed";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepRequest {
    pub run_id: Option<String>,
    pub step: Option<String>,
}

impl StepRequest {
    pub fn new(run_id: Option<&str>, step: Option<&str>) -> Self {
        Self {
            run_id: run_id.map(str::to_string),
            step: step.map(str::to_string),
        }
    }

    /// Bodies that are not JSON objects, or members that are not strings, read as absent.
    pub fn from_json_body(body: &str) -> Self {
        let value = serde_json::from_str::<Value>(body).unwrap_or(Value::Null);
        let member = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            run_id: member("runId"),
            step: member("step"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReply {
    pub status: u16,
    pub body: StepResponse,
}

impl JobReply {
    fn rejected(error: &str) -> Self {
        Self {
            status: 400,
            body: StepResponse::failed(error, None),
        }
    }
}

pub struct JobRunner {
    executor: Arc<dyn StepExecutor>,
    paths: Option<StatePaths>,
}

impl JobRunner {
    pub fn new(executor: Arc<dyn StepExecutor>) -> Self {
        Self {
            executor,
            paths: None,
        }
    }

    pub fn with_runtime_log(mut self, paths: StatePaths) -> Self {
        self.paths = Some(paths);
        self
    }

    /// Validates the request before anything is spawned.
    pub fn execute_step(&self, request: &StepRequest) -> JobReply {
        let Some(step) = request
            .step
            .as_deref()
            .and_then(|raw| Step::parse(raw).ok())
        else {
            self.log(
                "warn",
                "step_rejected",
                INVALID_STEP_ERROR,
                &[("step", Value::from(request.step.clone()))],
            );
            return JobReply::rejected(INVALID_STEP_ERROR);
        };
        let run_id = match request.run_id.as_deref() {
            None => RunId::default(),
            Some(raw) => match RunId::parse(raw) {
                Ok(run_id) => run_id,
                Err(err) => {
                    self.log("warn", "step_rejected", &err.to_string(), &[]);
                    return JobReply::rejected(INVALID_RUN_ID_ERROR);
                }
            },
        };
        self.run(step, &run_id)
    }

    pub fn run(&self, step: Step, run_id: &RunId) -> JobReply {
        let fields = [
            ("runId", Value::from(run_id.as_str())),
            ("step", Value::from(step.as_str())),
        ];
        self.log("info", "step_started", step.as_str(), &fields);

        let outcome = match self.executor.execute(step, run_id) {
            Ok(outcome) => outcome,
            Err(err) => {
                let message = err.to_string();
                self.log("error", "step_failed", &message, &fields);
                return JobReply {
                    status: 500,
                    body: StepResponse::failed(message, None),
                };
            }
        };

        let parsed = parse_events_report(&outcome.stdout);
        let mut finished = fields.to_vec();
        finished.push(("exitCode", Value::from(outcome.exit_code)));
        finished.push(("events", Value::from(parsed.events.len())));
        finished.push(("skippedLines", Value::from(parsed.skipped)));

        if !outcome.success() {
            let stderr = outcome.stderr.trim_end();
            let error = if stderr.is_empty() {
                SIM_FLOW_FAILED_ERROR
            } else {
                stderr
            };
            self.log("error", "step_failed", error, &finished);
            return JobReply {
                status: 500,
                body: StepResponse::failed(error, Some(parsed.events)),
            };
        }

        self.log("info", "step_finished", step.as_str(), &finished);
        JobReply {
            status: 200,
            body: StepResponse::completed(
                run_id.as_str(),
                step.as_str(),
                parsed.events,
                split_log_lines(&outcome.stderr),
            ),
        }
    }

    fn log(&self, level: &str, event: &str, message: &str, fields: &[(&str, Value)]) {
        if let Some(paths) = &self.paths {
            append_runtime_record(paths, level, event, message, fields);
        }
    }
}

/// Progress text from stderr, one entry per non-blank line.
pub fn split_log_lines(stderr: &str) -> Vec<String> {
    stderr
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}
