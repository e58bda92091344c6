pub mod event_parse;
pub mod executor;
pub mod fragment;
pub mod job_runner;
pub mod response;
pub mod state_store;
pub mod step;

pub use event_parse::{parse_events, parse_events_report, ParsedEvents, StepEvent};
pub use executor::{ExecutionError, ExecutionOutcome, ProcessStepExecutor, StepExecutor};
pub use fragment::{
    BalanceSnapshot, LogEntry, RegistrationRecord, ServiceDescriptor, StateFragment, WalletRecord,
};
pub use job_runner::{split_log_lines, JobReply, JobRunner, StepRequest};
pub use response::StepResponse;
pub use state_store::{StateLookupError, StateStore};
pub use step::{RunId, Step, StepError, DEFAULT_RUN_ID};
