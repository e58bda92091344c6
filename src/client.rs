pub mod demo;
pub mod dispatcher;
pub mod log_render;
pub mod log_ring;
pub mod persistence;
pub mod transport;
pub mod view_model;

pub use dispatcher::{
    ActionToken, BufferedNotifier, DispatchOutcome, DispatcherConfig, Notifier, PartyActivity,
    RuntimeLogNotifier, SimulationStore, StepDispatcher,
};
pub use log_render::{
    format_log_ts, render_log_text, render_segments_markdown, short_address, LogSegment,
    ReferenceKind,
};
pub use log_ring::{LogEntry, LogRing, LOG_CAPACITY};
pub use transport::{HttpStepClient, LiveStepRequest, StepTransport, TransportError};
pub use view_model::{Party, PartyView, ViewModel};
