use crate::simulation::event_parse::StepEvent;
use serde::{Deserialize, Serialize};

/// Body of every `/sim/step` reply, success or failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<StepEvent>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepResponse {
    pub fn completed(
        run_id: impl Into<String>,
        step: impl Into<String>,
        events: Vec<StepEvent>,
        logs: Vec<String>,
    ) -> Self {
        Self {
            ok: true,
            run_id: Some(run_id.into()),
            step: Some(step.into()),
            events: Some(events),
            logs: Some(logs),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>, events: Option<Vec<StepEvent>>) -> Self {
        Self {
            ok: false,
            events,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn last_event(&self) -> Option<&StepEvent> {
        self.events.as_ref().and_then(|events| events.last())
    }
}
