use crate::simulation::fragment::StateFragment;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One JSON value a step script wrote on stdout. Opaque apart from its `state` member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepEvent(Value);

impl StepEvent {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn state(&self) -> Option<StateFragment> {
        StateFragment::from_value_lenient(self.0.get("state")?)
    }
}

impl From<Value> for StepEvent {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedEvents {
    pub events: Vec<StepEvent>,
    /// Non-blank lines that were not JSON.
    pub skipped: usize,
}

pub fn parse_events_report(raw: &str) -> ParsedEvents {
    let mut parsed = ParsedEvents::default();
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(value) => parsed.events.push(StepEvent(value)),
            Err(_) => parsed.skipped += 1,
        }
    }
    parsed
}

pub fn parse_events(raw: &str) -> Vec<StepEvent> {
    parse_events_report(raw).events
}
