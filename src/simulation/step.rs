use crate::shared::ids::validate_identifier_value;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_RUN_ID: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepError {
    #[error("unknown step `{0}`")]
    UnknownStep(String),
    #[error("invalid run id `{raw}`: {reason}")]
    InvalidRunId { raw: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    Init,
    Register,
    Seed,
    RegisterService,
    Pay,
    All,
    Reset,
    OrchestrateDeal,
}

impl Step {
    /// The allow-list, in wire order.
    pub const ALL: [Step; 8] = [
        Step::Init,
        Step::Register,
        Step::Seed,
        Step::RegisterService,
        Step::Pay,
        Step::All,
        Step::Reset,
        Step::OrchestrateDeal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Step::Init => "init",
            Step::Register => "register",
            Step::Seed => "seed",
            Step::RegisterService => "register-service",
            Step::Pay => "pay",
            Step::All => "all",
            Step::Reset => "reset",
            Step::OrchestrateDeal => "orchestrate-deal",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, StepError> {
        Self::ALL
            .into_iter()
            .find(|step| step.as_str() == raw)
            .ok_or_else(|| StepError::UnknownStep(raw.to_string()))
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Step {
    type Err = StepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Names one demonstration session and its `<runId>.json` snapshot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    pub fn parse(raw: &str) -> Result<Self, StepError> {
        validate_identifier_value("run id", raw).map_err(|reason| StepError::InvalidRunId {
            raw: raw.to_string(),
            reason,
        })?;
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self(DEFAULT_RUN_ID.to_string())
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for RunId {
    type Error = StepError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl<'de> Deserialize<'de> for RunId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(|err| D::Error::custom(err.to_string()))
    }
}
