use crate::simulation::response::StepResponse;
use crate::simulation::step::Step;
use serde_json::{json, Value};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveStepRequest {
    /// Base url without the trailing slash, e.g. `http://localhost:4000`.
    pub endpoint: String,
    pub api_key: String,
    pub run_id: String,
    pub step: Step,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("{0}")]
    Request(String),
    #[error("invalid response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

pub trait StepTransport: Send + Sync {
    /// One outbound call. Error statuses that carry a JSON body come back as `Ok` with
    /// `ok == false` so the server's message is preserved.
    fn post_step(&self, request: &LiveStepRequest) -> Result<StepResponse, TransportError>;
}

#[derive(Debug, Clone)]
pub struct HttpStepClient {
    agent: ureq::Agent,
}

impl Default for HttpStepClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpStepClient {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout_connect(Duration::from_secs(10))
                .build(),
        }
    }

    pub fn step_url(endpoint: &str) -> String {
        format!("{}/sim/step", endpoint.trim_end_matches('/'))
    }

    pub fn state_url(endpoint: &str, run_id: &str) -> String {
        format!(
            "{}/sim/state/{}",
            endpoint.trim_end_matches('/'),
            urlencoding::encode(run_id)
        )
    }

    /// `Ok(None)` when the server has no snapshot for `run_id`.
    pub fn fetch_state(
        &self,
        endpoint: &str,
        api_key: Option<&str>,
        run_id: &str,
    ) -> Result<Option<Value>, TransportError> {
        let url = Self::state_url(endpoint, run_id);
        let mut request = self.agent.get(&url);
        if let Some(key) = api_key.map(str::trim).filter(|k| !k.is_empty()) {
            request = request.set("Authorization", &format!("Bearer {key}"));
        }
        match request.call() {
            Ok(response) => response
                .into_json::<Value>()
                .map(Some)
                .map_err(|e| TransportError::Decode {
                    url,
                    reason: e.to_string(),
                }),
            Err(ureq::Error::Status(404, _)) => Ok(None),
            Err(ureq::Error::Status(code, response)) => Err(TransportError::Request(
                error_message(response).unwrap_or_else(|| format!("{url} returned {code}")),
            )),
            Err(err) => Err(TransportError::Request(err.to_string())),
        }
    }
}

fn error_message(response: ureq::Response) -> Option<String> {
    response
        .into_json::<StepResponse>()
        .ok()
        .and_then(|body| body.error)
}

impl StepTransport for HttpStepClient {
    fn post_step(&self, request: &LiveStepRequest) -> Result<StepResponse, TransportError> {
        let url = Self::step_url(&request.endpoint);
        let body = json!({"runId": request.run_id, "step": request.step.as_str()});
        let result = self
            .agent
            .post(&url)
            .set("Content-Type", "application/json")
            .set(
                "Authorization",
                &format!("Bearer {}", request.api_key.trim()),
            )
            .send_json(body);

        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(code, response)) => {
                return Ok(StepResponse {
                    ok: false,
                    error: error_message(response)
                        .or_else(|| Some(format!("step request returned {code}"))),
                    ..StepResponse::default()
                })
            }
            Err(err) => return Err(TransportError::Request(err.to_string())),
        };

        response
            .into_json::<StepResponse>()
            .map_err(|e| TransportError::Decode {
                url,
                reason: e.to_string(),
            })
    }
}
