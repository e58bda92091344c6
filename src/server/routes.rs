use crate::runtime::{append_runtime_record, StatePaths};
use crate::simulation::job_runner::{JobRunner, StepRequest};
use crate::simulation::state_store::StateStore;
use serde_json::{json, Value};

pub const STATE_NOT_FOUND_ERROR: &str = "State not found";
pub const NOT_FOUND_ERROR: &str = "Not found";
pub const UNAUTHORIZED_ERROR: &str = "Unauthorized";

const STEP_PATH: &str = "/sim/step";
const STATE_PATH_PREFIX: &str = "/sim/state/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: Option<Value>,
}

impl HttpReply {
    fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: Some(body),
        }
    }

    fn error(status: u16, message: &str) -> Self {
        Self::json(status, json!({"ok": false, "error": message}))
    }
}

/// The `/sim` surface, independent of any socket.
pub struct SimRoutes {
    runner: JobRunner,
    store: StateStore,
    api_key: Option<String>,
    paths: Option<StatePaths>,
}

impl SimRoutes {
    pub fn new(runner: JobRunner, store: StateStore) -> Self {
        Self {
            runner,
            store,
            api_key: None,
            paths: None,
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        self
    }

    pub fn with_runtime_log(mut self, paths: StatePaths) -> Self {
        self.paths = Some(paths);
        self
    }

    pub fn handle(
        &self,
        method: &str,
        url: &str,
        authorization: Option<&str>,
        body: &str,
    ) -> HttpReply {
        if method.eq_ignore_ascii_case("OPTIONS") {
            return HttpReply {
                status: 204,
                body: None,
            };
        }
        if !self.authorized(authorization) {
            return HttpReply::error(401, UNAUTHORIZED_ERROR);
        }

        let path = normalize_path(url);
        if path == STEP_PATH {
            if !method.eq_ignore_ascii_case("POST") {
                return HttpReply::error(404, NOT_FOUND_ERROR);
            }
            return self.post_step(body);
        }
        if let Some(raw_run_id) = path.strip_prefix(STATE_PATH_PREFIX) {
            if !method.eq_ignore_ascii_case("GET")
                || raw_run_id.is_empty()
                || raw_run_id.contains('/')
            {
                return HttpReply::error(404, NOT_FOUND_ERROR);
            }
            return self.get_state(raw_run_id);
        }
        HttpReply::error(404, NOT_FOUND_ERROR)
    }

    fn authorized(&self, authorization: Option<&str>) -> bool {
        let Some(expected) = &self.api_key else {
            return true;
        };
        authorization
            .and_then(|value| value.trim().strip_prefix("Bearer "))
            .map(str::trim)
            .is_some_and(|token| token == expected)
    }

    fn post_step(&self, body: &str) -> HttpReply {
        let reply = self.runner.execute_step(&StepRequest::from_json_body(body));
        match serde_json::to_value(&reply.body) {
            Ok(body) => HttpReply::json(reply.status, body),
            Err(err) => HttpReply::error(500, &err.to_string()),
        }
    }

    fn get_state(&self, raw_run_id: &str) -> HttpReply {
        let run_id = urlencoding::decode(raw_run_id)
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| raw_run_id.to_string());
        match self.store.get_state(&run_id) {
            Ok(snapshot) => HttpReply::json(200, snapshot),
            Err(err) => {
                if err.is_damaged_snapshot() {
                    if let Some(paths) = &self.paths {
                        append_runtime_record(
                            paths,
                            "warn",
                            "state_unreadable",
                            &err.to_string(),
                            &[("runId", Value::from(run_id.as_str()))],
                        );
                    }
                }
                HttpReply::error(404, STATE_NOT_FOUND_ERROR)
            }
        }
    }
}

fn normalize_path(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::normalize_path;

    #[test]
    fn query_strings_and_trailing_slashes_are_ignored() {
        assert_eq!(normalize_path("/sim/step?debug=1"), "/sim/step");
        assert_eq!(normalize_path("/sim/state/sim1/"), "/sim/state/sim1");
        assert_eq!(normalize_path("/"), "/");
    }
}
