use crate::client::demo::apply_demo_step;
use crate::client::transport::{LiveStepRequest, StepTransport};
use crate::client::view_model::{Party, ViewModel};
use crate::config::ClientSettings;
use crate::runtime::{append_runtime_log, StatePaths};
use crate::simulation::step::Step;
use chrono::{Local, SecondsFormat, Utc};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

pub const DEMO_MODE_NOTICE: &str = "No API key provided. Running demo mode.";
pub const PROXY_URL_MISSING_NOTICE: &str = "Proxy URL Not Set.";
pub const STEP_FAILED_FALLBACK: &str = "Simulation step failed.";
pub const RESET_LOG_TEXT: &str = "Simulation restored to initial state.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PartyActivity {
    #[default]
    Idle,
    Initializing,
    Registering,
    Seeding,
    RegisteringService,
    Paying,
}

/// The single in-flight slot shared by every trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActionToken {
    #[default]
    Idle,
    Running(Step),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Another step was in flight or the step's preconditions were unmet. Nothing ran.
    Skipped,
    Demo,
    Applied,
    Failed(String),
}

#[derive(Debug, Clone, Default)]
pub struct SimulationStore {
    view: ViewModel,
    activity_a: PartyActivity,
    activity_b: PartyActivity,
    token: ActionToken,
}

impl SimulationStore {
    pub fn new(view: ViewModel) -> Self {
        Self {
            view,
            ..Self::default()
        }
    }

    pub fn view(&self) -> &ViewModel {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewModel {
        &mut self.view
    }

    pub fn activity(&self, party: Party) -> PartyActivity {
        match party {
            Party::A => self.activity_a,
            Party::B => self.activity_b,
        }
    }

    pub fn token(&self) -> ActionToken {
        self.token
    }

    pub fn action_running(&self) -> bool {
        self.token != ActionToken::Idle
    }

    fn claim(&mut self, step: Step, claims: &[(Party, PartyActivity)]) {
        self.token = ActionToken::Running(step);
        for (party, activity) in claims {
            match party {
                Party::A => self.activity_a = *activity,
                Party::B => self.activity_b = *activity,
            }
        }
    }

    fn release(&mut self) {
        self.token = ActionToken::Idle;
        self.activity_a = PartyActivity::Idle;
        self.activity_b = PartyActivity::Idle;
    }
}

fn lock_store(store: &Mutex<SimulationStore>) -> MutexGuard<'_, SimulationStore> {
    store.lock().unwrap_or_else(|err| err.into_inner())
}

/// Releases the in-flight slot however the step ends.
struct ActionGuard {
    store: Arc<Mutex<SimulationStore>>,
}

impl Drop for ActionGuard {
    fn drop(&mut self) {
        lock_store(&self.store).release();
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Collects notifications so a caller can show them after the step returns.
#[derive(Debug, Default)]
pub struct BufferedNotifier {
    messages: Mutex<Vec<String>>,
}

impl BufferedNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .clone()
    }

    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.messages.lock().unwrap_or_else(|err| err.into_inner()))
    }
}

impl Notifier for BufferedNotifier {
    fn notify(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .push(message.to_string());
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeLogNotifier {
    paths: StatePaths,
}

impl RuntimeLogNotifier {
    pub fn new(paths: StatePaths) -> Self {
        Self { paths }
    }
}

impl Notifier for RuntimeLogNotifier {
    fn notify(&self, message: &str) {
        append_runtime_log(&self.paths, "info", "client_notification", message);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    pub api_key: Option<String>,
    pub proxy_url: Option<String>,
    pub run_id: String,
    pub demo_delay: Duration,
}

impl DispatcherConfig {
    pub fn from_settings(settings: &ClientSettings) -> Self {
        Self {
            api_key: settings.api_key.clone(),
            proxy_url: settings.proxy_url.clone(),
            run_id: settings.run_id.clone(),
            demo_delay: Duration::from_millis(settings.demo_delay_ms),
        }
    }
}

enum Mode {
    Live { endpoint: String, api_key: String },
    Demo,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn now_label() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub struct StepDispatcher {
    config: DispatcherConfig,
    store: Arc<Mutex<SimulationStore>>,
    transport: Arc<dyn StepTransport>,
    notifier: Arc<dyn Notifier>,
}

impl StepDispatcher {
    pub fn new(
        config: DispatcherConfig,
        view: ViewModel,
        transport: Arc<dyn StepTransport>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            store: Arc::new(Mutex::new(SimulationStore::new(view))),
            transport,
            notifier,
        }
    }

    pub fn view(&self) -> ViewModel {
        lock_store(&self.store).view().clone()
    }

    pub fn action_running(&self) -> bool {
        lock_store(&self.store).action_running()
    }

    pub fn activity(&self, party: Party) -> PartyActivity {
        lock_store(&self.store).activity(party)
    }

    pub fn is_live(&self) -> bool {
        non_blank(&self.config.api_key).is_some() && non_blank(&self.config.proxy_url).is_some()
    }

    /// Routes a step name to its trigger; `party` picks the single-party variant.
    pub fn trigger(&self, step: Step, party: Option<Party>) -> DispatchOutcome {
        match (step, party) {
            (Step::Init, None) => self.initialize_agents(),
            (Step::Init, Some(party)) => self.init_agent(party),
            (Step::Register, None) => self.register_agents(),
            (Step::Register, Some(party)) => self.register_agent(party),
            (Step::Seed, None) => self.seed_pools(),
            (Step::Seed, Some(party)) => self.seed_pool(party),
            (Step::RegisterService, None) => self.register_services(),
            (Step::RegisterService, Some(party)) => self.register_service(party),
            (Step::Pay, _) => self.pay_for_service(),
            (Step::All, _) => self.run_all(),
            (Step::OrchestrateDeal, _) => self.orchestrate_deal(),
            (Step::Reset, _) => self.reset(),
        }
    }

    pub fn initialize_agents(&self) -> DispatchOutcome {
        self.dispatch(
            Step::Init,
            &[
                (Party::A, PartyActivity::Initializing),
                (Party::B, PartyActivity::Initializing),
            ],
            |view| !view.both_ready(),
        )
    }

    pub fn init_agent(&self, party: Party) -> DispatchOutcome {
        self.dispatch(
            Step::Init,
            &[(party, PartyActivity::Initializing)],
            |view| !view.party(party).ready,
        )
    }

    pub fn register_agents(&self) -> DispatchOutcome {
        self.dispatch(
            Step::Register,
            &[
                (Party::A, PartyActivity::Registering),
                (Party::B, PartyActivity::Registering),
            ],
            |view| view.both_ready() && !view.both_pools_visible(),
        )
    }

    pub fn register_agent(&self, party: Party) -> DispatchOutcome {
        self.dispatch(
            Step::Register,
            &[(party, PartyActivity::Registering)],
            |view| view.party(party).ready && !view.party(party).pool_visible,
        )
    }

    pub fn seed_pools(&self) -> DispatchOutcome {
        self.dispatch(
            Step::Seed,
            &[
                (Party::A, PartyActivity::Seeding),
                (Party::B, PartyActivity::Seeding),
            ],
            ViewModel::both_pools_visible,
        )
    }

    pub fn seed_pool(&self, party: Party) -> DispatchOutcome {
        self.dispatch(Step::Seed, &[(party, PartyActivity::Seeding)], |view| {
            view.party(party).pool_visible
        })
    }

    pub fn register_services(&self) -> DispatchOutcome {
        self.dispatch(
            Step::RegisterService,
            &[
                (Party::A, PartyActivity::RegisteringService),
                (Party::B, PartyActivity::RegisteringService),
            ],
            |view| view.both_ready() && !view.services_registered,
        )
    }

    pub fn register_service(&self, party: Party) -> DispatchOutcome {
        self.dispatch(
            Step::RegisterService,
            &[(party, PartyActivity::RegisteringService)],
            |view| view.party(party).ready,
        )
    }

    /// Agent A pays for the service Agent B registered.
    pub fn pay_for_service(&self) -> DispatchOutcome {
        self.dispatch(
            Step::Pay,
            &[(Party::A, PartyActivity::Paying)],
            |view| {
                view.both_smart_accounts_visible()
                    && view.agent_b.pool_visible
                    && view.services_registered
            },
        )
    }

    pub fn run_all(&self) -> DispatchOutcome {
        self.dispatch(Step::All, &[], |_| true)
    }

    pub fn orchestrate_deal(&self) -> DispatchOutcome {
        self.dispatch(
            Step::OrchestrateDeal,
            &[
                (Party::A, PartyActivity::Paying),
                (Party::B, PartyActivity::RegisteringService),
            ],
            |view| view.both_smart_accounts_visible() && view.services_registered,
        )
    }

    /// Clears the view locally; in live mode the server is told to reset too.
    pub fn reset(&self) -> DispatchOutcome {
        let Some(_guard) = self.claim(Step::Reset, &[], |_| true) else {
            return DispatchOutcome::Skipped;
        };
        {
            let mut store = lock_store(&self.store);
            let view = store.view_mut();
            view.reset();
            view.push_log(now_label(), RESET_LOG_TEXT);
        }
        if self.is_live() {
            self.run_step(Step::Reset)
        } else {
            DispatchOutcome::Demo
        }
    }

    fn claim<F>(
        &self,
        step: Step,
        claims: &[(Party, PartyActivity)],
        precondition: F,
    ) -> Option<ActionGuard>
    where
        F: FnOnce(&ViewModel) -> bool,
    {
        let mut store = lock_store(&self.store);
        if store.action_running() || !precondition(store.view()) {
            return None;
        }
        store.claim(step, claims);
        Some(ActionGuard {
            store: Arc::clone(&self.store),
        })
    }

    fn dispatch<F>(
        &self,
        step: Step,
        claims: &[(Party, PartyActivity)],
        precondition: F,
    ) -> DispatchOutcome
    where
        F: FnOnce(&ViewModel) -> bool,
    {
        match self.claim(step, claims, precondition) {
            Some(_guard) => self.run_step(step),
            None => DispatchOutcome::Skipped,
        }
    }

    fn select_mode(&self) -> Mode {
        let Some(api_key) = non_blank(&self.config.api_key) else {
            return Mode::Demo;
        };
        let Some(proxy_url) = non_blank(&self.config.proxy_url) else {
            self.notifier.notify(PROXY_URL_MISSING_NOTICE);
            return Mode::Demo;
        };
        Mode::Live {
            endpoint: proxy_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Runs with the in-flight slot already held; the store lock is never held across
    /// the outbound call or the demo delay.
    fn run_step(&self, step: Step) -> DispatchOutcome {
        let (endpoint, api_key) = match self.select_mode() {
            Mode::Live { endpoint, api_key } => (endpoint, api_key),
            Mode::Demo => {
                self.notifier.notify(DEMO_MODE_NOTICE);
                thread::sleep(self.config.demo_delay);
                apply_demo_step(lock_store(&self.store).view_mut(), step, &now_label());
                return DispatchOutcome::Demo;
            }
        };

        lock_store(&self.store)
            .view_mut()
            .push_log(now_label(), format!("Simulation: running step \"{step}\"..."));

        let request = LiveStepRequest {
            endpoint,
            api_key,
            run_id: self.config.run_id.clone(),
            step,
        };
        let response = match self.transport.post_step(&request) {
            Ok(response) if response.ok => response,
            Ok(response) => {
                let message = response
                    .error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| STEP_FAILED_FALLBACK.to_string());
                return self.fail(message);
            }
            Err(err) => {
                let message = err.to_string();
                let message = if message.trim().is_empty() {
                    STEP_FAILED_FALLBACK.to_string()
                } else {
                    message
                };
                return self.fail(message);
            }
        };

        let fragment = response.last_event().and_then(|event| event.state());
        let mut store = lock_store(&self.store);
        let view = store.view_mut();
        if let Some(fragment) = fragment {
            view.apply_state(&fragment);
        }
        if let Some(lines) = &response.logs {
            view.log.replace_with_server_lines(lines, &now_iso());
        }
        DispatchOutcome::Applied
    }

    fn fail(&self, message: String) -> DispatchOutcome {
        self.notifier.notify(&message);
        lock_store(&self.store)
            .view_mut()
            .push_log(now_label(), format!("Error: {message}"));
        DispatchOutcome::Failed(message)
    }
}
