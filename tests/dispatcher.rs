use agentsim::client::{
    BufferedNotifier, DispatchOutcome, DispatcherConfig, LiveStepRequest, Party, PartyActivity,
    StepDispatcher, StepTransport, TransportError, ViewModel,
};
use agentsim::simulation::{Step, StepEvent, StepResponse};
use serde_json::json;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

const DEMO_WALLET_A: &str = "0x35ac16EdD84Ec0C1397C41c260BC288593E90B6C";

fn live_config() -> DispatcherConfig {
    DispatcherConfig {
        api_key: Some("key".to_string()),
        proxy_url: Some("http://proxy.test".to_string()),
        run_id: "sim1".to_string(),
        demo_delay: Duration::ZERO,
    }
}

fn demo_config() -> DispatcherConfig {
    DispatcherConfig {
        api_key: None,
        proxy_url: None,
        ..live_config()
    }
}

/// Answers every call with a clone of one canned result.
struct ScriptedTransport {
    reply: Result<StepResponse, String>,
    calls: Mutex<Vec<LiveStepRequest>>,
}

impl ScriptedTransport {
    fn replying(reply: Result<StepResponse, String>) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<LiveStepRequest> {
        self.calls.lock().expect("calls lock").clone()
    }
}

impl StepTransport for ScriptedTransport {
    fn post_step(&self, request: &LiveStepRequest) -> Result<StepResponse, TransportError> {
        self.calls.lock().expect("calls lock").push(request.clone());
        self.reply.clone().map_err(TransportError::Request)
    }
}

fn dispatcher(
    config: DispatcherConfig,
    view: ViewModel,
    transport: Arc<ScriptedTransport>,
) -> (StepDispatcher, Arc<BufferedNotifier>) {
    let notifier = Arc::new(BufferedNotifier::default());
    let dispatcher = StepDispatcher::new(config, view, transport, notifier.clone());
    (dispatcher, notifier)
}

fn ok_reply(step: &str, events: Vec<serde_json::Value>, logs: &[&str]) -> StepResponse {
    StepResponse::completed(
        "sim1",
        step,
        events.into_iter().map(StepEvent::new).collect(),
        logs.iter().map(|line| line.to_string()).collect(),
    )
}

fn ready_view() -> ViewModel {
    let mut view = ViewModel::default();
    for party in Party::BOTH {
        let agent = view.party_mut(party);
        agent.wallet = Some(format!("0x{party:?}"));
        agent.ready = true;
    }
    view
}

#[test]
fn register_before_init_is_skipped_without_a_call() {
    let transport = ScriptedTransport::replying(Ok(ok_reply("register", vec![], &[])));
    let (dispatcher, notifier) = dispatcher(live_config(), ViewModel::default(), transport.clone());

    assert_eq!(dispatcher.register_agent(Party::A), DispatchOutcome::Skipped);
    assert_eq!(dispatcher.register_agents(), DispatchOutcome::Skipped);
    assert_eq!(dispatcher.seed_pools(), DispatchOutcome::Skipped);
    assert_eq!(dispatcher.pay_for_service(), DispatchOutcome::Skipped);
    assert!(transport.calls().is_empty());
    assert!(notifier.messages().is_empty());
    assert!(dispatcher.view().log.is_empty());
}

#[test]
fn live_step_applies_last_event_and_replaces_log() {
    let transport = ScriptedTransport::replying(Ok(ok_reply(
        "init",
        vec![
            json!({"type": "early", "state": {"walletB": {"address": "0xB1"}}}),
            json!({"type": "final", "state": {"walletA": {"address": DEMO_WALLET_A}}}),
        ],
        &["[t1] funded", "created accounts"],
    )));
    let (dispatcher, _notifier) =
        dispatcher(live_config(), ViewModel::default(), transport.clone());

    assert_eq!(dispatcher.initialize_agents(), DispatchOutcome::Applied);

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].step, Step::Init);
    assert_eq!(calls[0].run_id, "sim1");
    assert_eq!(calls[0].endpoint, "http://proxy.test");

    let view = dispatcher.view();
    assert_eq!(view.agent_a.wallet.as_deref(), Some(DEMO_WALLET_A));
    assert!(view.agent_a.ready);
    assert_eq!(view.agent_b.wallet, None);

    let entries: Vec<_> = view.log.entries().cloned().collect();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].text, "created accounts");
    assert_eq!(entries[1].ts, "t1");
    assert_eq!(entries[1].text, "funded");
    assert!(!dispatcher.action_running());
}

#[test]
fn server_error_is_notified_and_logged() {
    let transport = ScriptedTransport::replying(Ok(StepResponse::failed("boom", None)));
    let (dispatcher, notifier) = dispatcher(live_config(), ready_view(), transport);

    let outcome = dispatcher.register_agents();
    assert_eq!(outcome, DispatchOutcome::Failed("boom".to_string()));
    assert_eq!(notifier.messages(), vec!["boom".to_string()]);

    let view = dispatcher.view();
    let texts: Vec<_> = view.log.entries().map(|e| e.text.clone()).collect();
    assert_eq!(texts[0], "Error: boom");
    assert_eq!(texts[1], "Simulation: running step \"register\"...");
    assert!(!dispatcher.action_running());
    assert_eq!(dispatcher.activity(Party::A), PartyActivity::Idle);
}

#[test]
fn transport_failure_without_message_uses_fallback() {
    let transport = ScriptedTransport::replying(Err(String::new()));
    let (dispatcher, notifier) = dispatcher(live_config(), ViewModel::default(), transport);

    let outcome = dispatcher.init_agent(Party::B);
    assert_eq!(
        outcome,
        DispatchOutcome::Failed("Simulation step failed.".to_string())
    );
    assert_eq!(notifier.messages(), vec!["Simulation step failed.".to_string()]);
}

#[test]
fn missing_key_runs_demo_mode() {
    let transport = ScriptedTransport::replying(Ok(ok_reply("init", vec![], &[])));
    let (dispatcher, notifier) = dispatcher(demo_config(), ViewModel::default(), transport.clone());

    assert_eq!(dispatcher.initialize_agents(), DispatchOutcome::Demo);
    assert!(transport.calls().is_empty());
    assert_eq!(
        notifier.messages(),
        vec!["No API key provided. Running demo mode.".to_string()]
    );
    let view = dispatcher.view();
    assert!(view.both_ready());
    assert_eq!(view.agent_a.wallet.as_deref(), Some(DEMO_WALLET_A));
}

#[test]
fn key_without_proxy_url_warns_then_runs_demo() {
    let config = DispatcherConfig {
        proxy_url: Some("  ".to_string()),
        ..live_config()
    };
    let transport = ScriptedTransport::replying(Ok(ok_reply("init", vec![], &[])));
    let (dispatcher, notifier) = dispatcher(config, ViewModel::default(), transport.clone());

    assert_eq!(dispatcher.initialize_agents(), DispatchOutcome::Demo);
    assert!(transport.calls().is_empty());
    assert_eq!(
        notifier.messages(),
        vec![
            "Proxy URL Not Set.".to_string(),
            "No API key provided. Running demo mode.".to_string()
        ]
    );
}

#[test]
fn demo_run_all_reaches_paid_state() {
    let transport = ScriptedTransport::replying(Ok(ok_reply("all", vec![], &[])));
    let (dispatcher, _notifier) = dispatcher(demo_config(), ViewModel::default(), transport);

    assert_eq!(dispatcher.run_all(), DispatchOutcome::Demo);
    let view = dispatcher.view();
    assert!(view.both_ready());
    assert!(view.both_pools_visible());
    assert!(view.services_registered);
    assert_eq!(view.agent_b.pool_tvl, "1.0");
    assert_eq!(
        view.log.newest().map(|e| e.text.as_str()),
        Some("Demo: Agent A paid for service via x402 gateway.")
    );

    // Everything is revealed, so init is no longer runnable.
    assert_eq!(dispatcher.initialize_agents(), DispatchOutcome::Skipped);
}

#[test]
fn reset_clears_view_and_notifies_server_in_live_mode() {
    let transport = ScriptedTransport::replying(Ok(ok_reply("reset", vec![], &[])));
    let (dispatcher, _notifier) = dispatcher(live_config(), ready_view(), transport.clone());

    assert_eq!(dispatcher.reset(), DispatchOutcome::Applied);
    assert_eq!(transport.calls()[0].step, Step::Reset);

    let view = dispatcher.view();
    assert!(!view.agent_a.ready);
    assert_eq!(view.agent_a.service_id, None);
    let texts: Vec<_> = view.log.entries().map(|e| e.text.clone()).collect();
    assert_eq!(
        texts,
        vec![
            "Simulation: running step \"reset\"...".to_string(),
            "Simulation restored to initial state.".to_string()
        ]
    );
}

/// Parks inside `post_step` until the test releases it.
struct BlockingTransport {
    entered: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
}

impl StepTransport for BlockingTransport {
    fn post_step(&self, request: &LiveStepRequest) -> Result<StepResponse, TransportError> {
        let _ = self.entered.lock().expect("entered lock").send(());
        let _ = self.release.lock().expect("release lock").recv();
        Ok(StepResponse::completed(
            "sim1",
            request.step.as_str(),
            Vec::new(),
            Vec::new(),
        ))
    }
}

#[test]
fn only_one_step_runs_at_a_time() {
    let (entered_tx, entered_rx) = channel();
    let (release_tx, release_rx) = channel();
    let transport = Arc::new(BlockingTransport {
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
    });
    let dispatcher = Arc::new(StepDispatcher::new(
        live_config(),
        ViewModel::default(),
        transport,
        Arc::new(BufferedNotifier::default()),
    ));

    let first = {
        let dispatcher = Arc::clone(&dispatcher);
        thread::spawn(move || dispatcher.init_agent(Party::A))
    };
    entered_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("first step reached the transport");

    assert!(dispatcher.action_running());
    assert_eq!(dispatcher.activity(Party::A), PartyActivity::Initializing);
    assert_eq!(dispatcher.activity(Party::B), PartyActivity::Idle);
    assert_eq!(dispatcher.init_agent(Party::B), DispatchOutcome::Skipped);
    assert_eq!(dispatcher.reset(), DispatchOutcome::Skipped);

    release_tx.send(()).expect("release");
    assert_eq!(first.join().expect("join"), DispatchOutcome::Applied);
    assert!(!dispatcher.action_running());
    assert_eq!(dispatcher.activity(Party::A), PartyActivity::Idle);
}
