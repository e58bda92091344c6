use crate::client::view_model::{ViewModel, DEFAULT_SERVICE_ID, DEFAULT_SERVICE_URL};
use crate::simulation::fragment::{
    BalanceSnapshot, RegistrationRecord, ServiceDescriptor, StateFragment, WalletRecord,
};
use crate::simulation::step::Step;

pub const DEMO_WALLET_A: &str = "0x35ac16EdD84Ec0C1397C41c260BC288593E90B6C";
pub const DEMO_WALLET_B: &str = "0x367CF2175C3Db73Fb4496578773eEE991590b0d3";
pub const DEMO_AGENT_A_ID: &str = "172";
pub const DEMO_AGENT_B_ID: &str = "173";
pub const DEMO_SMART_A: &str = "0x53e7A5d01325d9c2A48FE026D9eEb612c5e80722";
pub const DEMO_SMART_B: &str = "0xDB3D454B56933ce0ce350A0B01B9E7B3e2805825";
pub const DEMO_POOL_A: &str = "0x9b3a7b531Ee1cDB115D5cd5f5d00a4F9D6fFB0Cb";
pub const DEMO_POOL_B: &str = "0xa5cde960079168A48Cbe2d61A630A370A5393C10";

fn wallet(address: &str) -> Option<WalletRecord> {
    Some(WalletRecord {
        address: Some(address.to_string()),
    })
}

fn registration(agent_id: &str, smart_account: &str, pool: &str) -> Option<RegistrationRecord> {
    Some(RegistrationRecord {
        agent_id: Some(agent_id.to_string()),
        smart_account: Some(smart_account.to_string()),
        pool_address: Some(pool.to_string()),
    })
}

fn text(value: &str) -> Option<String> {
    Some(value.to_string())
}

/// Canned fragment for `step`. Steps with nothing to show return `None`.
pub fn demo_fragment(step: Step) -> Option<StateFragment> {
    match step {
        Step::Init => Some(StateFragment {
            wallet_a: wallet(DEMO_WALLET_A),
            wallet_b: wallet(DEMO_WALLET_B),
            ..StateFragment::default()
        }),
        Step::Register => Some(StateFragment {
            reg_a: registration(DEMO_AGENT_A_ID, DEMO_SMART_A, DEMO_POOL_A),
            reg_b: registration(DEMO_AGENT_B_ID, DEMO_SMART_B, DEMO_POOL_B),
            ..StateFragment::default()
        }),
        Step::Seed => Some(StateFragment {
            balances: Some(BalanceSnapshot {
                agent_a_smart_usdc: text("0.5"),
                agent_b_smart_usdc: text("0.5"),
                pool_a_usdc: text("0.5"),
                pool_b_usdc: text("1.0"),
                ..BalanceSnapshot::default()
            }),
            ..StateFragment::default()
        }),
        Step::RegisterService => Some(StateFragment {
            service: Some(ServiceDescriptor {
                id_hex: text(DEFAULT_SERVICE_ID),
                url: text(DEFAULT_SERVICE_URL),
                owner_agent_id: text(DEMO_AGENT_B_ID),
            }),
            ..StateFragment::default()
        }),
        Step::Pay | Step::All | Step::Reset | Step::OrchestrateDeal => None,
    }
}

fn demo_messages(step: Step) -> &'static [&'static str] {
    match step {
        Step::Init => &[
            "Demo: Initialized new EOAs.",
            "Demo: Agent A EOA created.",
            "Demo: Agent B EOA created.",
        ],
        Step::Register => &[
            "Demo: Agent A registered (agentId 172).",
            "Demo: Agent B registered (agentId 173).",
        ],
        Step::Seed => &["Demo: Pools seeded and balances updated."],
        Step::RegisterService => &["Demo: Service registered by Agent B."],
        Step::Pay => &["Demo: Agent A paid for service via x402 gateway."],
        Step::OrchestrateDeal => &["Demo: Deal orchestrated between Agent A and Agent B."],
        Step::Reset => &["Demo: Simulation reset."],
        Step::All => &[],
    }
}

/// Offline stand-in for a live step. Same input, same resulting view.
pub fn apply_demo_step(view: &mut ViewModel, step: Step, stamp: &str) {
    match step {
        Step::Reset => view.reset(),
        Step::All => {
            for stage in [
                Step::Init,
                Step::Register,
                Step::Seed,
                Step::RegisterService,
                Step::Pay,
            ] {
                apply_demo_step(view, stage, stamp);
            }
            return;
        }
        _ => {
            if let Some(fragment) = demo_fragment(step) {
                view.apply_state(&fragment);
            }
        }
    }
    for message in demo_messages(step) {
        view.push_log(stamp, *message);
    }
}
