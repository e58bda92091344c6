use crate::client::log_ring::LogRing;
use crate::simulation::fragment::{RegistrationRecord, StateFragment, WalletRecord};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVICE_ID: &str =
    "0x0f03bb4150e3ecc7282c9b267aebb306c541e54e7ed8274defa5afaa1a397275";
pub const DEFAULT_SERVICE_URL: &str = "https://sim.example.com/api";
pub const ZERO_BALANCE: &str = "0.00";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Party {
    A,
    B,
}

impl Party {
    pub const BOTH: [Party; 2] = [Party::A, Party::B];

    pub fn label(self) -> &'static str {
        match self {
            Party::A => "Agent A",
            Party::B => "Agent B",
        }
    }

    pub fn parse(raw: &str) -> Option<Party> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "a" => Some(Party::A),
            "b" => Some(Party::B),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartyView {
    pub wallet: Option<String>,
    pub agent_id: Option<String>,
    pub smart_account: Option<String>,
    pub pool: Option<String>,
    pub service_id: Option<String>,
    pub service_url: Option<String>,
    pub smart_usdc: String,
    pub pool_tvl: String,
    pub ready: bool,
    pub smart_visible: bool,
    pub pool_visible: bool,
}

impl Default for PartyView {
    fn default() -> Self {
        Self {
            service_id: Some(DEFAULT_SERVICE_ID.to_string()),
            service_url: Some(DEFAULT_SERVICE_URL.to_string()),
            ..Self::cleared()
        }
    }
}

impl PartyView {
    /// State after an explicit reset: nothing preset, nothing visible.
    pub fn cleared() -> Self {
        Self {
            wallet: None,
            agent_id: None,
            smart_account: None,
            pool: None,
            service_id: None,
            service_url: None,
            smart_usdc: ZERO_BALANCE.to_string(),
            pool_tvl: ZERO_BALANCE.to_string(),
            ready: false,
            smart_visible: false,
            pool_visible: false,
        }
    }

    fn apply_wallet(&mut self, wallet: &WalletRecord) {
        if let Some(address) = present(&wallet.address) {
            self.wallet = Some(address.to_string());
            self.ready = true;
        }
    }

    fn apply_registration(&mut self, record: &RegistrationRecord) {
        overwrite(&mut self.agent_id, &record.agent_id);
        overwrite(&mut self.smart_account, &record.smart_account);
        overwrite(&mut self.pool, &record.pool_address);
        self.smart_visible = true;
        self.pool_visible = true;
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn overwrite(target: &mut Option<String>, value: &Option<String>) {
    if let Some(value) = present(value) {
        *target = Some(value.to_string());
    }
}

fn overwrite_balance(target: &mut String, value: &Option<String>) {
    if let Some(value) = present(value) {
        *target = value.to_string();
    }
}

/// Everything the diagram shows. Fields only move forward until `reset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewModel {
    pub agent_a: PartyView,
    pub agent_b: PartyView,
    pub services_registered: bool,
    pub gateway_usdc: String,
    pub log: LogRing,
}

impl Default for ViewModel {
    fn default() -> Self {
        Self {
            agent_a: PartyView::default(),
            agent_b: PartyView::default(),
            services_registered: false,
            gateway_usdc: ZERO_BALANCE.to_string(),
            log: LogRing::default(),
        }
    }
}

impl ViewModel {
    pub fn party(&self, party: Party) -> &PartyView {
        match party {
            Party::A => &self.agent_a,
            Party::B => &self.agent_b,
        }
    }

    pub fn party_mut(&mut self, party: Party) -> &mut PartyView {
        match party {
            Party::A => &mut self.agent_a,
            Party::B => &mut self.agent_b,
        }
    }

    pub fn both_ready(&self) -> bool {
        self.agent_a.ready && self.agent_b.ready
    }

    pub fn both_pools_visible(&self) -> bool {
        self.agent_a.pool_visible && self.agent_b.pool_visible
    }

    pub fn both_smart_accounts_visible(&self) -> bool {
        self.agent_a.smart_visible && self.agent_b.smart_visible
    }

    pub fn push_log(&mut self, ts: impl Into<String>, text: impl Into<String>) {
        self.log.push_text(ts, text);
    }

    pub fn apply_state(&mut self, fragment: &StateFragment) {
        if let Some(wallet) = &fragment.wallet_a {
            self.agent_a.apply_wallet(wallet);
        }
        if let Some(wallet) = &fragment.wallet_b {
            self.agent_b.apply_wallet(wallet);
        }
        if let Some(record) = &fragment.reg_a {
            self.agent_a.apply_registration(record);
        }
        if let Some(record) = &fragment.reg_b {
            self.agent_b.apply_registration(record);
        }
        if let Some(service) = &fragment.service {
            if present(&service.id_hex).is_some() {
                for party in Party::BOTH {
                    let view = self.party_mut(party);
                    overwrite(&mut view.service_id, &service.id_hex);
                    // An absent url keeps the current one.
                    overwrite(&mut view.service_url, &service.url);
                }
                self.services_registered = true;
            }
        }
        if let Some(balances) = &fragment.balances {
            overwrite_balance(&mut self.agent_a.smart_usdc, &balances.agent_a_smart_usdc);
            overwrite_balance(&mut self.agent_b.smart_usdc, &balances.agent_b_smart_usdc);
            overwrite_balance(&mut self.agent_a.pool_tvl, &balances.pool_a_usdc);
            overwrite_balance(&mut self.agent_b.pool_tvl, &balances.pool_b_usdc);
        }
        if let Some(entries) = &fragment.logs {
            self.log.replace_with_entries(entries);
        }
    }

    pub fn reset(&mut self) {
        *self = Self {
            agent_a: PartyView::cleared(),
            agent_b: PartyView::cleared(),
            services_registered: false,
            gateway_usdc: ZERO_BALANCE.to_string(),
            log: LogRing::default(),
        };
    }
}

/// Reducer form of [`ViewModel::apply_state`].
pub fn apply_state(mut view: ViewModel, fragment: &StateFragment) -> ViewModel {
    view.apply_state(fragment);
    view
}
