use crate::shared::serde_ext::optional_string_or_number;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub ts: String,
    pub text: String,
}

impl LogEntry {
    pub fn new(ts: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            ts: ts.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRecord {
    #[serde(
        default,
        deserialize_with = "optional_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smart_account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_hex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(
        default,
        deserialize_with = "optional_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub owner_agent_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSnapshot {
    #[serde(
        default,
        deserialize_with = "optional_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub funder_mon: Option<String>,
    #[serde(
        default,
        deserialize_with = "optional_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub funder_usdc: Option<String>,
    #[serde(
        default,
        deserialize_with = "optional_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub agent_a_smart_mon: Option<String>,
    #[serde(
        default,
        deserialize_with = "optional_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub agent_a_smart_usdc: Option<String>,
    #[serde(
        default,
        deserialize_with = "optional_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub agent_b_smart_mon: Option<String>,
    #[serde(
        default,
        deserialize_with = "optional_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub agent_b_smart_usdc: Option<String>,
    #[serde(
        default,
        deserialize_with = "optional_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub pool_a_usdc: Option<String>,
    #[serde(
        default,
        deserialize_with = "optional_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub pool_b_usdc: Option<String>,
}

/// Partial view of the demonstration returned by a step. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateFragment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_a: Option<WalletRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_b: Option<WalletRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reg_a: Option<RegistrationRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reg_b: Option<RegistrationRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balances: Option<BalanceSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<LogEntry>>,
}

impl StateFragment {
    /// Decodes each member on its own so one malformed member only drops itself.
    /// Log entries are kept one by one. Returns `None` unless `value` is an object.
    pub fn from_value_lenient(value: &Value) -> Option<Self> {
        let members = value.as_object()?;
        Some(Self {
            wallet_a: member(members, "walletA"),
            wallet_b: member(members, "walletB"),
            reg_a: member(members, "regA"),
            reg_b: member(members, "regB"),
            service: member(members, "service"),
            balances: member(members, "balances"),
            logs: members.get("logs").and_then(Value::as_array).map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| LogEntry::deserialize(entry).ok())
                    .collect()
            }),
        })
    }
}

fn member<T: DeserializeOwned>(members: &Map<String, Value>, key: &str) -> Option<T> {
    members
        .get(key)
        .and_then(|value| T::deserialize(value).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_member_does_not_hide_its_siblings() {
        let fragment = StateFragment::from_value_lenient(&serde_json::json!({
            "walletA": {"address": "0xA"},
            "regA": {"agentId": 172, "smartAccount": "0x5f7A"},
            "balances": {"agentASmartUsdc": true},
            "logs": [{"text": "no ts"}, {"ts": "10:00:00", "text": "seeded"}]
        }))
        .expect("object");

        assert_eq!(
            fragment.wallet_a.and_then(|w| w.address).as_deref(),
            Some("0xA")
        );
        assert_eq!(
            fragment.reg_a.and_then(|r| r.agent_id).as_deref(),
            Some("172")
        );
        assert!(fragment.balances.is_none());
        assert_eq!(fragment.logs, Some(vec![LogEntry::new("10:00:00", "seeded")]));
    }

    #[test]
    fn lenient_decode_requires_an_object() {
        assert!(StateFragment::from_value_lenient(&serde_json::json!("done")).is_none());
        assert!(StateFragment::from_value_lenient(&serde_json::json!([1])).is_none());
        assert_eq!(
            StateFragment::from_value_lenient(&serde_json::json!({"logs": "x"})),
            Some(StateFragment::default())
        );
    }

    #[test]
    fn script_fragment_decodes_camel_case_and_numeric_ids() {
        let fragment: StateFragment = serde_json::from_str(
            r#"{
                "walletA": {"address": "0x35ac16EdD84Ec0C1397C41c260BC288593E90B6C"},
                "regB": {"agentId": 173, "smartAccount": "0xDB3D", "poolAddress": "0xa5cd"},
                "service": {"idHex": "0x0f03", "url": "https://svc", "ownerAgentId": "173"},
                "balances": {"agentASmartUsdc": "0.5", "poolBUsdc": 1.0},
                "extra": true
            }"#,
        )
        .expect("decode");

        assert_eq!(
            fragment.wallet_a.and_then(|w| w.address).as_deref(),
            Some("0x35ac16EdD84Ec0C1397C41c260BC288593E90B6C")
        );
        assert!(fragment.wallet_b.is_none());
        let reg_b = fragment.reg_b.expect("regB");
        assert_eq!(reg_b.agent_id.as_deref(), Some("173"));
        assert_eq!(reg_b.pool_address.as_deref(), Some("0xa5cd"));
        let balances = fragment.balances.expect("balances");
        assert_eq!(balances.agent_a_smart_usdc.as_deref(), Some("0.5"));
        assert_eq!(balances.pool_b_usdc.as_deref(), Some("1.0"));
        assert_eq!(balances.pool_a_usdc, None);
    }
}
