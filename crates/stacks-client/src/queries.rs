//! Wire types and endpoint paths for the ledger API

use amm_core::{ContractId, NetworkError, ValidationError};
use clarity_value::TypedValue;
use serde::{Deserialize, Serialize};

/// Event type of a contract print log. Older indexers use the short form.
pub const CONTRACT_LOG_EVENT_TYPES: &[&str] = &["smart_contract_log", "contract_log"];

/// `GET` path for a page of a contract's events
pub fn contract_events_path(contract: &ContractId, offset: u64, limit: u64) -> String {
    format!(
        "/extended/v1/contract/{}/events?limit={}&offset={}",
        contract, limit, offset
    )
}

/// `POST` path for a read-only function call
pub fn read_only_path(call: &ReadOnlyCall) -> String {
    format!(
        "/v2/contracts/call-read/{}/{}/{}",
        call.contract_address, call.contract_name, call.function_name
    )
}

/// One page of the append-only event log.
///
/// Entries stay raw so one malformed entry cannot fail the whole page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPage {
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
    /// Total events in the log, when the indexer reports it
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
}

impl EventPage {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Entries parsed individually
    pub fn events(&self) -> impl Iterator<Item = Result<ContractEvent, serde_json::Error>> + '_ {
        self.results
            .iter()
            .map(|raw| serde_json::from_value(raw.clone()))
    }
}

/// Single event log entry
#[derive(Debug, Clone, Deserialize)]
pub struct ContractEvent {
    #[serde(default)]
    pub event_index: Option<u64>,
    pub event_type: String,
    #[serde(default)]
    pub tx_id: Option<String>,
    #[serde(default)]
    pub contract_log: Option<ContractLog>,
}

impl ContractEvent {
    pub fn is_contract_log(&self) -> bool {
        CONTRACT_LOG_EVENT_TYPES.contains(&self.event_type.as_str())
    }
}

/// Print-log payload of a contract event
#[derive(Debug, Clone, Deserialize)]
pub struct ContractLog {
    pub contract_id: String,
    pub topic: String,
    pub value: LogValue,
}

/// Encoded log value
#[derive(Debug, Clone, Deserialize)]
pub struct LogValue {
    pub hex: String,
    #[serde(default)]
    pub repr: Option<String>,
}

/// A read-only function call: `(contractAddress, contractName, functionName, args, sender)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOnlyCall {
    pub contract_address: String,
    pub contract_name: String,
    pub function_name: String,
    /// `0x`-prefixed hex of each encoded argument
    pub arguments: Vec<String>,
    pub sender: String,
}

impl ReadOnlyCall {
    pub fn new(
        contract: &ContractId,
        function_name: &str,
        args: &[TypedValue],
        sender: &str,
    ) -> Result<Self, ValidationError> {
        let (address, name) = contract.split()?;
        let arguments = args
            .iter()
            .map(TypedValue::to_hex)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            contract_address: address.to_string(),
            contract_name: name.to_string(),
            function_name: function_name.to_string(),
            arguments,
            sender: sender.to_string(),
        })
    }

    pub fn body(&self) -> ReadOnlyRequest<'_> {
        ReadOnlyRequest {
            sender: &self.sender,
            arguments: &self.arguments,
        }
    }
}

/// JSON body of a read-only call
#[derive(Debug, Serialize)]
pub struct ReadOnlyRequest<'a> {
    pub sender: &'a str,
    pub arguments: &'a [String],
}

/// JSON response of a read-only call
#[derive(Debug, Clone, Deserialize)]
pub struct ReadOnlyResponse {
    pub okay: bool,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub cause: Option<String>,
}

impl ReadOnlyResponse {
    /// Raw encoded result bytes, or the rejection cause
    pub fn into_bytes(self, function: &str) -> Result<Vec<u8>, NetworkError> {
        if !self.okay {
            return Err(NetworkError::CallRejected {
                function: function.to_string(),
                cause: self.cause.unwrap_or_else(|| "unknown".to_string()),
            });
        }
        let result = self.result.ok_or_else(|| {
            NetworkError::ParseError(format!("{}: okay response without result", function))
        })?;
        let digits = result.strip_prefix("0x").unwrap_or(&result);
        hex::decode(digits)
            .map_err(|e| NetworkError::ParseError(format!("{}: result is not hex: {}", function, e)))
    }
}

/// Subset of `/v2/info`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInfo {
    #[serde(default)]
    pub network_id: Option<u32>,
    #[serde(default)]
    pub stacks_tip_height: u64,
    #[serde(default)]
    pub burn_block_height: u64,
    #[serde(default)]
    pub server_version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const POOL_CONTRACT: &str = "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7.amm-pool-v1";

    #[test]
    fn test_event_path() {
        let path = contract_events_path(&ContractId::new(POOL_CONTRACT), 100, 50);
        assert_eq!(
            path,
            format!("/extended/v1/contract/{}/events?limit=50&offset=100", POOL_CONTRACT)
        );
    }

    #[test]
    fn test_read_only_call_encoding() {
        let call = ReadOnlyCall::new(
            &ContractId::new(POOL_CONTRACT),
            "get-pool",
            &[TypedValue::UInt(1)],
            "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7",
        )
        .unwrap();
        assert_eq!(
            read_only_path(&call),
            "/v2/contracts/call-read/SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7/amm-pool-v1/get-pool"
        );
        assert_eq!(
            call.arguments,
            vec!["0x0100000000000000000000000000000001".to_string()]
        );
        let body = serde_json::to_value(call.body()).unwrap();
        assert_eq!(body["sender"], "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7");
    }

    #[test]
    fn test_read_only_call_rejects_bad_contract() {
        assert!(ReadOnlyCall::new(&ContractId::new("nodot"), "f", &[], "SP1").is_err());
    }

    #[test]
    fn test_read_only_response() {
        let ok: ReadOnlyResponse =
            serde_json::from_value(json!({"okay": true, "result": "0x03"})).unwrap();
        assert_eq!(ok.into_bytes("pool-exists").unwrap(), vec![0x03]);

        let rejected: ReadOnlyResponse = serde_json::from_value(
            json!({"okay": false, "cause": "Unchecked(NoSuchContract)"}),
        )
        .unwrap();
        assert!(matches!(
            rejected.into_bytes("get-pool"),
            Err(NetworkError::CallRejected { .. })
        ));
    }

    #[test]
    fn test_event_page_tolerates_malformed_entry() {
        let page: EventPage = serde_json::from_value(json!({
            "limit": 50,
            "offset": 0,
            "results": [
                {
                    "event_index": 0,
                    "event_type": "smart_contract_log",
                    "tx_id": "0x01",
                    "contract_log": {
                        "contract_id": POOL_CONTRACT,
                        "topic": "print",
                        "value": {"hex": "0x03", "repr": "true"}
                    }
                },
                {"unexpected": true}
            ]
        }))
        .unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page.total, None);
        let parsed: Vec<_> = page.events().collect();
        assert!(parsed[0].as_ref().unwrap().is_contract_log());
        assert!(parsed[1].is_err());
    }
}
