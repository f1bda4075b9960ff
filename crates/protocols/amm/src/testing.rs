//! In-memory ledger and fixtures shared by the async tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use amm_core::{ContractId, NetworkError, PoolContractConfig, PoolId, TokenRef};
use async_trait::async_trait;
use clarity_value::TypedValue;
use serde_json::json;
use stacks_client::{EventPage, LedgerReader, ReadOnlyCall};

use crate::constants::fields;
use crate::reader::StateReader;
use crate::state::{Pool, PoolIdentifier, PoolKey, RecordSource};

// Consensus order by hash160: C (0x98..) < A (0xa4..) < B (0xe6..)
pub const TOKEN_A: &str = "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7.token-a";
pub const TOKEN_B: &str = "SP3K8BC0PPEVCV7NZ6QSRWPQ2JE9E5B6N3PA0KBR9.token-b";
pub const TOKEN_C: &str = "SP2C2YFP12AJZB4MABJBAJ55XECVS7E4PMMZ89YZR.token-c";
pub const OTHER_CONTRACT: &str = "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7.router-v1";

pub fn t(s: &str) -> TokenRef {
    TokenRef::new(s)
}

pub fn pool_contract() -> ContractId {
    PoolContractConfig::default().contract
}

/// A/B pool, fee 30, canonical id `0x010203`
pub fn pool(reserve0: u128, reserve1: u128, total_liquidity: u128) -> Pool {
    Pool {
        id: PoolIdentifier::Canonical(PoolId::new(vec![1, 2, 3])),
        key: PoolKey::new(t(TOKEN_A), t(TOKEN_B), 30).unwrap(),
        reserve0,
        reserve1,
        total_liquidity,
        source: RecordSource::Authoritative,
    }
}

pub fn principal(s: &str) -> TypedValue {
    TypedValue::Principal(s.parse().unwrap())
}

/// `{action: "create-pool", data: {...}}` print payload
pub fn create_pool_payload(
    token0: &str,
    token1: &str,
    fee: u128,
    reserves: Option<(u128, u128)>,
    pool_id: Option<Vec<u8>>,
) -> TypedValue {
    let mut data = vec![
        (fields::TOKEN_0, principal(token0)),
        (fields::TOKEN_1, principal(token1)),
        (fields::FEE, TypedValue::UInt(fee)),
    ];
    if let Some((r0, r1)) = reserves {
        data.push((fields::RESERVE_0, TypedValue::UInt(r0)));
        data.push((fields::RESERVE_1, TypedValue::UInt(r1)));
    }
    if let Some(id) = pool_id {
        data.push((fields::POOL_ID, TypedValue::Buffer(id)));
    }
    TypedValue::tuple([
        (fields::ACTION, TypedValue::Text("create-pool".into())),
        (fields::DATA, TypedValue::tuple(data)),
    ])
}

/// Event log entry carrying `value` as a print log of `contract`
pub fn print_event(contract: &str, value: &TypedValue) -> serde_json::Value {
    json!({
        "event_index": 0,
        "event_type": "smart_contract_log",
        "tx_id": "0x00",
        "contract_log": {
            "contract_id": contract,
            "topic": "print",
            "value": {"hex": value.to_hex().unwrap(), "repr": value.to_string()}
        }
    })
}

/// Pool state tuple as returned by the state-fetch function
pub fn pool_state(token0: &str, token1: &str, fee: u128, r0: u128, r1: u128, l: u128) -> TypedValue {
    TypedValue::tuple([
        (fields::TOKEN_0, principal(token0)),
        (fields::TOKEN_1, principal(token1)),
        (fields::FEE, TypedValue::UInt(fee)),
        (fields::RESERVE_0, TypedValue::UInt(r0)),
        (fields::RESERVE_1, TypedValue::UInt(r1)),
        (fields::TOTAL_LIQUIDITY, TypedValue::UInt(l)),
    ])
}

/// Scripted ledger. Unscripted read-only calls answer `none`.
#[derive(Default)]
pub struct MockLedger {
    pub events: Vec<serde_json::Value>,
    pub report_total: bool,
    pub fail_at_offset: Option<u64>,
    pub failing_function: Option<String>,
    responses: HashMap<(String, Vec<String>), Vec<u8>>,
    page_requests: AtomicUsize,
    calls: AtomicUsize,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(mut self, events: Vec<serde_json::Value>) -> Self {
        self.events = events;
        self
    }

    pub fn respond(&mut self, function: &str, args: &[TypedValue], result: TypedValue) {
        let args = args.iter().map(|a| a.to_hex().unwrap()).collect();
        self.responses
            .insert((function.to_string(), args), result.serialize().unwrap());
    }

    /// Script the exists / id / state chain for one pool
    pub fn script_pool(&mut self, key: &PoolKey, id: &[u8], state: TypedValue) {
        let args = crate::reader::key_args(key).unwrap();
        self.respond("pool-exists", &args, TypedValue::ok(TypedValue::Bool(true)));
        self.respond(
            "get-pool-id",
            &args,
            TypedValue::ok(TypedValue::some(TypedValue::Buffer(id.to_vec()))),
        );
        self.respond(
            "get-pool",
            &[TypedValue::Buffer(id.to_vec())],
            TypedValue::ok(TypedValue::some(state)),
        );
    }

    pub fn page_requests(&self) -> usize {
        self.page_requests.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerReader for MockLedger {
    async fn contract_events(
        &self,
        _contract: &ContractId,
        offset: u64,
        limit: u64,
    ) -> stacks_client::Result<EventPage> {
        self.page_requests.fetch_add(1, Ordering::SeqCst);
        if self.fail_at_offset == Some(offset) {
            return Err(NetworkError::Timeout { secs: 30 });
        }
        let len = self.events.len();
        let start = (offset as usize).min(len);
        let end = (offset.saturating_add(limit) as usize).min(len);
        Ok(EventPage {
            limit: Some(limit),
            offset: Some(offset),
            total: self.report_total.then_some(len as u64),
            results: self.events[start..end].to_vec(),
        })
    }

    async fn call_read_only(&self, call: &ReadOnlyCall) -> stacks_client::Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_function.as_deref() == Some(call.function_name.as_str()) {
            return Err(NetworkError::HttpStatus {
                status: 500,
                url: call.function_name.clone(),
            });
        }
        let key = (call.function_name.clone(), call.arguments.clone());
        Ok(self.responses.get(&key).cloned().unwrap_or_else(|| vec![0x09]))
    }
}

pub fn state_reader(ledger: MockLedger) -> StateReader<MockLedger> {
    StateReader::new(ledger, PoolContractConfig::default())
}
