//! Pool State Reader
//!
//! Read-only queries against the pool contract and token contracts, plus
//! the exhaustive known-pair sweep that guards against a lagging event log.

use std::collections::{BTreeSet, HashMap};

use amm_core::{
    ContractId, DecodeError, Error, FeeBps, PoolContractConfig, PoolId, TokenRef, ValidationError,
};
use clarity_value::{normalize, Principal, TypedValue};
use futures::stream::{self, StreamExt};
use stacks_client::{LedgerReader, ReadOnlyCall};
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::constants::{fields, quote::MAX_DECIMALS};
use crate::state::{Pool, PoolKey, RecordSource};

/// Default number of in-flight sweep probes
pub const DEFAULT_PROBE_CONCURRENCY: usize = 8;

/// True once a caller-imposed deadline has passed
pub(crate) fn deadline_passed(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}

/// Principal tuple member as a token reference
pub(crate) fn token_field(value: &TypedValue, name: &str) -> Result<TokenRef, DecodeError> {
    let principal = value.field(name)?.unwrap_optional_some().as_principal()?;
    Ok(TokenRef::new(principal.to_string()))
}

/// Unsigned tuple member
pub(crate) fn uint_field(value: &TypedValue, name: &str) -> Result<u128, DecodeError> {
    value.field(name)?.unwrap_optional_some().as_uint()
}

fn token_principal(token: &TokenRef) -> Result<TypedValue, ValidationError> {
    token
        .as_str()
        .parse::<Principal>()
        .map(TypedValue::Principal)
        .map_err(|e| ValidationError::InvalidIdentifier {
            value: token.to_string(),
            reason: e.to_string(),
        })
}

/// Arguments of the key-addressed pool functions: `(token-low, token-high, fee)`
pub(crate) fn key_args(key: &PoolKey) -> Result<Vec<TypedValue>, ValidationError> {
    Ok(vec![
        token_principal(&key.token_low)?,
        token_principal(&key.token_high)?,
        TypedValue::UInt(key.fee),
    ])
}

/// Decode a pool state tuple read for `id`
fn pool_from_state(id: &PoolId, state: &TypedValue) -> Result<Pool, Error> {
    let pool = Pool::from_contract_order(
        Some(id.clone()),
        token_field(state, fields::TOKEN_0)?,
        token_field(state, fields::TOKEN_1)?,
        uint_field(state, fields::FEE)?,
        uint_field(state, fields::RESERVE_0)?,
        uint_field(state, fields::RESERVE_1)?,
        uint_field(state, fields::TOTAL_LIQUIDITY)?,
        RecordSource::Authoritative,
    )?;
    Ok(pool)
}

/// Result of a known-pair sweep
#[derive(Debug, Default)]
pub struct SweepOutcome {
    /// Authoritative records, ordered by key
    pub pools: Vec<Pool>,
    /// Pair/fee combinations considered
    pub probes: usize,
    /// Probes that errored
    pub failures: usize,
    /// Probes not started because the deadline passed
    pub skipped: usize,
}

impl SweepOutcome {
    pub fn complete(&self) -> bool {
        self.failures == 0 && self.skipped == 0
    }
}

/// Read-only state access for one pool contract
pub struct StateReader<R> {
    ledger: R,
    pools: PoolContractConfig,
    probe_concurrency: usize,
    /// Token decimals never change once deployed
    decimals: RwLock<HashMap<TokenRef, u8>>,
}

impl<R: LedgerReader> StateReader<R> {
    pub fn new(ledger: R, pools: PoolContractConfig) -> Self {
        Self {
            ledger,
            pools,
            probe_concurrency: DEFAULT_PROBE_CONCURRENCY,
            decimals: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_probe_concurrency(mut self, probe_concurrency: usize) -> Self {
        self.probe_concurrency = probe_concurrency.max(1);
        self
    }

    pub fn ledger(&self) -> &R {
        &self.ledger
    }

    /// The pool contract
    pub fn contract(&self) -> &ContractId {
        &self.pools.contract
    }

    async fn call(
        &self,
        contract: &ContractId,
        function: &str,
        args: &[TypedValue],
    ) -> Result<Vec<u8>, Error> {
        let call = ReadOnlyCall::new(contract, function, args, &self.pools.sender)?;
        Ok(self.ledger.call_read_only(&call).await?)
    }

    async fn call_pool(&self, function: &str, args: &[TypedValue]) -> Result<TypedValue, Error> {
        let bytes = self.call(&self.pools.contract, function, args).await?;
        Ok(normalize(&bytes)?)
    }

    /// Token decimals, cached for the reader's lifetime
    pub async fn get_decimals(&self, token: &TokenRef) -> Result<u8, Error> {
        if let Some(decimals) = self.decimals.read().await.get(token) {
            return Ok(*decimals);
        }

        let bytes = self
            .call(&token.contract_id(), &self.pools.functions.get_decimals, &[])
            .await?;
        let value = normalize(&bytes)
            .and_then(|v| v.unwrap_response()?.as_uint())
            .map_err(|e| ValidationError::UnparsableResponse {
                what: "decimals",
                message: format!("{}: {}", token, e),
            })?;
        let decimals = u8::try_from(value)
            .ok()
            .filter(|d| u32::from(*d) <= MAX_DECIMALS)
            .ok_or(ValidationError::InvalidDecimals {
                value,
                max: MAX_DECIMALS,
            })?;

        self.decimals.write().await.insert(token.clone(), decimals);
        tracing::debug!(token = %token, decimals, "Cached token decimals");
        Ok(decimals)
    }

    /// Token balance of `account` in base units
    pub async fn get_balance(&self, token: &TokenRef, account: &str) -> Result<u128, Error> {
        let owner = account
            .parse::<Principal>()
            .map_err(|e| ValidationError::InvalidIdentifier {
                value: account.to_string(),
                reason: e.to_string(),
            })?;
        let bytes = self
            .call(
                &token.contract_id(),
                &self.pools.functions.get_balance,
                &[TypedValue::Principal(owner)],
            )
            .await?;
        let balance = normalize(&bytes)
            .and_then(|v| v.unwrap_response()?.as_uint())
            .map_err(|e| ValidationError::UnparsableResponse {
                what: "balance",
                message: format!("{}: {}", token, e),
            })?;
        Ok(balance)
    }

    /// Ledger pool id for `key`. Anything but a buffer after unwrapping is a miss.
    pub async fn resolve_pool_id(&self, key: &PoolKey) -> Result<Option<PoolId>, Error> {
        let value = self
            .call_pool(&self.pools.functions.get_pool_id, &key_args(key)?)
            .await?;
        match value.unwrap_layers() {
            Ok(Some(TypedValue::Buffer(bytes))) if !bytes.is_empty() => {
                Ok(Some(PoolId::new(bytes.clone())))
            }
            Ok(_) => Ok(None),
            Err(e) => {
                tracing::debug!(key = %key, "Pool id lookup missed: {}", e);
                Ok(None)
            }
        }
    }

    /// Authoritative state for `id`. Anything but a well-formed pool tuple
    /// after unwrapping is a miss.
    pub async fn get_pool_state(&self, id: &PoolId) -> Result<Option<Pool>, Error> {
        let value = self
            .call_pool(
                &self.pools.functions.get_pool,
                &[TypedValue::Buffer(id.as_bytes().to_vec())],
            )
            .await?;
        match value.unwrap_layers() {
            Ok(Some(state @ TypedValue::Tuple(_))) => match pool_from_state(id, state) {
                Ok(pool) => Ok(Some(pool)),
                Err(e) => {
                    tracing::debug!(pool_id = %id, "Pool state unreadable: {}", e);
                    Ok(None)
                }
            },
            Ok(_) => Ok(None),
            Err(e) => {
                tracing::debug!(pool_id = %id, "Pool state lookup missed: {}", e);
                Ok(None)
            }
        }
    }

    /// Id lookup then state fetch. State describing a different key is a miss.
    pub async fn resolve_pool(&self, key: &PoolKey) -> Result<Option<Pool>, Error> {
        let Some(id) = self.resolve_pool_id(key).await? else {
            return Ok(None);
        };
        match self.get_pool_state(&id).await? {
            Some(pool) if &pool.key != key => {
                tracing::warn!(
                    requested = %key,
                    returned = %pool.key,
                    pool_id = %id,
                    "Pool state key differs from lookup key"
                );
                Ok(None)
            }
            pool => Ok(pool),
        }
    }

    /// Existence check; an `err` or `none` answer means absent
    pub async fn pool_exists(&self, key: &PoolKey) -> Result<bool, Error> {
        let value = self
            .call_pool(&self.pools.functions.pool_exists, &key_args(key)?)
            .await?;
        match value.unwrap_layers() {
            Ok(Some(v)) => Ok(v.as_bool()?),
            Ok(None) | Err(DecodeError::ErrResponse(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn probe(&self, key: &PoolKey) -> Result<Option<Pool>, Error> {
        if !self.pool_exists(key).await? {
            return Ok(None);
        }
        self.resolve_pool(key).await
    }

    /// Probe every unordered token pair at every fee tier.
    ///
    /// Probes run with bounded concurrency; a failed probe is logged and
    /// does not affect the others. Probes not yet started when the deadline
    /// passes are skipped.
    pub async fn sweep_known_pairs(
        &self,
        tokens: &[TokenRef],
        fees: &[FeeBps],
        deadline: Option<Instant>,
    ) -> SweepOutcome {
        let keys = pair_keys(tokens, fees);
        let mut outcome = SweepOutcome {
            probes: keys.len(),
            ..Default::default()
        };

        let mut results = stream::iter(keys.into_iter().map(|key| async move {
            if deadline_passed(deadline) {
                return (key, None);
            }
            let result = self.probe(&key).await;
            (key, Some(result))
        }))
        .buffer_unordered(self.probe_concurrency);

        while let Some((key, result)) = results.next().await {
            match result {
                Some(Ok(Some(pool))) => outcome.pools.push(pool),
                Some(Ok(None)) => {}
                Some(Err(e)) => {
                    outcome.failures += 1;
                    tracing::warn!(key = %key, "Pool probe failed: {}", e);
                }
                None => outcome.skipped += 1,
            }
        }

        outcome.pools.sort_by(|a, b| a.key.cmp(&b.key));
        tracing::debug!(
            probes = outcome.probes,
            found = outcome.pools.len(),
            failures = outcome.failures,
            skipped = outcome.skipped,
            "Known-pair sweep finished"
        );
        outcome
    }
}

/// Every canonical key over distinct unordered pairs and distinct fees
fn pair_keys(tokens: &[TokenRef], fees: &[FeeBps]) -> Vec<PoolKey> {
    let tokens: Vec<&TokenRef> = tokens.iter().collect::<BTreeSet<_>>().into_iter().collect();
    let fees: BTreeSet<FeeBps> = fees.iter().copied().collect();

    let mut keys = Vec::new();
    for (i, a) in tokens.iter().enumerate() {
        for b in &tokens[i + 1..] {
            for fee in &fees {
                match PoolKey::new((*a).clone(), (*b).clone(), *fee) {
                    Ok(key) => keys.push(key),
                    Err(e) => tracing::warn!(token_a = %a, token_b = %b, fee = %fee, "Skipping pair: {}", e),
                }
            }
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::PoolIdentifier;
    use crate::testing::*;

    #[tokio::test]
    async fn test_get_decimals_cached() {
        let mut ledger = MockLedger::new();
        ledger.respond("get-decimals", &[], TypedValue::ok(TypedValue::UInt(6)));
        let reader = state_reader(ledger);

        assert_eq!(reader.get_decimals(&t(TOKEN_A)).await.unwrap(), 6);
        assert_eq!(reader.get_decimals(&t(TOKEN_A)).await.unwrap(), 6);
        assert_eq!(reader.ledger().calls(), 1);
    }

    #[tokio::test]
    async fn test_get_decimals_unparsable() {
        let mut ledger = MockLedger::new();
        ledger.respond("get-decimals", &[], TypedValue::ok(TypedValue::Text("six".into())));
        let reader = state_reader(ledger);

        assert!(matches!(
            reader.get_decimals(&t(TOKEN_A)).await,
            Err(Error::Validation(ValidationError::UnparsableResponse { what: "decimals", .. }))
        ));
    }

    #[tokio::test]
    async fn test_get_decimals_out_of_range() {
        let mut ledger = MockLedger::new();
        ledger.respond("get-decimals", &[], TypedValue::UInt(300));
        let reader = state_reader(ledger);

        assert!(matches!(
            reader.get_decimals(&t(TOKEN_A)).await,
            Err(Error::Validation(ValidationError::InvalidDecimals { value: 300, .. }))
        ));
    }

    #[tokio::test]
    async fn test_get_balance() {
        let owner = "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7";
        let mut ledger = MockLedger::new();
        ledger.respond(
            "get-balance",
            &[principal(owner)],
            TypedValue::ok(TypedValue::UInt(1_500)),
        );
        let reader = state_reader(ledger);

        assert_eq!(reader.get_balance(&t(TOKEN_B), owner).await.unwrap(), 1_500);
        assert!(matches!(
            reader.get_balance(&t(TOKEN_B), "not-an-address").await,
            Err(Error::Validation(ValidationError::InvalidIdentifier { .. }))
        ));
    }

    #[tokio::test]
    async fn test_resolve_pool() {
        let key = PoolKey::new(t(TOKEN_A), t(TOKEN_B), 30).unwrap();
        let mut ledger = MockLedger::new();
        // contract order B/A: reserves swap into key order
        ledger.script_pool(&key, &[0xaa; 32], pool_state(TOKEN_B, TOKEN_A, 30, 2_000, 1_000, 1_414));
        let reader = state_reader(ledger);

        let pool = reader.resolve_pool(&key).await.unwrap().unwrap();
        assert_eq!(pool.id, PoolIdentifier::Canonical(PoolId::new(vec![0xaa; 32])));
        assert_eq!(pool.key, key);
        assert_eq!((pool.reserve0, pool.reserve1), (1_000, 2_000));
        assert_eq!(pool.source, RecordSource::Authoritative);
    }

    #[tokio::test]
    async fn test_resolve_pool_tolerant_miss() {
        let key = PoolKey::new(t(TOKEN_A), t(TOKEN_C), 30).unwrap();
        let mut ledger = MockLedger::new();
        ledger.respond(
            "get-pool-id",
            &key_args(&key).unwrap(),
            TypedValue::err(TypedValue::UInt(404)),
        );
        let reader = state_reader(ledger);

        assert_eq!(reader.resolve_pool_id(&key).await.unwrap(), None);
        assert_eq!(reader.resolve_pool(&key).await.unwrap(), None);
        // unscripted id answers none
        assert_eq!(
            reader.get_pool_state(&PoolId::new(vec![1])).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_malformed_pool_state_is_a_miss() {
        let key = PoolKey::new(t(TOKEN_A), t(TOKEN_B), 30).unwrap();
        let mut ledger = MockLedger::new();
        ledger.script_pool(&key, &[2; 32], TypedValue::tuple([("fee", TypedValue::UInt(30))]));
        let reader = state_reader(ledger);

        assert_eq!(
            reader.get_pool_state(&PoolId::new(vec![2; 32])).await.unwrap(),
            None
        );
        assert_eq!(reader.resolve_pool(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_resolve_pool_rejects_state_for_other_key() {
        let ab = PoolKey::new(t(TOKEN_A), t(TOKEN_B), 30).unwrap();
        let bc = PoolKey::new(t(TOKEN_B), t(TOKEN_C), 30).unwrap();
        let mut ledger = MockLedger::new();
        ledger.script_pool(&ab, &[7; 32], pool_state(TOKEN_A, TOKEN_B, 30, 10, 20, 14));
        // B/C's id lookup points at the A/B pool
        ledger.respond(
            "get-pool-id",
            &key_args(&bc).unwrap(),
            TypedValue::ok(TypedValue::some(TypedValue::Buffer(vec![7; 32]))),
        );
        let reader = state_reader(ledger);

        assert_eq!(reader.resolve_pool(&bc).await.unwrap(), None);
        assert!(reader.resolve_pool(&ab).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sweep_finds_existing_pairs_only() {
        let ab = PoolKey::new(t(TOKEN_A), t(TOKEN_B), 30).unwrap();
        let bc = PoolKey::new(t(TOKEN_B), t(TOKEN_C), 100).unwrap();
        let mut ledger = MockLedger::new();
        ledger.script_pool(&ab, &[1; 32], pool_state(TOKEN_A, TOKEN_B, 30, 10, 20, 14));
        ledger.script_pool(&bc, &[2; 32], pool_state(TOKEN_B, TOKEN_C, 100, 5, 5, 5));
        let reader = state_reader(ledger).with_probe_concurrency(2);

        let tokens = [t(TOKEN_A), t(TOKEN_B), t(TOKEN_C), t(TOKEN_A)];
        let outcome = reader.sweep_known_pairs(&tokens, &[30, 100], None).await;
        assert_eq!(outcome.probes, 6);
        assert_eq!(outcome.pools.len(), 2);
        assert!(outcome.complete());
        let keys: Vec<_> = outcome.pools.iter().map(|p| p.key.clone()).collect();
        assert!(keys.contains(&ab) && keys.contains(&bc));
    }

    #[tokio::test]
    async fn test_sweep_isolates_probe_failures() {
        let ab = PoolKey::new(t(TOKEN_A), t(TOKEN_B), 30).unwrap();
        let mut ledger = MockLedger::new();
        ledger.script_pool(&ab, &[1; 32], pool_state(TOKEN_A, TOKEN_B, 30, 10, 20, 14));
        // B/C answers the existence check with a non-bool
        let bc = PoolKey::new(t(TOKEN_B), t(TOKEN_C), 30).unwrap();
        ledger.respond(
            "pool-exists",
            &key_args(&bc).unwrap(),
            TypedValue::ok(TypedValue::UInt(1)),
        );
        let reader = state_reader(ledger);

        let outcome = reader
            .sweep_known_pairs(&[t(TOKEN_A), t(TOKEN_B), t(TOKEN_C)], &[30], None)
            .await;
        assert_eq!(outcome.pools.len(), 1);
        assert_eq!(outcome.pools[0].key, ab);
        assert_eq!(outcome.failures, 1);
    }

    #[tokio::test]
    async fn test_sweep_respects_deadline() {
        let reader = state_reader(MockLedger::new());
        let outcome = reader
            .sweep_known_pairs(&[t(TOKEN_A), t(TOKEN_B)], &[30, 100], Some(Instant::now()))
            .await;
        assert_eq!(outcome.skipped, 2);
        assert!(outcome.pools.is_empty());
        assert_eq!(reader.ledger().calls(), 0);
    }
}
