//! Pool Discovery
//!
//! Reconciles event-log candidates with authoritative state reads into one
//! canonical record per pool key.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use amm_core::{FeeBps, TokenRef};
use serde::Serialize;
use stacks_client::LedgerReader;
use tokio::time::Instant;

use crate::events::scan_pool_creation_events;
use crate::reader::{deadline_passed, StateReader};
use crate::state::{Pool, PoolKey};

/// Reconciled pool set with run statistics
#[derive(Debug, Default, Serialize)]
pub struct DiscoveryReport {
    /// At most one record per key, ordered by key
    pub pools: Vec<Pool>,
    /// Candidates decoded from the event log
    pub candidates: usize,
    /// Records returned by the known-pair sweep
    pub authoritative: usize,
    /// Synthetic-id records replaced in the repair pass
    pub repaired: usize,
    /// Records dropped for inconsistent reserves
    pub rejected: usize,
    /// Whether the event scan reached the end of the log
    pub scan_complete: bool,
}

/// Insert `record` unless the slot already holds one of equal or higher precedence
fn fold_record(merged: &mut BTreeMap<PoolKey, Pool>, record: Pool) {
    match merged.entry(record.key.clone()) {
        Entry::Vacant(slot) => {
            slot.insert(record);
        }
        Entry::Occupied(mut slot) => {
            if record.precedence() > slot.get().precedence() {
                slot.insert(record);
            }
        }
    }
}

/// Merge candidates with authoritative records.
///
/// A candidate that looks like a fallback is replaced by the authoritative
/// record for its key. Records sharing a key collapse to the one with a
/// canonical id. Authoritative records for keys the log never mentioned are
/// added last.
pub fn merge_records(candidates: Vec<Pool>, authoritative: Vec<Pool>) -> BTreeMap<PoolKey, Pool> {
    let mut by_key: BTreeMap<PoolKey, Pool> = BTreeMap::new();
    for record in authoritative {
        fold_record(&mut by_key, record);
    }

    let mut merged = BTreeMap::new();
    for candidate in candidates {
        let record = match by_key.get(&candidate.key) {
            Some(found) if candidate.looks_like_fallback() => found.clone(),
            _ => candidate,
        };
        fold_record(&mut merged, record);
    }

    for (key, record) in by_key {
        merged.entry(key).or_insert(record);
    }
    merged
}

/// Discover the pool set of the reader's pool contract.
///
/// The event scan and the known-pair sweep run concurrently. With no
/// candidates the sweep result is used as is, keyed and ordered like the
/// merged path; otherwise the two are merged and each record still carrying
/// a synthetic id gets one direct lookup. A lookup answering with another
/// key's state leaves the fallback in place.
/// Records violating the reserves invariant are logged and dropped. Partial
/// failures and the deadline shrink the result, never abort it.
pub async fn discover_pools<R: LedgerReader>(
    reader: &StateReader<R>,
    known_tokens: &[TokenRef],
    known_fees: &[FeeBps],
    deadline: Option<Instant>,
) -> DiscoveryReport {
    let contract = reader.contract();
    let (scan, sweep) = tokio::join!(
        scan_pool_creation_events(reader.ledger(), contract, deadline),
        reader.sweep_known_pairs(known_tokens, known_fees, deadline),
    );

    let mut report = DiscoveryReport {
        candidates: scan.candidates.len(),
        authoritative: sweep.pools.len(),
        scan_complete: scan.complete,
        ..Default::default()
    };

    let merged = if scan.candidates.is_empty() {
        // Sweep records are already one per key; the fold only orders them
        let mut direct = BTreeMap::new();
        for record in sweep.pools {
            fold_record(&mut direct, record);
        }
        direct
    } else {
        let mut merged = merge_records(scan.candidates, sweep.pools);
        for record in merged.values_mut() {
            if record.id.is_canonical() {
                continue;
            }
            if deadline_passed(deadline) {
                tracing::warn!(key = %record.key, "Deadline reached, keeping fallback record");
                continue;
            }
            match reader.resolve_pool(&record.key).await {
                Ok(Some(resolved)) => {
                    *record = resolved;
                    report.repaired += 1;
                }
                Ok(None) => {
                    tracing::debug!(key = %record.key, "No ledger record, keeping fallback");
                }
                Err(e) => {
                    tracing::warn!(key = %record.key, "Pool repair failed: {}", e);
                }
            }
        }
        merged
    };

    for (key, pool) in merged {
        match pool.check_reserves() {
            Ok(()) => report.pools.push(pool),
            Err(e) => {
                report.rejected += 1;
                tracing::warn!(key = %key, code = e.error_code(), "Rejecting pool record: {}", e);
            }
        }
    }

    tracing::info!(
        contract = %contract,
        pools = report.pools.len(),
        candidates = report.candidates,
        authoritative = report.authoritative,
        repaired = report.repaired,
        rejected = report.rejected,
        "Pool discovery complete"
    );
    report
}
