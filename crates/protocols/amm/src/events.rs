//! Pool Creation Event Scanner
//!
//! Pages through the pool contract's event log and turns `create-pool`
//! prints into fallback-quality candidate records.

use amm_core::{ContractId, DecodeError, Error, PoolId};
use clarity_value::{normalize_hex, TypedValue};
use stacks_client::{ContractEvent, LedgerReader};
use tokio::time::Instant;

use crate::calculator::calculate_initial_liquidity;
use crate::constants::{events, fields};
use crate::reader::{deadline_passed, token_field, uint_field};
use crate::state::{Pool, RecordSource};

/// Result of an event log scan
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Candidates in log order
    pub candidates: Vec<Pool>,
    /// Page requests issued
    pub pages: usize,
    /// Entries skipped because they failed to decode
    pub skipped: usize,
    /// False when the scan stopped on a transport failure or the deadline
    pub complete: bool,
}

/// Scan the event log for pool creations.
///
/// Pages are requested strictly in order, 50 entries at a time. The scan
/// ends on a short page, once the reported `total` is reached, on a
/// transport failure or when the deadline passes; the last two keep what
/// was accumulated so far.
pub async fn scan_pool_creation_events<R: LedgerReader + ?Sized>(
    ledger: &R,
    contract: &ContractId,
    deadline: Option<Instant>,
) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();
    let mut offset = 0u64;

    loop {
        if deadline_passed(deadline) {
            tracing::warn!(contract = %contract, offset, "Event scan deadline reached");
            return outcome;
        }

        let page = match ledger
            .contract_events(contract, offset, events::PAGE_SIZE)
            .await
        {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(contract = %contract, offset, "Event scan stopped early: {}", e);
                return outcome;
            }
        };
        outcome.pages += 1;

        let count = page.len() as u64;
        for entry in page.events() {
            let parsed = entry
                .map_err(|e| Error::from(DecodeError::MalformedJson(e.to_string())))
                .and_then(|event| candidate_from_event(&event, contract));
            match parsed {
                Ok(Some(candidate)) => outcome.candidates.push(candidate),
                Ok(None) => {}
                Err(e) => {
                    outcome.skipped += 1;
                    tracing::warn!(contract = %contract, offset, "Skipping event entry: {}", e);
                }
            }
        }
        tracing::debug!(contract = %contract, offset, count, "Scanned event page");

        if count < events::PAGE_SIZE {
            break;
        }
        offset += events::PAGE_SIZE;
        if page.total.is_some_and(|total| offset >= total) {
            break;
        }
    }

    outcome.complete = true;
    tracing::info!(
        contract = %contract,
        pages = outcome.pages,
        candidates = outcome.candidates.len(),
        skipped = outcome.skipped,
        "Event scan complete"
    );
    outcome
}

/// Candidate record from one log entry. `Ok(None)` for entries that are not
/// pool-creation prints of `contract`.
fn candidate_from_event(event: &ContractEvent, contract: &ContractId) -> Result<Option<Pool>, Error> {
    if !event.is_contract_log() {
        return Ok(None);
    }
    let Some(log) = &event.contract_log else {
        return Ok(None);
    };
    if log.contract_id != contract.as_str() || log.topic != events::PRINT_TOPIC {
        return Ok(None);
    }

    let value = normalize_hex(&log.value.hex)?;
    if !matches!(value, TypedValue::Tuple(_)) {
        return Ok(None);
    }
    let is_create = match value.opt_field(fields::ACTION)? {
        Some(action) => action.unwrap_optional_some().as_text()? == events::CREATE_POOL_ACTION,
        None => false,
    };
    if !is_create {
        return Ok(None);
    }

    let data = value.field(fields::DATA)?;
    let token0 = token_field(data, fields::TOKEN_0)?;
    let token1 = token_field(data, fields::TOKEN_1)?;
    let fee = uint_field(data, fields::FEE)?;

    let (reserve0, reserve1) = match (
        data.opt_field(fields::RESERVE_0)?,
        data.opt_field(fields::RESERVE_1)?,
    ) {
        (Some(_), Some(_)) => (
            uint_field(data, fields::RESERVE_0)?,
            uint_field(data, fields::RESERVE_1)?,
        ),
        _ => (0, 0),
    };
    // Prints rarely carry the share supply; a creation mints sqrt(r0 * r1)
    let total_liquidity = match data.opt_field(fields::TOTAL_LIQUIDITY)? {
        Some(_) => uint_field(data, fields::TOTAL_LIQUIDITY)?,
        None => calculate_initial_liquidity(reserve0, reserve1),
    };
    let pool_id = match data.opt_field(fields::POOL_ID)? {
        Some(id) => Some(id.unwrap_optional_some().as_buffer()?)
            .filter(|bytes| !bytes.is_empty())
            .map(PoolId::new),
        None => None,
    };

    let candidate = Pool::from_contract_order(
        pool_id,
        token0,
        token1,
        fee,
        reserve0,
        reserve1,
        total_liquidity,
        RecordSource::Fallback,
    )?;
    Ok(Some(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{PoolIdentifier, PoolKey};
    use crate::testing::*;
    use serde_json::json;

    fn creation(i: u128) -> serde_json::Value {
        let contract = pool_contract();
        print_event(
            contract.as_str(),
            &create_pool_payload(TOKEN_A, TOKEN_B, i, None, None),
        )
    }

    #[tokio::test]
    async fn test_stops_on_short_page() {
        let events: Vec<_> = (0..62).map(creation).collect();
        let ledger = MockLedger::new().with_events(events);

        let outcome = scan_pool_creation_events(&ledger, &pool_contract(), None).await;
        assert_eq!(ledger.page_requests(), 2);
        assert_eq!(outcome.pages, 2);
        assert_eq!(outcome.candidates.len(), 62);
        assert!(outcome.complete);
    }

    #[tokio::test]
    async fn test_stops_on_reported_total() {
        let events: Vec<_> = (0..50).map(creation).collect();
        let mut ledger = MockLedger::new().with_events(events);
        ledger.report_total = true;

        let outcome = scan_pool_creation_events(&ledger, &pool_contract(), None).await;
        assert_eq!(ledger.page_requests(), 1);
        assert_eq!(outcome.candidates.len(), 50);
    }

    #[tokio::test]
    async fn test_exact_window_without_total_needs_empty_page() {
        let events: Vec<_> = (0..50).map(creation).collect();
        let ledger = MockLedger::new().with_events(events);

        scan_pool_creation_events(&ledger, &pool_contract(), None).await;
        assert_eq!(ledger.page_requests(), 2);
    }

    #[tokio::test]
    async fn test_transport_failure_keeps_partial_results() {
        let events: Vec<_> = (0..80).map(creation).collect();
        let mut ledger = MockLedger::new().with_events(events);
        ledger.fail_at_offset = Some(50);

        let outcome = scan_pool_creation_events(&ledger, &pool_contract(), None).await;
        assert_eq!(outcome.candidates.len(), 50);
        assert!(!outcome.complete);
    }

    #[tokio::test]
    async fn test_deadline_stops_before_first_page() {
        let ledger = MockLedger::new().with_events(vec![creation(30)]);
        let outcome =
            scan_pool_creation_events(&ledger, &pool_contract(), Some(Instant::now())).await;
        assert_eq!(ledger.page_requests(), 0);
        assert!(outcome.candidates.is_empty());
        assert!(!outcome.complete);
    }

    #[tokio::test]
    async fn test_filters_unrelated_entries() {
        let contract = pool_contract();
        let payload = create_pool_payload(TOKEN_A, TOKEN_B, 30, None, None);
        let mut wrong_topic = print_event(contract.as_str(), &payload);
        wrong_topic["contract_log"]["topic"] = json!("transfer");
        let mut wrong_type = print_event(contract.as_str(), &payload);
        wrong_type["event_type"] = json!("fungible_token_asset");
        let swap = TypedValue::tuple([
            ("action", TypedValue::Text("swap".into())),
            ("data", TypedValue::UInt(1)),
        ]);

        let ledger = MockLedger::new().with_events(vec![
            print_event(OTHER_CONTRACT, &payload),
            wrong_topic,
            wrong_type,
            print_event(contract.as_str(), &swap),
            print_event(contract.as_str(), &TypedValue::Text("hello".into())),
            print_event(contract.as_str(), &payload),
        ]);

        let outcome = scan_pool_creation_events(&ledger, &contract, None).await;
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.skipped, 0);
    }

    #[tokio::test]
    async fn test_malformed_entries_are_skipped() {
        let contract = pool_contract();
        let mut bad_hex = print_event(
            contract.as_str(),
            &create_pool_payload(TOKEN_A, TOKEN_B, 30, None, None),
        );
        bad_hex["contract_log"]["value"]["hex"] = json!("0x0c0000");
        let missing_token = TypedValue::tuple([
            ("action", TypedValue::Text("create-pool".into())),
            ("data", TypedValue::tuple([("fee", TypedValue::UInt(30))])),
        ]);

        let ledger = MockLedger::new().with_events(vec![
            json!({"not": "an event"}),
            bad_hex,
            print_event(contract.as_str(), &missing_token),
            print_event(
                contract.as_str(),
                &create_pool_payload(TOKEN_B, TOKEN_C, 100, None, None),
            ),
        ]);

        let outcome = scan_pool_creation_events(&ledger, &contract, None).await;
        assert_eq!(outcome.skipped, 3);
        assert_eq!(outcome.candidates.len(), 1);
        assert!(outcome.complete);
    }

    #[tokio::test]
    async fn test_candidate_fields() {
        let contract = pool_contract();
        let ledger = MockLedger::new().with_events(vec![
            // contract order B/A, reserves follow the tokens
            print_event(
                contract.as_str(),
                &create_pool_payload(TOKEN_B, TOKEN_A, 30, Some((400, 100)), None),
            ),
            print_event(
                contract.as_str(),
                &create_pool_payload(TOKEN_A, TOKEN_C, 100, None, Some(vec![0xab; 4])),
            ),
        ]);

        let outcome = scan_pool_creation_events(&ledger, &contract, None).await;
        let first = &outcome.candidates[0];
        assert_eq!(first.key, PoolKey::new(t(TOKEN_A), t(TOKEN_B), 30).unwrap());
        assert_eq!((first.reserve0, first.reserve1), (100, 400));
        assert_eq!(first.total_liquidity, 200);
        assert_eq!(
            first.id,
            PoolIdentifier::Synthetic(format!("{}-{}-30", TOKEN_A, TOKEN_B))
        );
        assert_eq!(first.source, RecordSource::Fallback);

        let second = &outcome.candidates[1];
        assert_eq!(second.id, PoolIdentifier::Canonical(PoolId::new(vec![0xab; 4])));
        assert_eq!(second.reserve0, 0);
        assert!(second.looks_like_fallback());
    }
}
