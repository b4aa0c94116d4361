//! Order-level deduplication.
//!
//! Exports overlap: the same order shows up as `Pending` in one file and as
//! `Shipped` in a later one. We keep the latest known state per order id.
//!
//! Ordering (stable):
//! 1. order id ascending
//! 2. purchase timestamp descending
//! 3. item-status label ascending, absent last ("Enviado" < "Não Enviado")
//!
//! The first record of each order group wins.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::domain::CanonicalRecord;

#[derive(Debug, Clone, Default)]
pub struct DedupOutcome {
    /// One record per order id, ordered by order id.
    pub records: Vec<CanonicalRecord>,
    /// Records dropped in favour of a newer one for the same order.
    pub superseded: usize,
}

pub fn deduplicate(mut records: Vec<CanonicalRecord>) -> DedupOutcome {
    let input_len = records.len();
    records.sort_by(dedup_order);
    records.dedup_by(|later, first| later.order_id == first.order_id);

    // Exact full-row duplicates cannot survive the per-order pass; this only
    // guards the output contract.
    let mut seen = HashSet::with_capacity(records.len());
    records.retain(|r| seen.insert(r.clone()));

    DedupOutcome {
        superseded: input_len - records.len(),
        records,
    }
}

fn dedup_order(a: &CanonicalRecord, b: &CanonicalRecord) -> Ordering {
    a.order_id
        .cmp(&b.order_id)
        .then_with(|| b.purchase_date.cmp(&a.purchase_date))
        .then_with(|| {
            let a_label = a.item_status.as_ref().map(|s| s.label());
            let b_label = b.item_status.as_ref().map(|s| s.label());
            match (a_label, b_label) {
                (Some(x), Some(y)) => x.cmp(y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        })
}
