//! Memoized derived views.
//!
//! A [`ViewCache`] remembers the last projection it computed together with
//! the snapshot it was computed from, and reuses it while the store still
//! hands out the same snapshot.

use std::sync::Arc;

use crate::lead::Lead;
use crate::store::{Bucket, LeadStore, TargetFilter};

#[derive(Debug, Default)]
pub struct ViewCache {
    entry: Option<CachedView>,
    recomputes: usize,
}

#[derive(Debug)]
struct CachedView {
    // Holding the snapshot keeps its allocation alive, so pointer identity
    // cannot be reused by a later snapshot while this entry exists.
    source: Arc<Vec<Lead>>,
    bucket: Bucket,
    filter: TargetFilter,
    positions: Vec<usize>,
}

impl ViewCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The view for `(bucket, filter)` over `store`'s current snapshot.
    pub fn view<'a>(
        &mut self,
        store: &'a LeadStore,
        bucket: Bucket,
        filter: TargetFilter,
    ) -> Vec<&'a Lead> {
        let snapshot = store.snapshot();
        let hit = self.entry.as_ref().is_some_and(|e| {
            Arc::ptr_eq(&e.source, &snapshot) && e.bucket == bucket && e.filter == filter
        });

        if !hit {
            let positions = snapshot
                .iter()
                .enumerate()
                .filter(|(_, l)| bucket.contains(l) && filter.matches(l))
                .map(|(i, _)| i)
                .collect();
            self.recomputes += 1;
            self.entry = Some(CachedView {
                source: snapshot,
                bucket,
                filter,
                positions,
            });
        }

        let leads = store.leads();
        self.entry
            .as_ref()
            .map(|e| e.positions.iter().map(|&i| &leads[i]).collect())
            .unwrap_or_default()
    }

    /// How many times a view was actually recomputed.
    #[must_use]
    pub fn recomputes(&self) -> usize {
        self.recomputes
    }
}
