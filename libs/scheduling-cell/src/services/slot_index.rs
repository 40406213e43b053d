// libs/scheduling-cell/src/services/slot_index.rs
//
// Frequency-bucket index from "available slot count" to the providers
// holding that count. It is a cache over provider state: every entry can be
// recomputed from a provider's availability and bookings, and callers must
// re-validate under the provider lock before acting on anything read here.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use indexmap::IndexSet;
use tracing::debug;

use crate::models::ProviderId;
use crate::time_range::Minute;

#[derive(Debug, Default)]
struct Bucket {
    members: IndexSet<ProviderId>,
    /// Round-robin position for tie-breaking between equal counts.
    cursor: usize,
}

impl Bucket {
    /// Next member at or after the cursor that is not in `skip`, advancing the cursor past it.
    fn rotate(&mut self, skip: &HashSet<ProviderId>) -> Option<ProviderId> {
        let len = self.members.len();
        for step in 0..len {
            let position = (self.cursor + step) % len;
            let Some(id) = self.members.get_index(position) else {
                continue;
            };
            if !skip.contains(id) {
                self.cursor = position + 1;
                return Some(id.clone());
            }
        }
        None
    }
}

#[derive(Debug, Default)]
struct SlotTable {
    buckets: Vec<Bucket>,
    counts: HashMap<ProviderId, usize>,
    max: usize,
}

impl SlotTable {
    fn bucket_mut(&mut self, count: usize) -> &mut Bucket {
        if self.buckets.len() <= count {
            self.buckets.resize_with(count + 1, Bucket::default);
        }
        &mut self.buckets[count]
    }

    fn is_empty_at(&self, count: usize) -> bool {
        self.buckets
            .get(count)
            .map_or(true, |bucket| bucket.members.is_empty())
    }
}

#[derive(Debug)]
pub struct SlotIndex {
    reference_minutes: Minute,
    table: Mutex<SlotTable>,
}

impl SlotIndex {
    pub fn new(reference_minutes: Minute) -> Self {
        Self {
            reference_minutes: reference_minutes.max(1),
            table: Mutex::new(SlotTable::default()),
        }
    }

    /// Duration class counted by this index.
    pub fn reference_minutes(&self) -> Minute {
        self.reference_minutes
    }

    fn table(&self) -> MutexGuard<'_, SlotTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move `provider_id` into the bucket for `new_count`.
    ///
    /// Callers hold the provider's lock, so updates for one provider are
    /// serialized while updates for different providers only share the
    /// short table lock.
    pub fn update_count(&self, provider_id: &str, new_count: usize) {
        let mut table = self.table();

        let old_count = table.counts.get(provider_id).copied();
        if old_count == Some(new_count) {
            return;
        }

        if let Some(old_count) = old_count {
            let bucket = table.bucket_mut(old_count);
            bucket.members.swap_remove(provider_id);
            if bucket.cursor > bucket.members.len() {
                bucket.cursor = 0;
            }
        }

        table.bucket_mut(new_count).members.insert(provider_id.to_string());
        table.counts.insert(provider_id.to_string(), new_count);

        if new_count > table.max {
            table.max = new_count;
        } else {
            while table.max > 0 && table.is_empty_at(table.max) {
                table.max -= 1;
            }
        }

        debug!(
            "Slot index: provider {} count {:?} -> {} (max {})",
            provider_id, old_count, new_count, table.max
        );
    }

    /// One provider from the highest non-zero bucket, rotating among ties.
    pub fn peek_max(&self) -> Option<ProviderId> {
        let mut table = self.table();
        let max = table.max;
        if max == 0 {
            return None;
        }
        table.bucket_mut(max).rotate(&HashSet::new())
    }

    /// Highest-count provider not in `tried`, walking buckets downwards.
    ///
    /// Unlike [`peek_max`](Self::peek_max) this also reaches the zero bucket
    /// last: a provider with no reference-length gap may still hold room for
    /// a shorter request.
    pub fn next_candidate(&self, tried: &HashSet<ProviderId>) -> Option<ProviderId> {
        let mut table = self.table();
        let max = table.max;
        (0..=max)
            .rev()
            .find_map(|count| match table.buckets.get_mut(count) {
                Some(bucket) => bucket.rotate(tried),
                None => None,
            })
    }

    pub fn count_of(&self, provider_id: &str) -> Option<usize> {
        self.table().counts.get(provider_id).copied()
    }
}
