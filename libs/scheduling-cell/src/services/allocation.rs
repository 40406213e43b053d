// libs/scheduling-cell/src/services/allocation.rs
//
// Provider selection and best-fit slot placement.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::error::SchedulingError;
use crate::models::{AllocationRequest, Appointment};
use crate::services::registry::{Provider, ProviderRegistry};
use crate::services::slot_index::SlotIndex;
use crate::time_range::{Minute, TimeRange};

/// Pick the placement for `duration` minutes that leaves the least leftover.
///
/// Every free interval is clipped to `window`; among clipped intervals long
/// enough, the one with the smallest `len - duration` wins, ties going to the
/// earliest start. The slot is carved from the start of the chosen interval.
pub fn best_fit(free: &[TimeRange], window: &TimeRange, duration: Minute) -> Option<TimeRange> {
    if duration == 0 {
        return None;
    }

    free.iter()
        .filter_map(|interval| interval.intersect(window))
        .filter(|candidate| candidate.len() >= duration)
        .min_by_key(|candidate| (candidate.len() - duration, candidate.start))
        .map(|chosen| TimeRange::new(chosen.start, chosen.start + duration))
}

pub struct AllocationService {
    registry: Arc<ProviderRegistry>,
    index: Arc<SlotIndex>,
}

impl AllocationService {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        let index = registry.slot_index().clone();
        Self { registry, index }
    }

    #[instrument(skip(self, request), fields(request_id = %request.request_id))]
    pub fn schedule(&self, request: &AllocationRequest) -> Result<Appointment, SchedulingError> {
        if request.duration == 0 {
            return Err(SchedulingError::InvalidRequest(
                "duration must be greater than zero".to_string(),
            ));
        }
        if !request.preferred_range.is_valid() {
            return Err(SchedulingError::InvalidRequest(format!(
                "preferred range {}-{} is empty or outside the day",
                request.preferred_range.start, request.preferred_range.end
            )));
        }

        self.registry.claim_request(&request.request_id)?;

        let outcome = match &request.preferred_provider {
            Some(provider_id) => self
                .registry
                .get_provider(provider_id)
                .and_then(|provider| self.try_provider(&provider, request)),
            None => self.schedule_any(request),
        };

        match &outcome {
            Ok(appointment) => info!(
                "Scheduled request {} with provider {} at {}-{}",
                appointment.request_id,
                appointment.provider_id,
                appointment.slot.start,
                appointment.slot.end
            ),
            Err(e) => {
                self.registry.release_request(&request.request_id);
                warn!("Scheduling failed for request {}: {}", request.request_id, e);
            }
        }

        outcome
    }

    /// Walk candidates from the most available provider downwards until one
    /// accepts the request under its lock.
    fn schedule_any(&self, request: &AllocationRequest) -> Result<Appointment, SchedulingError> {
        let mut tried = HashSet::new();

        while let Some(candidate) = self.index.next_candidate(&tried) {
            tried.insert(candidate.clone());

            let provider = match self.registry.get_provider(&candidate) {
                Ok(provider) => provider,
                Err(_) => continue,
            };

            match self.try_provider(&provider, request) {
                Err(e) if e.is_candidate_exhausted() => {
                    debug!("Candidate {} exhausted: {}", candidate, e);
                }
                outcome => return outcome,
            }
        }

        Err(SchedulingError::NoAvailability {
            request_id: request.request_id.clone(),
        })
    }

    /// Re-validate and commit against one provider while holding its lock.
    fn try_provider(
        &self,
        provider: &Provider,
        request: &AllocationRequest,
    ) -> Result<Appointment, SchedulingError> {
        let mut schedule = provider.lock();

        if schedule.is_at_daily_limit() {
            return Err(SchedulingError::DailyLimitReached {
                provider_id: provider.id().to_string(),
                limit: schedule.max_daily_appointments(),
            });
        }

        let free = schedule.free_intervals();
        let slot = best_fit(&free, &request.preferred_range, request.duration).ok_or_else(|| {
            SchedulingError::NoAvailability {
                request_id: request.request_id.clone(),
            }
        })?;

        let appointment = Appointment {
            request_id: request.request_id.clone(),
            provider_id: provider.id().to_string(),
            slot,
        };
        schedule.book(appointment.clone());
        self.registry.confirm_request(&request.request_id, provider.id());
        self.registry.refresh_index(provider.id(), &schedule);

        Ok(appointment)
    }
}
