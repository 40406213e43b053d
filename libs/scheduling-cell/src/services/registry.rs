use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tracing::{debug, info, warn};

use crate::error::SchedulingError;
use crate::models::{Appointment, ProviderId, ProviderSnapshot, RequestId};
use crate::services::slot_index::SlotIndex;
use crate::time_range::{self, Minute, TimeRange};

/// Mutable state of one provider. Only reachable through [`Provider::lock`].
#[derive(Debug)]
pub struct ProviderSchedule {
    availability: Vec<TimeRange>,
    max_daily_appointments: usize,
    /// Keyed by slot start; booked slots never overlap so starts are unique.
    booked: BTreeMap<Minute, Appointment>,
}

impl ProviderSchedule {
    fn new(availability: Vec<TimeRange>, max_daily_appointments: usize) -> Self {
        Self {
            availability,
            max_daily_appointments,
            booked: BTreeMap::new(),
        }
    }

    pub fn availability(&self) -> &[TimeRange] {
        &self.availability
    }

    pub fn max_daily_appointments(&self) -> usize {
        self.max_daily_appointments
    }

    pub fn booked_count(&self) -> usize {
        self.booked.len()
    }

    pub fn is_at_daily_limit(&self) -> bool {
        self.booked.len() >= self.max_daily_appointments
    }

    /// Booked appointments in ascending start order.
    pub fn appointments(&self) -> impl Iterator<Item = &Appointment> {
        self.booked.values()
    }

    /// `availability − booked`, sorted.
    pub fn free_intervals(&self) -> Vec<TimeRange> {
        time_range::subtract_all(&self.availability, self.booked.values().map(|a| &a.slot))
    }

    /// Number of disjoint free intervals at least `reference` minutes long.
    ///
    /// The daily cap is not folded in; a provider at its cap is skipped when
    /// re-validated under its lock.
    pub fn slot_count(&self, reference: Minute) -> usize {
        self.free_intervals()
            .iter()
            .filter(|free| free.len() >= reference)
            .count()
    }

    /// Insert a booking. The caller has already checked it fits in the free space.
    pub(crate) fn book(&mut self, appointment: Appointment) {
        debug_assert!(time_range::covered_by(&self.availability, &appointment.slot));
        debug_assert!(!self.booked.values().any(|a| a.slot.overlaps(&appointment.slot)));
        self.booked.insert(appointment.slot.start, appointment);
    }

    pub(crate) fn remove_by_request(&mut self, request_id: &str) -> Option<Appointment> {
        let start = self
            .booked
            .iter()
            .find(|(_, appointment)| appointment.request_id == request_id)
            .map(|(start, _)| *start)?;
        self.booked.remove(&start)
    }

    /// Swap in a new availability (and optionally a new cap), then keep
    /// bookings in ascending start order while they are still covered and
    /// under the cap. Returns the bookings that were dropped.
    pub(crate) fn replace_availability(
        &mut self,
        availability: Vec<TimeRange>,
        max_daily_appointments: Option<usize>,
    ) -> Vec<Appointment> {
        self.availability = availability;
        if let Some(limit) = max_daily_appointments {
            self.max_daily_appointments = limit;
        }

        let previous = std::mem::take(&mut self.booked);
        let mut cancelled = Vec::new();
        for (start, appointment) in previous {
            let covered = time_range::covered_by(&self.availability, &appointment.slot);
            if covered && self.booked.len() < self.max_daily_appointments {
                self.booked.insert(start, appointment);
            } else {
                cancelled.push(appointment);
            }
        }
        cancelled
    }
}

#[derive(Debug)]
pub struct Provider {
    id: ProviderId,
    schedule: Mutex<ProviderSchedule>,
}

impl Provider {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Acquire this provider's lock. A poisoned lock is recovered: every
    /// mutation of [`ProviderSchedule`] completes before it can panic.
    pub fn lock(&self) -> MutexGuard<'_, ProviderSchedule> {
        self.schedule.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self, reference: Minute) -> ProviderSnapshot {
        let schedule = self.lock();
        ProviderSnapshot {
            id: self.id.clone(),
            availability: schedule.availability.clone(),
            free_intervals: schedule.free_intervals(),
            appointments: schedule.appointments().cloned().collect(),
            max_daily_appointments: schedule.max_daily_appointments,
            slot_count: schedule.slot_count(reference),
        }
    }
}

/// Owner of all provider and appointment records.
pub struct ProviderRegistry {
    providers: RwLock<HashMap<ProviderId, Arc<Provider>>>,
    /// Request id -> owning provider; `None` while an allocation is in flight.
    requests: Mutex<HashMap<RequestId, Option<ProviderId>>>,
    index: Arc<SlotIndex>,
}

impl ProviderRegistry {
    pub fn new(index: Arc<SlotIndex>) -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
            requests: Mutex::new(HashMap::new()),
            index,
        }
    }

    pub fn slot_index(&self) -> &Arc<SlotIndex> {
        &self.index
    }

    pub fn add_provider(
        &self,
        id: &str,
        availability: &[TimeRange],
        max_daily_appointments: usize,
    ) -> Result<Arc<Provider>, SchedulingError> {
        let availability = time_range::normalize(availability).map_err(|e| {
            warn!("Rejected availability for provider {}: {}", id, e);
            SchedulingError::from(e)
        })?;

        let provider = {
            let mut providers = self.providers.write().unwrap_or_else(PoisonError::into_inner);
            if providers.contains_key(id) {
                warn!("Provider {} already registered", id);
                return Err(SchedulingError::DuplicateProvider(id.to_string()));
            }
            let provider = Arc::new(Provider {
                id: id.to_string(),
                schedule: Mutex::new(ProviderSchedule::new(availability, max_daily_appointments)),
            });
            providers.insert(id.to_string(), provider.clone());
            provider
        };

        {
            let schedule = provider.lock();
            self.index
                .update_count(id, schedule.slot_count(self.index.reference_minutes()));
        }

        info!("Provider {} added (max {} per day)", id, max_daily_appointments);
        Ok(provider)
    }

    pub fn get_provider(&self, id: &str) -> Result<Arc<Provider>, SchedulingError> {
        self.providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| SchedulingError::ProviderNotFound(id.to_string()))
    }

    /// Clone of the provider handles; the map lock is released on return.
    pub fn providers(&self) -> Vec<Arc<Provider>> {
        self.providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// All booked appointments, ordered by start, provider and request id.
    ///
    /// Each provider is read under its own lock in turn; the result is not
    /// an atomic cut across providers.
    pub fn list_appointments(&self) -> Vec<Appointment> {
        let mut appointments: Vec<Appointment> = self
            .providers()
            .iter()
            .flat_map(|provider| provider.lock().appointments().cloned().collect::<Vec<_>>())
            .collect();
        appointments.sort_by(|a, b| {
            (a.slot.start, &a.provider_id, &a.request_id)
                .cmp(&(b.slot.start, &b.provider_id, &b.request_id))
        });
        appointments
    }

    /// Recompute the index entry for a provider whose lock the caller holds.
    pub(crate) fn refresh_index(&self, provider_id: &str, schedule: &ProviderSchedule) {
        self.index
            .update_count(provider_id, schedule.slot_count(self.index.reference_minutes()));
    }

    fn requests(&self) -> MutexGuard<'_, HashMap<RequestId, Option<ProviderId>>> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reserve a request id for an allocation attempt.
    pub(crate) fn claim_request(&self, request_id: &str) -> Result<(), SchedulingError> {
        let mut requests = self.requests();
        if requests.contains_key(request_id) {
            return Err(SchedulingError::DuplicateRequest(request_id.to_string()));
        }
        requests.insert(request_id.to_string(), None);
        debug!("Claimed request id {}", request_id);
        Ok(())
    }

    pub(crate) fn confirm_request(&self, request_id: &str, provider_id: &str) {
        self.requests()
            .insert(request_id.to_string(), Some(provider_id.to_string()));
    }

    pub(crate) fn release_request(&self, request_id: &str) {
        self.requests().remove(request_id);
    }

    /// Provider currently holding the appointment for `request_id`.
    pub fn request_owner(&self, request_id: &str) -> Option<ProviderId> {
        self.requests().get(request_id).cloned().flatten()
    }
}
