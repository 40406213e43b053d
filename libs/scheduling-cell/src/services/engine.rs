use std::sync::Arc;

use tracing::{debug, info};

use shared_config::AppConfig;

use crate::error::SchedulingError;
use crate::models::{AllocationRequest, Appointment, ProviderSnapshot};
use crate::services::allocation::AllocationService;
use crate::services::registry::ProviderRegistry;
use crate::services::rescheduler::RescheduleService;
use crate::services::slot_index::SlotIndex;
use crate::time_range::{Minute, TimeRange};

/// In-memory scheduling authority: one registry, one slot index, and the
/// services operating on them.
pub struct SchedulingEngine {
    registry: Arc<ProviderRegistry>,
    index: Arc<SlotIndex>,
    allocation: AllocationService,
    rescheduler: RescheduleService,
}

impl SchedulingEngine {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_reference_minutes(config.slot_reference_minutes)
    }

    pub fn with_reference_minutes(reference_minutes: Minute) -> Self {
        let index = Arc::new(SlotIndex::new(reference_minutes));
        let registry = Arc::new(ProviderRegistry::new(index.clone()));
        debug!("Scheduling engine created with {} minute reference slots", index.reference_minutes());

        Self {
            allocation: AllocationService::new(registry.clone()),
            rescheduler: RescheduleService::new(registry.clone()),
            registry,
            index,
        }
    }

    pub fn slot_index(&self) -> &SlotIndex {
        &self.index
    }

    pub fn add_provider(
        &self,
        id: &str,
        availability: &[TimeRange],
        max_daily_appointments: usize,
    ) -> Result<(), SchedulingError> {
        self.registry
            .add_provider(id, availability, max_daily_appointments)
            .map(|_| ())
    }

    pub fn get_provider(&self, id: &str) -> Result<ProviderSnapshot, SchedulingError> {
        let provider = self.registry.get_provider(id)?;
        Ok(provider.snapshot(self.index.reference_minutes()))
    }

    pub fn schedule(&self, request: &AllocationRequest) -> Result<Appointment, SchedulingError> {
        self.allocation.schedule(request)
    }

    pub fn update_availability(
        &self,
        provider_id: &str,
        new_availability: &[TimeRange],
        max_daily_appointments: Option<usize>,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        self.rescheduler
            .update_availability(provider_id, new_availability, max_daily_appointments)
    }

    pub fn cancel_appointment(&self, request_id: &str) -> Result<Appointment, SchedulingError> {
        self.rescheduler.cancel_appointment(request_id)
    }

    pub fn list_appointments(&self) -> Vec<Appointment> {
        self.registry.list_appointments()
    }

    /// Rebuild every slot index entry from provider state, one provider lock at a time.
    pub fn reindex(&self) {
        let providers = self.registry.providers();
        for provider in &providers {
            let schedule = provider.lock();
            self.registry.refresh_index(provider.id(), &schedule);
        }
        info!("Slot index rebuilt for {} providers", providers.len());
    }
}
