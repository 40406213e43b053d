use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::error::SchedulingError;
use crate::models::Appointment;
use crate::services::registry::ProviderRegistry;
use crate::time_range::{self, TimeRange};

pub struct RescheduleService {
    registry: Arc<ProviderRegistry>,
}

impl RescheduleService {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    /// Replace a provider's availability and cancel every booking that no
    /// longer fits. Bookings are kept in ascending start order, so when the
    /// daily cap binds the later appointments are the ones cancelled.
    #[instrument(skip(self, new_availability))]
    pub fn update_availability(
        &self,
        provider_id: &str,
        new_availability: &[TimeRange],
        max_daily_appointments: Option<usize>,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let availability = time_range::normalize(new_availability).map_err(|e| {
            warn!("Rejected availability update for provider {}: {}", provider_id, e);
            SchedulingError::from(e)
        })?;
        let provider = self.registry.get_provider(provider_id)?;

        let mut schedule = provider.lock();
        let cancelled = schedule.replace_availability(availability, max_daily_appointments);
        for appointment in &cancelled {
            self.registry.release_request(&appointment.request_id);
        }
        self.registry.refresh_index(provider_id, &schedule);
        drop(schedule);

        info!(
            "Availability updated for provider {}, {} appointment(s) cancelled",
            provider_id,
            cancelled.len()
        );
        Ok(cancelled)
    }

    /// Cancel the appointment booked for `request_id`, freeing its slot.
    #[instrument(skip(self))]
    pub fn cancel_appointment(&self, request_id: &str) -> Result<Appointment, SchedulingError> {
        let not_found = || SchedulingError::AppointmentNotFound(request_id.to_string());

        let provider_id = self.registry.request_owner(request_id).ok_or_else(not_found)?;
        let provider = self.registry.get_provider(&provider_id)?;

        let mut schedule = provider.lock();
        // The booking may have been dropped by an availability update since
        // the ledger was read.
        let appointment = schedule.remove_by_request(request_id).ok_or_else(not_found)?;
        self.registry.release_request(request_id);
        self.registry.refresh_index(&provider_id, &schedule);
        drop(schedule);

        info!("Cancelled appointment for request {} with provider {}", request_id, provider_id);
        Ok(appointment)
    }
}
