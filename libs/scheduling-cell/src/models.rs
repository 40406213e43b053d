use serde::{Deserialize, Serialize};

use crate::time_range::{Minute, TimeRange};

pub type ProviderId = String;
pub type RequestId = String;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Appointment {
    pub request_id: RequestId,
    pub provider_id: ProviderId,
    pub slot: TimeRange,
}

/// Engine-level scheduling request. Times are minute offsets.
#[derive(Debug, Clone)]
pub struct AllocationRequest {
    pub request_id: RequestId,
    pub preferred_range: TimeRange,
    pub duration: Minute,
    pub preferred_provider: Option<ProviderId>,
}

impl AllocationRequest {
    pub fn new(request_id: impl Into<RequestId>, preferred_range: TimeRange, duration: Minute) -> Self {
        Self {
            request_id: request_id.into(),
            preferred_range,
            duration,
            preferred_provider: None,
        }
    }

    pub fn with_provider(mut self, provider_id: impl Into<ProviderId>) -> Self {
        self.preferred_provider = Some(provider_id.into());
        self
    }
}

/// Point-in-time view of one provider, taken under its lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderSnapshot {
    pub id: ProviderId,
    pub availability: Vec<TimeRange>,
    pub free_intervals: Vec<TimeRange>,
    pub appointments: Vec<Appointment>,
    pub max_daily_appointments: usize,
    pub slot_count: usize,
}

// Wire payloads. Times travel as HH:MM strings and are converted in the handlers.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlotPayload {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProviderRequest {
    pub id: ProviderId,
    pub availability: Vec<TimeSlotPayload>,
    pub max_daily_appointments: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleAppointmentRequest {
    pub id: RequestId,
    pub preferred_range: TimeSlotPayload,
    pub duration: Minute,
    pub preferred_provider: Option<ProviderId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAvailabilityRequest {
    pub availability: Vec<TimeSlotPayload>,
    pub max_daily_appointments: Option<usize>,
}
