use thiserror::Error;

use shared_models::error::AppError;

use crate::models::{ProviderId, RequestId};
use crate::time_range::RangeSetError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    #[error("Provider {0} already exists")]
    DuplicateProvider(ProviderId),

    #[error("Request {0} already has an appointment")]
    DuplicateRequest(RequestId),

    #[error("Provider {0} not found")]
    ProviderNotFound(ProviderId),

    #[error("Appointment for request {0} not found")]
    AppointmentNotFound(RequestId),

    #[error("Invalid availability: {0}")]
    InvalidAvailability(#[from] RangeSetError),

    #[error("Invalid scheduling request: {0}")]
    InvalidRequest(String),

    #[error("No available time slot within preferred range for request {request_id}")]
    NoAvailability { request_id: RequestId },

    #[error("Provider {provider_id} reached its daily limit of {limit} appointments")]
    DailyLimitReached { provider_id: ProviderId, limit: usize },
}

impl SchedulingError {
    /// Failures that only rule out one candidate provider during selection.
    pub fn is_candidate_exhausted(&self) -> bool {
        matches!(
            self,
            SchedulingError::NoAvailability { .. } | SchedulingError::DailyLimitReached { .. }
        )
    }
}

impl From<SchedulingError> for AppError {
    fn from(error: SchedulingError) -> Self {
        let message = error.to_string();
        match error {
            SchedulingError::ProviderNotFound(_) | SchedulingError::AppointmentNotFound(_) => {
                AppError::NotFound(message)
            }
            SchedulingError::InvalidAvailability(_) => AppError::ValidationError(message),
            SchedulingError::InvalidRequest(_) => AppError::BadRequest(message),
            SchedulingError::DuplicateProvider(_)
            | SchedulingError::DuplicateRequest(_)
            | SchedulingError::NoAvailability { .. }
            | SchedulingError::DailyLimitReached { .. } => AppError::Conflict(message),
        }
    }
}
