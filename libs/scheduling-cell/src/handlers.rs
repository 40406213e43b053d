use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};
use tracing::info;

use shared_models::error::AppError;
use shared_utils::time::{format_hhmm, parse_hhmm};

use crate::models::{
    AllocationRequest, Appointment, CreateProviderRequest, ScheduleAppointmentRequest,
    TimeSlotPayload, UpdateAvailabilityRequest,
};
use crate::services::SchedulingEngine;
use crate::time_range::TimeRange;

fn parse_slot(payload: &TimeSlotPayload) -> Result<TimeRange, AppError> {
    let start = parse_hhmm(&payload.start).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let end = parse_hhmm(&payload.end).map_err(|e| AppError::BadRequest(e.to_string()))?;
    Ok(TimeRange::new(start, end))
}

fn parse_slots(payloads: &[TimeSlotPayload]) -> Result<Vec<TimeRange>, AppError> {
    payloads.iter().map(parse_slot).collect()
}

fn slot_json(slot: &TimeRange) -> Value {
    json!({
        "start": format_hhmm(slot.start),
        "end": format_hhmm(slot.end)
    })
}

fn appointment_json(appointment: &Appointment) -> Value {
    json!({
        "request_id": appointment.request_id,
        "provider_id": appointment.provider_id,
        "time_slot": slot_json(&appointment.slot)
    })
}

/// Register a provider with its availability and daily cap
pub async fn add_provider(
    State(engine): State<Arc<SchedulingEngine>>,
    Json(request): Json<CreateProviderRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    info!("Add provider request: {}", request.id);

    if request.id.trim().is_empty() {
        return Err(AppError::BadRequest("Provider id must not be empty".to_string()));
    }
    let availability = parse_slots(&request.availability)?;

    engine.add_provider(&request.id, &availability, request.max_daily_appointments)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Provider added successfully.",
            "id": request.id
        })),
    ))
}

pub async fn get_provider(
    State(engine): State<Arc<SchedulingEngine>>,
    Path(provider_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let snapshot = engine.get_provider(&provider_id)?;

    Ok(Json(json!({
        "id": snapshot.id,
        "availability": snapshot.availability.iter().map(slot_json).collect::<Vec<_>>(),
        "free_intervals": snapshot.free_intervals.iter().map(slot_json).collect::<Vec<_>>(),
        "appointments": snapshot.appointments.iter().map(appointment_json).collect::<Vec<_>>(),
        "max_daily_appointments": snapshot.max_daily_appointments,
        "slot_count": snapshot.slot_count
    })))
}

/// Replace a provider's availability, cancelling appointments that no longer fit
pub async fn update_availability(
    State(engine): State<Arc<SchedulingEngine>>,
    Path(provider_id): Path<String>,
    Json(request): Json<UpdateAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    info!("Availability update for provider: {}", provider_id);

    let availability = parse_slots(&request.availability)?;
    let cancelled =
        engine.update_availability(&provider_id, &availability, request.max_daily_appointments)?;

    Ok(Json(json!({
        "message": "Availability updated, affected appointments cancelled.",
        "cancelled": cancelled.iter().map(appointment_json).collect::<Vec<_>>()
    })))
}

/// Schedule an appointment, honouring an explicit provider preference if given
pub async fn schedule_appointment(
    State(engine): State<Arc<SchedulingEngine>>,
    Json(request): Json<ScheduleAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    info!("Schedule request: {}", request.id);

    if request.id.trim().is_empty() {
        return Err(AppError::BadRequest("Request id must not be empty".to_string()));
    }
    if request.duration == 0 {
        return Err(AppError::BadRequest("Duration must be greater than zero".to_string()));
    }
    let preferred_range = parse_slot(&request.preferred_range)?;
    if !preferred_range.is_valid() {
        return Err(AppError::BadRequest(
            "Preferred range must start before it ends".to_string(),
        ));
    }

    let mut allocation = AllocationRequest::new(request.id, preferred_range, request.duration);
    if let Some(provider_id) = request.preferred_provider {
        allocation = allocation.with_provider(provider_id);
    }

    let appointment = engine.schedule(&allocation)?;

    Ok((StatusCode::CREATED, Json(appointment_json(&appointment))))
}

pub async fn list_appointments(
    State(engine): State<Arc<SchedulingEngine>>,
) -> Json<Value> {
    let appointments = engine.list_appointments();

    Json(json!({
        "scheduled": appointments.iter().map(appointment_json).collect::<Vec<_>>()
    }))
}

pub async fn cancel_appointment(
    State(engine): State<Arc<SchedulingEngine>>,
    Path(request_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    info!("Cancel request: {}", request_id);

    let appointment = engine.cancel_appointment(&request_id)?;

    Ok(Json(json!({
        "message": "Appointment cancelled.",
        "appointment": appointment_json(&appointment)
    })))
}
