// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use availability_cell::models::AvailabilityError;
use shared_models::error::AppError;

use crate::models::{
    AppointmentError, AppointmentSearchQuery, AppointmentStatus, BookAppointmentRequest,
    CancelAppointmentRequest, RescheduleAppointmentRequest, UpdateStatusRequest,
};
use crate::services::booking::AppointmentBookingService;
use crate::state::AppointmentState;

const DEFAULT_SEARCH_DAYS: i64 = 30;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub date: NaiveDate,
    pub appointment_type_id: String,
}

#[derive(Debug, Deserialize)]
pub struct NextSlotQuery {
    pub from: NaiveDateTime,
    pub appointment_type_id: String,
    pub max_days: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct DaysQuery {
    pub from: NaiveDate,
    pub days: i64,
    pub appointment_type_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AppointmentQueryParams {
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
    pub status: Option<AppointmentStatus>,
}

pub fn to_app_error(error: AppointmentError) -> AppError {
    match error {
        AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        AppointmentError::SlotNotAvailable => {
            AppError::Conflict("Appointment slot no longer available".to_string())
        }
        AppointmentError::InvalidStatusTransition { .. } => AppError::Conflict(error.to_string()),
        AppointmentError::AppointmentTypeUnavailable(_)
        | AppointmentError::InvalidTime(_)
        | AppointmentError::ValidationError(_) => AppError::ValidationError(error.to_string()),
        AppointmentError::DatabaseError(_) => AppError::Internal(error.to_string()),
        AppointmentError::Availability(inner) => match inner {
            AvailabilityError::UnknownAppointmentType(id) => {
                AppError::NotFound(format!("Appointment type not found: {}", id))
            }
            AvailabilityError::InvalidParameter(msg) => AppError::BadRequest(msg),
            AvailabilityError::Configuration(msg) => AppError::Internal(msg),
        },
    }
}

// ==============================================================================
// AVAILABILITY HANDLERS
// ==============================================================================

pub async fn list_appointment_types(
    State(state): State<Arc<AppointmentState>>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&state);
    let types = service.list_appointment_types();

    Ok(Json(json!({
        "success": true,
        "appointment_types": types,
        "total": types.len()
    })))
}

pub async fn get_available_slots(
    State(state): State<Arc<AppointmentState>>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&state);

    let slots = service
        .get_available_slots(query.date, &query.appointment_type_id)
        .await
        .map_err(to_app_error)?;
    let available = slots.iter().filter(|s| s.is_available).count();

    Ok(Json(json!({
        "success": true,
        "date": query.date,
        "appointment_type_id": query.appointment_type_id,
        "timezone": state.settings.timezone,
        "slots": slots,
        "total": slots.len(),
        "available": available
    })))
}

pub async fn find_next_available_slot(
    State(state): State<Arc<AppointmentState>>,
    Query(query): Query<NextSlotQuery>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&state);

    let slot = service
        .find_next_available_slot(
            query.from,
            &query.appointment_type_id,
            query.max_days.unwrap_or(DEFAULT_SEARCH_DAYS),
            Utc::now(),
        )
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "found": slot.is_some(),
        "slot": slot
    })))
}

pub async fn get_available_days(
    State(state): State<Arc<AppointmentState>>,
    Query(query): Query<DaysQuery>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&state);

    let days = service
        .get_available_days(query.from, query.days, &query.appointment_type_id)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "days": days
    })))
}

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

pub async fn book_appointment(
    State(state): State<Arc<AppointmentState>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&state);

    let confirmation = service
        .book_appointment(request, Utc::now())
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "booking": confirmation,
        "message": if confirmation.appointment.status == AppointmentStatus::Pending {
            "Appointment requested, awaiting confirmation"
        } else {
            "Appointment confirmed"
        }
    })))
}

pub async fn list_appointments(
    State(state): State<Arc<AppointmentState>>,
    Query(params): Query<AppointmentQueryParams>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&state);
    let query = AppointmentSearchQuery {
        from: params.from,
        to: params.to,
        status: params.status,
    };

    let appointments = service
        .list_appointments(&query)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "appointments": appointments,
        "total": appointments.len()
    })))
}

pub async fn get_appointment(
    State(state): State<Arc<AppointmentState>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&state);

    let appointment = service
        .get_appointment(appointment_id)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

pub async fn update_appointment_status(
    State(state): State<Arc<AppointmentState>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&state);

    let appointment = service
        .update_status(appointment_id, request.status, Utc::now())
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

pub async fn cancel_appointment(
    State(state): State<Arc<AppointmentState>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<CancelAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&state);

    let appointment = service
        .cancel_appointment(appointment_id, request.reason, Utc::now())
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment cancelled"
    })))
}

pub async fn reschedule_appointment(
    State(state): State<Arc<AppointmentState>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<RescheduleAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&state);

    let appointment = service
        .reschedule_appointment(appointment_id, request.new_start_time, Utc::now())
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment rescheduled"
    })))
}
