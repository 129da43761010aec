// libs/appointment-cell/tests/handlers_test.rs
use std::sync::Arc;

use assert_matches::assert_matches;
use axum::{
    body::{to_bytes, Body},
    extract::{Path, Query, State},
    http::{Request, StatusCode},
    Json,
};
use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use appointment_cell::handlers::{self, AppointmentQueryParams, DaysQuery, SlotsQuery};
use appointment_cell::models::{
    BookAppointmentRequest, CancelAppointmentRequest, ClientInfo, UpdateStatusRequest,
    AppointmentStatus,
};
use appointment_cell::{appointment_routes, availability_routes, AppointmentState};
use availability_cell::models::CalendarFile;
use availability_cell::services::CalendarSettings;
use shared_config::AppConfig;
use shared_models::error::AppError;

fn test_state() -> Arc<AppointmentState> {
    let settings = CalendarSettings::from_parts(&AppConfig::default(), CalendarFile::default())
        .expect("default calendar is valid");
    Arc::new(AppointmentState::in_memory(settings))
}

/// A Monday comfortably inside every booking window relative to the real clock.
fn upcoming_monday() -> NaiveDate {
    let settings = CalendarSettings::from_parts(&AppConfig::default(), CalendarFile::default()).unwrap();
    let mut date = settings.local_now(Utc::now()).date() + Duration::days(3);
    while date.weekday() != Weekday::Mon {
        date += Duration::days(1);
    }
    date
}

fn booking_request(date: NaiveDate, hour: u32) -> BookAppointmentRequest {
    BookAppointmentRequest {
        appointment_type_id: "free-consultation".to_string(),
        start_time: date.and_hms_opt(hour, 0, 0).unwrap(),
        client_info: ClientInfo {
            name: "Maria Gomez".to_string(),
            email: "maria@example.com".to_string(),
            ..ClientInfo::default()
        },
        notes: None,
    }
}

#[tokio::test]
async fn test_list_appointment_types_handler() {
    let Json(body) = handlers::list_appointment_types(State(test_state()))
        .await
        .unwrap();

    assert_eq!(body["success"], true);
    assert_eq!(body["total"], 4);
    assert_eq!(body["appointment_types"][0]["id"], "free-consultation");
}

#[tokio::test]
async fn test_slots_handler_reports_counts() {
    let query = SlotsQuery {
        date: NaiveDate::from_ymd_opt(2025, 9, 15).unwrap(),
        appointment_type_id: "free-consultation".to_string(),
    };
    let Json(body) = handlers::get_available_slots(State(test_state()), Query(query))
        .await
        .unwrap();

    assert_eq!(body["total"], 17);
    assert_eq!(body["available"], 17);
    assert_eq!(body["slots"][0]["start_time"], "2025-09-15T09:00:00");
}

#[tokio::test]
async fn test_slots_handler_unknown_type_is_not_found() {
    let query = SlotsQuery {
        date: NaiveDate::from_ymd_opt(2025, 9, 15).unwrap(),
        appointment_type_id: "does-not-exist".to_string(),
    };
    let result = handlers::get_available_slots(State(test_state()), Query(query)).await;
    assert_matches!(result, Err(AppError::NotFound(_)));
}

#[tokio::test]
async fn test_days_handler_rejects_bad_range() {
    let query = DaysQuery {
        from: NaiveDate::from_ymd_opt(2025, 9, 15).unwrap(),
        days: 0,
        appointment_type_id: "free-consultation".to_string(),
    };
    let result = handlers::get_available_days(State(test_state()), Query(query)).await;
    assert_matches!(result, Err(AppError::BadRequest(_)));
}

#[tokio::test]
async fn test_book_then_conflict_then_cancel() {
    let state = test_state();
    let monday = upcoming_monday();

    let Json(body) = handlers::book_appointment(State(state.clone()), Json(booking_request(monday, 10)))
        .await
        .unwrap();
    assert_eq!(body["booking"]["appointment"]["status"], "confirmed");
    let id: Uuid = serde_json::from_value(body["booking"]["appointment"]["id"].clone()).unwrap();

    let again = handlers::book_appointment(State(state.clone()), Json(booking_request(monday, 10))).await;
    assert_matches!(again, Err(AppError::Conflict(_)));

    let Json(cancelled) = handlers::cancel_appointment(
        State(state.clone()),
        Path(id),
        Json(CancelAppointmentRequest { reason: Some("Travel".to_string()) }),
    )
    .await
    .unwrap();
    assert_eq!(cancelled["appointment"]["status"], "cancelled");

    // Cancelling twice is an invalid transition
    let twice = handlers::cancel_appointment(
        State(state.clone()),
        Path(id),
        Json(CancelAppointmentRequest { reason: None }),
    )
    .await;
    assert_matches!(twice, Err(AppError::Conflict(_)));

    let Json(listed) = handlers::list_appointments(
        State(state),
        Query(AppointmentQueryParams {
            from: None,
            to: None,
            status: Some(AppointmentStatus::Cancelled),
        }),
    )
    .await
    .unwrap();
    assert_eq!(listed["total"], 1);
}

#[tokio::test]
async fn test_status_handler_maps_errors() {
    let state = test_state();

    let missing = handlers::update_appointment_status(
        State(state.clone()),
        Path(Uuid::new_v4()),
        Json(UpdateStatusRequest { status: AppointmentStatus::Completed }),
    )
    .await;
    assert_matches!(missing, Err(AppError::NotFound(_)));

    let mut request = booking_request(upcoming_monday(), 11);
    request.client_info.email = "nope".to_string();
    let invalid = handlers::book_appointment(State(state), Json(request)).await;
    assert_matches!(invalid, Err(AppError::ValidationError(_)));
}

#[tokio::test]
async fn test_routes_through_router() {
    let state = test_state();
    let app = axum::Router::new()
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/availability", availability_routes(state));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/availability/slots?date=2025-09-19&appointment_type_id=free-consultation")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    // Friday closes at 17:00
    assert_eq!(body["total"], 15);

    let payload = json!({
        "appointment_type_id": "free-consultation",
        "start_time": format!("{}T14:00:00", upcoming_monday()),
        "client_info": { "name": "Luis Ortiz", "email": "luis@example.com" }
    });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/appointments")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/appointments/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_last_calendar_date_is_bad_request() {
    let app = availability_routes(test_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/days?from=%2B262142-12-31&days=3&appointment_type_id=free-consultation")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
