// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, patch},
};

use crate::handlers;
use crate::state::AppointmentState;

pub fn appointment_routes(state: Arc<AppointmentState>) -> Router {
    Router::new()
        .route("/", post(handlers::book_appointment).get(handlers::list_appointments))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/status", patch(handlers::update_appointment_status))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .route("/{appointment_id}/reschedule", patch(handlers::reschedule_appointment))
        .with_state(state)
}

pub fn availability_routes(state: Arc<AppointmentState>) -> Router {
    Router::new()
        .route("/types", get(handlers::list_appointment_types))
        .route("/slots", get(handlers::get_available_slots))
        .route("/next", get(handlers::find_next_available_slot))
        .route("/days", get(handlers::get_available_days))
        .with_state(state)
}
