use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_cell::{appointment_routes, availability_routes, AppointmentState};

pub fn create_router(state: Arc<AppointmentState>) -> Router {
    let business = state.settings.business_name.clone();

    Router::new()
        .route("/", get(move || async move { format!("{} booking API is running!", business) }))
        .nest("/availability", availability_routes(state.clone()))
        .nest("/appointments", appointment_routes(state))
}
