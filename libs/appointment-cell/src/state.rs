// libs/appointment-cell/src/state.rs
use std::sync::Arc;

use tokio::sync::Mutex;

use availability_cell::services::CalendarSettings;

use crate::services::store::{AppointmentStore, InMemoryAppointmentStore};

/// Shared state handed to the appointment and availability routers.
pub struct AppointmentState {
    pub settings: Arc<CalendarSettings>,
    pub store: Arc<dyn AppointmentStore>,
    // Serialises check-then-write so two bookings cannot claim the same window.
    write_lock: Mutex<()>,
}

impl AppointmentState {
    pub fn new(settings: Arc<CalendarSettings>, store: Arc<dyn AppointmentStore>) -> Self {
        Self {
            settings,
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn in_memory(settings: CalendarSettings) -> Self {
        Self::new(Arc::new(settings), Arc::new(InMemoryAppointmentStore::new()))
    }

    pub(crate) fn write_lock(&self) -> &Mutex<()> {
        &self.write_lock
    }
}
