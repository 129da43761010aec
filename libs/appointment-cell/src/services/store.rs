// libs/appointment-cell/src/services/store.rs
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::models::{Appointment, AppointmentError};

/// Persistence seam for appointments. Appointments are never removed;
/// cancellation is a status change written through `update`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Snapshot of every stored appointment.
    async fn list(&self) -> Result<Vec<Appointment>, AppointmentError>;

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError>;

    async fn insert(&self, appointment: Appointment) -> Result<(), AppointmentError>;

    async fn update(&self, appointment: Appointment) -> Result<(), AppointmentError>;
}

#[derive(Default)]
pub struct InMemoryAppointmentStore {
    appointments: RwLock<Vec<Appointment>>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_appointments(appointments: Vec<Appointment>) -> Self {
        Self {
            appointments: RwLock::new(appointments),
        }
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn list(&self) -> Result<Vec<Appointment>, AppointmentError> {
        Ok(self.appointments.read().await.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError> {
        Ok(self
            .appointments
            .read()
            .await
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn insert(&self, appointment: Appointment) -> Result<(), AppointmentError> {
        let mut appointments = self.appointments.write().await;
        if appointments.iter().any(|a| a.id == appointment.id) {
            return Err(AppointmentError::DatabaseError(format!(
                "Appointment {} already exists",
                appointment.id
            )));
        }

        debug!("Storing appointment {}", appointment.id);
        appointments.push(appointment);
        Ok(())
    }

    async fn update(&self, appointment: Appointment) -> Result<(), AppointmentError> {
        let mut appointments = self.appointments.write().await;
        let existing = appointments
            .iter_mut()
            .find(|a| a.id == appointment.id)
            .ok_or(AppointmentError::NotFound)?;

        debug!("Updating appointment {}", appointment.id);
        *existing = appointment;
        Ok(())
    }
}
