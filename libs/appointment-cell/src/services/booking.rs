// libs/appointment-cell/src/services/booking.rs
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use rand::Rng;
use regex::Regex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use availability_cell::models::{AppointmentType, DayAvailability, SlotWindow, TimeSlot};
use availability_cell::services::AvailabilityService;

use crate::models::{
    Appointment, AppointmentError, AppointmentSearchQuery, AppointmentStatus,
    BookAppointmentRequest, BookingConfirmation, ClientInfo,
};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::state::AppointmentState;

const CONFIRMATION_CODE_LENGTH: usize = 8;
const CONFIRMATION_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const MAX_NAME_LENGTH: usize = 100;

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok())
        .as_ref()
}

fn phone_regex() -> Option<&'static Regex> {
    static PHONE: OnceLock<Option<Regex>> = OnceLock::new();
    PHONE
        .get_or_init(|| Regex::new(r"^\+?[0-9][0-9\s\-\.\(\)]{5,19}$").ok())
        .as_ref()
}

fn is_match(pattern: Option<&Regex>, value: &str) -> bool {
    pattern.is_some_and(|re| re.is_match(value))
}

pub fn generate_confirmation_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CONFIRMATION_CODE_LENGTH)
        .map(|_| CONFIRMATION_CODE_CHARSET[rng.gen_range(0..CONFIRMATION_CODE_CHARSET.len())] as char)
        .collect()
}

pub fn validate_client_info(client: &ClientInfo) -> Result<(), AppointmentError> {
    let name = client.name.trim();
    if name.is_empty() {
        return Err(AppointmentError::ValidationError("Client name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AppointmentError::ValidationError(format!(
            "Client name must be at most {} characters",
            MAX_NAME_LENGTH
        )));
    }

    let email = client.email.trim();
    if email.len() > 254 || !is_match(email_regex(), email) {
        return Err(AppointmentError::ValidationError(format!(
            "Invalid email address: {}",
            client.email
        )));
    }

    if let Some(phone) = client.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        if !is_match(phone_regex(), phone) {
            return Err(AppointmentError::ValidationError(format!(
                "Invalid phone number: {}",
                phone
            )));
        }
    }

    Ok(())
}

pub struct AppointmentBookingService {
    state: Arc<AppointmentState>,
    availability: AvailabilityService,
    lifecycle: AppointmentLifecycleService,
}

impl AppointmentBookingService {
    pub fn new(state: &Arc<AppointmentState>) -> Self {
        Self {
            state: Arc::clone(state),
            availability: AvailabilityService::new(Arc::clone(&state.settings)),
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    // ==============================================================================
    // AVAILABILITY
    // ==============================================================================

    pub fn list_appointment_types(&self) -> Vec<AppointmentType> {
        self.state
            .settings
            .appointment_types
            .iter()
            .filter(|t| t.is_active)
            .cloned()
            .collect()
    }

    pub async fn get_available_slots(
        &self,
        date: NaiveDate,
        appointment_type_id: &str,
    ) -> Result<Vec<TimeSlot>, AppointmentError> {
        let snapshot = self.state.store.list().await?;
        Ok(self
            .availability
            .get_available_slots(date, appointment_type_id, &snapshot)?)
    }

    /// Next slot that `book_appointment` would accept at `now`: never earlier
    /// than the type's minimum notice, never past its booking horizon.
    pub async fn find_next_available_slot(
        &self,
        from: NaiveDateTime,
        appointment_type_id: &str,
        max_search_days: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<TimeSlot>, AppointmentError> {
        let appointment_type = self.availability.resolve_type(appointment_type_id)?;
        let settings = &self.state.settings;
        let local_now = settings.local_now(now);

        let earliest = local_now + Duration::hours(settings.min_advance_hours_for(appointment_type));
        let latest = local_now + Duration::days(settings.max_advance_days_for(appointment_type));

        let snapshot = self.state.store.list().await?;
        let slot = self.availability.find_next_available_slot(
            from.max(earliest),
            appointment_type_id,
            &snapshot,
            max_search_days,
        )?;

        Ok(slot.filter(|s| s.start_time <= latest))
    }

    pub async fn get_available_days(
        &self,
        from: NaiveDate,
        days: i64,
        appointment_type_id: &str,
    ) -> Result<Vec<DayAvailability>, AppointmentError> {
        let snapshot = self.state.store.list().await?;
        Ok(self
            .availability
            .get_available_days(from, days, appointment_type_id, &snapshot)?)
    }

    // ==============================================================================
    // BOOKING
    // ==============================================================================

    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
        now: DateTime<Utc>,
    ) -> Result<BookingConfirmation, AppointmentError> {
        debug!(
            "Booking {} appointment at {}",
            request.appointment_type_id, request.start_time
        );

        let appointment_type = self
            .availability
            .resolve_type(&request.appointment_type_id)?
            .clone();

        if !appointment_type.is_active || !appointment_type.allow_online_booking {
            warn!("Rejected booking for non-bookable type {}", appointment_type.id);
            return Err(AppointmentError::AppointmentTypeUnavailable(appointment_type.id));
        }

        validate_client_info(&request.client_info)?;
        self.validate_timing(&appointment_type, request.start_time, now)?;

        let window = SlotWindow::new(request.start_time, appointment_type.duration_minutes);

        let _guard = self.state.write_lock().lock().await;
        let existing = self.state.store.list().await?;

        if !self
            .availability
            .is_window_bookable(&window, &appointment_type, &existing)
        {
            warn!("Slot {} - {} is not available", window.start_time, window.end_time);
            return Err(AppointmentError::SlotNotAvailable);
        }

        let status = self.lifecycle.initial_status(
            appointment_type.requires_approval,
            self.state.settings.auto_confirm_bookings,
        );

        let client_info = ClientInfo {
            name: request.client_info.name.trim().to_string(),
            email: request.client_info.email.trim().to_string(),
            ..request.client_info
        };

        let appointment = Appointment {
            id: Uuid::new_v4(),
            title: format!("{} - {}", appointment_type.name, client_info.name),
            description: request.notes.clone(),
            start_time: window.start_time,
            end_time: window.end_time,
            status,
            appointment_type_id: appointment_type.id.clone(),
            client_info,
            notes: request.notes,
            cancellation_reason: None,
            price: appointment_type.price,
            created_at: now,
            updated_at: now,
        };

        self.state.store.insert(appointment.clone()).await?;
        info!(
            "Appointment {} booked for {} ({})",
            appointment.id, appointment.start_time, appointment.status
        );

        Ok(BookingConfirmation {
            confirmation_code: generate_confirmation_code(),
            reschedule_url: format!("/appointments/{}/reschedule", appointment.id),
            cancel_url: format!("/appointments/{}/cancel", appointment.id),
            meeting_details: "Meeting details will be sent by email".to_string(),
            appointment,
        })
    }

    // ==============================================================================
    // QUERIES
    // ==============================================================================

    pub async fn get_appointment(&self, id: Uuid) -> Result<Appointment, AppointmentError> {
        self.state
            .store
            .get(id)
            .await?
            .ok_or(AppointmentError::NotFound)
    }

    pub async fn list_appointments(
        &self,
        query: &AppointmentSearchQuery,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut appointments: Vec<Appointment> = self
            .state
            .store
            .list()
            .await?
            .into_iter()
            .filter(|a| query.matches(a))
            .collect();

        appointments.sort_by_key(|a| a.start_time);
        Ok(appointments)
    }

    // ==============================================================================
    // LIFECYCLE
    // ==============================================================================

    pub async fn update_status(
        &self,
        id: Uuid,
        new_status: AppointmentStatus,
        now: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        if new_status == AppointmentStatus::Rescheduled {
            return Err(AppointmentError::ValidationError(
                "Use the reschedule operation to move an appointment".to_string(),
            ));
        }
        self.transition(id, new_status, None, now).await
    }

    pub async fn cancel_appointment(
        &self,
        id: Uuid,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        self.transition(id, AppointmentStatus::Cancelled, reason, now).await
    }

    pub async fn reschedule_appointment(
        &self,
        id: Uuid,
        new_start_time: NaiveDateTime,
        now: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Rescheduling appointment {} to {}", id, new_start_time);

        let _guard = self.state.write_lock().lock().await;
        let mut appointment = self.get_appointment(id).await?;

        self.lifecycle
            .validate_status_transition(appointment.status, AppointmentStatus::Rescheduled)?;

        let appointment_type = self
            .availability
            .resolve_type(&appointment.appointment_type_id)?
            .clone();
        self.validate_timing(&appointment_type, new_start_time, now)?;

        let window = SlotWindow::new(new_start_time, appointment_type.duration_minutes);
        let others: Vec<Appointment> = self
            .state
            .store
            .list()
            .await?
            .into_iter()
            .filter(|a| a.id != id)
            .collect();

        if !self
            .availability
            .is_window_bookable(&window, &appointment_type, &others)
        {
            warn!("Cannot reschedule {}: {} is not available", id, new_start_time);
            return Err(AppointmentError::SlotNotAvailable);
        }

        let next_status = self.lifecycle.initial_status(
            appointment_type.requires_approval,
            self.state.settings.auto_confirm_bookings,
        );
        self.lifecycle
            .validate_status_transition(AppointmentStatus::Rescheduled, next_status)?;

        appointment.start_time = window.start_time;
        appointment.end_time = window.end_time;
        appointment.status = next_status;
        appointment.updated_at = now;

        self.state.store.update(appointment.clone()).await?;
        info!("Appointment {} moved to {} ({})", id, appointment.start_time, appointment.status);

        Ok(appointment)
    }

    async fn transition(
        &self,
        id: Uuid,
        new_status: AppointmentStatus,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        let _guard = self.state.write_lock().lock().await;
        let mut appointment = self.get_appointment(id).await?;

        self.lifecycle
            .validate_status_transition(appointment.status, new_status)?;

        appointment.status = new_status;
        if new_status == AppointmentStatus::Cancelled {
            appointment.cancellation_reason = reason;
        }
        appointment.updated_at = now;

        self.state.store.update(appointment.clone()).await?;
        info!("Appointment {} is now {}", id, new_status);

        Ok(appointment)
    }

    fn validate_timing(
        &self,
        appointment_type: &AppointmentType,
        start_time: NaiveDateTime,
        now: DateTime<Utc>,
    ) -> Result<(), AppointmentError> {
        let settings = &self.state.settings;
        let local_now = settings.local_now(now);

        let min_hours = settings.min_advance_hours_for(appointment_type);
        if start_time < local_now + Duration::hours(min_hours) {
            return Err(AppointmentError::InvalidTime(format!(
                "{} must be booked at least {} hours in advance",
                appointment_type.name, min_hours
            )));
        }

        let max_days = settings.max_advance_days_for(appointment_type);
        if start_time > local_now + Duration::days(max_days) {
            return Err(AppointmentError::InvalidTime(format!(
                "{} cannot be booked more than {} days ahead",
                appointment_type.name, max_days
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use shared_config::AppConfig;
    use availability_cell::services::CalendarSettings;

    use crate::services::store::MockAppointmentStore;

    fn state_with(store: MockAppointmentStore) -> Arc<AppointmentState> {
        let settings = CalendarSettings::load(&AppConfig::default()).unwrap();
        Arc::new(AppointmentState::new(Arc::new(settings), Arc::new(store)))
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0).unwrap()
    }

    fn request(hour: u32) -> BookAppointmentRequest {
        BookAppointmentRequest {
            appointment_type_id: "free-consultation".to_string(),
            start_time: NaiveDate::from_ymd_opt(2025, 9, 15)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            client_info: ClientInfo {
                name: "Ana Torres".to_string(),
                email: "ana@example.com".to_string(),
                ..ClientInfo::default()
            },
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let mut store = MockAppointmentStore::new();
        store
            .expect_list()
            .returning(|| Err(AppointmentError::DatabaseError("store offline".to_string())));

        let service = AppointmentBookingService::new(&state_with(store));
        let result = service
            .get_available_slots(NaiveDate::from_ymd_opt(2025, 9, 15).unwrap(), "free-consultation")
            .await;

        assert!(matches!(result, Err(AppointmentError::DatabaseError(_))));
    }

    #[tokio::test]
    async fn test_free_slot_is_written_once() {
        let mut store = MockAppointmentStore::new();
        store.expect_list().times(1).returning(|| Ok(vec![]));
        store.expect_insert().times(1).returning(|_| Ok(()));

        let service = AppointmentBookingService::new(&state_with(store));
        let confirmation = service.book_appointment(request(10), now()).await.unwrap();

        assert_eq!(confirmation.appointment.status, AppointmentStatus::Confirmed);
        assert_eq!(confirmation.confirmation_code.len(), CONFIRMATION_CODE_LENGTH);
        assert_eq!(confirmation.appointment.title, "Free Consultation - Ana Torres");
    }

    #[tokio::test]
    async fn test_invalid_request_never_touches_store() {
        let mut store = MockAppointmentStore::new();
        store.expect_list().never();
        store.expect_insert().never();

        let service = AppointmentBookingService::new(&state_with(store));
        let mut bad = request(10);
        bad.client_info.email = "not-an-email".to_string();

        let result = service.book_appointment(bad, now()).await;
        assert!(matches!(result, Err(AppointmentError::ValidationError(_))));
    }

    #[test]
    fn test_confirmation_code_charset() {
        let code = generate_confirmation_code();
        assert_eq!(code.len(), 8);
        assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_validation_patterns_compile() {
        assert!(email_regex().is_some());
        assert!(phone_regex().is_some());
        assert!(is_match(email_regex(), "ana@example.com"));
        assert!(!is_match(None, "ana@example.com"));
    }

    #[test]
    fn test_client_validation() {
        let mut client = ClientInfo {
            name: "  ".to_string(),
            email: "ana@example.com".to_string(),
            ..ClientInfo::default()
        };
        assert!(validate_client_info(&client).is_err());

        client.name = "Ana".to_string();
        assert!(validate_client_info(&client).is_ok());

        client.phone = Some("+57 300 123 4567".to_string());
        assert!(validate_client_info(&client).is_ok());

        client.phone = Some("call me".to_string());
        assert!(validate_client_info(&client).is_err());
    }
}
