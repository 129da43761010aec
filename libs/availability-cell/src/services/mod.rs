pub mod availability;
pub mod calendar;
pub mod conflict;
pub mod slots;

pub use availability::AvailabilityService;
pub use calendar::{CalendarSettings, WorkingHoursTable};
pub use conflict::ConflictChecker;
pub use slots::{generate_slots, SlotGenerator};
