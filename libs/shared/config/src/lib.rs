use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub business_name: String,
    pub timezone: String,
    pub utc_offset_minutes: i32,
    pub slot_interval_minutes: i64,
    pub auto_confirm_bookings: bool,
    pub min_advance_booking_hours: i64,
    pub max_future_booking_days: i64,
    pub enforce_buffer: bool,
    pub calendar_config_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            business_name: "Booking".to_string(),
            timezone: "America/Bogota".to_string(),
            utc_offset_minutes: -300,
            slot_interval_minutes: 30,
            auto_confirm_bookings: true,
            min_advance_booking_hours: 24,
            max_future_booking_days: 60,
            enforce_buffer: false,
            calendar_config_path: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            host: env::var("HOST")
                .unwrap_or_else(|_| {
                    warn!("HOST not set, using default");
                    defaults.host.clone()
                }),
            port: parse_var("PORT", defaults.port),
            business_name: env::var("BUSINESS_NAME")
                .unwrap_or_else(|_| {
                    warn!("BUSINESS_NAME not set, using default");
                    defaults.business_name.clone()
                }),
            timezone: env::var("BUSINESS_TIMEZONE")
                .unwrap_or_else(|_| {
                    warn!("BUSINESS_TIMEZONE not set, using default");
                    defaults.timezone.clone()
                }),
            utc_offset_minutes: parse_var("BUSINESS_UTC_OFFSET_MINUTES", defaults.utc_offset_minutes),
            slot_interval_minutes: parse_var("SLOT_INTERVAL_MINUTES", defaults.slot_interval_minutes),
            auto_confirm_bookings: parse_var("AUTO_CONFIRM_BOOKINGS", defaults.auto_confirm_bookings),
            min_advance_booking_hours: parse_var("MIN_ADVANCE_BOOKING_HOURS", defaults.min_advance_booking_hours),
            max_future_booking_days: parse_var("MAX_FUTURE_BOOKING_DAYS", defaults.max_future_booking_days),
            enforce_buffer: parse_var("ENFORCE_BUFFER_TIME", defaults.enforce_buffer),
            calendar_config_path: env::var("CALENDAR_CONFIG_PATH").ok().map(PathBuf::from),
        };

        if config.calendar_config_path.is_none() {
            warn!("CALENDAR_CONFIG_PATH not set, using built-in working hours and appointment types");
        }

        config
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value {:?}, using default {:?}", name, raw, default);
            default
        }),
        Err(_) => {
            warn!("{} not set, using default {:?}", name, default);
            default
        }
    }
}
