use chrono::NaiveTime;

pub const LOADING_TIME_MINUTES: u64 = 20;
pub const UNLOADING_TIME_MINUTES: u64 = 20;
/// Grace period past the scheduled end within which a trip may still finish
pub const OVERTIME_ALLOWANCE_MINUTES: u64 = 50;
pub const DEFAULT_WORK_HOURS: f64 = 10.0;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const GOOGLE_MAPS_API_BASE_URL: &str = "https://maps.googleapis.com/maps/api";

/// Latest scheduled end regardless of work hours
pub fn hard_cutoff() -> NaiveTime {
    NaiveTime::from_hms_opt(17, 20, 0).expect("valid static hard cutoff")
}
