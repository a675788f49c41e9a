// Expiry formatting for tokens and credentials
use chrono::{DateTime, Utc};

pub fn format_time_remaining(expires_at: &DateTime<Utc>) -> String {
    format_remaining_at(expires_at, Utc::now())
}

fn format_remaining_at(expires_at: &DateTime<Utc>, now: DateTime<Utc>) -> String {
    if *expires_at <= now {
        return "EXPIRED".to_string();
    }

    let duration = (*expires_at - now).num_seconds();
    let hours = duration / 3600;
    let minutes = (duration % 3600) / 60;
    let seconds = duration % 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

pub fn is_expiring_soon(expires_at: &DateTime<Utc>, threshold_minutes: i64) -> bool {
    let now = Utc::now();
    let duration = (*expires_at - now).num_minutes();
    duration > 0 && duration < threshold_minutes
}
