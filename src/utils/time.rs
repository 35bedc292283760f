use chrono::{DateTime, Months, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}

/// Expiry for a paid plan: one year for `yearly`, one month otherwise.
/// Month arithmetic clamps to the last day (Jan 31 + 1 month = Feb 28/29).
pub fn plan_expiry(from: DateTime<Utc>, period: &str) -> DateTime<Utc> {
    let months = if period == "yearly" { 12 } else { 1 };
    from.checked_add_months(Months::new(months)).unwrap_or(from)
}
