//! When a race weekend's results count as final.
//!
//! Stewards' penalties and disqualifications can land after the flag, so
//! results are only scored once the first Monday 00:00 UTC after the race
//! has passed and the results feed has complete data.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use serde::Serialize;

/// First Monday 00:00 UTC strictly after the race start. A race held on a
/// Monday waits for the following Monday.
pub fn scoring_deadline(race_start: DateTime<Utc>) -> DateTime<Utc> {
    let weekday = race_start.weekday().num_days_from_monday() as i64;
    let days = if weekday == 0 { 7 } else { 7 - weekday };
    let monday = race_start.date_naive() + Duration::days(days);
    Utc.from_utc_datetime(&monday.and_hms_opt(0, 0, 0).unwrap_or_default())
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReadinessStatus {
    pub race_start: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub evaluated_at: DateTime<Utc>,
    pub hours_since_race: i64,
    pub past_deadline: bool,
    /// "Past deadline" once it has passed, otherwise e.g. "37h 12m".
    pub time_until_deadline: String,
    pub data_available: bool,
    pub ready_to_score: bool,
    pub status_message: String,
}

impl ReadinessStatus {
    pub fn evaluate(race_start: DateTime<Utc>, now: DateTime<Utc>, data_available: bool) -> Self {
        let deadline = scoring_deadline(race_start);
        let past_deadline = now >= deadline;
        let ready_to_score = past_deadline && data_available;

        let time_until_deadline = if past_deadline {
            "Past deadline".to_string()
        } else {
            let remaining = deadline - now;
            format!("{}h {}m", remaining.num_hours(), remaining.num_minutes() % 60)
        };

        let status_message = if ready_to_score {
            "Ready to score"
        } else if !past_deadline {
            "Waiting for Monday deadline"
        } else {
            "Past Monday deadline, waiting for results data"
        };

        Self {
            race_start,
            deadline,
            evaluated_at: now,
            hours_since_race: (now - race_start).num_hours(),
            past_deadline,
            time_until_deadline,
            data_available,
            ready_to_score,
            status_message: status_message.to_string(),
        }
    }
}
