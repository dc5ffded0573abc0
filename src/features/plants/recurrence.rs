//! Watering recurrence and reminder delay math.

use super::models::{Frequency, Plant, RepeatEvery};
use chrono::{DateTime, Duration, Local, Utc};

/// Host schedulers reject near-immediate triggers
pub const MIN_DELAY_SECONDS: u64 = 60;

/// Gap added to the chosen reminder moment before scheduling.
///
/// Weekly plants get `floor(7 / times)` whole days. Every other unit adds
/// nothing, so the reminder fires at the chosen moment itself.
pub fn watering_interval(frequency: &Frequency) -> Duration {
    match frequency.repeat_every {
        RepeatEvery::Week => 7_i64
            .checked_div(i64::from(frequency.times))
            .map(Duration::days)
            .unwrap_or_else(Duration::zero),
        _ => Duration::zero(),
    }
}

/// The moment the next reminder for `plant` should fire
pub fn next_watering(plant: &Plant) -> DateTime<Utc> {
    plant.date_time_notification + watering_interval(&plant.frequency)
}

/// Seconds from `now` until `next`, rounded up, never below
/// [`MIN_DELAY_SECONDS`]. A `next` in the past gets the minimum.
pub fn delay_seconds(now: DateTime<Utc>, next: DateTime<Utc>) -> u64 {
    let millis = (next - now).num_milliseconds();
    if millis <= 0 {
        return MIN_DELAY_SECONDS;
    }
    let seconds = (millis as u64).div_ceil(1000);
    seconds.max(MIN_DELAY_SECONDS)
}

/// `HH:mm` of `at` in local time
pub fn format_hour(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M").to_string()
}
