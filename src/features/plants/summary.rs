//! Headline shown above the saved plant list.

use super::models::Plant;
use chrono::{DateTime, Utc};

/// Shown when nothing has been saved yet
pub const EMPTY_GARDEN_HINT: &str =
    "Já que ainda não tem plantinhas aqui, porque não se hidratar? Beba água! 🥤";

/// Summarize the next watering for plants already sorted by reminder time
pub fn watering_summary(plants: &[Plant], now: DateTime<Utc>) -> String {
    match plants.first() {
        Some(next) => format!(
            "Não esqueça de regar a {} em {}.",
            next.name,
            humanize_distance(next.date_time_notification, now)
        ),
        None => EMPTY_GARDEN_HINT.to_string(),
    }
}

const MINUTES_IN_DAY: i64 = 1440;
const MINUTES_IN_MONTH: i64 = 43200;

fn plural(count: i64, singular: &str, plural: &str) -> String {
    format!("{count} {}", if count == 1 { singular } else { plural })
}

/// Divide and round half up, for non-negative values
fn rounded(value: i64, by: i64) -> i64 {
    (value + by / 2) / by
}

/// Portuguese distance between two instants, regardless of order.
///
/// Follows the usual "time ago" buckets: whole minutes below 45, then
/// rounded hours, days and months with a "cerca de" qualifier where the
/// figure is approximate. Months count as 30 days.
pub fn humanize_distance(a: DateTime<Utc>, b: DateTime<Utc>) -> String {
    let minutes = rounded((a - b).num_seconds().abs(), 60);

    if minutes == 0 {
        "menos de um minuto".to_string()
    } else if minutes < 45 {
        plural(minutes, "minuto", "minutos")
    } else if minutes < 90 {
        "cerca de 1 hora".to_string()
    } else if minutes < MINUTES_IN_DAY {
        format!("cerca de {}", plural(rounded(minutes, 60), "hora", "horas"))
    } else if minutes < 2520 {
        "1 dia".to_string()
    } else if minutes < MINUTES_IN_MONTH {
        plural(rounded(minutes, MINUTES_IN_DAY), "dia", "dias")
    } else if minutes < 2 * MINUTES_IN_MONTH {
        let months = rounded(minutes, MINUTES_IN_MONTH);
        format!("cerca de {}", plural(months, "mês", "meses"))
    } else {
        let months = minutes / MINUTES_IN_MONTH;
        if months < 12 {
            return plural(rounded(minutes, MINUTES_IN_MONTH), "mês", "meses");
        }
        let years = months / 12;
        match months % 12 {
            0..=2 => format!("cerca de {}", plural(years, "ano", "anos")),
            3..=8 => format!("mais de {}", plural(years, "ano", "anos")),
            _ => format!("quase {}", plural(years + 1, "ano", "anos")),
        }
    }
}
