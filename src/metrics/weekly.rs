//! Weekly workout histogram for the dashboard chart.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::social::types::Post;

pub const DAYS_PER_WEEK: usize = 7;

/// Count the viewing user's workouts per day of the current
/// Sunday-to-Saturday week, reordered Monday-first for display.
///
/// Posts without a structured timestamp fall back to their legacy free-text
/// date; unparseable text contributes nothing.
pub fn weekly_histogram(posts: &[Post], user_id: Uuid, now: DateTime<Utc>) -> [u32; DAYS_PER_WEEK] {
    let today = now.date_naive();
    let week_start = today - Duration::days(today.weekday().num_days_from_sunday() as i64);
    let week_end = week_start + Duration::days(6);

    let mut counts = [0u32; DAYS_PER_WEEK];
    for post in posts {
        if post.author.id != user_id {
            continue;
        }
        let date = match post.created_at {
            Some(ts) => ts.date_naive(),
            None => match post
                .legacy_date
                .as_deref()
                .and_then(|text| parse_legacy_date(text, today))
            {
                Some(d) => d,
                None => continue,
            },
        };
        if date >= week_start && date <= week_end {
            counts[date.weekday().num_days_from_monday() as usize] += 1;
        }
    }
    counts
}

/// Parse the free-text date of a legacy record. Tolerates localized tokens
/// for today/yesterday and `DD/MM/YYYY`.
fn parse_legacy_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let lower = text.to_lowercase();
    if lower.contains("hoje") || lower.contains("today") {
        return Some(today);
    }
    if lower.contains("ontem") || lower.contains("yesterday") {
        return Some(today - Duration::days(1));
    }

    let parts: Vec<&str> = text.split('/').collect();
    if parts.len() != 3 {
        return None;
    }
    let day: u32 = parts[0].trim().parse().ok()?;
    let month: u32 = parts[1].trim().parse().ok()?;
    let year: i32 = parts[2].trim().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
