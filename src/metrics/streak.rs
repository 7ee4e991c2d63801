//! Consecutive-day workout streak.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};

use crate::social::types::Post;

/// Count consecutive calendar days with at least one workout, ending today
/// or yesterday. A lapsed day resets the streak to zero; the check happens
/// at read time, there is no background job.
///
/// Only posts with a structured timestamp participate.
pub fn current_streak(posts: &[Post], today: NaiveDate) -> u32 {
    let dates: BTreeSet<NaiveDate> = posts
        .iter()
        .filter_map(|p| p.created_at)
        .map(|ts| ts.date_naive())
        .collect();

    let mut recent = dates.iter().rev();
    let latest = match recent.next() {
        Some(d) => *d,
        None => return 0,
    };

    let yesterday = today - Duration::days(1);
    if latest != today && latest != yesterday {
        return 0;
    }

    let mut streak = 1;
    let mut cursor = latest;
    for date in recent {
        if *date == cursor - Duration::days(1) {
            streak += 1;
            cursor = *date;
        } else {
            break;
        }
    }
    streak
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::social::types::{Intensity, UserRef};
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn post_on(author: &UserRef, y: i32, m: u32, d: u32) -> Post {
        Post {
            id: Uuid::new_v4(),
            author: author.clone(),
            created_at: Some(Utc.with_ymd_and_hms(y, m, d, 9, 30, 0).unwrap()),
            legacy_date: None,
            activity: "Gym".to_string(),
            duration_min: 45,
            intensity: Intensity::Moderate,
            weight_notes: None,
            sets_notes: None,
            image_url: None,
            likes: 0,
            liked_by_me: false,
            comments: Vec::new(),
            xp: 50,
        }
    }

    fn author() -> UserRef {
        UserRef {
            id: Uuid::new_v4(),
            name: "Runner".to_string(),
            avatar_url: None,
        }
    }

    #[test]
    fn no_posts_means_zero() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 12).unwrap();
        assert_eq!(current_streak(&[], today), 0);
    }

    #[test]
    fn three_consecutive_days_ending_today() {
        let a = author();
        let posts = vec![
            post_on(&a, 2025, 6, 12),
            post_on(&a, 2025, 6, 11),
            post_on(&a, 2025, 6, 10),
        ];
        let today = NaiveDate::from_ymd_opt(2025, 6, 12).unwrap();
        assert_eq!(current_streak(&posts, today), 3);
    }

    #[test]
    fn streak_may_end_yesterday() {
        let a = author();
        let posts = vec![post_on(&a, 2025, 6, 11), post_on(&a, 2025, 6, 10)];
        let today = NaiveDate::from_ymd_opt(2025, 6, 12).unwrap();
        assert_eq!(current_streak(&posts, today), 2);
    }

    #[test]
    fn lapsed_streak_resets_to_zero() {
        let a = author();
        // Five consecutive days, but the most recent is two days ago.
        let posts = vec![
            post_on(&a, 2025, 6, 10),
            post_on(&a, 2025, 6, 9),
            post_on(&a, 2025, 6, 8),
            post_on(&a, 2025, 6, 7),
            post_on(&a, 2025, 6, 6),
        ];
        let today = NaiveDate::from_ymd_opt(2025, 6, 12).unwrap();
        assert_eq!(current_streak(&posts, today), 0);
    }

    #[test]
    fn gap_stops_the_run() {
        let a = author();
        let posts = vec![
            post_on(&a, 2025, 6, 12),
            post_on(&a, 2025, 6, 11),
            post_on(&a, 2025, 6, 9),
            post_on(&a, 2025, 6, 8),
        ];
        let today = NaiveDate::from_ymd_opt(2025, 6, 12).unwrap();
        assert_eq!(current_streak(&posts, today), 2);
    }

    #[test]
    fn same_day_posts_count_once() {
        let a = author();
        let posts = vec![
            post_on(&a, 2025, 6, 12),
            post_on(&a, 2025, 6, 12),
            post_on(&a, 2025, 6, 11),
        ];
        let today = NaiveDate::from_ymd_opt(2025, 6, 12).unwrap();
        assert_eq!(current_streak(&posts, today), 2);
    }
}
