//! Core types for the social fitness domain.
//!
//! Defines posts, comments, ranked users, challenges, and related enums.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// League tier for the ranking board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeagueTier {
    /// Entry league (level 1-5)
    Beginner,
    /// Middle league (level 6-10)
    Intermediate,
    /// Top league (level 11+)
    Advanced,
}

impl LeagueTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeagueTier::Beginner => "beginner",
            LeagueTier::Intermediate => "intermediate",
            LeagueTier::Advanced => "advanced",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "beginner" => Some(LeagueTier::Beginner),
            "intermediate" => Some(LeagueTier::Intermediate),
            "advanced" => Some(LeagueTier::Advanced),
            _ => None,
        }
    }

    /// Tier is a step function of computed level.
    pub fn from_level(level: u32) -> Self {
        if level > 10 {
            LeagueTier::Advanced
        } else if level > 5 {
            LeagueTier::Intermediate
        } else {
            LeagueTier::Beginner
        }
    }
}

/// Workout intensity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    Low,
    Moderate,
    High,
}

impl Intensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intensity::Low => "low",
            Intensity::Moderate => "moderate",
            Intensity::High => "high",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Intensity::Low),
            "moderate" => Some(Intensity::Moderate),
            "high" => Some(Intensity::High),
            _ => None,
        }
    }
}

/// Denormalized user copy embedded in posts, comments, and challenges.
///
/// The display name is materialized here rather than joined at render time;
/// renames must fan out to every copy (see `AppStore::rename_current_user`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: Uuid,
    pub name: String,
    pub avatar_url: Option<String>,
}

/// Comment on a workout post. Append-only; no edit or delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub author: UserRef,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A logged workout shown in the feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author: UserRef,
    /// Structured creation timestamp; absent only on pre-migration records.
    pub created_at: Option<DateTime<Utc>>,
    /// Free-text date carried by legacy records without `created_at`.
    pub legacy_date: Option<String>,
    pub activity: String,
    pub duration_min: u32,
    pub intensity: Intensity,
    pub weight_notes: Option<String>,
    pub sets_notes: Option<String>,
    pub image_url: Option<String>,
    pub likes: u32,
    /// Whether the viewing user has liked this post.
    pub liked_by_me: bool,
    pub comments: Vec<Comment>,
    /// Experience points awarded for the workout.
    pub xp: u32,
}

/// Profile projection used by the ranking board and profile views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedUser {
    pub id: Uuid,
    pub name: String,
    pub avatar_url: Option<String>,
    pub points: u32,
    /// Position within the currently displayed scope; 1-based, 0 = unranked.
    pub rank: u32,
    pub level: u32,
    pub tier: LeagueTier,
    pub workout_count: u32,
    pub photo_count: u32,
    pub is_current_user: bool,
    pub current_weight_kg: f32,
    pub initial_weight_kg: f32,
    pub height_cm: f32,
}

impl RankedUser {
    /// Body-mass index from current weight and height.
    pub fn bmi(&self) -> Option<f32> {
        if self.current_weight_kg <= 0.0 || self.height_cm <= 0.0 {
            return None;
        }
        let height_m = self.height_cm / 100.0;
        let bmi = self.current_weight_kg / (height_m * height_m);
        Some((bmi * 10.0).round() / 10.0)
    }
}

/// Derived challenge status; always recomputed from wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    Upcoming,
    Active,
    Completed,
}

impl ChallengeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeStatus::Upcoming => "upcoming",
            ChallengeStatus::Active => "active",
            ChallengeStatus::Completed => "completed",
        }
    }
}

/// Time-boxed challenge between friends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub creator: UserRef,
    /// Ordered participant set; the creator is always a member.
    pub participants: Vec<UserRef>,
}

impl Challenge {
    /// Status relative to `now`. The window runs from the start of the first
    /// day to the end of the last day, whatever time of day is stored.
    pub fn status(&self, now: DateTime<Utc>) -> ChallengeStatus {
        let start = start_of_day(self.starts_at);
        let end = end_of_day(self.ends_at);
        if now > end {
            ChallengeStatus::Completed
        } else if now >= start {
            ChallengeStatus::Active
        } else {
            ChallengeStatus::Upcoming
        }
    }

    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.participants.iter().any(|p| p.id == user_id)
    }
}

/// Midnight at the start of the timestamp's calendar day.
pub fn start_of_day(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// 23:59:59.999 of the timestamp's calendar day.
pub fn end_of_day(ts: DateTime<Utc>) -> DateTime<Utc> {
    let last = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    ts.date_naive().and_time(last).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn tier_step_function() {
        assert_eq!(LeagueTier::from_level(1), LeagueTier::Beginner);
        assert_eq!(LeagueTier::from_level(5), LeagueTier::Beginner);
        assert_eq!(LeagueTier::from_level(6), LeagueTier::Intermediate);
        assert_eq!(LeagueTier::from_level(10), LeagueTier::Intermediate);
        assert_eq!(LeagueTier::from_level(11), LeagueTier::Advanced);
    }

    #[test]
    fn intensity_round_trip() {
        assert_eq!(Intensity::from_str("moderate"), Some(Intensity::Moderate));
        assert_eq!(Intensity::from_str("extreme"), None);
        assert_eq!(Intensity::High.as_str(), "high");
    }

    #[test]
    fn bmi_rounds_to_one_decimal() {
        let user = RankedUser {
            id: Uuid::new_v4(),
            name: "Test".to_string(),
            avatar_url: None,
            points: 0,
            rank: 0,
            level: 1,
            tier: LeagueTier::Beginner,
            workout_count: 0,
            photo_count: 0,
            is_current_user: false,
            current_weight_kg: 70.0,
            initial_weight_kg: 72.0,
            height_cm: 175.0,
        };
        assert_eq!(user.bmi(), Some(22.9));
    }

    #[test]
    fn bmi_requires_weight_and_height() {
        let user = RankedUser {
            id: Uuid::new_v4(),
            name: "Test".to_string(),
            avatar_url: None,
            points: 0,
            rank: 0,
            level: 1,
            tier: LeagueTier::Beginner,
            workout_count: 0,
            photo_count: 0,
            is_current_user: false,
            current_weight_kg: 0.0,
            initial_weight_kg: 0.0,
            height_cm: 175.0,
        };
        assert_eq!(user.bmi(), None);
    }

    #[test]
    fn challenge_status_transitions() {
        let challenge = Challenge {
            id: Uuid::new_v4(),
            title: "Week of squats".to_string(),
            description: None,
            starts_at: Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap(),
            ends_at: Utc.with_ymd_and_hms(2025, 3, 16, 0, 0, 0).unwrap(),
            creator: UserRef {
                id: Uuid::new_v4(),
                name: "Creator".to_string(),
                avatar_url: None,
            },
            participants: Vec::new(),
        };

        let before = Utc.with_ymd_and_hms(2025, 3, 9, 12, 0, 0).unwrap();
        assert_eq!(challenge.status(before), ChallengeStatus::Upcoming);

        // Last day counts until the end of the day even though the stored
        // end timestamp is midnight.
        let last_day_evening = Utc.with_ymd_and_hms(2025, 3, 16, 21, 0, 0).unwrap();
        assert_eq!(challenge.status(last_day_evening), ChallengeStatus::Active);

        let after = Utc.with_ymd_and_hms(2025, 3, 17, 0, 0, 0).unwrap();
        assert_eq!(challenge.status(after), ChallengeStatus::Completed);
    }
}
