//! Typed rows exchanged with the remote gateway.
//!
//! These mirror the backend tables (profiles, posts, likes, comments,
//! friendships, challenges, participants) plus the auth session. Mapping to
//! domain types happens in the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authenticated session returned by the auth provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub access_token: String,
}

/// Row of the `profiles` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub current_weight: Option<f32>,
    pub initial_weight: Option<f32>,
    pub height: Option<f32>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Partial profile update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_weight: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_weight: Option<f32>,
}

/// Comment row joined with its author profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_name: Option<String>,
    pub author_avatar: Option<String>,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Post row joined with author, likes, and comments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub author_name: Option<String>,
    pub author_avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub activity: String,
    pub duration_min: u32,
    pub intensity: String,
    pub weight: Option<String>,
    pub sets: Option<String>,
    pub image_url: Option<String>,
    pub likes_count: u32,
    /// Users who liked this post.
    pub liked_by: Vec<Uuid>,
    pub comments: Vec<CommentRecord>,
}

/// Insert payload for a new workout post.
#[derive(Debug, Clone, Serialize)]
pub struct NewPost {
    pub user_id: Uuid,
    pub activity: String,
    pub duration_min: u32,
    pub intensity: String,
    pub weight: Option<String>,
    pub sets: Option<String>,
    pub image_url: Option<String>,
}

/// Update payload for an existing post.
#[derive(Debug, Clone, Serialize)]
pub struct PostPatch {
    pub activity: String,
    pub duration_min: u32,
    pub intensity: String,
    pub weight: Option<String>,
    pub sets: Option<String>,
    pub image_url: Option<String>,
}

/// Friendship edge status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FriendshipStatus {
    Pending,
    Accepted,
}

impl FriendshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendshipStatus::Pending => "pending",
            FriendshipStatus::Accepted => "accepted",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(FriendshipStatus::Pending),
            "accepted" => Some(FriendshipStatus::Accepted),
            _ => None,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, FriendshipStatus::Accepted)
    }
}

/// Directed friendship edge (requester -> target).
///
/// At most one edge exists per ordered pair; two accepted edges between the
/// same pair represent a mutual friendship.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendshipRecord {
    pub user_id: Uuid,
    pub friend_id: Uuid,
    pub status: FriendshipStatus,
}

/// Challenge row joined with its creator and participant profiles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeRecord {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub creator: ProfileRecord,
    pub participants: Vec<ProfileRecord>,
}

/// Insert payload for a new challenge.
#[derive(Debug, Clone, Serialize)]
pub struct NewChallenge {
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub creator_id: Uuid,
}

/// Scalar update payload for a challenge. Participants are synced
/// separately via the participant operations.
#[derive(Debug, Clone, Serialize)]
pub struct ChallengePatch {
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}
