//! Remote data gateway.
//!
//! The backend is an external collaborator reached through a generic
//! query/command surface: filtered selects, counts, inserts, updates,
//! deletes, binary upload, and auth session operations. `HttpGateway` talks
//! to a hosted backend; `MemoryGateway` backs tests and demos.

pub mod http;
pub mod memory;
pub mod types;

use uuid::Uuid;

pub use http::HttpGateway;
pub use memory::MemoryGateway;
pub use types::{
    ChallengePatch, ChallengeRecord, CommentRecord, FriendshipRecord, FriendshipStatus,
    NewChallenge, NewPost, PostPatch, PostRecord, ProfilePatch, ProfileRecord, Session,
};

/// Gateway contract consumed by the application store.
///
/// Every operation is a single attempt; retry and timeout policy belong to
/// the transport, not to callers.
#[allow(async_fn_in_trait)]
pub trait RemoteGateway {
    // Session / auth
    async fn session(&self) -> Result<Option<Session>, GatewayError>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, GatewayError>;
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<Session, GatewayError>;
    async fn sign_out(&self) -> Result<(), GatewayError>;

    // Profiles
    async fn fetch_profiles(&self) -> Result<Vec<ProfileRecord>, GatewayError>;
    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<ProfileRecord>, GatewayError>;
    async fn upsert_profile(&self, profile: &ProfileRecord) -> Result<(), GatewayError>;
    async fn update_profile(&self, user_id: Uuid, patch: ProfilePatch)
        -> Result<(), GatewayError>;
    /// Number of posts owned by the user.
    async fn workout_count(&self, user_id: Uuid) -> Result<u32, GatewayError>;
    /// Number of posts owned by the user with a non-null image.
    async fn photo_count(&self, user_id: Uuid) -> Result<u32, GatewayError>;

    // Posts (joined with author, likes, comments; newest first)
    async fn fetch_posts(&self, authors: Option<&[Uuid]>)
        -> Result<Vec<PostRecord>, GatewayError>;
    async fn insert_post(&self, post: NewPost) -> Result<Uuid, GatewayError>;
    async fn update_post(&self, post_id: Uuid, patch: PostPatch) -> Result<(), GatewayError>;
    async fn delete_post(&self, post_id: Uuid) -> Result<(), GatewayError>;
    async fn insert_like(&self, post_id: Uuid, user_id: Uuid) -> Result<(), GatewayError>;
    async fn delete_like(&self, post_id: Uuid, user_id: Uuid) -> Result<(), GatewayError>;
    async fn insert_comment(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        text: &str,
    ) -> Result<Uuid, GatewayError>;

    // Friendships (queried by either endpoint)
    async fn friendships_from(&self, user_id: Uuid)
        -> Result<Vec<FriendshipRecord>, GatewayError>;
    async fn friendships_to(&self, user_id: Uuid) -> Result<Vec<FriendshipRecord>, GatewayError>;
    /// Insert a pending edge (requester -> target).
    async fn insert_friendship(&self, user_id: Uuid, friend_id: Uuid)
        -> Result<(), GatewayError>;
    /// Flip the (requester, target) edge to accepted.
    async fn accept_friendship(
        &self,
        requester_id: Uuid,
        target_id: Uuid,
    ) -> Result<(), GatewayError>;
    /// Delete the directed edge if it exists; deleting a missing edge is not
    /// an error.
    async fn delete_friendship(&self, user_id: Uuid, friend_id: Uuid)
        -> Result<(), GatewayError>;

    // Challenges (joined with creator and participants; newest first)
    async fn fetch_challenges(&self) -> Result<Vec<ChallengeRecord>, GatewayError>;
    async fn insert_challenge(&self, challenge: NewChallenge) -> Result<Uuid, GatewayError>;
    async fn update_challenge(
        &self,
        challenge_id: Uuid,
        patch: ChallengePatch,
    ) -> Result<(), GatewayError>;
    async fn delete_challenge(&self, challenge_id: Uuid) -> Result<(), GatewayError>;
    async fn challenge_participant_ids(
        &self,
        challenge_id: Uuid,
    ) -> Result<Vec<Uuid>, GatewayError>;
    async fn insert_participants(
        &self,
        challenge_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<(), GatewayError>;
    async fn remove_participants(
        &self,
        challenge_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<(), GatewayError>;

    // Binary storage
    /// Upload image bytes and return a public URL.
    async fn upload_image(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, GatewayError>;
}

/// Gateway errors.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(String),

    #[error("backend rejected request: {0}")]
    Backend(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("unexpected response: {0}")]
    Decode(String),
}
