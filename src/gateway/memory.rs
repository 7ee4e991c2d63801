//! In-memory gateway used by tests and demos.
//!
//! Implements the full `RemoteGateway` contract against plain vectors, with
//! single-shot failure injection so optimistic-rollback paths can be
//! exercised deterministically.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::types::{
    ChallengePatch, ChallengeRecord, CommentRecord, FriendshipRecord, FriendshipStatus,
    NewChallenge, NewPost, PostPatch, PostRecord, ProfilePatch, ProfileRecord, Session,
};
use super::{GatewayError, RemoteGateway};

#[derive(Debug, Clone)]
struct StoredComment {
    id: Uuid,
    user_id: Uuid,
    text: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct StoredPost {
    id: Uuid,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    activity: String,
    duration_min: u32,
    intensity: String,
    weight: Option<String>,
    sets: Option<String>,
    image_url: Option<String>,
    likes: Vec<Uuid>,
    comments: Vec<StoredComment>,
}

#[derive(Debug, Clone)]
struct StoredChallenge {
    id: Uuid,
    title: String,
    description: Option<String>,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    creator_id: Uuid,
}

#[derive(Debug, Default)]
struct Inner {
    session: Option<Session>,
    accounts: Vec<(String, String, Session)>,
    profiles: Vec<ProfileRecord>,
    posts: Vec<StoredPost>,
    friendships: Vec<FriendshipRecord>,
    challenges: Vec<StoredChallenge>,
    /// (challenge_id, user_id) membership rows.
    participants: Vec<(Uuid, Uuid)>,
    /// Operation name -> calls to let through before failing once.
    fail_next: HashMap<String, u32>,
}

/// Gateway over in-process state. Clones share the same state, so several
/// stores can act as different clients of one backend.
#[derive(Default, Clone)]
pub struct MemoryGateway {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call to the named operation fail once.
    pub fn fail_next(&self, operation: &str) {
        self.fail_nth(operation, 0);
    }

    /// Make the named operation fail once, after letting `skip` calls
    /// through.
    pub fn fail_nth(&self, operation: &str, skip: u32) {
        let mut inner = self.inner.lock().expect("gateway lock");
        inner.fail_next.insert(operation.to_string(), skip);
    }

    fn take_failure(inner: &mut Inner, operation: &str) -> Result<(), GatewayError> {
        let fire = match inner.fail_next.get_mut(operation) {
            Some(remaining) if *remaining == 0 => true,
            Some(remaining) => {
                *remaining -= 1;
                false
            }
            None => false,
        };
        if fire {
            inner.fail_next.remove(operation);
            return Err(GatewayError::Backend(format!(
                "injected failure: {operation}"
            )));
        }
        Ok(())
    }

    /// Seed a profile row directly.
    pub fn seed_profile(&self, profile: ProfileRecord) {
        let mut inner = self.inner.lock().expect("gateway lock");
        inner.profiles.push(profile);
    }

    /// Seed an authenticated session directly.
    pub fn seed_session(&self, session: Session) {
        let mut inner = self.inner.lock().expect("gateway lock");
        inner.session = Some(session);
    }

    /// Rewrite a post's creation timestamp. Test helper for date-window
    /// computations (streak, histogram, challenge windows).
    pub fn backdate_post(&self, post_id: Uuid, created_at: DateTime<Utc>) {
        let mut inner = self.inner.lock().expect("gateway lock");
        if let Some(post) = inner.posts.iter_mut().find(|p| p.id == post_id) {
            post.created_at = created_at;
        }
    }

    fn profile_of(inner: &Inner, user_id: Uuid) -> Option<&ProfileRecord> {
        inner.profiles.iter().find(|p| p.id == user_id)
    }

    fn post_record(inner: &Inner, post: &StoredPost) -> PostRecord {
        let author = Self::profile_of(inner, post.user_id);
        PostRecord {
            id: post.id,
            user_id: post.user_id,
            author_name: author.and_then(|p| p.full_name.clone()),
            author_avatar: author.and_then(|p| p.avatar_url.clone()),
            created_at: post.created_at,
            activity: post.activity.clone(),
            duration_min: post.duration_min,
            intensity: post.intensity.clone(),
            weight: post.weight.clone(),
            sets: post.sets.clone(),
            image_url: post.image_url.clone(),
            likes_count: post.likes.len() as u32,
            liked_by: post.likes.clone(),
            comments: post
                .comments
                .iter()
                .map(|c| {
                    let commenter = Self::profile_of(inner, c.user_id);
                    CommentRecord {
                        id: c.id,
                        author_id: c.user_id,
                        author_name: commenter.and_then(|p| p.full_name.clone()),
                        author_avatar: commenter.and_then(|p| p.avatar_url.clone()),
                        text: c.text.clone(),
                        created_at: c.created_at,
                    }
                })
                .collect(),
        }
    }

    fn challenge_record(inner: &Inner, challenge: &StoredChallenge) -> ChallengeRecord {
        let creator = Self::profile_of(inner, challenge.creator_id)
            .cloned()
            .unwrap_or(ProfileRecord {
                id: challenge.creator_id,
                full_name: None,
                avatar_url: None,
                current_weight: None,
                initial_weight: None,
                height: None,
                updated_at: None,
            });
        let participants = inner
            .participants
            .iter()
            .filter(|(cid, _)| *cid == challenge.id)
            .filter_map(|(_, uid)| Self::profile_of(inner, *uid).cloned())
            .collect();
        ChallengeRecord {
            id: challenge.id,
            title: challenge.title.clone(),
            description: challenge.description.clone(),
            start_date: challenge.start_date,
            end_date: challenge.end_date,
            creator,
            participants,
        }
    }
}

impl RemoteGateway for MemoryGateway {
    async fn session(&self) -> Result<Option<Session>, GatewayError> {
        let inner = self.inner.lock().expect("gateway lock");
        Ok(inner.session.clone())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, GatewayError> {
        let mut inner = self.inner.lock().expect("gateway lock");
        Self::take_failure(&mut inner, "sign_in")?;
        let session = inner
            .accounts
            .iter()
            .find(|(e, p, _)| e == email && p == password)
            .map(|(_, _, s)| s.clone())
            .ok_or_else(|| GatewayError::Auth("invalid credentials".to_string()))?;
        inner.session = Some(session.clone());
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<Session, GatewayError> {
        let mut inner = self.inner.lock().expect("gateway lock");
        Self::take_failure(&mut inner, "sign_up")?;
        if inner.accounts.iter().any(|(e, _, _)| e == email) {
            return Err(GatewayError::Auth("email already registered".to_string()));
        }
        let session = Session {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
            display_name: Some(full_name.to_string()),
            avatar_url: None,
            access_token: format!("memory-{}", Uuid::new_v4()),
        };
        inner
            .accounts
            .push((email.to_string(), password.to_string(), session.clone()));
        inner.session = Some(session.clone());
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), GatewayError> {
        let mut inner = self.inner.lock().expect("gateway lock");
        inner.session = None;
        Ok(())
    }

    async fn fetch_profiles(&self) -> Result<Vec<ProfileRecord>, GatewayError> {
        let inner = self.inner.lock().expect("gateway lock");
        Ok(inner.profiles.clone())
    }

    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<ProfileRecord>, GatewayError> {
        let inner = self.inner.lock().expect("gateway lock");
        Ok(Self::profile_of(&inner, user_id).cloned())
    }

    async fn upsert_profile(&self, profile: &ProfileRecord) -> Result<(), GatewayError> {
        let mut inner = self.inner.lock().expect("gateway lock");
        Self::take_failure(&mut inner, "upsert_profile")?;
        if let Some(existing) = inner.profiles.iter_mut().find(|p| p.id == profile.id) {
            *existing = profile.clone();
        } else {
            inner.profiles.push(profile.clone());
        }
        Ok(())
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        patch: ProfilePatch,
    ) -> Result<(), GatewayError> {
        let mut inner = self.inner.lock().expect("gateway lock");
        Self::take_failure(&mut inner, "update_profile")?;
        if let Some(profile) = inner.profiles.iter_mut().find(|p| p.id == user_id) {
            if let Some(name) = patch.full_name {
                profile.full_name = Some(name);
            }
            if let Some(weight) = patch.current_weight {
                profile.current_weight = Some(weight);
            }
            if let Some(weight) = patch.initial_weight {
                profile.initial_weight = Some(weight);
            }
            profile.updated_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn workout_count(&self, user_id: Uuid) -> Result<u32, GatewayError> {
        let inner = self.inner.lock().expect("gateway lock");
        Ok(inner.posts.iter().filter(|p| p.user_id == user_id).count() as u32)
    }

    async fn photo_count(&self, user_id: Uuid) -> Result<u32, GatewayError> {
        let inner = self.inner.lock().expect("gateway lock");
        Ok(inner
            .posts
            .iter()
            .filter(|p| p.user_id == user_id && p.image_url.is_some())
            .count() as u32)
    }

    async fn fetch_posts(
        &self,
        authors: Option<&[Uuid]>,
    ) -> Result<Vec<PostRecord>, GatewayError> {
        let inner = self.inner.lock().expect("gateway lock");
        let mut records: Vec<PostRecord> = inner
            .posts
            .iter()
            .filter(|p| authors.map(|ids| ids.contains(&p.user_id)).unwrap_or(true))
            .map(|p| Self::post_record(&inner, p))
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn insert_post(&self, post: NewPost) -> Result<Uuid, GatewayError> {
        let mut inner = self.inner.lock().expect("gateway lock");
        Self::take_failure(&mut inner, "insert_post")?;
        let id = Uuid::new_v4();
        inner.posts.push(StoredPost {
            id,
            user_id: post.user_id,
            created_at: Utc::now(),
            activity: post.activity,
            duration_min: post.duration_min,
            intensity: post.intensity,
            weight: post.weight,
            sets: post.sets,
            image_url: post.image_url,
            likes: Vec::new(),
            comments: Vec::new(),
        });
        Ok(id)
    }

    async fn update_post(&self, post_id: Uuid, patch: PostPatch) -> Result<(), GatewayError> {
        let mut inner = self.inner.lock().expect("gateway lock");
        Self::take_failure(&mut inner, "update_post")?;
        let post = inner
            .posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or_else(|| GatewayError::Backend("post not found".to_string()))?;
        post.activity = patch.activity;
        post.duration_min = patch.duration_min;
        post.intensity = patch.intensity;
        post.weight = patch.weight;
        post.sets = patch.sets;
        post.image_url = patch.image_url;
        Ok(())
    }

    async fn delete_post(&self, post_id: Uuid) -> Result<(), GatewayError> {
        let mut inner = self.inner.lock().expect("gateway lock");
        Self::take_failure(&mut inner, "delete_post")?;
        inner.posts.retain(|p| p.id != post_id);
        Ok(())
    }

    async fn insert_like(&self, post_id: Uuid, user_id: Uuid) -> Result<(), GatewayError> {
        let mut inner = self.inner.lock().expect("gateway lock");
        Self::take_failure(&mut inner, "insert_like")?;
        let post = inner
            .posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or_else(|| GatewayError::Backend("post not found".to_string()))?;
        if !post.likes.contains(&user_id) {
            post.likes.push(user_id);
        }
        Ok(())
    }

    async fn delete_like(&self, post_id: Uuid, user_id: Uuid) -> Result<(), GatewayError> {
        let mut inner = self.inner.lock().expect("gateway lock");
        Self::take_failure(&mut inner, "delete_like")?;
        if let Some(post) = inner.posts.iter_mut().find(|p| p.id == post_id) {
            post.likes.retain(|id| *id != user_id);
        }
        Ok(())
    }

    async fn insert_comment(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        text: &str,
    ) -> Result<Uuid, GatewayError> {
        let mut inner = self.inner.lock().expect("gateway lock");
        Self::take_failure(&mut inner, "insert_comment")?;
        let post = inner
            .posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or_else(|| GatewayError::Backend("post not found".to_string()))?;
        let id = Uuid::new_v4();
        post.comments.push(StoredComment {
            id,
            user_id,
            text: text.to_string(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn friendships_from(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<FriendshipRecord>, GatewayError> {
        let inner = self.inner.lock().expect("gateway lock");
        Ok(inner
            .friendships
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn friendships_to(&self, user_id: Uuid) -> Result<Vec<FriendshipRecord>, GatewayError> {
        let inner = self.inner.lock().expect("gateway lock");
        Ok(inner
            .friendships
            .iter()
            .filter(|f| f.friend_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_friendship(
        &self,
        user_id: Uuid,
        friend_id: Uuid,
    ) -> Result<(), GatewayError> {
        let mut inner = self.inner.lock().expect("gateway lock");
        Self::take_failure(&mut inner, "insert_friendship")?;
        // One edge per ordered pair.
        if inner
            .friendships
            .iter()
            .any(|f| f.user_id == user_id && f.friend_id == friend_id)
        {
            return Err(GatewayError::Backend("duplicate friendship".to_string()));
        }
        inner.friendships.push(FriendshipRecord {
            user_id,
            friend_id,
            status: FriendshipStatus::Pending,
        });
        Ok(())
    }

    async fn accept_friendship(
        &self,
        requester_id: Uuid,
        target_id: Uuid,
    ) -> Result<(), GatewayError> {
        let mut inner = self.inner.lock().expect("gateway lock");
        Self::take_failure(&mut inner, "accept_friendship")?;
        if let Some(edge) = inner
            .friendships
            .iter_mut()
            .find(|f| f.user_id == requester_id && f.friend_id == target_id)
        {
            edge.status = FriendshipStatus::Accepted;
        }
        Ok(())
    }

    async fn delete_friendship(
        &self,
        user_id: Uuid,
        friend_id: Uuid,
    ) -> Result<(), GatewayError> {
        let mut inner = self.inner.lock().expect("gateway lock");
        Self::take_failure(&mut inner, "delete_friendship")?;
        inner
            .friendships
            .retain(|f| !(f.user_id == user_id && f.friend_id == friend_id));
        Ok(())
    }

    async fn fetch_challenges(&self) -> Result<Vec<ChallengeRecord>, GatewayError> {
        let inner = self.inner.lock().expect("gateway lock");
        let mut records: Vec<ChallengeRecord> = inner
            .challenges
            .iter()
            .map(|c| Self::challenge_record(&inner, c))
            .collect();
        records.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(records)
    }

    async fn insert_challenge(&self, challenge: NewChallenge) -> Result<Uuid, GatewayError> {
        let mut inner = self.inner.lock().expect("gateway lock");
        Self::take_failure(&mut inner, "insert_challenge")?;
        let id = Uuid::new_v4();
        inner.challenges.push(StoredChallenge {
            id,
            title: challenge.title,
            description: challenge.description,
            start_date: challenge.start_date,
            end_date: challenge.end_date,
            creator_id: challenge.creator_id,
        });
        Ok(id)
    }

    async fn update_challenge(
        &self,
        challenge_id: Uuid,
        patch: ChallengePatch,
    ) -> Result<(), GatewayError> {
        let mut inner = self.inner.lock().expect("gateway lock");
        Self::take_failure(&mut inner, "update_challenge")?;
        let challenge = inner
            .challenges
            .iter_mut()
            .find(|c| c.id == challenge_id)
            .ok_or_else(|| GatewayError::Backend("challenge not found".to_string()))?;
        challenge.title = patch.title;
        challenge.description = patch.description;
        challenge.start_date = patch.start_date;
        challenge.end_date = patch.end_date;
        Ok(())
    }

    async fn delete_challenge(&self, challenge_id: Uuid) -> Result<(), GatewayError> {
        let mut inner = self.inner.lock().expect("gateway lock");
        Self::take_failure(&mut inner, "delete_challenge")?;
        inner.challenges.retain(|c| c.id != challenge_id);
        inner.participants.retain(|(cid, _)| *cid != challenge_id);
        Ok(())
    }

    async fn challenge_participant_ids(
        &self,
        challenge_id: Uuid,
    ) -> Result<Vec<Uuid>, GatewayError> {
        let inner = self.inner.lock().expect("gateway lock");
        Ok(inner
            .participants
            .iter()
            .filter(|(cid, _)| *cid == challenge_id)
            .map(|(_, uid)| *uid)
            .collect())
    }

    async fn insert_participants(
        &self,
        challenge_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<(), GatewayError> {
        let mut inner = self.inner.lock().expect("gateway lock");
        Self::take_failure(&mut inner, "insert_participants")?;
        for user_id in user_ids {
            if !inner
                .participants
                .iter()
                .any(|(cid, uid)| *cid == challenge_id && uid == user_id)
            {
                inner.participants.push((challenge_id, *user_id));
            }
        }
        Ok(())
    }

    async fn remove_participants(
        &self,
        challenge_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<(), GatewayError> {
        let mut inner = self.inner.lock().expect("gateway lock");
        Self::take_failure(&mut inner, "remove_participants")?;
        inner
            .participants
            .retain(|(cid, uid)| *cid != challenge_id || !user_ids.contains(uid));
        Ok(())
    }

    async fn upload_image(&self, file_name: &str, _bytes: Vec<u8>) -> Result<String, GatewayError> {
        let mut inner = self.inner.lock().expect("gateway lock");
        Self::take_failure(&mut inner, "upload_image")?;
        Ok(format!("memory://workouts/{file_name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sign_up_then_sign_in() {
        let gateway = MemoryGateway::new();
        let created = gateway
            .sign_up("ana@example.com", "hunter2", "Ana")
            .await
            .unwrap();
        gateway.sign_out().await.unwrap();
        assert!(gateway.session().await.unwrap().is_none());

        let session = gateway.sign_in("ana@example.com", "hunter2").await.unwrap();
        assert_eq!(session.user_id, created.user_id);
    }

    #[tokio::test]
    async fn failure_injection_is_single_shot() {
        let gateway = MemoryGateway::new();
        let session = gateway
            .sign_up("ana@example.com", "hunter2", "Ana")
            .await
            .unwrap();
        let post_id = gateway
            .insert_post(NewPost {
                user_id: session.user_id,
                activity: "Gym".to_string(),
                duration_min: 45,
                intensity: "moderate".to_string(),
                weight: None,
                sets: None,
                image_url: None,
            })
            .await
            .unwrap();

        gateway.fail_next("insert_like");
        assert!(gateway.insert_like(post_id, session.user_id).await.is_err());
        assert!(gateway.insert_like(post_id, session.user_id).await.is_ok());
    }

    #[tokio::test]
    async fn seeded_session_is_returned() {
        let gateway = MemoryGateway::new();
        let user_id = Uuid::new_v4();
        gateway.seed_session(Session {
            user_id,
            email: "ana@example.com".to_string(),
            display_name: Some("Ana".to_string()),
            avatar_url: None,
            access_token: "token".to_string(),
        });
        let session = gateway.session().await.unwrap().unwrap();
        assert_eq!(session.user_id, user_id);
    }

    #[tokio::test]
    async fn duplicate_friendship_is_rejected() {
        let gateway = MemoryGateway::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        gateway.insert_friendship(a, b).await.unwrap();
        assert!(gateway.insert_friendship(a, b).await.is_err());
        // Deleting a missing edge is a no-op.
        gateway.delete_friendship(b, a).await.unwrap();
    }
}
