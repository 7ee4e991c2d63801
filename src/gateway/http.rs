//! HTTP gateway for a hosted PostgREST-style backend.
//!
//! Speaks the REST conventions of the hosted stack the app was built
//! against: `/rest/v1` filtered selects with embedded joins, exact-count
//! HEAD requests, `/auth/v1` password-grant auth, and `/storage/v1` object
//! upload with public-URL derivation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::types::{
    ChallengePatch, ChallengeRecord, CommentRecord, FriendshipRecord, FriendshipStatus,
    NewChallenge, NewPost, PostPatch, PostRecord, ProfilePatch, ProfileRecord, Session,
};
use super::{GatewayError, RemoteGateway};

const POSTS_SELECT: &str = "*,profiles:user_id(id,full_name,avatar_url),post_likes(user_id),post_comments(id,text,created_at,profiles:user_id(id,full_name,avatar_url))";
const CHALLENGES_SELECT: &str = "*,creator:profiles!creator_id(id,full_name,avatar_url,current_weight,initial_weight,height,updated_at),challenge_participants(user:profiles(id,full_name,avatar_url,current_weight,initial_weight,height,updated_at))";

/// Gateway backed by a remote REST/auth/storage endpoint.
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    /// Access token for the signed-in user; requests fall back to the
    /// anonymous API key when absent.
    access_token: Arc<RwLock<Option<String>>>,
}

impl HttpGateway {
    /// Create a new gateway against the given backend.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            access_token: Arc::new(RwLock::new(None)),
        }
    }

    /// Restore a previously persisted access token.
    pub async fn set_access_token(&self, token: String) {
        *self.access_token.write().await = Some(token);
    }

    pub async fn clear_token(&self) {
        *self.access_token.write().await = None;
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    async fn bearer(&self) -> String {
        self.access_token
            .read()
            .await
            .clone()
            .unwrap_or_else(|| self.api_key.clone())
    }

    async fn request(
        &self,
        method: reqwest::Method,
        url: String,
    ) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(self.bearer().await)
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, GatewayError> {
        let response = builder
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
            {
                Err(GatewayError::Auth(format!("{status}: {body}")))
            } else {
                Err(GatewayError::Backend(format!("{status}: {body}")))
            }
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, String)],
    ) -> Result<T, GatewayError> {
        let builder = self.request(reqwest::Method::GET, url).await.query(query);
        let response = self.send(builder).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }

    /// Exact row count via a HEAD request; the total rides in the
    /// `content-range` header ("0-24/42").
    async fn count(&self, table: &str, query: &[(&str, String)]) -> Result<u32, GatewayError> {
        let builder = self
            .request(reqwest::Method::HEAD, self.rest_url(table))
            .await
            .query(query)
            .header("Prefer", "count=exact");
        let response = self.send(builder).await?;

        let range = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| GatewayError::Decode("missing content-range header".to_string()))?;
        let total = range
            .rsplit('/')
            .next()
            .and_then(|s| s.parse::<u32>().ok())
            .ok_or_else(|| GatewayError::Decode(format!("bad content-range: {range}")))?;
        Ok(total)
    }

    /// Insert returning the new row id (`Prefer: return=representation`).
    async fn insert_returning_id(
        &self,
        table: &str,
        body: serde_json::Value,
    ) -> Result<Uuid, GatewayError> {
        let builder = self
            .request(reqwest::Method::POST, self.rest_url(table))
            .await
            .header("Prefer", "return=representation")
            .json(&body);
        let response = self.send(builder).await?;
        let rows: Vec<WireId> = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        rows.first()
            .map(|r| r.id)
            .ok_or_else(|| GatewayError::Decode("insert returned no rows".to_string()))
    }

    async fn session_from_user(&self, user: WireUser, token: String) -> Session {
        Session {
            user_id: user.id,
            email: user.email.unwrap_or_default(),
            display_name: user.user_metadata.as_ref().and_then(|m| m.full_name.clone()),
            avatar_url: user.user_metadata.as_ref().and_then(|m| m.avatar_url.clone()),
            access_token: token,
        }
    }
}

impl RemoteGateway for HttpGateway {
    async fn session(&self) -> Result<Option<Session>, GatewayError> {
        let token = match self.access_token.read().await.clone() {
            Some(t) => t,
            None => return Ok(None),
        };
        let builder = self
            .request(reqwest::Method::GET, format!("{}/auth/v1/user", self.base_url))
            .await;
        let user: WireUser = match self.send(builder).await {
            Ok(response) => response
                .json()
                .await
                .map_err(|e| GatewayError::Decode(e.to_string()))?,
            Err(GatewayError::Auth(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(Some(self.session_from_user(user, token).await))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, GatewayError> {
        let builder = self
            .client
            .post(format!(
                "{}/auth/v1/token?grant_type=password",
                self.base_url
            ))
            .header("apikey", &self.api_key)
            .json(&json!({ "email": email, "password": password }));
        let response = self.send(builder).await?;
        let grant: WireGrant = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;

        let token = grant
            .access_token
            .ok_or_else(|| GatewayError::Auth("no access token in response".to_string()))?;
        let user = grant
            .user
            .ok_or_else(|| GatewayError::Auth("no user in response".to_string()))?;
        *self.access_token.write().await = Some(token.clone());
        Ok(self.session_from_user(user, token).await)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<Session, GatewayError> {
        let builder = self
            .client
            .post(format!("{}/auth/v1/signup", self.base_url))
            .header("apikey", &self.api_key)
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "full_name": full_name },
            }));
        let response = self.send(builder).await?;
        let grant: WireGrant = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;

        let token = grant
            .access_token
            .ok_or_else(|| GatewayError::Auth("signup requires confirmation".to_string()))?;
        let user = grant
            .user
            .ok_or_else(|| GatewayError::Auth("no user in response".to_string()))?;
        *self.access_token.write().await = Some(token.clone());
        Ok(self.session_from_user(user, token).await)
    }

    async fn sign_out(&self) -> Result<(), GatewayError> {
        let builder = self
            .request(
                reqwest::Method::POST,
                format!("{}/auth/v1/logout", self.base_url),
            )
            .await;
        let result = self.send(builder).await;
        self.clear_token().await;
        result.map(|_| ())
    }

    async fn fetch_profiles(&self) -> Result<Vec<ProfileRecord>, GatewayError> {
        self.get_json(
            self.rest_url("profiles"),
            &[("select", "*".to_string())],
        )
        .await
    }

    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<ProfileRecord>, GatewayError> {
        let rows: Vec<ProfileRecord> = self
            .get_json(
                self.rest_url("profiles"),
                &[
                    ("select", "*".to_string()),
                    ("id", format!("eq.{user_id}")),
                ],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn upsert_profile(&self, profile: &ProfileRecord) -> Result<(), GatewayError> {
        let builder = self
            .request(reqwest::Method::POST, self.rest_url("profiles"))
            .await
            .header("Prefer", "resolution=merge-duplicates")
            .json(profile);
        self.send(builder).await.map(|_| ())
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        patch: ProfilePatch,
    ) -> Result<(), GatewayError> {
        let builder = self
            .request(reqwest::Method::PATCH, self.rest_url("profiles"))
            .await
            .query(&[("id", format!("eq.{user_id}"))])
            .json(&patch);
        self.send(builder).await.map(|_| ())
    }

    async fn workout_count(&self, user_id: Uuid) -> Result<u32, GatewayError> {
        self.count("posts", &[("user_id", format!("eq.{user_id}"))])
            .await
    }

    async fn photo_count(&self, user_id: Uuid) -> Result<u32, GatewayError> {
        self.count(
            "posts",
            &[
                ("user_id", format!("eq.{user_id}")),
                ("image_url", "not.is.null".to_string()),
            ],
        )
        .await
    }

    async fn fetch_posts(
        &self,
        authors: Option<&[Uuid]>,
    ) -> Result<Vec<PostRecord>, GatewayError> {
        let mut query = vec![
            ("select", POSTS_SELECT.to_string()),
            ("order", "created_at.desc".to_string()),
        ];
        if let Some(ids) = authors {
            let list = ids
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(",");
            query.push(("user_id", format!("in.({list})")));
        }
        let rows: Vec<WirePost> = self.get_json(self.rest_url("posts"), &query).await?;
        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn insert_post(&self, post: NewPost) -> Result<Uuid, GatewayError> {
        self.insert_returning_id(
            "posts",
            json!({
                "user_id": post.user_id,
                "activity": post.activity,
                "duration": post.duration_min,
                "intensity": post.intensity,
                "weight": post.weight,
                "sets": post.sets,
                "image_url": post.image_url,
                "likes_count": 0,
            }),
        )
        .await
    }

    async fn update_post(&self, post_id: Uuid, patch: PostPatch) -> Result<(), GatewayError> {
        let builder = self
            .request(reqwest::Method::PATCH, self.rest_url("posts"))
            .await
            .query(&[("id", format!("eq.{post_id}"))])
            .json(&json!({
                "activity": patch.activity,
                "duration": patch.duration_min,
                "intensity": patch.intensity,
                "weight": patch.weight,
                "sets": patch.sets,
                "image_url": patch.image_url,
            }));
        self.send(builder).await.map(|_| ())
    }

    async fn delete_post(&self, post_id: Uuid) -> Result<(), GatewayError> {
        let builder = self
            .request(reqwest::Method::DELETE, self.rest_url("posts"))
            .await
            .query(&[("id", format!("eq.{post_id}"))]);
        self.send(builder).await.map(|_| ())
    }

    async fn insert_like(&self, post_id: Uuid, user_id: Uuid) -> Result<(), GatewayError> {
        let builder = self
            .request(reqwest::Method::POST, self.rest_url("post_likes"))
            .await
            .json(&json!({ "post_id": post_id, "user_id": user_id }));
        self.send(builder).await.map(|_| ())
    }

    async fn delete_like(&self, post_id: Uuid, user_id: Uuid) -> Result<(), GatewayError> {
        let builder = self
            .request(reqwest::Method::DELETE, self.rest_url("post_likes"))
            .await
            .query(&[
                ("post_id", format!("eq.{post_id}")),
                ("user_id", format!("eq.{user_id}")),
            ]);
        self.send(builder).await.map(|_| ())
    }

    async fn insert_comment(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        text: &str,
    ) -> Result<Uuid, GatewayError> {
        self.insert_returning_id(
            "post_comments",
            json!({ "post_id": post_id, "user_id": user_id, "text": text }),
        )
        .await
    }

    async fn friendships_from(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<FriendshipRecord>, GatewayError> {
        let rows: Vec<WireFriendship> = self
            .get_json(
                self.rest_url("friendships"),
                &[
                    ("select", "user_id,friend_id,status".to_string()),
                    ("user_id", format!("eq.{user_id}")),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(FriendshipRecord::from).collect())
    }

    async fn friendships_to(&self, user_id: Uuid) -> Result<Vec<FriendshipRecord>, GatewayError> {
        let rows: Vec<WireFriendship> = self
            .get_json(
                self.rest_url("friendships"),
                &[
                    ("select", "user_id,friend_id,status".to_string()),
                    ("friend_id", format!("eq.{user_id}")),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(FriendshipRecord::from).collect())
    }

    async fn insert_friendship(
        &self,
        user_id: Uuid,
        friend_id: Uuid,
    ) -> Result<(), GatewayError> {
        let builder = self
            .request(reqwest::Method::POST, self.rest_url("friendships"))
            .await
            .json(&json!({
                "user_id": user_id,
                "friend_id": friend_id,
                "status": FriendshipStatus::Pending.as_str(),
            }));
        self.send(builder).await.map(|_| ())
    }

    async fn accept_friendship(
        &self,
        requester_id: Uuid,
        target_id: Uuid,
    ) -> Result<(), GatewayError> {
        let builder = self
            .request(reqwest::Method::PATCH, self.rest_url("friendships"))
            .await
            .query(&[
                ("user_id", format!("eq.{requester_id}")),
                ("friend_id", format!("eq.{target_id}")),
            ])
            .json(&json!({ "status": FriendshipStatus::Accepted.as_str() }));
        self.send(builder).await.map(|_| ())
    }

    async fn delete_friendship(
        &self,
        user_id: Uuid,
        friend_id: Uuid,
    ) -> Result<(), GatewayError> {
        let builder = self
            .request(reqwest::Method::DELETE, self.rest_url("friendships"))
            .await
            .query(&[
                ("user_id", format!("eq.{user_id}")),
                ("friend_id", format!("eq.{friend_id}")),
            ]);
        // Deleting zero rows still returns success, which is what the
        // try-both-directions removal flow relies on.
        self.send(builder).await.map(|_| ())
    }

    async fn fetch_challenges(&self) -> Result<Vec<ChallengeRecord>, GatewayError> {
        let rows: Vec<WireChallenge> = self
            .get_json(
                self.rest_url("challenges"),
                &[
                    ("select", CHALLENGES_SELECT.to_string()),
                    ("order", "start_date.desc".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(ChallengeRecord::from).collect())
    }

    async fn insert_challenge(&self, challenge: NewChallenge) -> Result<Uuid, GatewayError> {
        self.insert_returning_id(
            "challenges",
            json!({
                "title": challenge.title,
                "description": challenge.description,
                "start_date": challenge.start_date,
                "end_date": challenge.end_date,
                "creator_id": challenge.creator_id,
            }),
        )
        .await
    }

    async fn update_challenge(
        &self,
        challenge_id: Uuid,
        patch: ChallengePatch,
    ) -> Result<(), GatewayError> {
        let builder = self
            .request(reqwest::Method::PATCH, self.rest_url("challenges"))
            .await
            .query(&[("id", format!("eq.{challenge_id}"))])
            .json(&patch);
        self.send(builder).await.map(|_| ())
    }

    async fn delete_challenge(&self, challenge_id: Uuid) -> Result<(), GatewayError> {
        let builder = self
            .request(reqwest::Method::DELETE, self.rest_url("challenges"))
            .await
            .query(&[("id", format!("eq.{challenge_id}"))]);
        self.send(builder).await.map(|_| ())
    }

    async fn challenge_participant_ids(
        &self,
        challenge_id: Uuid,
    ) -> Result<Vec<Uuid>, GatewayError> {
        let rows: Vec<WireParticipantId> = self
            .get_json(
                self.rest_url("challenge_participants"),
                &[
                    ("select", "user_id".to_string()),
                    ("challenge_id", format!("eq.{challenge_id}")),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(|r| r.user_id).collect())
    }

    async fn insert_participants(
        &self,
        challenge_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<(), GatewayError> {
        if user_ids.is_empty() {
            return Ok(());
        }
        let rows: Vec<serde_json::Value> = user_ids
            .iter()
            .map(|id| json!({ "challenge_id": challenge_id, "user_id": id }))
            .collect();
        let builder = self
            .request(reqwest::Method::POST, self.rest_url("challenge_participants"))
            .await
            .json(&rows);
        self.send(builder).await.map(|_| ())
    }

    async fn remove_participants(
        &self,
        challenge_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<(), GatewayError> {
        if user_ids.is_empty() {
            return Ok(());
        }
        let list = user_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let builder = self
            .request(reqwest::Method::DELETE, self.rest_url("challenge_participants"))
            .await
            .query(&[
                ("challenge_id", format!("eq.{challenge_id}")),
                ("user_id", format!("in.({list})")),
            ]);
        self.send(builder).await.map(|_| ())
    }

    async fn upload_image(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, GatewayError> {
        let builder = self
            .request(
                reqwest::Method::POST,
                format!("{}/storage/v1/object/workouts/{}", self.base_url, file_name),
            )
            .await
            .header("Content-Type", "application/octet-stream")
            .body(bytes);
        self.send(builder).await?;
        Ok(format!(
            "{}/storage/v1/object/public/workouts/{}",
            self.base_url, file_name
        ))
    }
}

// Wire rows, shaped by the embedded-select strings above.

#[derive(Debug, Deserialize)]
struct WireId {
    id: Uuid,
}

#[derive(Debug, Deserialize)]
struct WireMetadata {
    full_name: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUser {
    id: Uuid,
    email: Option<String>,
    user_metadata: Option<WireMetadata>,
}

#[derive(Debug, Deserialize)]
struct WireGrant {
    access_token: Option<String>,
    user: Option<WireUser>,
}

#[derive(Debug, Deserialize)]
struct WireMiniProfile {
    id: Uuid,
    full_name: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireLike {
    user_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct WireComment {
    id: Uuid,
    text: String,
    created_at: DateTime<Utc>,
    profiles: Option<WireMiniProfile>,
}

#[derive(Debug, Deserialize)]
struct WirePost {
    id: Uuid,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    activity: String,
    duration: u32,
    intensity: String,
    weight: Option<String>,
    sets: Option<String>,
    image_url: Option<String>,
    likes_count: Option<u32>,
    profiles: Option<WireMiniProfile>,
    post_likes: Option<Vec<WireLike>>,
    post_comments: Option<Vec<WireComment>>,
}

impl From<WirePost> for PostRecord {
    fn from(row: WirePost) -> Self {
        let comments = row
            .post_comments
            .unwrap_or_default()
            .into_iter()
            .map(|c| CommentRecord {
                id: c.id,
                author_id: c.profiles.as_ref().map(|p| p.id).unwrap_or(row.user_id),
                author_name: c.profiles.as_ref().and_then(|p| p.full_name.clone()),
                author_avatar: c.profiles.as_ref().and_then(|p| p.avatar_url.clone()),
                text: c.text,
                created_at: c.created_at,
            })
            .collect();

        PostRecord {
            id: row.id,
            user_id: row.user_id,
            author_name: row.profiles.as_ref().and_then(|p| p.full_name.clone()),
            author_avatar: row.profiles.as_ref().and_then(|p| p.avatar_url.clone()),
            created_at: row.created_at,
            activity: row.activity,
            duration_min: row.duration,
            intensity: row.intensity,
            weight: row.weight,
            sets: row.sets,
            image_url: row.image_url,
            likes_count: row.likes_count.unwrap_or(0),
            liked_by: row
                .post_likes
                .unwrap_or_default()
                .into_iter()
                .map(|l| l.user_id)
                .collect(),
            comments,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireFriendship {
    user_id: Uuid,
    friend_id: Uuid,
    status: String,
}

impl From<WireFriendship> for FriendshipRecord {
    fn from(row: WireFriendship) -> Self {
        FriendshipRecord {
            user_id: row.user_id,
            friend_id: row.friend_id,
            status: FriendshipStatus::from_str(&row.status).unwrap_or(FriendshipStatus::Pending),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireParticipant {
    user: ProfileRecord,
}

#[derive(Debug, Deserialize)]
struct WireParticipantId {
    user_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct WireChallenge {
    id: Uuid,
    title: String,
    description: Option<String>,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    creator: ProfileRecord,
    challenge_participants: Vec<WireParticipant>,
}

impl From<WireChallenge> for ChallengeRecord {
    fn from(row: WireChallenge) -> Self {
        ChallengeRecord {
            id: row.id,
            title: row.title,
            description: row.description,
            start_date: row.start_date,
            end_date: row.end_date,
            creator: row.creator,
            participants: row
                .challenge_participants
                .into_iter()
                .map(|p| p.user)
                .collect(),
        }
    }
}
