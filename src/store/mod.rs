//! Application state store.
//!
//! `AppStore` is the single source of truth for a client session. UIs read
//! the `AppState` snapshot and call the named action methods; every remote
//! effect goes through the injected `RemoteGateway`. Two remote patterns are
//! used throughout: optimistic-then-confirm with an inverse rollback, and
//! submit-then-refetch where the backend owns identity (comment ids, post
//! timestamps).

pub mod challenges;
pub mod friends;
pub mod posts;
pub mod state;

use chrono::{DateTime, NaiveDate, Utc};
use futures::future::try_join_all;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::gateway::{
    ChallengeRecord, GatewayError, PostRecord, ProfilePatch, ProfileRecord, RemoteGateway, Session,
};
use crate::metrics::{current_streak, weekly_histogram, DAYS_PER_WEEK};
use crate::ranking::{assign_ranks, level_for_points, points_for_workouts, XP_PER_WORKOUT};
use crate::social::challenges::{challenge_standings, challenge_winner, Standing};
use crate::social::types::{
    Challenge, Comment, Intensity, LeagueTier, Post, RankedUser, UserRef,
};
use state::{AppState, View};

pub use challenges::ChallengeForm;
pub use posts::{PhotoUpload, WorkoutForm};

/// Height assumed for profiles that never recorded one, in centimeters.
const DEFAULT_HEIGHT_CM: f32 = 175.0;

/// Store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("not signed in")]
    NotAuthenticated,

    #[error("unknown post: {0}")]
    UnknownPost(Uuid),

    #[error("unknown challenge: {0}")]
    UnknownChallenge(Uuid),

    #[error("challenge saved but {failed} of {total} participants could not be synced")]
    ParticipantSync { failed: usize, total: usize },
}

/// Hook for ranking notifications. The store calls it at most once per
/// refresh, when the user leaves the top three.
pub trait RankAlerts {
    fn dropped_from_podium(&mut self, previous_rank: u32, current_rank: u32);
}

/// Default hook that swallows alerts.
pub struct NoAlerts;

impl RankAlerts for NoAlerts {
    fn dropped_from_podium(&mut self, _previous_rank: u32, _current_rank: u32) {}
}

/// Client state store over a remote gateway.
pub struct AppStore<G: RemoteGateway> {
    gateway: G,
    state: AppState,
    session: Option<Session>,
    alerts: Box<dyn RankAlerts + Send>,
}

impl<G: RemoteGateway> AppStore<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            state: AppState::default(),
            session: None,
            alerts: Box::new(NoAlerts),
        }
    }

    pub fn with_alerts(gateway: G, alerts: Box<dyn RankAlerts + Send>) -> Self {
        Self {
            gateway,
            state: AppState::default(),
            session: None,
            alerts,
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// The gateway backing this store.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub(crate) fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    /// Id of the signed-in user, if any.
    pub fn current_user_id(&self) -> Option<Uuid> {
        self.session.as_ref().map(|s| s.user_id)
    }

    pub(crate) fn user_id(&self) -> Result<Uuid, StoreError> {
        self.current_user_id().ok_or(StoreError::NotAuthenticated)
    }

    // ---- session -----------------------------------------------------

    /// Restore a persisted session if the auth provider has one, then load
    /// all collections. Returns whether a session was found.
    pub async fn bootstrap(&mut self) -> Result<bool, StoreError> {
        match self.gateway.session().await? {
            Some(session) => {
                info!(user_id = %session.user_id, "session restored");
                self.session = Some(session);
                self.state.authenticated = true;
                self.resync().await?;
                Ok(true)
            }
            None => {
                debug!("no persisted session");
                Ok(false)
            }
        }
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<(), StoreError> {
        let session = self.gateway.sign_in(email, password).await?;
        info!(user_id = %session.user_id, "signed in");
        self.session = Some(session);
        self.state.authenticated = true;
        self.resync().await
    }

    pub async fn sign_up(
        &mut self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<(), StoreError> {
        let session = self.gateway.sign_up(email, password, full_name).await?;
        info!(user_id = %session.user_id, "account created");
        self.session = Some(session);
        self.state.authenticated = true;
        self.resync().await
    }

    /// Sign out and reset to an empty, feed-facing state.
    pub async fn sign_out(&mut self) -> Result<(), StoreError> {
        self.gateway.sign_out().await?;
        self.session = None;
        self.state = AppState::default();
        Ok(())
    }

    /// Reload every collection after an auth change.
    pub async fn resync(&mut self) -> Result<(), StoreError> {
        self.refresh_profile().await?;
        self.refresh_posts().await?;
        self.refresh_challenges().await?;
        self.refresh_ranking().await?;
        Ok(())
    }

    // ---- fetches -----------------------------------------------------

    /// Replace the feed with the posts of the user and their accepted
    /// friends, in either edge direction.
    pub async fn refresh_posts(&mut self) -> Result<(), StoreError> {
        let uid = self.user_id()?;
        let outgoing = self.gateway.friendships_from(uid).await?;
        let incoming = self.gateway.friendships_to(uid).await?;

        let mut authors: Vec<Uuid> = vec![uid];
        for edge in outgoing.iter().filter(|e| e.status.is_accepted()) {
            authors.push(edge.friend_id);
        }
        for edge in incoming.iter().filter(|e| e.status.is_accepted()) {
            authors.push(edge.user_id);
        }

        let records = self.gateway.fetch_posts(Some(&authors)).await?;
        debug!(count = records.len(), "feed refreshed");
        self.state.posts = records.into_iter().map(|r| map_post(r, uid)).collect();
        Ok(())
    }

    /// Recompute the ranking board from profiles and per-profile counts,
    /// refresh the friend sets, and observe the user's new rank.
    pub async fn refresh_ranking(&mut self) -> Result<(), StoreError> {
        let uid = self.user_id()?;
        let profiles = self.gateway.fetch_profiles().await?;

        // Points come from counts, not from a stored column, so every
        // profile needs its own pair of count queries. Fan them out.
        let gateway = &self.gateway;
        let counts: Vec<(u32, u32)> = try_join_all(profiles.iter().map(|profile| {
            let id = profile.id;
            async move {
                let workouts = gateway.workout_count(id).await?;
                let photos = gateway.photo_count(id).await?;
                Ok::<_, GatewayError>((workouts, photos))
            }
        }))
        .await?;

        let users: Vec<RankedUser> = profiles
            .iter()
            .zip(counts)
            .map(|(profile, (workouts, photos))| {
                let points = points_for_workouts(workouts);
                let level = level_for_points(points);
                RankedUser {
                    id: profile.id,
                    name: profile_name(profile, self.session.as_ref()),
                    avatar_url: profile.avatar_url.clone(),
                    points,
                    rank: 0,
                    level,
                    tier: LeagueTier::from_level(level),
                    workout_count: workouts,
                    photo_count: photos,
                    is_current_user: profile.id == uid,
                    current_weight_kg: profile.current_weight.unwrap_or(0.0),
                    initial_weight_kg: profile.initial_weight.unwrap_or(0.0),
                    height_cm: profile.height.unwrap_or(DEFAULT_HEIGHT_CM),
                }
            })
            .collect();

        self.state.ranking = assign_ranks(users);
        self.state.current_user = self
            .state
            .ranking
            .iter()
            .find(|u| u.id == uid)
            .cloned()
            .or(self.state.current_user.take());

        self.refresh_friend_sets(uid).await?;

        if let Some(rank) = self.state.ranking.iter().find(|u| u.id == uid).map(|u| u.rank) {
            self.observe_rank(rank);
        }
        Ok(())
    }

    async fn refresh_friend_sets(&mut self, uid: Uuid) -> Result<(), StoreError> {
        let outgoing = self.gateway.friendships_from(uid).await?;
        let incoming = self.gateway.friendships_to(uid).await?;

        let mut sets = state::FriendSets::default();
        for edge in outgoing {
            if edge.status.is_accepted() {
                sets.confirmed.insert(edge.friend_id);
            } else {
                sets.outgoing.insert(edge.friend_id);
            }
        }
        for edge in incoming {
            if edge.status.is_accepted() {
                sets.confirmed.insert(edge.user_id);
            } else {
                sets.incoming.insert(edge.user_id);
            }
        }
        self.state.friends = sets;
        Ok(())
    }

    /// Replace the challenge list from the backend.
    pub async fn refresh_challenges(&mut self) -> Result<(), StoreError> {
        let records = self.gateway.fetch_challenges().await?;
        self.state.challenges = records.into_iter().map(map_challenge).collect();
        Ok(())
    }

    /// Merge the user's profile row into the local projection. Missing rows
    /// are tolerated; the first workout creates one.
    pub async fn refresh_profile(&mut self) -> Result<(), StoreError> {
        let uid = self.user_id()?;
        let Some(profile) = self.gateway.fetch_profile(uid).await? else {
            debug!(user_id = %uid, "no profile row yet");
            return Ok(());
        };

        let name = profile_name(&profile, self.session.as_ref());
        let current = self.state.current_user.get_or_insert_with(|| RankedUser {
            id: uid,
            name: name.clone(),
            avatar_url: None,
            points: 0,
            rank: 0,
            level: 1,
            tier: LeagueTier::Beginner,
            workout_count: 0,
            photo_count: 0,
            is_current_user: true,
            current_weight_kg: 0.0,
            initial_weight_kg: 0.0,
            height_cm: DEFAULT_HEIGHT_CM,
        });
        current.name = name;
        current.avatar_url = profile.avatar_url.clone();
        current.current_weight_kg = profile.current_weight.unwrap_or(0.0);
        current.initial_weight_kg = profile.initial_weight.unwrap_or(0.0);
        current.height_cm = profile.height.unwrap_or(DEFAULT_HEIGHT_CM);

        let snapshot = current.clone();
        if let Some(entry) = self.state.ranking.iter_mut().find(|u| u.id == uid) {
            entry.name = snapshot.name.clone();
            entry.avatar_url = snapshot.avatar_url.clone();
            entry.current_weight_kg = snapshot.current_weight_kg;
            entry.initial_weight_kg = snapshot.initial_weight_kg;
            entry.height_cm = snapshot.height_cm;
        }
        Ok(())
    }

    // ---- profile scalars ---------------------------------------------

    /// Persist a new current weight and mirror it locally.
    pub async fn update_weight(&mut self, weight_kg: f32) -> Result<(), StoreError> {
        let uid = self.user_id()?;
        self.gateway
            .update_profile(
                uid,
                ProfilePatch {
                    current_weight: Some(weight_kg),
                    ..ProfilePatch::default()
                },
            )
            .await?;
        if let Some(user) = self.state.current_user.as_mut() {
            user.current_weight_kg = weight_kg;
        }
        if let Some(entry) = self.state.ranking.iter_mut().find(|u| u.id == uid) {
            entry.current_weight_kg = weight_kg;
        }
        Ok(())
    }

    /// Persist a new initial (reference) weight and mirror it locally.
    pub async fn update_initial_weight(&mut self, weight_kg: f32) -> Result<(), StoreError> {
        let uid = self.user_id()?;
        self.gateway
            .update_profile(
                uid,
                ProfilePatch {
                    initial_weight: Some(weight_kg),
                    ..ProfilePatch::default()
                },
            )
            .await?;
        if let Some(user) = self.state.current_user.as_mut() {
            user.initial_weight_kg = weight_kg;
        }
        if let Some(entry) = self.state.ranking.iter_mut().find(|u| u.id == uid) {
            entry.initial_weight_kg = weight_kg;
        }
        Ok(())
    }

    /// Rename the current user in every denormalized copy: the ranking
    /// entry, authored posts and comments, challenge creator and participant
    /// slots, and the selected-user slot. Local only.
    pub fn rename_current_user(&mut self, name: &str) -> Result<(), StoreError> {
        let uid = self.user_id()?;
        let name = name.trim();
        if name.is_empty() {
            return Ok(());
        }

        if let Some(user) = self.state.current_user.as_mut() {
            user.name = name.to_string();
        }
        if let Some(entry) = self.state.ranking.iter_mut().find(|u| u.id == uid) {
            entry.name = name.to_string();
        }
        if let Some(selected) = self.state.selected_user.as_mut() {
            if selected.id == uid {
                selected.name = name.to_string();
            }
        }
        for post in self.state.posts.iter_mut() {
            if post.author.id == uid {
                post.author.name = name.to_string();
            }
            for comment in post.comments.iter_mut() {
                if comment.author.id == uid {
                    comment.author.name = name.to_string();
                }
            }
        }
        for challenge in self.state.challenges.iter_mut() {
            if challenge.creator.id == uid {
                challenge.creator.name = name.to_string();
            }
            for participant in challenge.participants.iter_mut() {
                if participant.id == uid {
                    participant.name = name.to_string();
                }
            }
        }
        Ok(())
    }

    // ---- navigation --------------------------------------------------

    pub fn navigate(&mut self, view: View) {
        if self.state.view != view {
            self.state.previous_view = Some(self.state.view);
            self.state.view = view;
        }
    }

    /// Return to the previously shown view, falling back to the feed. The
    /// back stack is one slot deep.
    pub fn go_back(&mut self) {
        self.state.view = self.state.previous_view.take().unwrap_or(View::Feed);
    }

    /// Open a user's profile from the ranking board.
    pub fn select_user(&mut self, user_id: Uuid) {
        self.state.selected_user = self.state.ranking.iter().find(|u| u.id == user_id).cloned();
        self.navigate(View::UserProfile);
    }

    pub fn open_my_profile(&mut self) {
        self.state.selected_user = self.state.current_user.clone();
        self.navigate(View::UserProfile);
    }

    /// Open the log form for a new workout.
    pub fn open_log(&mut self) {
        self.state.editing_post = None;
        self.state.log_open = true;
    }

    /// Open the log form pre-filled with an existing post.
    pub fn edit_post(&mut self, post_id: Uuid) -> Result<(), StoreError> {
        let post = self
            .state
            .posts
            .iter()
            .find(|p| p.id == post_id)
            .cloned()
            .ok_or(StoreError::UnknownPost(post_id))?;
        self.state.editing_post = Some(post);
        self.state.log_open = true;
        Ok(())
    }

    pub fn close_log(&mut self) {
        self.state.editing_post = None;
        self.state.log_open = false;
    }

    pub fn toggle_notifications(&mut self) {
        self.state.notifications_enabled = !self.state.notifications_enabled;
    }

    // ---- derived reads -----------------------------------------------

    /// Consecutive-day workout streak of the current user.
    pub fn streak(&self, today: NaiveDate) -> u32 {
        let Ok(uid) = self.user_id() else { return 0 };
        let own: Vec<Post> = self
            .state
            .posts
            .iter()
            .filter(|p| p.author.id == uid)
            .cloned()
            .collect();
        current_streak(&own, today)
    }

    /// Per-day workout counts of the current week, Monday-first.
    pub fn weekly(&self, now: DateTime<Utc>) -> [u32; DAYS_PER_WEEK] {
        match self.user_id() {
            Ok(uid) => weekly_histogram(&self.state.posts, uid, now),
            Err(_) => [0; DAYS_PER_WEEK],
        }
    }

    /// Ranking entries of the user's confirmed friends.
    pub fn my_friends(&self) -> Vec<&RankedUser> {
        self.state
            .ranking
            .iter()
            .filter(|u| self.state.friends.confirmed.contains(&u.id))
            .collect()
    }

    /// Leaderboard of one challenge, scored from the loaded feed.
    pub fn standings(&self, challenge_id: Uuid) -> Result<Vec<Standing>, StoreError> {
        let challenge = self.find_challenge(challenge_id)?;
        Ok(challenge_standings(challenge, &self.state.posts))
    }

    /// Winner of a concluded challenge, if any.
    pub fn winner(
        &self,
        challenge_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Standing>, StoreError> {
        let challenge = self.find_challenge(challenge_id)?;
        Ok(challenge_winner(challenge, &self.state.posts, now))
    }

    pub(crate) fn find_challenge(&self, challenge_id: Uuid) -> Result<&Challenge, StoreError> {
        self.state
            .challenges
            .iter()
            .find(|c| c.id == challenge_id)
            .ok_or(StoreError::UnknownChallenge(challenge_id))
    }

    // ---- rank watch --------------------------------------------------

    /// Track the user's rank across refreshes. The first observation only
    /// seeds the memory; afterwards a move from the top three to below it
    /// fires the alert hook once.
    fn observe_rank(&mut self, current: u32) {
        match self.state.previous_rank {
            None => {
                self.state.previous_rank = Some(current);
            }
            Some(previous) => {
                if self.state.notifications_enabled && previous <= 3 && current > 3 {
                    warn!(previous, current, "dropped off the podium");
                    self.alerts.dropped_from_podium(previous, current);
                }
                self.state.previous_rank = Some(current);
            }
        }
    }
}

/// Display name for a profile row, falling back to the session identity.
fn profile_name(profile: &ProfileRecord, session: Option<&Session>) -> String {
    if let Some(name) = profile.full_name.as_deref() {
        if !name.trim().is_empty() {
            return name.to_string();
        }
    }
    if let Some(session) = session {
        if session.user_id == profile.id {
            if let Some(name) = session.display_name.as_deref() {
                return name.to_string();
            }
            if let Some(prefix) = session.email.split('@').next() {
                if !prefix.is_empty() {
                    return prefix.to_string();
                }
            }
        }
    }
    "Athlete".to_string()
}

pub(crate) fn map_post(record: PostRecord, viewer: Uuid) -> Post {
    Post {
        id: record.id,
        author: UserRef {
            id: record.user_id,
            name: record.author_name.unwrap_or_else(|| "Athlete".to_string()),
            avatar_url: record.author_avatar,
        },
        created_at: Some(record.created_at),
        legacy_date: None,
        activity: record.activity,
        duration_min: record.duration_min,
        intensity: Intensity::from_str(&record.intensity).unwrap_or(Intensity::Moderate),
        weight_notes: record.weight,
        sets_notes: record.sets,
        image_url: record.image_url,
        likes: record.likes_count,
        liked_by_me: record.liked_by.contains(&viewer),
        comments: record
            .comments
            .into_iter()
            .map(|c| Comment {
                id: c.id,
                author: UserRef {
                    id: c.author_id,
                    name: c.author_name.unwrap_or_else(|| "Athlete".to_string()),
                    avatar_url: c.author_avatar,
                },
                text: c.text,
                created_at: c.created_at,
            })
            .collect(),
        xp: XP_PER_WORKOUT,
    }
}

pub(crate) fn map_user_ref(profile: &ProfileRecord) -> UserRef {
    UserRef {
        id: profile.id,
        name: profile
            .full_name
            .clone()
            .unwrap_or_else(|| "Athlete".to_string()),
        avatar_url: profile.avatar_url.clone(),
    }
}

pub(crate) fn map_challenge(record: ChallengeRecord) -> Challenge {
    Challenge {
        id: record.id,
        title: record.title,
        description: record.description,
        starts_at: record.start_date,
        ends_at: record.end_date,
        creator: map_user_ref(&record.creator),
        participants: record.participants.iter().map(map_user_ref).collect(),
    }
}
