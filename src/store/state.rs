//! Client state snapshot.
//!
//! One struct holds everything a UI renders. All mutation goes through the
//! store's action methods; derived values (streak, histogram, standings) are
//! computed on demand and never stored here.

use std::collections::HashSet;

use uuid::Uuid;

use crate::social::types::{Challenge, Post, RankedUser};

/// Top-level screens the client can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Feed,
    Dashboard,
    Ranking,
    UserProfile,
    Friends,
    Challenges,
}

/// Friendship ids partitioned by edge state, from the current user's
/// perspective.
#[derive(Debug, Clone, Default)]
pub struct FriendSets {
    /// Mutual friends (accepted in either direction).
    pub confirmed: HashSet<Uuid>,
    /// Requests waiting for the current user's decision.
    pub incoming: HashSet<Uuid>,
    /// Requests the current user sent that are still pending.
    pub outgoing: HashSet<Uuid>,
}

impl FriendSets {
    /// Whether any relationship (confirmed or pending) exists with the user.
    pub fn knows(&self, user_id: Uuid) -> bool {
        self.confirmed.contains(&user_id)
            || self.incoming.contains(&user_id)
            || self.outgoing.contains(&user_id)
    }

    /// Drop the user from every set.
    pub fn forget(&mut self, user_id: Uuid) {
        self.confirmed.remove(&user_id);
        self.incoming.remove(&user_id);
        self.outgoing.remove(&user_id);
    }
}

/// Everything the client knows, as last fetched or optimistically updated.
#[derive(Debug, Clone)]
pub struct AppState {
    pub authenticated: bool,
    pub view: View,
    /// Single-slot back stack.
    pub previous_view: Option<View>,
    /// Feed posts, newest first, scoped to the user and accepted friends.
    pub posts: Vec<Post>,
    /// Global ranking, points descending.
    pub ranking: Vec<RankedUser>,
    pub challenges: Vec<Challenge>,
    pub friends: FriendSets,
    pub current_user: Option<RankedUser>,
    /// Profile currently open in the profile view.
    pub selected_user: Option<RankedUser>,
    /// Post loaded into the log form for editing.
    pub editing_post: Option<Post>,
    pub log_open: bool,
    pub notifications_enabled: bool,
    /// Rank seen at the previous ranking refresh; drives the podium alert.
    pub previous_rank: Option<u32>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            authenticated: false,
            view: View::Feed,
            previous_view: None,
            posts: Vec::new(),
            ranking: Vec::new(),
            challenges: Vec::new(),
            friends: FriendSets::default(),
            current_user: None,
            selected_user: None,
            editing_post: None,
            log_open: false,
            // Off until the user opts in.
            notifications_enabled: false,
            previous_rank: None,
        }
    }
}
