//! Friendship actions.
//!
//! Friendships are directed edges (requester -> target) with a pending or
//! accepted status; a mutual friendship is an accepted edge in either
//! direction. Removal deletes both directions without checking which one
//! exists, so it is idempotent.

use tracing::{info, warn};
use uuid::Uuid;

use crate::gateway::RemoteGateway;

use super::{AppStore, StoreError};

impl<G: RemoteGateway> AppStore<G> {
    /// Send a friend request. Requests to oneself or to anyone already
    /// related (confirmed or pending in either direction) are ignored. The
    /// outgoing set is updated optimistically and intentionally kept on
    /// failure; the next ranking refresh reconciles it.
    pub async fn add_friend(&mut self, target_id: Uuid) -> Result<(), StoreError> {
        let uid = self.user_id()?;
        if target_id == uid || self.state().friends.knows(target_id) {
            return Ok(());
        }

        self.state_mut().friends.outgoing.insert(target_id);
        if let Err(err) = self.gateway().insert_friendship(uid, target_id).await {
            warn!(target = %target_id, error = %err, "friend request failed");
            return Err(err.into());
        }
        info!(target = %target_id, "friend request sent");
        Ok(())
    }

    /// Accept an incoming request: the requester moves from incoming to
    /// confirmed locally, the (requester, me) edge flips to accepted
    /// remotely, and the ranking is refreshed so the new friend's posts
    /// enter the feed scope on the next feed fetch.
    pub async fn accept_friend(&mut self, requester_id: Uuid) -> Result<(), StoreError> {
        let uid = self.user_id()?;
        let friends = &mut self.state_mut().friends;
        friends.incoming.remove(&requester_id);
        friends.confirmed.insert(requester_id);

        self.gateway().accept_friendship(requester_id, uid).await?;
        info!(requester = %requester_id, "friend request accepted");
        self.refresh_ranking().await?;
        Ok(())
    }

    /// Remove a friend or reject a request. Both edge directions are
    /// deleted; a missing edge is not an error, so removing an already
    /// absent friendship succeeds.
    pub async fn remove_friend(&mut self, other_id: Uuid) -> Result<(), StoreError> {
        let uid = self.user_id()?;
        self.state_mut().friends.forget(other_id);

        self.gateway().delete_friendship(uid, other_id).await?;
        self.gateway().delete_friendship(other_id, uid).await?;
        info!(other = %other_id, "friendship removed");
        Ok(())
    }
}
