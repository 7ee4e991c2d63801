//! Challenge actions.
//!
//! Challenge membership lives in its own table, so creating or editing a
//! challenge is a multi-step write: the row first, then the participant
//! rows. A failed participant batch leaves the challenge standing with a
//! partial roster; the failure is reported, not rolled back.

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::gateway::{ChallengePatch, NewChallenge, RemoteGateway};
use crate::social::types::UserRef;

use super::{AppStore, StoreError};

/// Form contents for creating or editing a challenge. `friend_ids` are the
/// invited participants; the creator is always a member and never listed
/// here.
#[derive(Debug, Clone)]
pub struct ChallengeForm {
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub friend_ids: Vec<Uuid>,
}

impl<G: RemoteGateway> AppStore<G> {
    /// Create a challenge: the row, then the creator's membership, then the
    /// invited friends as one batch. Once the row exists, membership insert
    /// failures no longer abort: the challenge stays with whoever made it
    /// in, the list is refetched, and the partial sync is reported.
    pub async fn create_challenge(&mut self, form: ChallengeForm) -> Result<(), StoreError> {
        let uid = self.user_id()?;
        let invitees = dedup_excluding(&form.friend_ids, uid);

        let challenge_id = self
            .gateway()
            .insert_challenge(NewChallenge {
                title: form.title,
                description: form.description,
                start_date: form.starts_at,
                end_date: form.ends_at,
                creator_id: uid,
            })
            .await?;
        info!(challenge_id = %challenge_id, "challenge created");

        let mut failed = 0usize;
        if let Err(err) = self.gateway().insert_participants(challenge_id, &[uid]).await {
            warn!(challenge_id = %challenge_id, error = %err, "creator membership insert failed");
            failed += 1;
        }

        if !invitees.is_empty() {
            if let Err(err) = self
                .gateway()
                .insert_participants(challenge_id, &invitees)
                .await
            {
                warn!(challenge_id = %challenge_id, error = %err, "invitee batch failed");
                failed += invitees.len();
            }
        }

        self.refresh_challenges().await?;
        if failed > 0 {
            return Err(StoreError::ParticipantSync {
                failed,
                total: invitees.len() + 1,
            });
        }
        Ok(())
    }

    /// Edit a challenge: patch the scalar columns, then diff the remote
    /// membership against the requested one. The creator can never be
    /// removed. Local state is replaced with the requested shape even when
    /// part of the membership sync fails, so the form result is what the
    /// user sees; the error reports the drift.
    pub async fn update_challenge(
        &mut self,
        challenge_id: Uuid,
        form: ChallengeForm,
    ) -> Result<(), StoreError> {
        let creator = self.find_challenge(challenge_id)?.creator.clone();
        let invitees = dedup_excluding(&form.friend_ids, creator.id);

        self.gateway()
            .update_challenge(
                challenge_id,
                ChallengePatch {
                    title: form.title.clone(),
                    description: form.description.clone(),
                    start_date: form.starts_at,
                    end_date: form.ends_at,
                },
            )
            .await?;

        let current = self.gateway().challenge_participant_ids(challenge_id).await?;
        let mut desired: Vec<Uuid> = vec![creator.id];
        desired.extend(invitees.iter().copied());

        let to_add: Vec<Uuid> = desired
            .iter()
            .copied()
            .filter(|id| !current.contains(id))
            .collect();
        let to_remove: Vec<Uuid> = current
            .iter()
            .copied()
            .filter(|id| *id != creator.id && !desired.contains(id))
            .collect();

        let mut failed = 0usize;
        if !to_add.is_empty() {
            if let Err(err) = self.gateway().insert_participants(challenge_id, &to_add).await {
                warn!(challenge_id = %challenge_id, error = %err, "participant add failed");
                failed += to_add.len();
            }
        }
        if !to_remove.is_empty() {
            if let Err(err) = self
                .gateway()
                .remove_participants(challenge_id, &to_remove)
                .await
            {
                warn!(challenge_id = %challenge_id, error = %err, "participant removal failed");
                failed += to_remove.len();
            }
        }

        let participants = self.participant_refs(&creator, &invitees);
        if let Some(challenge) = self
            .state_mut()
            .challenges
            .iter_mut()
            .find(|c| c.id == challenge_id)
        {
            challenge.title = form.title;
            challenge.description = form.description;
            challenge.starts_at = form.starts_at;
            challenge.ends_at = form.ends_at;
            challenge.participants = participants;
        }

        if failed > 0 {
            return Err(StoreError::ParticipantSync {
                failed,
                total: desired.len(),
            });
        }
        info!(challenge_id = %challenge_id, "challenge updated");
        Ok(())
    }

    /// Delete a challenge and drop it locally. By convention only the
    /// creator's UI offers this.
    pub async fn delete_challenge(&mut self, challenge_id: Uuid) -> Result<(), StoreError> {
        self.gateway().delete_challenge(challenge_id).await?;
        self.state_mut().challenges.retain(|c| c.id != challenge_id);
        info!(challenge_id = %challenge_id, "challenge deleted");
        Ok(())
    }

    /// Leave a challenge: remove the own participant row, drop oneself from
    /// the local roster, then refetch for authority.
    pub async fn leave_challenge(&mut self, challenge_id: Uuid) -> Result<(), StoreError> {
        let uid = self.user_id()?;
        self.gateway()
            .remove_participants(challenge_id, &[uid])
            .await?;
        if let Some(challenge) = self
            .state_mut()
            .challenges
            .iter_mut()
            .find(|c| c.id == challenge_id)
        {
            challenge.participants.retain(|p| p.id != uid);
        }
        info!(challenge_id = %challenge_id, "left challenge");
        self.refresh_challenges().await?;
        Ok(())
    }

    /// Build the local roster for a replaced challenge: creator first, then
    /// invitees with names resolved from the ranking board.
    fn participant_refs(&self, creator: &UserRef, invitees: &[Uuid]) -> Vec<UserRef> {
        let mut refs = vec![creator.clone()];
        for id in invitees {
            let user = self
                .state()
                .ranking
                .iter()
                .find(|u| u.id == *id)
                .map(|u| UserRef {
                    id: u.id,
                    name: u.name.clone(),
                    avatar_url: u.avatar_url.clone(),
                })
                .unwrap_or(UserRef {
                    id: *id,
                    name: "Athlete".to_string(),
                    avatar_url: None,
                });
            refs.push(user);
        }
        refs
    }
}

/// Deduplicate ids, preserving order and dropping the excluded user.
fn dedup_excluding(ids: &[Uuid], excluded: Uuid) -> Vec<Uuid> {
    let mut out: Vec<Uuid> = Vec::with_capacity(ids.len());
    for id in ids {
        if *id != excluded && !out.contains(id) {
            out.push(*id);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_drops_excluded_and_duplicates() {
        let me = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let out = dedup_excluding(&[a, me, b, a], me);
        assert_eq!(out, vec![a, b]);
    }
}
