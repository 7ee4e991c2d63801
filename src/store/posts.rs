//! Workout post actions.
//!
//! Saving uploads the photo first and degrades to a text-only record when
//! the upload fails; the workout itself is never lost to a storage error.
//! Likes are optimistic with an inverse rollback; comments are
//! submit-then-refetch because the backend owns comment identity.

use tracing::{info, warn};
use uuid::Uuid;

use crate::gateway::{NewPost, PostPatch, ProfileRecord, RemoteGateway};
use crate::social::types::Intensity;

use super::{AppStore, StoreError, DEFAULT_HEIGHT_CM};

/// Photo attached to a workout, ready for upload.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Log-form contents for a new or edited workout.
#[derive(Debug, Clone)]
pub struct WorkoutForm {
    pub activity: String,
    pub duration_min: u32,
    pub intensity: Intensity,
    pub weight_notes: Option<String>,
    pub sets_notes: Option<String>,
    pub photo: Option<PhotoUpload>,
}

impl<G: RemoteGateway> AppStore<G> {
    /// Save the log form. With an editing post loaded this updates it in
    /// place; otherwise it creates a new post with zero likes. Afterwards
    /// the affected collections are refetched and the form closes.
    pub async fn save_workout(&mut self, form: WorkoutForm) -> Result<(), StoreError> {
        let uid = self.user_id()?;
        let editing = self.state().editing_post.clone();

        let mut image_url = match form.photo {
            Some(photo) => match self.gateway().upload_image(&photo.file_name, photo.bytes).await {
                Ok(url) => Some(url),
                Err(err) => {
                    // The workout still gets recorded, just without a photo.
                    warn!(error = %err, "photo upload failed, saving without image");
                    None
                }
            },
            None => None,
        };

        match editing {
            Some(post) => {
                if image_url.is_none() {
                    image_url = post.image_url.clone();
                }
                self.gateway()
                    .update_post(
                        post.id,
                        PostPatch {
                            activity: form.activity,
                            duration_min: form.duration_min,
                            intensity: form.intensity.as_str().to_string(),
                            weight: form.weight_notes,
                            sets: form.sets_notes,
                            image_url,
                        },
                    )
                    .await?;
                info!(post_id = %post.id, "workout updated");
                self.close_log();
                self.refresh_posts().await?;
                self.refresh_ranking().await?;
            }
            None => {
                let post_id = self
                    .gateway()
                    .insert_post(NewPost {
                        user_id: uid,
                        activity: form.activity,
                        duration_min: form.duration_min,
                        intensity: form.intensity.as_str().to_string(),
                        weight: form.weight_notes,
                        sets: form.sets_notes,
                        image_url,
                    })
                    .await?;
                info!(post_id = %post_id, "workout logged");

                // The first workout is also the moment the profile row gets
                // materialized, so name and weights survive a ranking
                // rebuild.
                let profile = self.profile_row(uid);
                if let Err(err) = self.gateway().upsert_profile(&profile).await {
                    warn!(error = %err, "profile upsert failed");
                }

                self.close_log();
                self.refresh_posts().await?;
                self.refresh_ranking().await?;
                self.refresh_profile().await?;
            }
        }
        Ok(())
    }

    /// Delete an own post, drop it from the feed immediately, and refresh
    /// the derived collections.
    pub async fn delete_post(&mut self, post_id: Uuid) -> Result<(), StoreError> {
        self.gateway().delete_post(post_id).await?;
        self.state_mut().posts.retain(|p| p.id != post_id);
        info!(post_id = %post_id, "workout deleted");
        self.refresh_ranking().await?;
        self.refresh_profile().await?;
        Ok(())
    }

    /// Flip the like state of a post. The flip is applied locally first and
    /// reverted with the exact inverse if the remote write fails.
    pub async fn toggle_like(&mut self, post_id: Uuid) -> Result<(), StoreError> {
        let uid = self.user_id()?;
        let was_liked = {
            let post = self
                .state_mut()
                .posts
                .iter_mut()
                .find(|p| p.id == post_id)
                .ok_or(StoreError::UnknownPost(post_id))?;
            let was_liked = post.liked_by_me;
            post.liked_by_me = !was_liked;
            if was_liked {
                post.likes = post.likes.saturating_sub(1);
            } else {
                post.likes += 1;
            }
            was_liked
        };

        let result = if was_liked {
            self.gateway().delete_like(post_id, uid).await
        } else {
            self.gateway().insert_like(post_id, uid).await
        };

        if let Err(err) = result {
            warn!(post_id = %post_id, error = %err, "like toggle failed, reverting");
            if let Some(post) = self.state_mut().posts.iter_mut().find(|p| p.id == post_id) {
                post.liked_by_me = was_liked;
                if was_liked {
                    post.likes += 1;
                } else {
                    post.likes = post.likes.saturating_sub(1);
                }
            }
            return Err(err.into());
        }
        Ok(())
    }

    /// Append a comment and refetch the feed; the backend-assigned comment
    /// id and timestamp are authoritative. Blank text is ignored.
    pub async fn comment(&mut self, post_id: Uuid, text: &str) -> Result<(), StoreError> {
        let uid = self.user_id()?;
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }
        if !self.state().posts.iter().any(|p| p.id == post_id) {
            return Err(StoreError::UnknownPost(post_id));
        }
        self.gateway().insert_comment(post_id, uid, text).await?;
        self.refresh_posts().await?;
        Ok(())
    }

    /// Profile row snapshot from local state, for the upsert that rides
    /// along with a first workout.
    fn profile_row(&self, uid: Uuid) -> ProfileRecord {
        let current = self.state().current_user.as_ref();
        let session_name = self
            .session
            .as_ref()
            .and_then(|s| s.display_name.clone());
        ProfileRecord {
            id: uid,
            full_name: current.map(|u| u.name.clone()).or(session_name),
            avatar_url: current.and_then(|u| u.avatar_url.clone()),
            current_weight: current
                .map(|u| u.current_weight_kg)
                .filter(|w| *w > 0.0),
            initial_weight: current
                .map(|u| u.initial_weight_kg)
                .filter(|w| *w > 0.0),
            height: current
                .map(|u| u.height_cm)
                .filter(|h| *h > 0.0 && *h != DEFAULT_HEIGHT_CM),
            updated_at: None,
        }
    }
}
