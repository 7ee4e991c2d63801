//! Integration tests for challenge creation, editing, membership, and the
//! partial-sync failure mode.

use chrono::{TimeZone, Utc};
use fitlife::store::{AppStore, ChallengeForm, StoreError, WorkoutForm};
use fitlife::{Intensity, MemoryGateway};
use uuid::Uuid;

fn workout(activity: &str) -> WorkoutForm {
    WorkoutForm {
        activity: activity.to_string(),
        duration_min: 30,
        intensity: Intensity::High,
        weight_notes: None,
        sets_notes: None,
        photo: None,
    }
}

fn form(title: &str, friend_ids: Vec<Uuid>) -> ChallengeForm {
    ChallengeForm {
        title: title.to_string(),
        description: Some("First to ten workouts".to_string()),
        starts_at: Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap(),
        ends_at: Utc.with_ymd_and_hms(2025, 7, 7, 0, 0, 0).unwrap(),
        friend_ids,
    }
}

/// A client with a materialized profile row, so it shows up as a
/// participant in joined challenge fetches.
async fn client(gateway: &MemoryGateway, email: &str, name: &str) -> AppStore<MemoryGateway> {
    let mut store = AppStore::new(gateway.clone());
    store.sign_up(email, "password", name).await.unwrap();
    store.save_workout(workout("Warmup")).await.unwrap();
    store
}

#[tokio::test]
async fn creator_is_always_a_participant() {
    let gateway = MemoryGateway::new();
    let mut ana = client(&gateway, "ana@example.com", "Ana").await;
    let bruno = client(&gateway, "bruno@example.com", "Bruno").await;
    let ana_id = ana.current_user_id().unwrap();
    let bruno_id = bruno.current_user_id().unwrap();

    ana.create_challenge(form("July showdown", vec![bruno_id, ana_id, bruno_id]))
        .await
        .unwrap();

    let challenge = &ana.state().challenges[0];
    assert_eq!(challenge.title, "July showdown");
    assert_eq!(challenge.creator.id, ana_id);
    let ids: Vec<Uuid> = challenge.participants.iter().map(|p| p.id).collect();
    // Creator once, invitee once, duplicates collapsed.
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&ana_id));
    assert!(ids.contains(&bruno_id));
}

#[tokio::test]
async fn failed_invitee_batch_leaves_a_partial_challenge() {
    let gateway = MemoryGateway::new();
    let mut ana = client(&gateway, "ana@example.com", "Ana").await;
    let bruno = client(&gateway, "bruno@example.com", "Bruno").await;
    let ana_id = ana.current_user_id().unwrap();
    let bruno_id = bruno.current_user_id().unwrap();

    // First participant insert is the creator; the invitee batch is second.
    gateway.fail_nth("insert_participants", 1);

    let err = ana
        .create_challenge(form("July showdown", vec![bruno_id]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::ParticipantSync {
            failed: 1,
            total: 2
        }
    ));

    // The challenge exists with whoever made it in.
    let challenge = &ana.state().challenges[0];
    let ids: Vec<Uuid> = challenge.participants.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![ana_id]);
}

#[tokio::test]
async fn failed_creator_insert_still_invites_and_keeps_the_challenge() {
    let gateway = MemoryGateway::new();
    let mut ana = client(&gateway, "ana@example.com", "Ana").await;
    let bruno = client(&gateway, "bruno@example.com", "Bruno").await;
    let ana_id = ana.current_user_id().unwrap();
    let bruno_id = bruno.current_user_id().unwrap();

    // The creator's own membership insert is the first participant call.
    gateway.fail_next("insert_participants");

    let err = ana
        .create_challenge(form("July showdown", vec![bruno_id]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::ParticipantSync {
            failed: 1,
            total: 2
        }
    ));

    // The invitee batch still ran and the challenge is visible locally.
    assert_eq!(ana.state().challenges.len(), 1);
    let ids: Vec<Uuid> = ana.state().challenges[0]
        .participants
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, vec![bruno_id]);
    assert!(!ids.contains(&ana_id));
}

#[tokio::test]
async fn editing_syncs_membership_but_never_drops_the_creator() {
    let gateway = MemoryGateway::new();
    let mut ana = client(&gateway, "ana@example.com", "Ana").await;
    let bruno = client(&gateway, "bruno@example.com", "Bruno").await;
    let carla = client(&gateway, "carla@example.com", "Carla").await;
    let ana_id = ana.current_user_id().unwrap();
    let bruno_id = bruno.current_user_id().unwrap();
    let carla_id = carla.current_user_id().unwrap();

    ana.create_challenge(form("July showdown", vec![bruno_id]))
        .await
        .unwrap();
    let challenge_id = ana.state().challenges[0].id;

    // Swap Bruno for Carla; an empty invitee list could not remove Ana.
    let mut edited = form("July showdown, extended", vec![carla_id]);
    edited.ends_at = Utc.with_ymd_and_hms(2025, 7, 14, 0, 0, 0).unwrap();
    ana.update_challenge(challenge_id, edited).await.unwrap();

    let challenge = &ana.state().challenges[0];
    assert_eq!(challenge.title, "July showdown, extended");
    let ids: Vec<Uuid> = challenge.participants.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![ana_id, carla_id]);

    // The backend agrees after a refetch.
    ana.refresh_challenges().await.unwrap();
    let ids: Vec<Uuid> = ana.state().challenges[0]
        .participants
        .iter()
        .map(|p| p.id)
        .collect();
    assert!(ids.contains(&ana_id));
    assert!(ids.contains(&carla_id));
    assert!(!ids.contains(&bruno_id));
}

#[tokio::test]
async fn partial_membership_sync_still_replaces_local_state() {
    let gateway = MemoryGateway::new();
    let mut ana = client(&gateway, "ana@example.com", "Ana").await;
    let bruno = client(&gateway, "bruno@example.com", "Bruno").await;
    let ana_id = ana.current_user_id().unwrap();
    let bruno_id = bruno.current_user_id().unwrap();

    ana.create_challenge(form("July showdown", vec![])).await.unwrap();
    let challenge_id = ana.state().challenges[0].id;

    gateway.fail_next("insert_participants");
    let err = ana
        .update_challenge(challenge_id, form("July showdown", vec![bruno_id]))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ParticipantSync { .. }));

    // The form result is what the user sees, drift and all.
    let ids: Vec<Uuid> = ana.state().challenges[0]
        .participants
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, vec![ana_id, bruno_id]);
}

#[tokio::test]
async fn leaving_and_deleting() {
    let gateway = MemoryGateway::new();
    let mut ana = client(&gateway, "ana@example.com", "Ana").await;
    let mut bruno = client(&gateway, "bruno@example.com", "Bruno").await;
    let bruno_id = bruno.current_user_id().unwrap();

    ana.create_challenge(form("July showdown", vec![bruno_id]))
        .await
        .unwrap();
    let challenge_id = ana.state().challenges[0].id;

    bruno.refresh_challenges().await.unwrap();
    bruno.leave_challenge(challenge_id).await.unwrap();
    assert!(!bruno.state().challenges[0]
        .participants
        .iter()
        .any(|p| p.id == bruno_id));

    ana.delete_challenge(challenge_id).await.unwrap();
    assert!(ana.state().challenges.is_empty());
    bruno.refresh_challenges().await.unwrap();
    assert!(bruno.state().challenges.is_empty());
}
