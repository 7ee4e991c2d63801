//! Integration tests for the friendship lifecycle across two clients.

use fitlife::store::AppStore;
use fitlife::MemoryGateway;
use uuid::Uuid;

async fn client(gateway: &MemoryGateway, email: &str, name: &str) -> AppStore<MemoryGateway> {
    let mut store = AppStore::new(gateway.clone());
    store.sign_up(email, "password", name).await.unwrap();
    store
}

#[tokio::test]
async fn request_and_accept_flow() {
    let gateway = MemoryGateway::new();
    let mut ana = client(&gateway, "ana@example.com", "Ana").await;
    let mut bruno = client(&gateway, "bruno@example.com", "Bruno").await;
    let ana_id = ana.current_user_id().unwrap();
    let bruno_id = bruno.current_user_id().unwrap();

    // Ana requests; her outgoing set updates immediately.
    ana.add_friend(bruno_id).await.unwrap();
    assert!(ana.state().friends.outgoing.contains(&bruno_id));
    assert!(!ana.state().friends.confirmed.contains(&bruno_id));

    // Bruno sees the incoming request after his next refresh.
    bruno.refresh_ranking().await.unwrap();
    assert!(bruno.state().friends.incoming.contains(&ana_id));

    bruno.accept_friend(ana_id).await.unwrap();
    assert!(bruno.state().friends.confirmed.contains(&ana_id));
    assert!(!bruno.state().friends.incoming.contains(&ana_id));

    // Ana's next refresh moves Bruno from outgoing to confirmed.
    ana.refresh_ranking().await.unwrap();
    assert!(ana.state().friends.confirmed.contains(&bruno_id));
    assert!(!ana.state().friends.outgoing.contains(&bruno_id));
}

#[tokio::test]
async fn self_and_duplicate_requests_are_ignored() {
    let gateway = MemoryGateway::new();
    let mut ana = client(&gateway, "ana@example.com", "Ana").await;
    let bruno = client(&gateway, "bruno@example.com", "Bruno").await;
    let ana_id = ana.current_user_id().unwrap();
    let bruno_id = bruno.current_user_id().unwrap();

    ana.add_friend(ana_id).await.unwrap();
    assert!(ana.state().friends.outgoing.is_empty());

    ana.add_friend(bruno_id).await.unwrap();
    // Second request is a guarded no-op; the backend would reject the
    // duplicate edge, but it is never asked.
    ana.add_friend(bruno_id).await.unwrap();
    assert_eq!(ana.state().friends.outgoing.len(), 1);
}

#[tokio::test]
async fn removal_clears_both_directions_and_is_idempotent() {
    let gateway = MemoryGateway::new();
    let mut ana = client(&gateway, "ana@example.com", "Ana").await;
    let mut bruno = client(&gateway, "bruno@example.com", "Bruno").await;
    let ana_id = ana.current_user_id().unwrap();
    let bruno_id = bruno.current_user_id().unwrap();

    ana.add_friend(bruno_id).await.unwrap();
    bruno.refresh_ranking().await.unwrap();
    bruno.accept_friend(ana_id).await.unwrap();

    // Bruno removes the friendship even though Ana owns the edge row.
    bruno.remove_friend(ana_id).await.unwrap();
    assert!(!bruno.state().friends.confirmed.contains(&ana_id));

    ana.refresh_ranking().await.unwrap();
    assert!(!ana.state().friends.confirmed.contains(&bruno_id));
    assert!(!ana.state().friends.outgoing.contains(&bruno_id));

    // Removing again, or removing a stranger, succeeds quietly.
    bruno.remove_friend(ana_id).await.unwrap();
    bruno.remove_friend(Uuid::new_v4()).await.unwrap();
}

#[tokio::test]
async fn rejecting_an_incoming_request_uses_removal() {
    let gateway = MemoryGateway::new();
    let mut ana = client(&gateway, "ana@example.com", "Ana").await;
    let mut bruno = client(&gateway, "bruno@example.com", "Bruno").await;
    let ana_id = ana.current_user_id().unwrap();
    let bruno_id = bruno.current_user_id().unwrap();

    ana.add_friend(bruno_id).await.unwrap();
    bruno.refresh_ranking().await.unwrap();
    assert!(bruno.state().friends.incoming.contains(&ana_id));

    bruno.remove_friend(ana_id).await.unwrap();
    assert!(bruno.state().friends.incoming.is_empty());

    // The pending edge is gone on Ana's side too.
    ana.refresh_ranking().await.unwrap();
    assert!(ana.state().friends.outgoing.is_empty());
}
