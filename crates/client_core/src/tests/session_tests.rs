use std::time::Duration;

use identity::InMemoryIdentityProvider;
use tokio_stream::StreamExt;

use super::*;
use crate::test_support::{me, SilentIdentityProvider};

#[tokio::test]
async fn resolves_signed_out_when_nobody_is_signed_in() {
    let provider = Arc::new(InMemoryIdentityProvider::default());
    let context = SessionContext::start(provider);
    let mut handle = context.handle();

    let snapshot = handle.resolved().await.expect("resolved");
    assert!(!snapshot.is_resolving);
    assert_eq!(snapshot.current_identity, None);
    context.shutdown().await;
}

#[tokio::test]
async fn resolves_to_restored_identity_and_follows_sign_out() {
    let provider = Arc::new(InMemoryIdentityProvider::default());
    provider.restore_session(me()).await;
    let context = SessionContext::start(provider.clone());
    let mut handle = context.handle();

    let snapshot = handle.resolved().await.expect("resolved");
    assert_eq!(
        snapshot.current_identity.map(|i| i.email),
        Some("me@x.com".to_string())
    );

    provider.sign_out().await.expect("sign out");
    assert!(handle.changed().await);
    let after = handle.snapshot();
    assert_eq!(after.current_identity, None);
    assert!(!after.is_resolving, "resolving never comes back");
}

#[tokio::test(start_paused = true)]
async fn silent_provider_leaves_session_resolving() {
    let provider = Arc::new(SilentIdentityProvider::default());
    let context = SessionContext::start(provider.clone());
    let mut handle = context.handle();

    let waited = tokio::time::timeout(Duration::from_secs(60), handle.resolved()).await;
    assert!(waited.is_err(), "session must not resolve on its own");
    assert!(handle.is_resolving());
    assert_eq!(handle.current_identity(), None);

    provider
        .announce(identity::SessionChange::SignedIn(me()))
        .await;
    let snapshot = handle.resolved().await.expect("resolved");
    assert_eq!(snapshot.current_identity, Some(me()));
}

#[tokio::test]
async fn shutdown_unsubscribes_from_provider() {
    let provider = Arc::new(InMemoryIdentityProvider::default());
    let context = SessionContext::start(provider.clone());
    let mut handle = context.handle();
    handle.resolved().await.expect("resolved");
    assert_eq!(provider.subscriber_count().await, 1);

    context.shutdown().await;
    assert_eq!(provider.subscriber_count().await, 0);
    assert!(!handle.changed().await);
    assert!(handle.resolved().await.is_some(), "last snapshot stays readable");
}

#[tokio::test]
async fn change_stream_starts_with_current_snapshot() {
    let provider = Arc::new(InMemoryIdentityProvider::default());
    let context = SessionContext::start(provider.clone());
    let mut handle = context.handle();
    handle.resolved().await.expect("resolved");

    let mut changes = handle.changes();
    let first = changes.next().await.expect("initial snapshot");
    assert_eq!(first.current_identity, None);

    provider.restore_session(me()).await;
    let next = changes.next().await.expect("sign-in change");
    assert_eq!(next.current_identity, Some(me()));
}
