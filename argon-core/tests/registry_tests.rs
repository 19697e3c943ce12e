//! Integration tests for the session registry
//!
//! Exercises the cross-session shared structure under concurrency: create
//! and remove from many tasks at once, with duplicate detection racing.

use std::sync::Arc;

use argon_core::error::ArgonError;
use argon_core::types::{OwnerId, SessionHandle, SessionKind};
use argon_core::SessionRegistry;

#[tokio::test]
async fn test_concurrent_creates_are_all_visible() {
    let registry = Arc::new(SessionRegistry::new());

    let mut tasks = Vec::new();
    for i in 0..32 {
        let registry = registry.clone();
        tasks.push(tokio::spawn(async move {
            registry.create(
                SessionHandle::new(format!("s{}", i)),
                SessionKind::ScreenCast,
                "org.example.App",
                OwnerId::new(i),
            )
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(registry.len(), 32);
    for i in 0..32 {
        assert!(registry.lookup(&SessionHandle::new(format!("s{}", i))).is_some());
    }
}

#[tokio::test]
async fn test_racing_creates_on_one_handle_pick_a_single_winner() {
    let registry = Arc::new(SessionRegistry::new());

    let mut tasks = Vec::new();
    for i in 0..16 {
        let registry = registry.clone();
        tasks.push(tokio::spawn(async move {
            registry.create(
                SessionHandle::new("contested"),
                SessionKind::ScreenCast,
                "org.example.App",
                OwnerId::new(i),
            )
        }));
    }

    let mut created = 0;
    let mut duplicates = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => created += 1,
            Err(ArgonError::DuplicateSession(_)) => duplicates += 1,
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(duplicates, 15);
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn test_remove_makes_the_handle_reusable() {
    let registry = Arc::new(SessionRegistry::new());
    let handle = SessionHandle::new("recycled");

    for generation in 0..8 {
        registry
            .create(
                handle.clone(),
                SessionKind::RemoteDesktop,
                "org.example.App",
                OwnerId::new(generation),
            )
            .unwrap();
        assert!(registry.lookup(&handle).is_some());
        registry.remove(&handle);
        assert!(registry.lookup(&handle).is_none());
    }
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_ownership_index_tracks_removals() {
    let registry = SessionRegistry::new();
    let owner = OwnerId::new(7);
    for i in 0..4 {
        registry
            .create(
                SessionHandle::new(format!("o{}", i)),
                SessionKind::ScreenCast,
                "org.example.App",
                owner,
            )
            .unwrap();
    }

    registry.remove(&SessionHandle::new("o2"));
    let owned = registry.handles_owned_by(owner);
    assert_eq!(owned.len(), 3);
    assert!(owned.iter().all(|h| h.as_str() != "o2"));
}
