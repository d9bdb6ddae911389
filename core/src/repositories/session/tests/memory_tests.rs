//! Unit tests for the in-memory session store

use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::{Session, SessionMetadataUpdate, SessionState};
use crate::domain::value_objects::ClientFingerprint;
use crate::errors::StoreError;
use crate::repositories::session::{InMemorySessionStore, SessionStore};

fn fingerprint() -> ClientFingerprint {
    ClientFingerprint::new("192.168.1.10", "Mozilla/5.0 Firefox/121.0")
}

fn new_session(user_id: Uuid, hash: &str) -> Session {
    let now = Utc::now();
    Session::new(user_id, hash.to_string(), &fingerprint(), now, now + Duration::days(7))
}

#[tokio::test]
async fn test_create_and_find() {
    let store = InMemorySessionStore::new();
    let session = new_session(Uuid::new_v4(), "hash-a");
    store.create(&session).await.unwrap();

    let by_hash = store.find_by_token_hash("hash-a").await.unwrap();
    assert_eq!(by_hash, session);
    let by_id = store.find_by_id(session.id).await.unwrap();
    assert_eq!(by_id.refresh_token_hash, "hash-a");

    assert_eq!(store.find_by_token_hash("missing").await, Err(StoreError::NotFound));
}

#[tokio::test]
async fn test_duplicate_hash_conflicts() {
    let store = InMemorySessionStore::new();
    store.create(&new_session(Uuid::new_v4(), "same")).await.unwrap();
    let result = store.create(&new_session(Uuid::new_v4(), "same")).await;
    assert_eq!(result, Err(StoreError::Conflict));
}

#[tokio::test]
async fn test_revoke_reports_transition() {
    let store = InMemorySessionStore::new();
    let session = new_session(Uuid::new_v4(), "hash-r");
    store.create(&session).await.unwrap();

    assert!(store.revoke(session.id, Utc::now()).await.unwrap());
    assert!(!store.revoke(session.id, Utc::now()).await.unwrap());
    let stored = store.find_by_id(session.id).await.unwrap();
    assert_eq!(stored.state(), SessionState::Revoked);

    assert_eq!(store.revoke(Uuid::new_v4(), Utc::now()).await, Err(StoreError::NotFound));
}

#[tokio::test]
async fn test_revoke_all_for_user_and_family() {
    let store = InMemorySessionStore::new();
    let user_id = Uuid::new_v4();
    let other_user = Uuid::new_v4();
    let a = new_session(user_id, "a");
    let b = new_session(user_id, "b");
    let c = new_session(other_user, "c");
    for s in [&a, &b, &c] {
        store.create(s).await.unwrap();
    }

    assert_eq!(store.revoke_family(a.family_id, Utc::now()).await.unwrap(), 1);
    assert_eq!(store.revoke_all_for_user(user_id, Utc::now()).await.unwrap(), 1);
    assert!(store.find_by_id(b.id).await.unwrap().is_revoked());
    assert!(!store.find_by_id(c.id).await.unwrap().is_revoked());
}

#[tokio::test]
async fn test_list_active_excludes_revoked_and_expired() {
    let store = InMemorySessionStore::new();
    let user_id = Uuid::new_v4();
    let now = Utc::now();
    let active = new_session(user_id, "active");
    let revoked = new_session(user_id, "revoked");
    let mut expired = new_session(user_id, "expired");
    expired.expires_at = now - Duration::seconds(1);
    for s in [&active, &revoked, &expired] {
        store.create(s).await.unwrap();
    }
    store.revoke(revoked.id, now).await.unwrap();

    let listed = store.list_active_for_user(user_id, now).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, active.id);
}

#[tokio::test]
async fn test_update_metadata_is_compare_and_set() {
    let store = InMemorySessionStore::new();
    let session = new_session(Uuid::new_v4(), "meta");
    store.create(&session).await.unwrap();

    let update = SessionMetadataUpdate::for_refresh(&session, &fingerprint(), Utc::now());
    store.update_metadata(session.id, &update).await.unwrap();
    // Same snapshot applied twice loses
    assert_eq!(store.update_metadata(session.id, &update).await, Err(StoreError::Conflict));

    let stored = store.find_by_id(session.id).await.unwrap();
    assert_eq!(stored.refresh_count, 1);
    assert_eq!(stored.last_ip.as_deref(), Some("192.168.1.10"));

    store.revoke(session.id, Utc::now()).await.unwrap();
    let next = SessionMetadataUpdate::for_refresh(&stored, &fingerprint(), Utc::now());
    assert_eq!(store.update_metadata(session.id, &next).await, Err(StoreError::Conflict));
}

#[tokio::test]
async fn test_rotate_atomically() {
    let store = InMemorySessionStore::new();
    let parent = new_session(Uuid::new_v4(), "parent");
    store.create(&parent).await.unwrap();

    let now = Utc::now();
    let child = parent.successor("child".to_string(), &fingerprint(), now, now + Duration::days(7));
    store.rotate_atomically(parent.id, &child, now).await.unwrap();

    let old = store.find_by_id(parent.id).await.unwrap();
    assert_eq!(old.state(), SessionState::Rotated);
    assert!(old.was_rotated);
    let new = store.find_by_token_hash("child").await.unwrap();
    assert_eq!(new.parent_session_id, Some(parent.id));
    assert_eq!(new.family_id, parent.family_id);
    assert_eq!(store.family(parent.family_id).await.len(), 2);
}

#[tokio::test]
async fn test_rotate_conflict_leaves_no_trace() {
    let store = InMemorySessionStore::new();
    let parent = new_session(Uuid::new_v4(), "parent");
    store.create(&parent).await.unwrap();
    let now = Utc::now();
    let first = parent.successor("first".to_string(), &fingerprint(), now, now + Duration::days(7));
    let second = parent.successor("second".to_string(), &fingerprint(), now, now + Duration::days(7));

    store.rotate_atomically(parent.id, &first, now).await.unwrap();
    assert_eq!(store.rotate_atomically(parent.id, &second, now).await, Err(StoreError::Conflict));
    assert_eq!(store.find_by_token_hash("second").await, Err(StoreError::NotFound));
    assert_eq!(store.len().await, 2);
}

#[tokio::test]
async fn test_concurrent_rotation_has_single_winner() {
    let store = Arc::new(InMemorySessionStore::new());
    let parent = new_session(Uuid::new_v4(), "parent");
    store.create(&parent).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = store.clone();
        let parent = parent.clone();
        handles.push(tokio::spawn(async move {
            let now = Utc::now();
            let child = parent.successor(format!("child-{}", i), &fingerprint(), now, now + Duration::days(7));
            store.rotate_atomically(parent.id, &child, now).await
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}
