//! Sign-in, persistence and restore across a restart.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use bitebox_client::storage::keys;
use bitebox_client::{AuthError, AuthSession, KeyValueStore, MemoryStore};
use bitebox_core::{User, UserRole};
use bitebox_integration_tests::FakeBackend;
use secrecy::SecretString;
use serde_json::json;

fn backend_with_driver() -> FakeBackend {
    let backend = FakeBackend::new();
    backend.register(
        "rider@example.com",
        "hunter2",
        json!({
            "id": 77,
            "email": "rider@example.com",
            "name": "Bayo",
            "phone": "+2348011111111",
            "role": "driver",
        }),
    );
    backend
}

#[tokio::test]
async fn test_driver_login_is_stored_as_delivery() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let mut auth = AuthSession::new(backend_with_driver(), Arc::clone(&store));

    let user = auth
        .login(
            "rider@example.com",
            SecretString::from("hunter2"),
            UserRole::Delivery,
        )
        .await
        .unwrap();
    assert_eq!(user.role, UserRole::Delivery);
    assert_eq!(user.id.as_str(), "77");

    let saved: User = serde_json::from_str(&store.get(keys::USER).unwrap().unwrap()).unwrap();
    assert_eq!(saved.role, UserRole::Delivery);
    assert_eq!(store.get(keys::ACCESS_TOKEN).unwrap().as_deref(), Some("access-77"));
    assert_eq!(store.get(keys::REFRESH_TOKEN).unwrap().as_deref(), Some("refresh-77"));
}

#[tokio::test]
async fn test_session_survives_restart_until_logout() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let backend = backend_with_driver();

    let mut first = AuthSession::new(backend.clone(), Arc::clone(&store));
    first
        .login(
            "rider@example.com",
            SecretString::from("hunter2"),
            UserRole::Delivery,
        )
        .await
        .unwrap();
    first.complete_onboarding().unwrap();

    let mut restarted = AuthSession::new(backend.clone(), Arc::clone(&store));
    assert!(restarted.is_loading());
    restarted.load_user().unwrap();
    assert!(!restarted.is_loading());
    assert!(restarted.is_authenticated());
    assert!(restarted.has_completed_onboarding());
    assert!(restarted.user().unwrap().is_driver());

    restarted.logout();
    assert!(!restarted.is_authenticated());
    for key in keys::ALL {
        assert!(store.get(key).unwrap().is_none(), "{key} should be cleared");
    }

    let mut after_logout = AuthSession::new(backend, store);
    after_logout.load_user().unwrap();
    assert!(after_logout.user().is_none());
}

#[tokio::test]
async fn test_wrong_password_stores_nothing() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let mut auth = AuthSession::new(backend_with_driver(), Arc::clone(&store));

    let err = auth
        .login(
            "rider@example.com",
            SecretString::from("wrong"),
            UserRole::Delivery,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Api(ref e) if e.is_unauthorized()));
    assert!(!auth.is_authenticated());
    assert!(store.get(keys::USER).unwrap().is_none());
}
