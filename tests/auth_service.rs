mod common;

use asset_library::services::{
    auth_service::AuthService,
    session::{AuthChange, AuthError, SessionProvider},
};
use common::memory_pool;

async fn auth() -> AuthService {
    AuthService::new(memory_pool().await, "http://assets.test/")
}

#[tokio::test]
async fn magic_link_signs_in_once() {
    let auth = auth().await;
    let mut changes = auth.on_auth_change();

    let link = auth.sign_in_with_magic_link(" Ada@Example.com ").await.unwrap();
    assert_eq!(link.email, "ada@example.com");
    assert_eq!(
        link.url,
        format!("http://assets.test/auth/verify?token={}", link.token)
    );

    let issued = auth.complete_magic_link(&link.token).await.unwrap();
    assert_eq!(issued.user.email, "ada@example.com");
    assert_eq!(
        changes.recv().await.unwrap(),
        AuthChange::SignedIn(issued.user.clone())
    );

    let current = auth.get_current_user(&issued.access_token).await.unwrap();
    assert_eq!(current, Some(issued.user.clone()));

    let reused = auth.complete_magic_link(&link.token).await.unwrap_err();
    assert!(matches!(reused, AuthError::InvalidLink));
}

#[tokio::test]
async fn same_email_maps_to_same_user() {
    let auth = auth().await;
    let first = auth.sign_in_with_magic_link("ada@example.com").await.unwrap();
    let second = auth.sign_in_with_magic_link("ADA@example.com").await.unwrap();

    let a = auth.complete_magic_link(&first.token).await.unwrap();
    let b = auth.complete_magic_link(&second.token).await.unwrap();
    assert_eq!(a.user.id, b.user.id);
    assert_ne!(a.access_token, b.access_token);
}

#[tokio::test]
async fn sign_out_ends_session_and_notifies() {
    let auth = auth().await;
    let link = auth.sign_in_with_magic_link("ada@example.com").await.unwrap();
    let issued = auth.complete_magic_link(&link.token).await.unwrap();
    let mut changes = auth.on_auth_change();

    auth.sign_out(&issued.access_token).await.unwrap();

    let change = changes.recv().await.unwrap();
    assert_eq!(change.user(), None);
    assert_eq!(
        change,
        AuthChange::SignedOut {
            user_id: issued.user.id.clone()
        }
    );
    assert_eq!(
        auth.get_current_user(&issued.access_token).await.unwrap(),
        None
    );

    // signing out twice is harmless
    auth.sign_out(&issued.access_token).await.unwrap();
}

#[tokio::test]
async fn rejects_bad_email_and_unknown_links() {
    let auth = auth().await;
    assert!(matches!(
        auth.sign_in_with_magic_link("not-an-email").await,
        Err(AuthError::InvalidEmail(_))
    ));
    assert!(matches!(
        auth.complete_magic_link("made-up").await,
        Err(AuthError::InvalidLink)
    ));
    assert_eq!(auth.get_current_user("made-up").await.unwrap(), None);
}
