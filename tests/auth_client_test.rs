//! Auth service integration tests using wiremock
//!
//! Covers password sign-in, both sign-up outcomes, sign-out, password
//! change and the profile and notification metadata updates, plus the local
//! checks that keep bad input off the wire.

mod common;

use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use marketa::auth::{
    gate, Access, AuthClient, AuthUser, NotificationPreferences, Profile, Route, Session,
    SignUpOutcome,
};
use marketa::error::MarketaError;

use common::backend_config;

fn make_client(server: &MockServer) -> AuthClient {
    AuthClient::new(&backend_config(&server.uri())).expect("client")
}

fn token_body() -> serde_json::Value {
    serde_json::json!({
        "access_token": "access-1",
        "refresh_token": "refresh-1",
        "expires_in": 3600,
        "token_type": "bearer",
        "user": { "id": "user-1", "email": "ada@example.com" }
    })
}

fn session() -> Session {
    Session {
        access_token: "access-1".to_string(),
        refresh_token: None,
        expires_at: None,
        user: AuthUser {
            id: "user-1".to_string(),
            email: Some("ada@example.com".to_string()),
        },
    }
}

fn auth_message(err: anyhow::Error) -> String {
    match err.downcast::<MarketaError>() {
        Ok(MarketaError::Authentication(msg)) => msg,
        Ok(other) => panic!("expected authentication error, got {:?}", other),
        Err(other) => panic!("expected MarketaError, got {:?}", other),
    }
}

/// A successful sign-in yields a session that opens the dashboard.
#[tokio::test]
async fn test_sign_in_opens_dashboard() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(header("apikey", "anon-key"))
        .and(body_json(serde_json::json!({
            "email": "ada@example.com",
            "password": "secret1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = make_client(&server);
    let session = client
        .sign_in(" ada@example.com ", "secret1")
        .await
        .expect("sign in");

    assert_eq!(session.access_token, "access-1");
    assert_eq!(session.refresh_token.as_deref(), Some("refresh-1"));
    assert_eq!(session.user.id, "user-1");
    assert!(!session.is_expired());

    assert_eq!(gate(Route::Auth, true), Access::Redirect(Route::Dashboard));
    assert_eq!(gate(Route::Dashboard, true), Access::Allow);
}

/// The service's own message is surfaced on bad credentials.
#[tokio::test]
async fn test_sign_in_rejected_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&server)
        .await;

    let client = make_client(&server);
    let err = client
        .sign_in("ada@example.com", "wrong-password")
        .await
        .expect_err("rejected");
    assert_eq!(auth_message(err), "Invalid login credentials");
}

/// Empty fields never reach the service.
#[tokio::test]
async fn test_sign_in_empty_fields_not_sent() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
        .expect(0)
        .mount(&server)
        .await;

    let client = make_client(&server);
    let err = client.sign_in("", "secret1").await.expect_err("empty email");
    assert!(matches!(
        err.downcast_ref::<MarketaError>(),
        Some(MarketaError::Validation(_))
    ));
}

/// Sign-up without auto-confirm leaves the user pending confirmation.
#[tokio::test]
async fn test_sign_up_requires_confirmation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "user-2",
            "email": "grace@example.com",
            "confirmation_sent_at": "2025-01-15T10:00:00Z"
        })))
        .mount(&server)
        .await;

    let client = make_client(&server);
    let outcome = client
        .sign_up("grace@example.com", "secret1")
        .await
        .expect("sign up");

    match outcome {
        SignUpOutcome::ConfirmationRequired(user) => assert_eq!(user.id, "user-2"),
        other => panic!("expected confirmation, got {:?}", other),
    }
}

/// Sign-up with auto-confirm opens a session straight away.
#[tokio::test]
async fn test_sign_up_auto_confirmed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
        .mount(&server)
        .await;

    let client = make_client(&server);
    let outcome = client
        .sign_up("ada@example.com", "secret1")
        .await
        .expect("sign up");
    assert!(matches!(outcome, SignUpOutcome::SignedIn(ref s) if s.user.id == "user-1"));
}

/// Sign-out sends the session's bearer token.
#[tokio::test]
async fn test_sign_out_uses_bearer() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("Authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = make_client(&server);
    client.sign_out(&session()).await.expect("sign out");
}

/// Password change is checked locally, then sent as a user update.
#[tokio::test]
async fn test_update_password() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/auth/v1/user"))
        .and(header("Authorization", "Bearer access-1"))
        .and(body_json(serde_json::json!({ "password": "newpass1" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "user-1" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = make_client(&server);

    let mismatch = client
        .update_password(&session(), "newpass1", "newpass2")
        .await
        .expect_err("mismatch");
    assert!(mismatch.to_string().contains("New passwords do not match"));

    let short = client
        .update_password(&session(), "abc", "abc")
        .await
        .expect_err("too short");
    assert!(short
        .to_string()
        .contains("Password must be at least 6 characters"));

    client
        .update_password(&session(), "newpass1", "newpass1")
        .await
        .expect("update");
}

/// Profile fields go to user metadata; unset fields are left out.
#[tokio::test]
async fn test_update_profile_sends_metadata() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/auth/v1/user"))
        .and(header("Authorization", "Bearer access-1"))
        .and(body_json(serde_json::json!({
            "data": { "full_name": "Ada Lovelace", "company": "Analytical Engines" }
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "user-1" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = make_client(&server);
    let profile = Profile {
        full_name: Some("Ada Lovelace".to_string()),
        company: Some("Analytical Engines".to_string()),
        website: None,
    };
    client
        .update_profile(&session(), &profile)
        .await
        .expect("profile update");

    let empty = client
        .update_profile(&session(), &Profile::default())
        .await
        .expect_err("nothing to update");
    assert!(matches!(
        empty.downcast_ref::<MarketaError>(),
        Some(MarketaError::Validation(_))
    ));
}

/// All four notification switches are saved together.
#[tokio::test]
async fn test_update_preferences_sends_all_switches() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/auth/v1/user"))
        .and(body_json(serde_json::json!({
            "data": {
                "email_notifications": true,
                "marketing_emails": true,
                "campaign_alerts": false,
                "weekly_reports": true
            }
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "user-1" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = make_client(&server);
    let preferences = NotificationPreferences {
        marketing_emails: true,
        campaign_alerts: false,
        ..Default::default()
    };
    client
        .update_preferences(&session(), &preferences)
        .await
        .expect("preferences update");
}

/// A rejected metadata update surfaces the service's message.
#[tokio::test]
async fn test_update_preferences_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "msg": "JWT expired"
        })))
        .mount(&server)
        .await;

    let client = make_client(&server);
    let err = client
        .update_preferences(&session(), &NotificationPreferences::default())
        .await
        .expect_err("rejected");
    assert_eq!(auth_message(err), "JWT expired");
}
