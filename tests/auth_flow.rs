mod support;

use serde_json::json;

use support::FakeRemote;
use taskdeck::commands::{login, register};
use taskdeck::model::RegistrationForm;
use taskdeck::session::SessionStore;
use taskdeck::Error;

fn form() -> RegistrationForm {
    RegistrationForm {
        name: "Ada Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        password: "Analytical1".to_string(),
        confirm_password: "Analytical1".to_string(),
    }
}

#[tokio::test]
async fn register_sends_valid_form() -> Result<(), Box<dyn std::error::Error>> {
    let remote = FakeRemote::new();
    remote.reply("register", json!({"message": "User registered"}));

    let response = register(remote.as_ref(), &form()).await?;

    assert_eq!(response["message"], "User registered");
    assert_eq!(remote.calls(), vec!["register"]);
    Ok(())
}

#[tokio::test]
async fn register_rejects_mismatched_passwords_locally() {
    let remote = FakeRemote::new();
    let mut form = form();
    form.confirm_password = "Analytical2".to_string();

    let err = register(remote.as_ref(), &form).await.unwrap_err();

    let Error::Validation(errors) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(errors.get("confirmPassword"), Some("Passwords don't match"));
    assert!(remote.calls().is_empty());
}

#[tokio::test]
async fn register_reports_each_invalid_field() {
    let remote = FakeRemote::new();
    let form = RegistrationForm {
        name: "A".to_string(),
        email: "not-an-email".to_string(),
        password: "short".to_string(),
        confirm_password: "short".to_string(),
    };

    let err = register(remote.as_ref(), &form).await.unwrap_err();

    let Error::Validation(errors) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert!(errors.get("name").is_some());
    assert_eq!(errors.get("email"), Some("Invalid email address"));
    assert_eq!(
        errors.get("password"),
        Some("Password must be at least 8 characters long")
    );
    assert_eq!(errors.get("confirmPassword"), None);
}

#[tokio::test]
async fn login_requires_email_and_password() {
    let remote = FakeRemote::new();

    let err = login(remote.as_ref(), "", "").await.unwrap_err();

    let Error::Validation(errors) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(errors.get("email"), Some("Email is required"));
    assert_eq!(errors.get("password"), Some("Password is required"));
    assert!(remote.calls().is_empty());
}

#[tokio::test]
async fn login_session_round_trips_through_store() -> Result<(), Box<dyn std::error::Error>> {
    let remote = FakeRemote::new();
    remote.reply(
        "login",
        json!({"token": "jwt-abc", "user": {"_id": "u1", "name": "Ada", "email": "ada@example.com"}}),
    );
    let dir = tempfile::tempdir()?;
    let store = SessionStore::new(dir.path());

    let session = login(remote.as_ref(), " ada@example.com ", "Analytical1").await?;
    store.save(&session)?;

    let loaded = store.require()?;
    assert_eq!(loaded.display_name, "Ada");
    assert_eq!(loaded.email, "ada@example.com");
    assert_eq!(loaded.credentials().token(), "jwt-abc");
    Ok(())
}

#[tokio::test]
async fn login_with_wrong_password_surfaces_server_message() {
    let remote = FakeRemote::new();
    remote.fail("login", 401, "Invalid credentials");

    let err = login(remote.as_ref(), "ada@example.com", "nope").await.unwrap_err();

    assert!(matches!(err, Error::Http { status: 401, .. }));
    assert_eq!(err.slice_message("Login failed"), "Invalid credentials");
}

#[tokio::test]
async fn login_with_empty_token_is_a_protocol_error() {
    let remote = FakeRemote::new();
    remote.reply("login", json!({"token": ""}));

    let err = login(remote.as_ref(), "ada@example.com", "secret").await.unwrap_err();

    assert!(matches!(err, Error::Protocol(_)));
}
