mod common;

use serde_json::json;

use common::{http_requests, navigations, ok, sale_json, started, toast_message, user_json};
use secrecy::SecretString;
use shared::api::{GoogleIdentity, ProfileUpdate, SignInRequest, SignUpRequest};
use shared::capabilities::{HttpError, NavigationOperation};
use shared::form::SelectedFile;
use shared::{Event, ListingId, Page};

fn navigated_to(effects: &[shared::Effect]) -> Option<String> {
    navigations(effects).into_iter().find_map(|op| match op {
        NavigationOperation::Navigate { path } => Some(path.clone()),
        NavigationOperation::ReplaceQuery { .. } => None,
    })
}

#[test]
fn sign_in_stores_session_and_goes_home() {
    let (app, mut model) = started(None);
    let update = app.update(
        Event::SignInRequested(SignInRequest {
            email: "u1@example.com".into(),
            password: SecretString::new("hunter2".into()),
        }),
        &mut model,
    );
    let requests = http_requests(&update.effects);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].url.path(), "/api/auth/signin");
    assert_eq!(requests[0].header("content-type"), Some("application/json"));
    let body: serde_json::Value = serde_json::from_slice(requests[0].body()).unwrap();
    assert_eq!(body, json!({ "email": "u1@example.com", "password": "hunter2" }));
    assert!(model.auth_pending);

    let update = app.update(Event::AuthResponse(ok(200, &user_json("u1"))), &mut model);
    assert!(!model.auth_pending);
    assert_eq!(model.session.as_ref().unwrap().user_id().as_str(), "u1");
    assert_eq!(model.page, Page::Search);
    assert_eq!(navigated_to(&update.effects).as_deref(), Some("/"));
    assert_eq!(toast_message(&model), Some("Welcome, Asha Rao"));
}

#[test]
fn wrong_credentials_surface_server_message() {
    let (app, mut model) = started(None);
    app.update(
        Event::SignInRequested(SignInRequest {
            email: "u1@example.com".into(),
            password: SecretString::new("nope".into()),
        }),
        &mut model,
    );
    app.update(
        Event::AuthResponse(ok(401, &json!({ "success": false, "message": "Wrong credentials!" }))),
        &mut model,
    );
    assert!(model.session.is_none());
    assert_eq!(toast_message(&model), Some("Wrong credentials!"));
}

#[test]
fn blank_sign_in_never_hits_network() {
    let (app, mut model) = started(None);
    let update = app.update(
        Event::SignInRequested(SignInRequest {
            email: "  ".into(),
            password: SecretString::new("".into()),
        }),
        &mut model,
    );
    assert!(http_requests(&update.effects).is_empty());
    assert!(!model.auth_pending);
    assert_eq!(toast_message(&model), Some("Email and password are required"));
}

#[test]
fn sign_up_then_sign_in_page() {
    let (app, mut model) = started(None);
    let update = app.update(
        Event::SignUpRequested(SignUpRequest {
            username: "asha".into(),
            email: "asha@example.com".into(),
            password: SecretString::new("s3cret".into()),
        }),
        &mut model,
    );
    assert_eq!(http_requests(&update.effects)[0].url.path(), "/api/auth/signup");

    let update = app.update(
        Event::SignUpResponse(ok(201, &json!({ "message": "User created successfully" }))),
        &mut model,
    );
    assert!(model.session.is_none());
    assert_eq!(model.page, Page::SignIn);
    assert_eq!(navigated_to(&update.effects).as_deref(), Some("/sign-in"));
}

#[test]
fn google_sign_in_accepts_wrapped_user() {
    let (app, mut model) = started(None);
    let update = app.update(
        Event::GoogleSignInCompleted(GoogleIdentity {
            name: "Asha Rao".into(),
            email: "asha@example.com".into(),
            photo: Some("https://photos.example.com/a.png".into()),
        }),
        &mut model,
    );
    assert_eq!(http_requests(&update.effects)[0].url.path(), "/api/auth/google-auth");

    app.update(
        Event::AuthResponse(ok(200, &json!({ "message": "ok", "user": user_json("g1") }))),
        &mut model,
    );
    assert_eq!(model.session.as_ref().unwrap().user_id().as_str(), "g1");
}

#[test]
fn sign_out_clears_session_even_on_failure() {
    let (app, mut model) = started(Some(user_json("u1")));
    let update = app.update(Event::SignOutRequested, &mut model);
    let requests = http_requests(&update.effects);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].url.path(), "/api/auth/signout");

    let update = app.update(
        Event::SignOutResponse(Box::new(Err(HttpError::Timeout))),
        &mut model,
    );
    assert!(model.session.is_none());
    assert!(model.toast.is_none());
    assert_eq!(navigated_to(&update.effects).as_deref(), Some("/sign-in"));
}

#[test]
fn failed_account_deletion_keeps_session() {
    let (app, mut model) = started(Some(user_json("u1")));
    let update = app.update(Event::DeleteAccountRequested, &mut model);
    let requests = http_requests(&update.effects);
    assert_eq!(requests[0].method, "DELETE");
    assert_eq!(requests[0].url.path(), "/api/user/u1/delete");

    app.update(
        Event::DeleteAccountResponse(ok(500, &json!({ "message": "Internal Server Error" }))),
        &mut model,
    );
    assert!(model.session.is_some());
    assert_eq!(toast_message(&model), Some("Internal Server Error"));

    app.update(Event::DeleteAccountRequested, &mut model);
    app.update(Event::DeleteAccountResponse(ok(200, &json!("User has been deleted!"))), &mut model);
    assert!(model.session.is_none());
    assert_eq!(model.page, Page::SignIn);
}

#[test]
fn profile_lists_and_deletes_own_listings() {
    let (app, mut model) = started(Some(user_json("u1")));
    let update = app.update(Event::ProfileOpened, &mut model);
    assert_eq!(http_requests(&update.effects)[0].url.path(), "/api/user/u1/listings");
    assert!(model.profile.loading);

    app.update(
        Event::UserListingsResponse(ok(
            200,
            &json!([sale_json("a", "Goa", 10.0, "u1"), sale_json("b", "Goa", 20.0, "u1")]),
        )),
        &mut model,
    );
    assert!(!model.profile.loading);
    assert_eq!(model.profile.listings.len(), 2);

    let id = ListingId::new("a");
    let update = app.update(Event::DeleteListingRequested { id: id.clone() }, &mut model);
    assert_eq!(http_requests(&update.effects)[0].url.path(), "/api/listing/a/delete");

    app.update(
        Event::DeleteListingResponse {
            id,
            result: ok(200, &json!({ "message": "Listing has been deleted!" })),
        },
        &mut model,
    );
    assert_eq!(model.profile.listings.len(), 1);
    assert_eq!(toast_message(&model), Some("Listing has been deleted!"));
}

#[test]
fn profile_update_replaces_session_user() {
    let (app, mut model) = started(Some(user_json("u1")));
    let update = app.update(
        Event::ProfileUpdateRequested(ProfileUpdate {
            username: Some("asha.rao".into()),
            ..ProfileUpdate::default()
        }),
        &mut model,
    );
    let requests = http_requests(&update.effects);
    assert_eq!(requests[0].method, "PUT");
    assert_eq!(requests[0].url.path(), "/api/user/u1/update");
    assert!(model.profile.saving);

    let mut updated = user_json("u1");
    updated["username"] = json!("asha.rao");
    app.update(Event::ProfileUpdateResponse(ok(200, &updated)), &mut model);
    assert!(!model.profile.saving);
    assert_eq!(model.session.as_ref().unwrap().user.username, "asha.rao");
}

#[test]
fn non_image_avatar_rejected_locally() {
    let (app, mut model) = started(Some(user_json("u1")));
    let update = app.update(
        Event::ProfileUpdateRequested(ProfileUpdate {
            avatar: Some(SelectedFile {
                name: "cv.pdf".into(),
                mime_type: "application/pdf".into(),
                bytes: vec![1, 2, 3],
            }),
            ..ProfileUpdate::default()
        }),
        &mut model,
    );
    assert!(http_requests(&update.effects).is_empty());
    assert_eq!(toast_message(&model), Some("cv.pdf is not an image file"));
}
