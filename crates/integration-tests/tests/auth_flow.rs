//! End-to-end storefront authentication flow.

use axum::http::StatusCode;
use serde_json::json;

use clementine_core::Role;
use clementine_integration_tests::TestContext;
use clementine_server::db::UserStore as _;

#[tokio::test]
async fn test_register_login_profile_round_trip() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .request(
            "POST",
            "/api/users/register",
            None,
            Some(json!({
                "name": "Uma",
                "email": "uma@example.com",
                "password": "secret123"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["token"].is_string());
    // The stored hash never appears in any response.
    assert!(body["user"].get("password_hash").is_none());

    let (status, body) = ctx
        .request(
            "POST",
            "/api/users/login",
            None,
            Some(json!({ "email": "uma@example.com", "password": "secret123" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().expect("login returns token").to_owned();

    let (status, body) = ctx
        .request("GET", "/api/users/profile", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "uma@example.com");
}

#[tokio::test]
async fn test_user_token_on_admin_route_is_forbidden_not_unauthorized() {
    let ctx = TestContext::new();

    let (_, body) = ctx
        .request(
            "POST",
            "/api/users/register",
            None,
            Some(json!({
                "name": "Uma",
                "email": "uma@example.com",
                "password": "secret123"
            })),
        )
        .await;
    let token = body["token"].as_str().unwrap().to_owned();

    // The identity is valid, so this is an authorization failure.
    let (status, body) = ctx
        .request("GET", "/api/admin/users", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let ctx = TestContext::new();

    let (status, body) = ctx.request("GET", "/api/users/profile", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "missing_token");
}

#[tokio::test]
async fn test_expired_token_reports_expiry() {
    let ctx = TestContext::new();

    let (_, body) = ctx
        .request(
            "POST",
            "/api/users/register",
            None,
            Some(json!({
                "name": "Uma",
                "email": "uma@example.com",
                "password": "secret123"
            })),
        )
        .await;
    let user_id = body["user"]["id"].as_i64().unwrap();

    // Signed with the right secret but already past exp (beyond leeway).
    #[allow(clippy::cast_possible_truncation)]
    let expired = TestContext::issue_token(user_id as i32, Role::User, -2);

    let (status, body) = ctx
        .request("GET", "/api/users/profile", Some(&expired), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "expired_token");
}

#[tokio::test]
async fn test_garbage_token_is_invalid() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .request("GET", "/api/users/profile", Some("not.a.token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "invalid_token");
}

#[tokio::test]
async fn test_x_auth_token_header_is_accepted() {
    let ctx = TestContext::new();

    let (_, body) = ctx
        .request(
            "POST",
            "/api/users/register",
            None,
            Some(json!({
                "name": "Uma",
                "email": "uma@example.com",
                "password": "secret123"
            })),
        )
        .await;
    let token = body["token"].as_str().unwrap().to_owned();

    let (status, body) = ctx
        .request_with_x_auth_token("GET", "/api/users/profile", &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "uma@example.com");
}

#[tokio::test]
async fn test_deleted_user_token_stops_resolving() {
    let ctx = TestContext::new();

    let (_, body) = ctx
        .request(
            "POST",
            "/api/users/register",
            None,
            Some(json!({
                "name": "Uma",
                "email": "uma@example.com",
                "password": "secret123"
            })),
        )
        .await;
    let token = body["token"].as_str().unwrap().to_owned();
    let user_id = body["user"]["id"].as_i64().unwrap();

    #[allow(clippy::cast_possible_truncation)]
    ctx.users
        .delete(clementine_core::UserId::new(user_id as i32))
        .await
        .unwrap();

    let (status, body) = ctx
        .request("GET", "/api/users/profile", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "identity_not_found");
}

#[tokio::test]
async fn test_wrong_password_is_400_on_storefront() {
    let ctx = TestContext::new();

    ctx.request(
        "POST",
        "/api/users/register",
        None,
        Some(json!({
            "name": "Uma",
            "email": "uma@example.com",
            "password": "secret123"
        })),
    )
    .await;

    let (status, body) = ctx
        .request(
            "POST",
            "/api/users/login",
            None,
            Some(json!({ "email": "uma@example.com", "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_credentials");
    assert_eq!(body["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_profile_update_requires_current_password_for_change() {
    let ctx = TestContext::new();

    let (_, body) = ctx
        .request(
            "POST",
            "/api/users/register",
            None,
            Some(json!({
                "name": "Uma",
                "email": "uma@example.com",
                "password": "secret123"
            })),
        )
        .await;
    let token = body["token"].as_str().unwrap().to_owned();

    let (status, body) = ctx
        .request(
            "PUT",
            "/api/users/profile",
            Some(&token),
            Some(json!({
                "current_password": "wrong-password",
                "new_password": "newsecret456"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "current_password_mismatch");

    let (status, _) = ctx
        .request(
            "PUT",
            "/api/users/profile",
            Some(&token),
            Some(json!({
                "current_password": "secret123",
                "new_password": "newsecret456"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Old password stops working, token issued earlier still resolves.
    let (status, _) = ctx
        .request(
            "POST",
            "/api/users/login",
            None,
            Some(json!({ "email": "uma@example.com", "password": "secret123" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .request("GET", "/api/users/profile", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_profile_update_to_taken_email_is_400() {
    let ctx = TestContext::new();

    ctx.request(
        "POST",
        "/api/users/register",
        None,
        Some(json!({
            "name": "A",
            "email": "a@example.com",
            "password": "secret123"
        })),
    )
    .await;
    let (_, body) = ctx
        .request(
            "POST",
            "/api/users/register",
            None,
            Some(json!({
                "name": "B",
                "email": "b@example.com",
                "password": "secret123"
            })),
        )
        .await;
    let b_token = body["token"].as_str().unwrap().to_owned();

    let (status, body) = ctx
        .request(
            "PUT",
            "/api/users/profile",
            Some(&b_token),
            Some(json!({ "email": "a@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "duplicate_email");

    // B's record is untouched; each email still names one account.
    let (status, body) = ctx
        .request("GET", "/api/users/profile", Some(&b_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "b@example.com");
}

#[tokio::test]
async fn test_duplicate_registration_is_400() {
    let ctx = TestContext::new();

    let register = json!({
        "name": "Uma",
        "email": "uma@example.com",
        "password": "secret123"
    });
    let (status, _) = ctx
        .request("POST", "/api/users/register", None, Some(register.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx
        .request("POST", "/api/users/register", None, Some(register))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "duplicate_email");
}
