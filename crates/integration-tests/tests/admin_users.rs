//! Admin back-office flows: login, user management, cross-domain isolation.

use axum::http::StatusCode;
use serde_json::json;

use clementine_core::Role;
use clementine_integration_tests::TestContext;

async fn register_user(ctx: &TestContext, email: &str) -> (i64, String) {
    let (status, body) = ctx
        .request(
            "POST",
            "/api/users/register",
            None,
            Some(json!({
                "name": "Shopper",
                "email": email,
                "password": "secret123"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    (
        body["user"]["id"].as_i64().unwrap(),
        body["token"].as_str().unwrap().to_owned(),
    )
}

async fn login_admin(ctx: &TestContext) -> String {
    ctx.seed_admin("ops@example.com", "hunter2hunter2").await;
    let (status, body) = ctx
        .request(
            "POST",
            "/api/admin/login",
            None,
            Some(json!({ "email": "ops@example.com", "password": "hunter2hunter2" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn test_admin_login_and_profile() {
    let ctx = TestContext::new();
    let token = login_admin(&ctx).await;

    let (status, body) = ctx
        .request("GET", "/api/admin/profile", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["admin"]["email"], "ops@example.com");
    // Login stamped last_login.
    assert!(!body["admin"]["last_login"].is_null());
}

#[tokio::test]
async fn test_admin_unknown_email_is_invalid_credentials() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .request(
            "POST",
            "/api/admin/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": "whatever1" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "invalid_credentials");
}

#[tokio::test]
async fn test_admin_lists_deletes_and_toggles_users() {
    let ctx = TestContext::new();
    let admin_token = login_admin(&ctx).await;
    let (first_id, _) = register_user(&ctx, "a@example.com").await;
    register_user(&ctx, "b@example.com").await;

    let (status, body) = ctx
        .request("GET", "/api/admin/users", Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"].as_array().unwrap().len(), 2);

    let (status, _) = ctx
        .request(
            "DELETE",
            &format!("/api/admin/users/{first_id}"),
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx
        .request("GET", "/api/admin/users", Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"].as_array().unwrap().len(), 1);

    // Deleting again is a 404, not a silent success.
    let (status, body) = ctx
        .request(
            "DELETE",
            &format!("/api/admin/users/{first_id}"),
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn test_deactivated_user_is_locked_out_until_reactivated() {
    let ctx = TestContext::new();
    let admin_token = login_admin(&ctx).await;
    let (user_id, user_token) = register_user(&ctx, "a@example.com").await;

    let (status, body) = ctx
        .request(
            "PATCH",
            &format!("/api/admin/users/{user_id}/status"),
            Some(&admin_token),
            Some(json!({ "active": false })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["active"], false);

    // The token is still cryptographically valid; the account is not.
    let (status, body) = ctx
        .request("GET", "/api/users/profile", Some(&user_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "account_inactive");

    ctx.request(
        "PATCH",
        &format!("/api/admin/users/{user_id}/status"),
        Some(&admin_token),
        Some(json!({ "active": true })),
    )
    .await;

    let (status, _) = ctx
        .request("GET", "/api/users/profile", Some(&user_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_token_cannot_act_as_user() {
    let ctx = TestContext::new();
    let admin_token = login_admin(&ctx).await;

    let (status, body) = ctx
        .request("GET", "/api/users/profile", Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");
}

#[tokio::test]
async fn test_admin_token_for_missing_admin_record() {
    let ctx = TestContext::new();

    // Valid signature, admin domain, but no admin with this ID exists.
    let token = TestContext::issue_token(999, Role::Admin, 24);
    let (status, body) = ctx
        .request("GET", "/api/admin/users", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "identity_not_found");
}

#[tokio::test]
async fn test_admin_management_routes_reject_anonymous() {
    let ctx = TestContext::new();

    for (method, path) in [
        ("GET", "/api/admin/users"),
        ("DELETE", "/api/admin/users/1"),
        ("GET", "/api/admin/profile"),
    ] {
        let (status, body) = ctx.request(method, path, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {path}");
        assert_eq!(body["code"], "missing_token");
    }
}
