//! Integration tests for signup, login and role-based access.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (robo-cli migrate)
//! - The storefront running against it (cargo run -p robo-shop-storefront)
//!
//! Run with: cargo test -p robo-shop-integration-tests -- --ignored

use reqwest::StatusCode;

use robo_shop_integration_tests::{TEST_PASSWORD, TestContext, browser, location, unique_username};

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_seller_signup_lands_on_dashboard() {
    let ctx = TestContext::new().await;
    let username = unique_username("seller");
    let email = format!("{username}@example.dz");
    let client = browser();

    let resp = client
        .post(ctx.url("/signup/"))
        .form(&[
            ("username", username.as_str()),
            ("email", email.as_str()),
            ("password1", TEST_PASSWORD),
            ("password2", TEST_PASSWORD),
            ("role", "seller"),
        ])
        .send()
        .await
        .expect("Failed to submit signup");

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/store/dashboard/");

    let resp = client
        .get(ctx.url("/store/dashboard/"))
        .send()
        .await
        .expect("Failed to load dashboard");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_buyer_login_and_logout() {
    let ctx = TestContext::new().await;
    let username = unique_username("buyer");
    ctx.signup(&username, "buyer").await;

    let client = browser();
    let resp = client
        .post(ctx.url("/login/"))
        .form(&[("username", username.as_str()), ("password", TEST_PASSWORD)])
        .send()
        .await
        .expect("Failed to submit login");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/store/products/");

    let resp = client
        .get(ctx.url("/logout/"))
        .send()
        .await
        .expect("Failed to log out");
    assert_eq!(location(&resp), "/login/");

    let resp = client
        .get(ctx.url("/store/products/"))
        .send()
        .await
        .expect("Failed to load products");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(location(&resp).starts_with("/login/?next="));
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_wrong_password_rerenders_login() {
    let ctx = TestContext::new().await;
    let username = unique_username("buyer");
    ctx.signup(&username, "buyer").await;

    let resp = browser()
        .post(ctx.url("/login/"))
        .form(&[("username", username.as_str()), ("password", "not-the-password")])
        .send()
        .await
        .expect("Failed to submit login");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("البيانات غير صحيحة"));
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_login_honours_safe_next_only() {
    let ctx = TestContext::new().await;
    let username = unique_username("buyer");
    ctx.signup(&username, "buyer").await;

    let resp = browser()
        .post(ctx.url("/login/"))
        .form(&[
            ("username", username.as_str()),
            ("password", TEST_PASSWORD),
            ("next", "https://evil.example/"),
        ])
        .send()
        .await
        .expect("Failed to submit login");
    assert_eq!(location(&resp), "/store/products/");

    let resp = browser()
        .post(ctx.url("/login/"))
        .form(&[
            ("username", username.as_str()),
            ("password", TEST_PASSWORD),
            ("next", "/cart/"),
        ])
        .send()
        .await
        .expect("Failed to submit login");
    assert_eq!(location(&resp), "/cart/");
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_buyer_cannot_open_add_product() {
    let ctx = TestContext::new().await;
    let client = ctx.signup(&unique_username("buyer"), "buyer").await;

    let resp = client
        .get(ctx.url("/store/products/add/"))
        .send()
        .await
        .expect("Failed to load add product page");

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_seller_is_sent_away_from_cart() {
    let ctx = TestContext::new().await;
    let client = ctx.signup(&unique_username("seller"), "seller").await;

    let resp = client
        .get(ctx.url("/cart/"))
        .send()
        .await
        .expect("Failed to load cart");

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");
}
