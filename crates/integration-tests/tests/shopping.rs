//! Integration tests for the cart and checkout flow.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (robo-cli migrate)
//! - The storefront running against it (cargo run -p robo-shop-storefront)
//!
//! Run with: cargo test -p robo-shop-integration-tests -- --ignored

use reqwest::{Client, StatusCode};

use robo_shop_core::ProductId;
use robo_shop_integration_tests::{TestContext, location, unique_username};
use robo_shop_storefront::routes::cart::CLAMPED_NOTICE;
use robo_shop_storefront::services::checkout::MISSING_FIELDS_MESSAGE;

/// A seller with one product of the given stock, plus a logged-in buyer.
async fn shop_with_stock(ctx: &TestContext, stock: u32) -> (ProductId, Client) {
    let seller = unique_username("seller");
    ctx.signup(&seller, "seller").await;
    let product = ctx.create_product(&seller, "Stepper Motor", "1200.00", stock).await;
    let buyer = ctx.signup(&unique_username("buyer"), "buyer").await;
    (product, buyer)
}

async fn add_to_cart(ctx: &TestContext, client: &Client, product: ProductId, quantity: &str) {
    let resp = client
        .post(ctx.url(&format!("/cart/add/{product}/")))
        .form(&[("quantity", quantity)])
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/cart/");
}

async fn cart_page(ctx: &TestContext, client: &Client) -> String {
    let resp = client
        .get(ctx.url("/cart/"))
        .send()
        .await
        .expect("Failed to load cart");
    assert_eq!(resp.status(), StatusCode::OK);
    resp.text().await.expect("Failed to read response")
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_add_to_cart_clamps_to_stock() {
    let ctx = TestContext::new().await;
    let (product, buyer) = shop_with_stock(&ctx, 2).await;

    add_to_cart(&ctx, &buyer, product, "5").await;

    let body = cart_page(&ctx, &buyer).await;
    assert!(body.contains(CLAMPED_NOTICE));
    assert!(body.contains("<td>2</td>"));

    // The notice is shown once.
    let body = cart_page(&ctx, &buyer).await;
    assert!(!body.contains(CLAMPED_NOTICE));
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_checkout_records_payment_and_decrements_stock() {
    let ctx = TestContext::new().await;
    let (product, buyer) = shop_with_stock(&ctx, 4).await;

    add_to_cart(&ctx, &buyer, product, "3").await;

    let resp = buyer
        .post(ctx.url("/checkout/"))
        .form(&[
            ("first_name", "Amina"),
            ("last_name", "Benali"),
            ("phone", "0550123456"),
            ("state", "Oran"),
            ("payment_method", "COD"),
        ])
        .send()
        .await
        .expect("Failed to submit checkout");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/checkout/success/");

    assert_eq!(ctx.stock_of(product).await, 1);

    let resp = buyer
        .get(ctx.url("/checkout/success/"))
        .send()
        .await
        .expect("Failed to load confirmation");
    assert_eq!(resp.status(), StatusCode::OK);

    let body = cart_page(&ctx, &buyer).await;
    assert!(!body.contains("<td>3</td>"));

    let resp = buyer
        .get(ctx.url("/account/payments/"))
        .send()
        .await
        .expect("Failed to load payment history");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("Amina"));
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_checkout_with_missing_fields_keeps_cart() {
    let ctx = TestContext::new().await;
    let (product, buyer) = shop_with_stock(&ctx, 4).await;

    add_to_cart(&ctx, &buyer, product, "1").await;

    let resp = buyer
        .post(ctx.url("/checkout/"))
        .form(&[("first_name", "Amina"), ("state", "Oran")])
        .send()
        .await
        .expect("Failed to submit checkout");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains(MISSING_FIELDS_MESSAGE));

    assert_eq!(ctx.stock_of(product).await, 4);
    assert!(cart_page(&ctx, &buyer).await.contains("Stepper Motor"));
}
