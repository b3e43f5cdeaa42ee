//! Storefront HTTP surface against the fake backend.

#![allow(clippy::unwrap_used)]

use reqwest::{Client, StatusCode, redirect::Policy};
use serde_json::{Value, json};

use freshcart_integration_tests::{FakeBackend, Reply, spawn_storefront, token_expiring_in};

/// Client that keeps cookies and does not follow redirects.
fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .unwrap()
}

async fn login(client: &Client, base: &str) {
    let resp = client
        .post(format!("{base}/auth/session"))
        .json(&json!({ "token": token_expiring_in(3600) }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

fn checkout_body(method: &str) -> Value {
    json!({
        "cartId": "c1",
        "shippingAddress": { "details": "12 Main St", "phone": "0100000000", "city": "Cairo" },
        "paymentMethod": method
    })
}

#[tokio::test]
async fn test_guard_redirects_then_admits() {
    let backend = FakeBackend::start().await;
    let base = spawn_storefront(&backend).await;
    let client = client();

    let resp = client
        .get(format!("{base}/cart/success"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        resp.headers()["location"],
        "/auth/login?returnUrl=%2Fcart%2Fsuccess"
    );

    login(&client, &base).await;

    let resp = client
        .get(format!("{base}/cart/success"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_legacy_success_lands_on_canonical_page() {
    let backend = FakeBackend::start().await;
    let base = spawn_storefront(&backend).await;
    let client = client();
    login(&client, &base).await;

    let direct: Value = client
        .get(format!("{base}/cart/success"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let resp = client
        .get(format!("{base}/cart/success/allorders"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PERMANENT_REDIRECT);
    let location = resp.headers()["location"].to_str().unwrap().to_string();

    let via_legacy: Value = client
        .get(format!("{base}{location}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(direct, via_legacy);
}

#[tokio::test]
async fn test_addresses_route() {
    let backend = FakeBackend::start().await;
    backend.reply_to_addresses(Reply::ok(json!({
        "status": "success",
        "results": 1,
        "data": [{ "_id": "a1", "name": "Home", "details": "12 Main St", "phone": "0100000000", "city": "Cairo" }]
    })));
    let base = spawn_storefront(&backend).await;
    let client = client();
    login(&client, &base).await;

    let view: Value = client
        .get(format!("{base}/addresses"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(view["selection"], json!({ "state": "existing", "addressId": "a1" }));
    assert_eq!(view["addresses"].as_array().unwrap().len(), 1);
    assert!(view.get("error").is_none());
    assert_eq!(view["events"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_cash_checkout_route() {
    let backend = FakeBackend::start().await;
    let base = spawn_storefront(&backend).await;
    let client = client();
    login(&client, &base).await;

    let outcome: Value = client
        .post(format!("{base}/checkout"))
        .json(&checkout_body("cash"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(outcome["success"], true);
    assert_eq!(outcome["orderId"], "o1");
    assert_eq!(outcome["message"], "Order placed successfully");
    assert!(outcome.get("stripeUrl").is_none());
}

#[tokio::test]
async fn test_card_checkout_route_uses_default_return_url() {
    let backend = FakeBackend::start().await;
    let base = spawn_storefront(&backend).await;
    let client = client();
    login(&client, &base).await;

    let outcome: Value = client
        .post(format!("{base}/checkout"))
        .json(&checkout_body("card"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(
        outcome,
        json!({ "success": true, "stripeUrl": "https://checkout.stripe.com/c/pay/cs_test_1" })
    );

    let request = backend.requests().into_iter().last().unwrap();
    assert_eq!(
        request.query_param("url").as_deref(),
        Some("http://localhost:3000/cart/success")
    );
}

#[tokio::test]
async fn test_checkout_route_reports_backend_auth_failure() {
    let backend = FakeBackend::start().await;
    backend.reply_to_cash_order(Reply::Text(StatusCode::UNAUTHORIZED, String::new()));
    let base = spawn_storefront(&backend).await;
    let client = client();
    login(&client, &base).await;

    let resp = client
        .post(format!("{base}/checkout"))
        .json(&checkout_body("cash"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.json::<Value>().await.unwrap(),
        json!({
            "success": false,
            "message": "Authentication required. Please log in and try again."
        })
    );
}
