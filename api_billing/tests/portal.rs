#[macro_use]
mod support;

use actix_web::{http::StatusCode, test};
use serde_json::{Value, json};

use support::{FAKE_PORTAL_URL, FakeProvider, TestState, test_config};

const PORTAL_URI: &str = "/api/stripe/create-portal-session";

#[actix_web::test]
async fn unauthenticated_request_is_rejected() {
    let state = TestState::new();
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri(PORTAL_URI)
        .set_json(json!({ "returnUrl": "https://app.example.com/account" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Authentication required");
    assert!(state.fake.portal_calls().is_empty());
}

#[actix_web::test]
async fn user_without_customer_is_rejected() {
    let state = TestState::new();
    let user = state.seed_user("free@example.com");
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri(PORTAL_URI)
        .insert_header(state.bearer(user.id))
        .set_json(json!({ "returnUrl": "https://app.example.com/account" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["error"],
        "No Stripe customer ID found. Please complete a purchase first."
    );
}

#[actix_web::test]
async fn customer_gets_portal_url() {
    let state = TestState::new();
    let user = state.seed_customer("paid@example.com", "cus_Paid1");
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri(PORTAL_URI)
        .insert_header(state.bearer(user.id))
        .set_json(json!({ "returnUrl": "https://app.example.com/account" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["url"], FAKE_PORTAL_URL);
    assert_eq!(
        state.fake.portal_calls(),
        vec![(
            "cus_Paid1".to_string(),
            Some("https://app.example.com/account".to_string())
        )]
    );
}

#[actix_web::test]
async fn return_url_is_optional() {
    let state = TestState::new();
    let user = state.seed_customer("paid@example.com", "cus_Paid1");
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri(PORTAL_URI)
        .insert_header(state.bearer(user.id))
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(state.fake.portal_calls()[0].1, None);
}

#[actix_web::test]
async fn missing_secret_key_is_rejected() {
    let mut config = test_config();
    config.stripe.secret_key = String::new();
    let state = TestState::with(config, FakeProvider::default());
    let user = state.seed_customer("paid@example.com", "cus_Paid1");
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri(PORTAL_URI)
        .insert_header(state.bearer(user.id))
        .set_json(json!({ "returnUrl": "https://app.example.com/account" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Stripe secret key not configured");
}

#[actix_web::test]
async fn provider_failure_is_bad_request() {
    let state = TestState::with(test_config(), FakeProvider::failing());
    let user = state.seed_customer("paid@example.com", "cus_Paid1");
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri(PORTAL_URI)
        .insert_header(state.bearer(user.id))
        .set_json(json!({ "returnUrl": "https://app.example.com/account" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .starts_with("Failed to create portal session: ")
    );
}
