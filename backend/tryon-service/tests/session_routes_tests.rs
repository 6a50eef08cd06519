#[macro_use]
mod common;

use actix_web::{http::StatusCode, test};
use chrono::{DateTime, Duration, Utc};
use common::{client_session, context, salon};
use serde_json::{json, Value};
use tryon_service::db::ClientSessionStore;

#[actix_web::test]
async fn test_individual_session_start_and_validate() {
    let ctx = context();
    let app = init_app!(ctx.state);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/individual/session/start")
            .set_json(json!({"user_type": "individual"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let started: Value = test::read_body_json(resp).await;
    assert_eq!(started["user_type"], "individual");
    assert_eq!(started["max_ai_uses"], 5);
    assert_eq!(started["session_duration_minutes"], 15);
    assert!(started["session_id"].is_string());
    let expires_at: DateTime<Utc> = started["expires_at"].as_str().unwrap().parse().unwrap();
    assert!(expires_at > Utc::now() + Duration::minutes(14));

    let token = started["session_token"].as_str().unwrap();
    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri("/api/individual/session/validate")
            .set_json(json!({"session_token": token}))
            .to_request(),
    )
    .await;
    let session = &body["session"];
    assert_eq!(session["id"], started["session_id"]);
    assert_eq!(session["user_type"], "individual");
    assert_eq!(session["ai_uses_remaining"], 5);
    let remaining = session["time_remaining_seconds"].as_i64().unwrap();
    assert!((890..=900).contains(&remaining));
}

#[actix_web::test]
async fn test_individual_start_rejects_other_user_types() {
    let ctx = context();
    let app = init_app!(ctx.state);

    for body in [json!({"user_type": "salon_client"}), json!({})] {
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/individual/session/start")
                .set_json(body)
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "INVALID_ARGUMENT");
        assert_eq!(body["status"], 400);
    }
}

#[actix_web::test]
async fn test_tampered_token_reveals_nothing() {
    let ctx = context();
    let app = init_app!(ctx.state);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/individual/session/validate")
            .set_json(json!({"session_token": "eyJhbGciOiJIUzI1NiJ9.e30.invalid"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "AUTHENTICATION_FAILED");
    assert!(body.get("session").is_none());
}

#[actix_web::test]
async fn test_client_session_start_and_validate() {
    let ctx = context();
    let s = salon(Some(5), Some(30));
    ctx.salons.insert(s.clone());
    let store = ctx.client_sessions.clone();
    let app = init_app!(ctx.state);

    let started: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri("/api/client/session/start")
            .set_json(json!({"salon_id": s.id.to_string()}))
            .to_request(),
    )
    .await;
    assert_eq!(started["salon_id"], s.id.to_string());
    assert_eq!(started["max_ai_uses"], 5);
    assert_eq!(started["session_duration_minutes"], 30);

    let token = started["session_token"].as_str().unwrap();
    let row = store.find_by_id(token.parse().unwrap()).await.unwrap().unwrap();
    assert_eq!(row.ai_uses_count, 0);
    assert!(row.is_active);

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri("/api/client/session/validate")
            .set_json(json!({"session_token": token}))
            .to_request(),
    )
    .await;
    let session = &body["session"];
    assert_eq!(session["salon_id"], s.id.to_string());
    assert_eq!(session["ai_uses_remaining"], 5);
    let remaining = session["time_remaining_seconds"].as_i64().unwrap();
    assert!((1790..=1800).contains(&remaining));
}

#[actix_web::test]
async fn test_client_session_start_errors() {
    let ctx = context();
    let app = init_app!(ctx.state);

    let cases = [
        (json!({}), StatusCode::BAD_REQUEST),
        (json!({"salon_id": "nope"}), StatusCode::BAD_REQUEST),
        (
            json!({"salon_id": uuid::Uuid::new_v4()}),
            StatusCode::NOT_FOUND,
        ),
    ];
    for (body, expected) in cases {
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/client/session/start")
                .set_json(body)
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), expected);
    }
}

#[actix_web::test]
async fn test_expired_client_session_is_deactivated() {
    let ctx = context();
    let expired = client_session(0, 5, Utc::now() - Duration::seconds(30));
    ctx.client_sessions.insert(expired.clone());
    let store = ctx.client_sessions.clone();
    let app = init_app!(ctx.state);

    let validate = || {
        test::TestRequest::post()
            .uri("/api/client/session/validate")
            .set_json(json!({"session_token": expired.id.to_string()}))
            .to_request()
    };

    let resp = test::call_service(&app, validate()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "SESSION_EXPIRED");
    assert!(!store.find_by_id(expired.id).await.unwrap().unwrap().is_active);

    let resp = test::call_service(&app, validate()).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "AUTHENTICATION_FAILED");
}

#[actix_web::test]
async fn test_exhausted_client_session_is_quota_error() {
    let ctx = context();
    let full = client_session(5, 5, Utc::now() + Duration::minutes(10));
    ctx.client_sessions.insert(full.clone());
    let app = init_app!(ctx.state);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/client/session/validate")
            .set_json(json!({"session_token": full.id.to_string()}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "QUOTA_EXHAUSTED");
}

#[actix_web::test]
async fn test_usage_route_for_both_kinds() {
    let ctx = context();
    let live = client_session(3, 4, Utc::now() + Duration::minutes(10));
    ctx.client_sessions.insert(live.clone());
    let app = init_app!(ctx.state);

    let started: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri("/api/individual/session/start")
            .set_json(json!({"user_type": "individual"}))
            .to_request(),
    )
    .await;

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri("/api/session/usage")
            .set_json(json!({
                "session_token": started["session_token"],
                "user_type": "individual"
            }))
            .to_request(),
    )
    .await;
    assert_eq!(body["ai_uses_remaining"], 4);
    let reissued = body["session_token"].as_str().unwrap();

    let validated: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri("/api/individual/session/validate")
            .set_json(json!({"session_token": reissued}))
            .to_request(),
    )
    .await;
    assert_eq!(validated["session"]["ai_uses_remaining"], 4);

    let usage = || {
        test::TestRequest::post()
            .uri("/api/session/usage")
            .set_json(json!({"session_token": live.id.to_string(), "user_type": "client"}))
            .to_request()
    };
    let body: Value = test::call_and_read_body_json(&app, usage()).await;
    assert_eq!(body["ai_uses_remaining"], 0);
    assert!(body.get("session_token").is_none());

    let resp = test::call_service(&app, usage()).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[actix_web::test]
async fn test_malformed_json_uses_error_shape() {
    let ctx = context();
    let app = init_app!(ctx.state);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/client/session/validate")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "INVALID_ARGUMENT");
}

#[actix_web::test]
async fn test_health_and_readiness_without_backends() {
    let ctx = context();
    let app = init_app!(ctx.state);

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/health").to_request(),
    )
    .await;
    assert_eq!(body["status"], "ok");

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/ready").to_request(),
    )
    .await;
    assert_eq!(body["ready"], true);
    assert_eq!(body["checks"]["postgresql"]["status"], "skipped");
    assert_eq!(body["checks"]["redis"]["status"], "skipped");
}
