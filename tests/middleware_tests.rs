//! Middleware tests
//!
//! TimingMiddleware must emit exactly one record per request with the final
//! status code, and must never fail or hold up a request.

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::{App, HttpResponse, web};
use std::time::Duration;

use iscogram::api::middleware::TimingMiddleware;
use iscogram::metrics::{OverflowPolicy, timing_channel};

async fn ok_handler() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}

async fn created_handler() -> HttpResponse {
    HttpResponse::Created().finish()
}

async fn failing_handler() -> actix_web::Result<HttpResponse> {
    Err(actix_web::error::ErrorBadRequest("bad input"))
}

async fn slow_handler() -> HttpResponse {
    tokio::time::sleep(Duration::from_millis(30)).await;
    HttpResponse::Ok().finish()
}

#[actix_rt::test]
async fn test_records_method_path_and_default_status() {
    let (tx, mut rx) = timing_channel(16, OverflowPolicy::Drop);
    let app = test::init_service(
        App::new()
            .wrap(TimingMiddleware::new(tx))
            .route("/posts", web::get().to(ok_handler)),
    )
    .await;

    let resp = test::call_service(&app, TestRequest::get().uri("/posts").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let record = rx.try_recv().expect("one record per request");
    assert_eq!(record.method, "GET");
    assert_eq!(record.path, "/posts");
    assert_eq!(record.status, 200);
    assert_eq!(record.route_key(), "GET /posts");
    assert!(rx.try_recv().is_none());
}

#[actix_rt::test]
async fn test_records_explicit_status() {
    let (tx, mut rx) = timing_channel(16, OverflowPolicy::Drop);
    let app = test::init_service(
        App::new()
            .wrap(TimingMiddleware::new(tx))
            .route("/register", web::post().to(created_handler)),
    )
    .await;

    let resp = test::call_service(&app, TestRequest::post().uri("/register").to_request()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(rx.try_recv().unwrap().status, 201);
}

#[actix_rt::test]
async fn test_records_error_and_unrouted_statuses() {
    let (tx, mut rx) = timing_channel(16, OverflowPolicy::Drop);
    let app = test::init_service(
        App::new()
            .wrap(TimingMiddleware::new(tx))
            .route("/fail", web::get().to(failing_handler)),
    )
    .await;

    let resp = test::call_service(&app, TestRequest::get().uri("/fail").to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(rx.try_recv().unwrap().status, 400);

    let resp = test::call_service(&app, TestRequest::get().uri("/missing").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let record = rx.try_recv().unwrap();
    assert_eq!(record.path, "/missing");
    assert_eq!(record.status, 404);
}

#[actix_rt::test]
async fn test_duration_covers_handler_time() {
    let (tx, mut rx) = timing_channel(16, OverflowPolicy::Drop);
    let app = test::init_service(
        App::new()
            .wrap(TimingMiddleware::new(tx))
            .route("/slow", web::get().to(slow_handler)),
    )
    .await;

    test::call_service(&app, TestRequest::get().uri("/slow").to_request()).await;
    let record = rx.try_recv().unwrap();
    assert!(record.duration >= Duration::from_millis(30));
}

#[actix_rt::test]
async fn test_full_channel_does_not_affect_responses() {
    let (tx, mut rx) = timing_channel(1, OverflowPolicy::Drop);
    let sender = tx.clone();
    let app = test::init_service(
        App::new()
            .wrap(TimingMiddleware::new(tx))
            .route("/posts", web::get().to(ok_handler)),
    )
    .await;

    for _ in 0..5 {
        let resp = test::call_service(&app, TestRequest::get().uri("/posts").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    assert!(rx.try_recv().is_some());
    assert!(rx.try_recv().is_none());
    assert_eq!(sender.dropped(), 4);
}

#[actix_rt::test]
async fn test_closed_channel_does_not_affect_responses() {
    let (tx, rx) = timing_channel(4, OverflowPolicy::Block);
    drop(rx);
    let app = test::init_service(
        App::new()
            .wrap(TimingMiddleware::new(tx))
            .route("/posts", web::get().to(ok_handler)),
    )
    .await;

    let resp = test::call_service(&app, TestRequest::get().uri("/posts").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
