//! HTTP surface tests, driven through the router without a socket.

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use seat_reservation::{app, clock::ManualClock, config::BookingConfig, AppState};

struct TestApp {
    router: Router,
    clock: ManualClock,
}

impl TestApp {
    fn new() -> Self {
        let clock = ManualClock::default();
        let booking = BookingConfig {
            hold: std::time::Duration::from_secs(120),
            sweep_interval: std::time::Duration::from_secs(30),
        };
        let state = AppState::in_memory(Arc::new(clock.clone()), &booking).unwrap();
        Self {
            router: app(state),
            clock,
        }
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn create_show(&self, total_seats: i32) -> i64 {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/admin/shows",
                Some(json!({
                    "name": "Swan Lake",
                    "startTime": (Utc::now() + Duration::days(2)).to_rfc3339(),
                    "totalSeats": total_seats,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["show"]["id"].as_i64().unwrap()
    }

    async fn book(&self, show_id: i64, labels: &[&str]) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            &format!("/api/shows/{}/book", show_id),
            Some(json!({ "seatLabels": labels })),
        )
        .await
    }
}

#[tokio::test]
async fn health_reports_ok() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn booking_lifecycle_over_http() {
    let app = TestApp::new();
    let show_id = app.create_show(10).await;

    let (status, body) = app.book(show_id, &["A2", "A1"]).await;
    assert_eq!(status, StatusCode::CREATED);
    let booking = &body["booking"];
    assert_eq!(booking["status"], "PENDING");
    assert_eq!(booking["showId"], show_id);
    assert_eq!(booking["seats"], json!(["A1", "A2"]));
    let booking_id = booking["id"].as_i64().unwrap();

    let (status, body) = app
        .send(Method::POST, &format!("/api/bookings/{}/confirm", booking_id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["booking"]["status"], "CONFIRMED");

    let (status, body) = app
        .send(Method::GET, &format!("/api/bookings/{}", booking_id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["booking"]["status"], "CONFIRMED");
    assert_eq!(body["booking"]["seats"], json!(["A1", "A2"]));

    let (status, body) = app
        .send(Method::GET, &format!("/api/shows/{}", show_id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["show"]["bookedSeats"], 2);
    assert_eq!(body["show"]["availableSeats"], 8);
}

#[tokio::test]
async fn taken_seats_conflict() {
    let app = TestApp::new();
    let show_id = app.create_show(10).await;

    let (status, _) = app.book(show_id, &["A1", "A2"]).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.book(show_id, &["A1", "A3"]).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "SEATS_UNAVAILABLE");
    assert_eq!(body["error"]["details"]["unavailable"], json!(["A1"]));
}

#[tokio::test]
async fn bad_requests_are_rejected_with_400() {
    let app = TestApp::new();
    let show_id = app.create_show(10).await;

    let (status, body) = app.book(show_id, &[]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, _) = app.book(show_id, &["A1", "A1"]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(Method::POST, &format!("/api/shows/{}/book", show_id), Some(json!({ "seats": 3 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = app.book(show_id, &["A1", "Q42"]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "SEATS_NOT_FOUND");

    let (status, _) = app.book(0, &["A1"]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // нечисловой id в пути отдаётся в общем формате ошибки
    for (method, uri) in [
        (Method::GET, "/api/bookings/abc"),
        (Method::POST, "/api/bookings/abc/confirm"),
        (Method::GET, "/api/shows/x1"),
    ] {
        let (status, body) = app.send(method, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    let (status, body) = app
        .send(Method::POST, "/api/shows/abc/book", Some(json!({ "seatLabels": ["A1"] })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn seat_numbers_alias_is_accepted() {
    let app = TestApp::new();
    let show_id = app.create_show(5).await;

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/api/shows/{}/book", show_id),
            Some(json!({ "seatNumbers": ["A5"] })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["booking"]["seats"], json!(["A5"]));
}

#[tokio::test]
async fn unknown_resources_are_404() {
    let app = TestApp::new();

    let (status, body) = app.book(77, &["A1"]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "SHOW_NOT_FOUND");

    let (status, body) = app.send(Method::POST, "/api/bookings/9/confirm", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "BOOKING_NOT_FOUND");

    let (status, _) = app.send(Method::GET, "/api/bookings/9", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send(Method::GET, "/api/shows/9", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_expiry_trigger_releases_lapsed_holds() {
    let app = TestApp::new();
    let show_id = app.create_show(10).await;

    let (_, body) = app.book(show_id, &["A7"]).await;
    let booking_id = body["booking"]["id"].as_i64().unwrap();

    let (status, body) = app.send(Method::POST, "/api/admin/bookings/expire", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["processedCount"], 0);

    app.clock.advance(Duration::minutes(2) + Duration::seconds(1));

    let (status, body) = app
        .send(Method::POST, &format!("/api/bookings/{}/confirm", booking_id), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "BOOKING_EXPIRED");

    let (status, body) = app.send(Method::POST, "/api/admin/bookings/expire", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["processedCount"], 1);

    let (_, body) = app
        .send(Method::GET, &format!("/api/bookings/{}", booking_id), None)
        .await;
    assert_eq!(body["booking"]["status"], "EXPIRED");
    assert_eq!(body["booking"]["seats"], json!(["A7"]));

    let (status, _) = app.book(show_id, &["A7"]).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn shows_are_listed_with_counts() {
    let app = TestApp::new();
    let show_id = app.create_show(12).await;
    app.book(show_id, &["B1", "B2", "A1"]).await;

    let (status, body) = app.send(Method::GET, "/api/shows", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    let show = &body["shows"][0];
    assert_eq!(show["id"], show_id);
    assert_eq!(show["totalSeats"], 12);
    assert_eq!(show["bookedSeats"], 3);
    assert_eq!(show["availableSeats"], 9);
}

#[tokio::test]
async fn oversized_show_is_rejected() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            Method::POST,
            "/api/admin/shows",
            Some(json!({
                "name": "Stadium",
                "startTime": Utc::now().to_rfc3339(),
                "totalSeats": 261,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}
