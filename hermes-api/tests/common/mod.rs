#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use hermes_api::{app, AppState, AuthConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

pub struct TestApp {
    router: Router,
}

pub struct TestUser {
    pub id: String,
    pub token: String,
}

impl TestApp {
    pub fn new() -> Self {
        let auth = AuthConfig {
            secret: "test-secret".to_string(),
            expiration: 3600,
            bcrypt_cost: 4,
        };
        Self {
            router: app(AppState::in_memory(auth)),
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, Some(token), body).await
    }

    pub async fn register(&self, name: &str, is_driver: bool) -> TestUser {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/v1/auth/register",
                None,
                Some(json!({
                    "fullName": name,
                    "email": format!("{}@hermes.test", name.to_lowercase()),
                    "phone": "+79001234567",
                    "password": "secret123",
                    "isDriver": is_driver,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        TestUser {
            id: body["user"]["id"].as_str().unwrap().to_string(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    pub async fn create_trip(&self, driver: &TestUser, seats: i32, price: i32) -> Value {
        let (status, body) = self
            .post(
                "/api/v1/trips",
                &driver.token,
                json!({
                    "fromCity": "Moscow",
                    "toCity": "Saint Petersburg",
                    "tripDate": "2026-12-01",
                    "tripTime": "09:30",
                    "price": price,
                    "seats": seats,
                    "noSmoking": true,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create trip failed: {body}");
        body
    }

    pub async fn book(&self, passenger: &TestUser, trip_id: &str, seats: i32) -> (StatusCode, Value) {
        self.post(
            "/api/v1/bookings",
            &passenger.token,
            json!({ "tripId": trip_id, "seatsBooked": seats }),
        )
        .await
    }

    pub async fn decide(&self, driver: &TestUser, booking_id: &str, status: &str) -> (StatusCode, Value) {
        self.patch(
            &format!("/api/v1/bookings/{booking_id}/status"),
            &driver.token,
            Some(json!({ "status": status })),
        )
        .await
    }

    pub async fn trip(&self, trip_id: &str) -> Value {
        let (status, body) = self.get(&format!("/api/v1/trips/{trip_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        body
    }
}
