mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_protected_routes_require_valid_token() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/v1/users/profile", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = app.get("/api/v1/bookings/my-bookings", Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/api/v1/trips/my-trips")
        .header(header::AUTHORIZATION, "Token abc")
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_registration_rules() {
    let app = TestApp::new();
    app.register("Dmitry", true).await;

    let register = |email: &str, password: &str| {
        json!({
            "fullName": "Someone",
            "email": email,
            "phone": "+79000000000",
            "password": password,
        })
    };

    let (status, _) = app
        .request(Method::POST, "/api/v1/auth/register", None, Some(register("no-at", "secret123")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request(Method::POST, "/api/v1/auth/register", None, Some(register("a@b.c", "12345")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(register("DMITRY@hermes.test", "secret123")),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "User already exists");
}

#[tokio::test]
async fn test_login() {
    let app = TestApp::new();
    let user = app.register("Pavel", false).await;

    let login = |email: &str, password: &str| json!({ "email": email, "password": password });

    let (status, body) = app
        .request(Method::POST, "/api/v1/auth/login", None, Some(login("pavel@hermes.test", "secret123")))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], user.id.as_str());
    assert_eq!(body["user"]["role"], "passenger");
    assert_eq!(body["user"]["reviewsCount"], 0);

    let token = body["token"].as_str().unwrap();
    let (status, profile) = app.get("/api/v1/users/profile", Some(token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["email"], "pavel@hermes.test");
    assert!(profile.get("passwordHash").is_none());

    let (status, wrong_password) = app
        .request(Method::POST, "/api/v1/auth/login", None, Some(login("pavel@hermes.test", "nope-nope")))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, unknown_email) = app
        .request(Method::POST, "/api/v1/auth/login", None, Some(login("ghost@hermes.test", "secret123")))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown_email);
}

#[tokio::test]
async fn test_profile_update() {
    let app = TestApp::new();
    let driver = app.register("Dmitry", true).await;

    let (status, profile) = app
        .request(
            Method::PUT,
            "/api/v1/users/profile",
            Some(&driver.token),
            Some(json!({
                "fullName": "Dmitry K",
                "phone": "+79009999999",
                "carBrand": "Lada",
                "carModel": "Vesta",
                "carYear": 2021,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["fullName"], "Dmitry K");
    assert_eq!(profile["carYear"], 2021);

    let trip = app.create_trip(&driver, 2, 500).await;
    let details = app.trip(trip["id"].as_str().unwrap()).await;
    assert_eq!(details["driverName"], "Dmitry K");
    assert_eq!(details["driverCar"], "Lada Vesta");
    assert_eq!(details["phone"], "+79009999999");

    let (status, _) = app
        .request(
            Method::PUT,
            "/api/v1/users/profile",
            Some(&driver.token),
            Some(json!({ "fullName": "  ", "phone": "+7" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_only_drivers_publish_trips() {
    let app = TestApp::new();
    let passenger = app.register("Pavel", false).await;
    let driver = app.register("Dmitry", true).await;

    let body = json!({
        "fromCity": "Kazan",
        "toCity": "Samara",
        "tripDate": "2026-12-01",
        "tripTime": "10:00",
        "price": 100,
        "seats": 3,
    });
    let (status, _) = app.post("/api/v1/trips", &passenger.token, body.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let mut too_many_seats = body.clone();
    too_many_seats["seats"] = json!(9);
    let (status, _) = app.post("/api/v1/trips", &driver.token, too_many_seats).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut negative_price = body;
    negative_price["price"] = json!(-1);
    let (status, _) = app.post("/api/v1/trips", &driver.token, negative_price).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::new();
    let driver = app.register("Dmitry", true).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/trips")
        .header(header::AUTHORIZATION, format!("Bearer {}", driver.token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = app.get("/api/v1/trips/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_trip_ownership_and_terminal_states() {
    let app = TestApp::new();
    let owner = app.register("Dmitry", true).await;
    let stranger = app.register("Oleg", true).await;
    let trip = app.create_trip(&owner, 3, 100).await;
    let trip_id = trip["id"].as_str().unwrap();

    let (status, _) = app
        .patch(&format!("/api/v1/trips/{trip_id}/cancel"), &stranger.token, None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .patch(&format!("/api/v1/trips/{trip_id}/complete"), &owner.token, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");

    let (status, _) = app
        .patch(&format!("/api/v1/trips/{trip_id}/cancel"), &owner.token, None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .patch("/api/v1/trips/00000000-0000-4000-8000-000000000000/cancel", &owner.token, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_is_public_and_hides_contacts() {
    let app = TestApp::new();
    let driver = app.register("Dmitry", true).await;
    let first = app.create_trip(&driver, 3, 100).await;
    app.create_trip(&driver, 2, 80).await;

    let (status, results) = app
        .get("/api/v1/trips/search?from=moscow&to=petersburg&date=2026-12-01", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["driverName"], "Dmitry");
    assert!(results[0].get("phone").is_none());

    let (_, page) = app.get("/api/v1/trips/search?page=2&limit=1", None).await;
    assert_eq!(page.as_array().unwrap().len(), 1);

    let (_, none) = app.get("/api/v1/trips/search?date=2027-01-01", None).await;
    assert!(none.as_array().unwrap().is_empty());

    let (_, blank_date) = app.get("/api/v1/trips/search?from=&date=", None).await;
    assert_eq!(blank_date.as_array().unwrap().len(), 2);

    let (status, _) = app.get("/api/v1/trips/search?limit=51", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.get("/api/v1/trips/search?page=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.get("/api/v1/trips/search?date=01.12.2026", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let details = app.trip(first["id"].as_str().unwrap()).await;
    assert_eq!(details["phone"], "+79001234567");
    assert_eq!(details["tripTime"], "09:30");
    assert_eq!(details["noSmoking"], true);
}

#[tokio::test]
async fn test_my_trips_by_role() {
    let app = TestApp::new();
    let driver = app.register("Dmitry", true).await;
    let passenger = app.register("Pavel", false).await;
    let trip = app.create_trip(&driver, 3, 100).await;
    let trip_id = trip["id"].as_str().unwrap();
    app.book(&passenger, trip_id, 1).await;

    let (_, published) = app.get("/api/v1/trips/my-trips", Some(&driver.token)).await;
    assert_eq!(published.as_array().unwrap().len(), 1);
    assert_eq!(published[0]["id"], trip_id);

    let (_, booked) = app.get("/api/v1/trips/my-trips", Some(&passenger.token)).await;
    assert_eq!(booked[0]["id"], trip_id);
    assert_eq!(booked[0]["bookingStatus"], "pending");
    assert_eq!(booked[0]["seatsBooked"], 1);
}
