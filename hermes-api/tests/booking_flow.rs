mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn test_seat_lifecycle_with_trip_cancellation() {
    let app = TestApp::new();
    let driver = app.register("Dmitry", true).await;
    let p = app.register("Pavel", false).await;
    let q = app.register("Quentin", false).await;
    let r = app.register("Rita", false).await;

    let trip = app.create_trip(&driver, 3, 100).await;
    let trip_id = trip["id"].as_str().unwrap();
    assert_eq!(trip["availableSeats"], 3);
    assert_eq!(trip["status"], "active");

    let (status, booking) = app.book(&p, trip_id, 2).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["status"], "pending");
    assert_eq!(booking["totalPrice"], 200);
    assert_eq!(app.trip(trip_id).await["availableSeats"], 3);

    let booking_id = booking["id"].as_str().unwrap();
    let (status, confirmed) = app.decide(&driver, booking_id, "confirmed").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed["status"], "confirmed");
    assert_eq!(app.trip(trip_id).await["availableSeats"], 1);

    let (status, body) = app.book(&q, trip_id, 2).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, pending) = app.book(&r, trip_id, 1).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .patch(&format!("/api/v1/trips/{trip_id}/cancel"), &driver.token, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["trip"]["status"], "cancelled");
    assert_eq!(body["cancelledBookings"], 1);

    let (_, r_bookings) = app.get("/api/v1/bookings/my-bookings", Some(&r.token)).await;
    assert_eq!(r_bookings[0]["id"], pending["id"]);
    assert_eq!(r_bookings[0]["status"], "cancelled");
    assert_eq!(r_bookings[0]["tripStatus"], "cancelled");

    let (_, p_bookings) = app.get("/api/v1/bookings/my-bookings", Some(&p.token)).await;
    assert_eq!(p_bookings[0]["status"], "confirmed");
    assert_eq!(p_bookings[0]["driverName"], "Dmitry");
}

#[tokio::test]
async fn test_booking_cannot_be_decided_twice() {
    let app = TestApp::new();
    let driver = app.register("Dmitry", true).await;
    let p = app.register("Pavel", false).await;
    let trip = app.create_trip(&driver, 4, 50).await;
    let trip_id = trip["id"].as_str().unwrap();

    let (_, booking) = app.book(&p, trip_id, 1).await;
    let booking_id = booking["id"].as_str().unwrap();

    let (status, _) = app.decide(&driver, booking_id, "confirmed").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.decide(&driver, booking_id, "confirmed").await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = app.decide(&driver, booking_id, "cancelled").await;
    assert_eq!(status, StatusCode::CONFLICT);

    assert_eq!(app.trip(trip_id).await["availableSeats"], 3);
}

#[tokio::test]
async fn test_confirmation_rechecks_capacity() {
    let app = TestApp::new();
    let driver = app.register("Dmitry", true).await;
    let p = app.register("Pavel", false).await;
    let q = app.register("Quentin", false).await;
    let trip = app.create_trip(&driver, 3, 10).await;
    let trip_id = trip["id"].as_str().unwrap();

    let (_, first) = app.book(&p, trip_id, 2).await;
    let (_, second) = app.book(&q, trip_id, 2).await;

    let (status, _) = app.decide(&driver, first["id"].as_str().unwrap(), "confirmed").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.decide(&driver, second["id"].as_str().unwrap(), "confirmed").await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, inbox) = app.get("/api/v1/bookings/driver", Some(&driver.token)).await;
    let inbox = inbox.as_array().unwrap();
    assert_eq!(inbox.len(), 2);
    assert_eq!(inbox[0]["status"], "pending");
    assert_eq!(inbox[0]["passengerName"], "Quentin");
    assert_eq!(inbox[1]["status"], "confirmed");
    assert_eq!(app.trip(trip_id).await["availableSeats"], 1);
}

#[tokio::test]
async fn test_decision_requires_trip_driver_and_valid_status() {
    let app = TestApp::new();
    let driver = app.register("Dmitry", true).await;
    let other_driver = app.register("Oleg", true).await;
    let p = app.register("Pavel", false).await;
    let trip = app.create_trip(&driver, 2, 10).await;
    let trip_id = trip["id"].as_str().unwrap();

    let (status, _) = app.book(&driver, trip_id, 1).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, booking) = app.book(&p, trip_id, 1).await;
    let booking_id = booking["id"].as_str().unwrap();

    let (status, _) = app.decide(&other_driver, booking_id, "confirmed").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.decide(&p, booking_id, "confirmed").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = app.decide(&driver, booking_id, "pending").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = app
        .decide(&driver, "00000000-0000-4000-8000-000000000000", "confirmed")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_driver_ratings_average_across_trips() {
    let app = TestApp::new();
    let driver = app.register("Dmitry", true).await;
    let p = app.register("Pavel", false).await;

    for rating in [4, 2] {
        let trip = app.create_trip(&driver, 3, 100).await;
        let (_, booking) = app.book(&p, trip["id"].as_str().unwrap(), 1).await;
        let booking_id = booking["id"].as_str().unwrap();
        app.decide(&driver, booking_id, "confirmed").await;

        let (status, review) = app
            .post(
                &format!("/api/v1/bookings/{booking_id}/rate"),
                &driver.token,
                json!({ "rating": rating, "comment": "On time" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{review}");
        assert_eq!(review["targetId"], p.id.as_str());
    }

    let (_, profile) = app.get("/api/v1/users/profile", Some(&p.token)).await;
    assert_eq!(profile["rating"], 3.0);
    assert_eq!(profile["reviewsCount"], 2);

    let (_, reviews) = app.get(&format!("/api/v1/reviews/user/{}", p.id), Some(&p.token)).await;
    assert_eq!(reviews.as_array().unwrap().len(), 2);
    assert_eq!(reviews[0]["authorName"], "Dmitry");

    let (_, mine) = app.get("/api/v1/reviews/my-reviews", Some(&p.token)).await;
    assert_eq!(mine.as_array().unwrap().len(), 2);
    let (_, written) = app.get("/api/v1/reviews/written", Some(&driver.token)).await;
    assert_eq!(written.as_array().unwrap().len(), 2);
    assert_eq!(written[0]["targetName"], "Pavel");
}

#[tokio::test]
async fn test_rating_a_pending_booking_is_rejected() {
    let app = TestApp::new();
    let driver = app.register("Dmitry", true).await;
    let p = app.register("Pavel", false).await;
    let trip = app.create_trip(&driver, 3, 100).await;
    let (_, booking) = app.book(&p, trip["id"].as_str().unwrap(), 1).await;
    let uri = format!("/api/v1/bookings/{}/rate", booking["id"].as_str().unwrap());

    let (status, _) = app.post(&uri, &driver.token, json!({ "rating": 5 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.post(&uri, &p.token, json!({ "rating": 5 })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_reviews_are_unique_per_trip_and_target() {
    let app = TestApp::new();
    let driver = app.register("Dmitry", true).await;
    let p = app.register("Pavel", false).await;
    let trip = app.create_trip(&driver, 3, 100).await;
    let trip_id = trip["id"].as_str().unwrap();

    let review = json!({ "tripId": trip_id, "targetId": driver.id, "rating": 5 });

    // Pending booking is not participation.
    let (_, booking) = app.book(&p, trip_id, 1).await;
    let (status, _) = app.post("/api/v1/reviews", &p.token, review.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    app.decide(&driver, booking["id"].as_str().unwrap(), "confirmed").await;

    let (_, check) = app.get(&format!("/api/v1/reviews/check/{trip_id}"), Some(&p.token)).await;
    assert_eq!(check, json!({ "exists": false }));

    let (status, created) = app.post("/api/v1/reviews", &p.token, review.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app.post("/api/v1/reviews", &p.token, review).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, check) = app.get(&format!("/api/v1/reviews/check/{trip_id}"), Some(&p.token)).await;
    assert_eq!(check["exists"], true);
    assert_eq!(check["review"]["id"], created["id"]);

    let (status, _) = app
        .post(
            "/api/v1/reviews",
            &p.token,
            json!({ "tripId": trip_id, "targetId": p.id, "rating": 5 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/api/v1/reviews",
            &p.token,
            json!({ "tripId": trip_id, "targetId": driver.id, "rating": 6 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_review_update_recomputes_rating() {
    let app = TestApp::new();
    let driver = app.register("Dmitry", true).await;
    let p = app.register("Pavel", false).await;
    let trip = app.create_trip(&driver, 3, 100).await;
    let trip_id = trip["id"].as_str().unwrap();
    let (_, booking) = app.book(&p, trip_id, 1).await;
    app.decide(&driver, booking["id"].as_str().unwrap(), "confirmed").await;

    let (_, review) = app
        .post(
            "/api/v1/reviews",
            &p.token,
            json!({ "tripId": trip_id, "targetId": driver.id, "rating": 2 }),
        )
        .await;
    let uri = format!("/api/v1/reviews/{}", review["id"].as_str().unwrap());

    let (status, _) = app
        .request(
            axum::http::Method::PUT,
            &uri,
            Some(&driver.token),
            Some(json!({ "rating": 5 })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = app
        .request(
            axum::http::Method::PUT,
            &uri,
            Some(&p.token),
            Some(json!({ "rating": 5, "comment": "Smooth ride" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["rating"], 5);

    let (_, profile) = app.get("/api/v1/users/profile", Some(&driver.token)).await;
    assert_eq!(profile["rating"], 5.0);
    assert_eq!(profile["reviewsCount"], 1);
}
