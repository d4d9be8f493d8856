//! Collection endpoints against a real database.
//!
//! Run with `TEST_DATABASE_URL=postgres://... cargo test -- --ignored`.

mod common;

use admin_service::db;
use axum::http::{Method, StatusCode};
use chrono::Local;
use common::{body_bytes, body_json, request, TestApp};
use serde_json::json;
use serial_test::serial;

async fn setup() -> (TestApp, String) {
    let app = TestApp::new().await;
    db::run_migrations(&app.state.db)
        .await
        .expect("migrations should run");

    sqlx::query(
        "TRUNCATE event_members, events, members, parishes, resources, prayers_requests RESTART IDENTITY CASCADE",
    )
    .execute(&app.state.db)
    .await
    .expect("tables should truncate");

    let user = app.seed_user("editor", false).await;
    let token = app.token_for(&user);
    (app, token)
}

async fn create(
    app: &TestApp,
    token: &str,
    uri: &str,
    body: serde_json::Value,
) -> serde_json::Value {
    let res = app
        .send(request(Method::POST, uri, Some(token), Some(body)))
        .await;
    assert_eq!(res.status(), StatusCode::CREATED, "POST {}", uri);
    body_json(res).await["data"].clone()
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
#[serial]
async fn test_member_crud() {
    let (app, token) = setup().await;

    let member = create(
        &app,
        &token,
        "/api/members",
        json!({ "firstName": "Ann", "lastName": "Lee", "email": "ann@example.org", "joinDate": "2024-05-01" }),
    )
    .await;
    assert_eq!(member["active"], true);
    let uri = format!("/api/members/{}", member["id"]);

    let res = app
        .send(request(
            Method::POST,
            "/api/members",
            Some(&token),
            Some(json!({ "firstName": "Ann", "lastName": "Other", "email": "ann@example.org", "joinDate": "2024-05-01" })),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = app
        .send(request(Method::PUT, &uri, Some(&token), Some(json!({ "active": false }))))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["message"], "Member updated successfully");
    assert_eq!(body["data"]["active"], false);
    assert_eq!(body["data"]["firstName"], "Ann");

    let res = app.send(request(Method::GET, "/api/members", Some(&token), None)).await;
    let body = body_json(res).await;
    assert_eq!(body["message"], "Members retrieved successfully");
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let res = app.send(request(Method::DELETE, &uri, Some(&token), None)).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(res).await.is_empty());

    let res = app.send(request(Method::DELETE, &uri, Some(&token), None)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(res).await["message"], "Member not found");
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
#[serial]
async fn test_event_membership() {
    let (app, token) = setup().await;

    let event = create(
        &app,
        &token,
        "/api/events",
        json!({
            "name": "Youth Retreat",
            "startDateTime": "2025-06-01T09:00:00Z",
            "endDateTime": "2025-06-01T17:00:00Z",
            "pictureLink": ""
        }),
    )
    .await;
    assert_eq!(event["members"], json!([]));
    let event_id = event["id"].as_i64().unwrap();

    let member = create(
        &app,
        &token,
        "/api/members",
        json!({ "firstName": "Ben", "lastName": "Ng", "email": "ben@example.org", "joinDate": "2024-01-10" }),
    )
    .await;
    let member_id = member["id"].as_i64().unwrap();

    let add_uri = format!("/api/events/{}/members", event_id);
    let res = app
        .send(request(Method::POST, &add_uri, Some(&token), Some(json!({ "memberId": member_id }))))
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = body_json(res).await;
    assert_eq!(body["message"], "Member added to event successfully");
    assert_eq!(body["data"]["members"][0]["id"], member_id);
    assert_eq!(body["data"]["members"][0]["firstName"], "Ben");

    let res = app
        .send(request(Method::POST, &add_uri, Some(&token), Some(json!({ "memberId": member_id }))))
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(
        body_json(res).await["message"],
        "Member is already registered for this event"
    );

    let res = app
        .send(request(Method::POST, &add_uri, Some(&token), Some(json!({ "memberId": 99999 }))))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(res).await["message"], "Member not found");

    let res = app
        .send(request(
            Method::POST,
            "/api/events/99999/members",
            Some(&token),
            Some(json!({ "memberId": member_id })),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(res).await["message"], "Event not found");

    let remove_uri = format!("/api/events/{}/members/{}", event_id, member_id);
    let res = app.send(request(Method::DELETE, &remove_uri, Some(&token), None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["data"]["members"], json!([]));

    let res = app.send(request(Method::DELETE, &remove_uri, Some(&token), None)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(res).await["message"], "Event member not found");

    // Deleting the member cascades to registrations
    app.send(request(Method::POST, &add_uri, Some(&token), Some(json!({ "memberId": member_id }))))
        .await;
    app.send(request(
        Method::DELETE,
        &format!("/api/members/{}", member_id),
        Some(&token),
        None,
    ))
    .await;
    let res = app
        .send(request(Method::GET, &format!("/api/events/{}", event_id), Some(&token), None))
        .await;
    assert_eq!(body_json(res).await["data"]["members"], json!([]));
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
#[serial]
async fn test_event_dates_must_be_ordered() {
    let (app, token) = setup().await;

    let res = app
        .send(request(
            Method::POST,
            "/api/events",
            Some(&token),
            Some(json!({
                "name": "Backwards",
                "startDateTime": "2025-06-02T09:00:00Z",
                "endDateTime": "2025-06-01T09:00:00Z"
            })),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let event = create(
        &app,
        &token,
        "/api/events",
        json!({
            "name": "Mass",
            "startDateTime": "2025-06-01T09:00:00Z",
            "endDateTime": "2025-06-01T10:00:00Z"
        }),
    )
    .await;

    // Only the start is supplied; the stored end is earlier
    let res = app
        .send(request(
            Method::PUT,
            &format!("/api/events/{}", event["id"]),
            Some(&token),
            Some(json!({ "startDateTime": "2025-06-01T11:00:00Z" })),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(res).await["message"],
        "endDateTime must be greater than or equal to startDateTime"
    );
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
#[serial]
async fn test_parishes_resources_and_prayer_requests() {
    let (app, token) = setup().await;

    let parish = create(
        &app,
        &token,
        "/api/parishes",
        json!({ "name": "St. Mary", "massSchedule": { "sunday": ["09:00", "11:00"] }, "website": "" }),
    )
    .await;
    assert_eq!(parish["massSchedule"]["sunday"][1], "11:00");

    let res = app
        .send(request(
            Method::POST,
            "/api/parishes",
            Some(&token),
            Some(json!({ "name": "St. Luke", "massSchedule": ["09:00"] })),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let resource = create(
        &app,
        &token,
        "/api/resources",
        json!({ "name": "Confessions", "link": "https://example.org/book", "type": "book" }),
    )
    .await;
    assert_eq!(resource["type"], "book");

    let res = app
        .send(request(
            Method::POST,
            "/api/resources",
            Some(&token),
            Some(json!({ "name": "Mystery", "link": "https://example.org", "type": "vinyl" })),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let prayer = create(
        &app,
        &token,
        "/api/prayer-requests",
        json!({ "content": "For my family" }),
    )
    .await;
    assert_eq!(
        prayer["date"],
        Local::now().date_naive().format("%Y-%m-%d").to_string()
    );

    let res = app
        .send(request(Method::GET, "/api/prayer-requests", Some(&token), None))
        .await;
    assert_eq!(
        body_json(res).await["message"],
        "Prayer requests retrieved successfully"
    );
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
#[serial]
async fn test_dashboard_counts() {
    let (app, token) = setup().await;

    create(
        &app,
        &token,
        "/api/prayer-requests",
        json!({ "content": "Old request", "date": "2001-01-01" }),
    )
    .await;
    create(
        &app,
        &token,
        "/api/prayer-requests",
        json!({ "content": "Fresh request" }),
    )
    .await;

    let res = app
        .send(request(Method::GET, "/api/dashboard/stats?range=all", Some(&token), None))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["data"]["range"], "all");
    assert!(body["data"]["rangeStart"].is_null());
    assert_eq!(body["data"]["metrics"]["prayerRequests"]["total"], 2);
    assert_eq!(body["data"]["metrics"]["prayerRequests"]["rangeCount"], 2);

    let res = app
        .send(request(Method::GET, "/api/dashboard/stats", Some(&token), None))
        .await;
    let body = body_json(res).await;
    assert_eq!(body["data"]["range"], "month");
    assert!(body["data"]["rangeStart"].is_string());
    assert_eq!(body["data"]["metrics"]["prayerRequests"]["rangeCount"], 1);
    assert_eq!(body["data"]["metrics"]["events"]["total"], 0);

    let res = app
        .send(request(Method::GET, "/api/dashboard/stats?range=decade", Some(&token), None))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
