use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use disc_rooms_back::{
    config::AppConfig,
    dao::room_store::memory::MemoryRoomStore,
    routes,
    state::{AppState, SharedState},
};
use futures::StreamExt;
use serde_json::{Value, json};
use tokio::time::timeout;
use tower::ServiceExt;

const HOST: &str = "host-1";

async fn app() -> Router {
    let state = AppState::new(AppConfig::default());
    state
        .install_room_store(Arc::new(MemoryRoomStore::new()))
        .await;
    routes::router(state)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    headers: &[(&str, &str)],
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn create_room(app: &Router, body: Value) -> Value {
    let (status, room) = send(
        app,
        Method::POST,
        "/rooms",
        &[("x-user-id", HOST)],
        Some(body),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{room}");
    room
}

fn room_id(room: &Value) -> String {
    room["id"].as_str().unwrap().to_string()
}

async fn join_guest(
    app: &Router,
    room_id: &str,
    name: &str,
    password: Option<&str>,
) -> (StatusCode, Value) {
    let mut body = json!({"guest_name": name});
    if let Some(password) = password {
        body["password"] = json!(password);
    }
    send(
        app,
        Method::POST,
        &format!("/rooms/{room_id}/join"),
        &[],
        Some(body),
    )
    .await
}

async fn ready_guest(app: &Router, room_id: &str, name: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        &format!("/rooms/{room_id}/ready"),
        &[],
        Some(json!({"guest_name": name})),
    )
    .await
}

/// Create a room for the given guests, join and ready them all, and return the started room.
async fn started_room(app: &Router, guests: &[&str]) -> Value {
    let room = create_room(
        app,
        json!({"course_id": "maple-hill", "capacity": guests.len()}),
    )
    .await;
    let id = room_id(&room);
    for guest in guests {
        let (status, _) = join_guest(app, &id, guest, None).await;
        assert_eq!(status, StatusCode::OK);
    }
    let mut last = Value::Null;
    for guest in guests {
        let (status, detail) = ready_guest(app, &id, guest).await;
        assert_eq!(status, StatusCode::OK);
        last = detail;
    }
    assert_eq!(last["status"], "in_progress");
    last
}

#[tokio::test]
async fn two_guests_in_a_room_of_two_start_the_game() {
    let app = app().await;
    let room = create_room(&app, json!({"course_id": "maple-hill", "capacity": 2})).await;
    assert_eq!(room["status"], "waiting");
    assert_eq!(room["has_password"], false);
    assert_eq!(room["code"].as_str().unwrap().len(), 6);
    let id = room_id(&room);

    for name in ["Sam", "Alex"] {
        let (status, _) = join_guest(&app, &id, name, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, detail) = ready_guest(&app, &id, "Sam").await;
    assert_eq!(detail["status"], "waiting");
    assert_eq!(detail["ready_count"], 1);

    let (status, detail) = ready_guest(&app, &id, "Alex").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["status"], "in_progress");
    assert_eq!(detail["ready_count"], 2);
    assert!(detail["game_id"].is_string());

    let game_id = detail["game_id"].as_str().unwrap();
    let (status, game) = send(&app, Method::GET, &format!("/games/{game_id}"), &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(game["active"], true);
    assert_eq!(game["room_id"], id.as_str());
}

#[tokio::test]
async fn joining_a_full_room_is_a_conflict() {
    let app = app().await;
    let room = create_room(&app, json!({"course_id": "maple-hill", "capacity": 1})).await;
    let id = room_id(&room);

    let (status, _) = join_guest(&app, &id, "Sam", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = join_guest(&app, &id, "Alex", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("full"));

    let (status, detail) = join_guest(&app, &id, "Sam", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["participants"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn wrong_password_is_unauthorized_and_leaves_no_participation() {
    let app = app().await;
    let room = create_room(
        &app,
        json!({"course_id": "maple-hill", "capacity": 4, "password": "birdie"}),
    )
    .await;
    assert_eq!(room["has_password"], true);
    assert!(room.get("password_hash").is_none());
    let id = room_id(&room);

    let (status, _) = join_guest(&app, &id, "Sam", Some("bogey")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, detail) = send(&app, Method::GET, &format!("/rooms/{id}"), &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(detail["participants"].as_array().unwrap().is_empty());

    let (status, _) = join_guest(&app, &id, "Sam", Some("birdie")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn room_starts_only_when_every_participant_is_ready() {
    let app = app().await;
    let room = create_room(&app, json!({"course_id": "maple-hill", "capacity": 3})).await;
    let id = room_id(&room);
    for name in ["A", "B", "C"] {
        join_guest(&app, &id, name, None).await;
    }

    for name in ["A", "B", "B"] {
        let (status, detail) = ready_guest(&app, &id, name).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["status"], "waiting");
        assert!(detail.get("game_id").is_none());
    }

    let (_, detail) = ready_guest(&app, &id, "C").await;
    assert_eq!(detail["status"], "in_progress");

    let (status, _) = join_guest(&app, &id, "Late", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn resubmitted_score_overwrites_the_previous_one() {
    let app = app().await;
    let room = started_room(&app, &["Sam", "Alex"]).await;
    let game_id = room["game_id"].as_str().unwrap();
    let uri = format!("/games/{game_id}/scores");

    for strokes in [5, 3] {
        let (status, score) = send(
            &app,
            Method::POST,
            &uri,
            &[],
            Some(json!({
                "hole": 1,
                "player": {"kind": "guest", "id": "Sam"},
                "strokes": strokes,
                "penalties": 1
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{score}");
        assert_eq!(score["total"], strokes + 1);
    }

    let (status, scores) = send(&app, Method::GET, &uri, &[], None).await;
    assert_eq!(status, StatusCode::OK);
    let scores = scores.as_array().unwrap();
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0]["strokes"], 3);

    let (_, game) = send(&app, Method::GET, &format!("/games/{game_id}"), &[], None).await;
    assert_eq!(game["leaderboard"][0]["total"], 4);
    assert_eq!(game["leaderboard"][0]["holes_played"], 1);
}

#[tokio::test]
async fn score_submission_is_validated() {
    let app = app().await;
    let room = started_room(&app, &["Sam"]).await;
    let game_id = room["game_id"].as_str().unwrap();
    let uri = format!("/games/{game_id}/scores");

    let (status, _) = send(
        &app,
        Method::POST,
        &uri,
        &[],
        Some(json!({"hole": 0, "player": {"kind": "guest", "id": "Sam"}, "strokes": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        &uri,
        &[],
        Some(json!({"hole": 1, "player": {"kind": "guest", "id": "Stranger"}, "strokes": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/games/00000000-0000-0000-0000-000000000000/scores",
        &[],
        Some(json!({"hole": 1, "player": {"kind": "guest", "id": "Sam"}, "strokes": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn completing_twice_yields_the_same_terminal_state() {
    let app = app().await;
    let room = started_room(&app, &["Sam"]).await;
    let id = room_id(&room);
    let game_id = room["game_id"].as_str().unwrap().to_string();
    let uri = format!("/rooms/{id}/complete");

    let (status, first) = send(&app, Method::POST, &uri, &[("x-user-id", HOST)], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["status"], "completed");
    assert_eq!(first["active"], false);
    let (_, game) = send(&app, Method::GET, &format!("/games/{game_id}"), &[], None).await;
    let completed_at = game["completed_at"].clone();
    assert!(completed_at.is_string());

    let (status, second) = send(&app, Method::POST, &uri, &[("x-user-id", HOST)], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second, first);
    let (_, game) = send(&app, Method::GET, &format!("/games/{game_id}"), &[], None).await;
    assert_eq!(game["completed_at"], completed_at);
    assert_eq!(game["active"], false);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/games/{game_id}/scores"),
        &[],
        Some(json!({"hole": 1, "player": {"kind": "guest", "id": "Sam"}, "strokes": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn completion_requires_host_or_admin() {
    let app = app().await;
    let room = create_room(&app, json!({"course_id": "maple-hill", "capacity": 2})).await;
    let uri = format!("/rooms/{}/complete", room_id(&room));

    let (status, _) = send(&app, Method::POST, &uri, &[], None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::POST, &uri, &[("x-user-id", "guest-7")], None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::POST,
        &uri,
        &[("x-user-id", "ops"), ("x-user-role", "admin")],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");
}

#[tokio::test]
async fn room_creation_requires_a_signed_in_user() {
    let app = app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/rooms",
        &[],
        Some(json!({"course_id": "maple-hill", "capacity": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].is_string());

    let (status, _) = send(
        &app,
        Method::POST,
        "/rooms",
        &[("x-user-id", HOST)],
        Some(json!({"course_id": "maple-hill", "capacity": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_rooms_are_not_found() {
    let app = app().await;
    let missing = "00000000-0000-0000-0000-000000000000";

    let (status, _) = send(&app, Method::GET, &format!("/rooms/{missing}"), &[], None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = join_guest(&app, missing, "Sam", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::GET, "/rooms/code/ZZZZZZ", &[], None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/rooms/{missing}/events"),
        &[],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn open_rooms_are_listed_and_found_by_code() {
    let app = app().await;
    let room = create_room(&app, json!({"course_id": "maple-hill", "capacity": 2})).await;
    create_room(&app, json!({"course_id": "river-park", "capacity": 2})).await;

    let (status, rooms) = send(&app, Method::GET, "/rooms?course_id=maple-hill", &[], None).await;
    assert_eq!(status, StatusCode::OK);
    let rooms = rooms.as_array().unwrap();
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0]["id"], room["id"]);

    let (_, all) = send(&app, Method::GET, "/rooms", &[], None).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let code = room["code"].as_str().unwrap().to_ascii_lowercase();
    let (status, found) = send(&app, Method::GET, &format!("/rooms/code/{code}"), &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["id"], room["id"]);
}

#[tokio::test]
async fn degraded_service_reports_unavailable() {
    let state: SharedState = AppState::new(AppConfig::default());
    let app = routes::router(state);

    let (status, health) = send(&app, Method::GET, "/healthcheck", &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "degraded");

    let (status, _) = send(&app, Method::GET, "/rooms", &[], None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn room_event_stream_is_served_as_sse() {
    let app = app().await;
    let room = create_room(&app, json!({"course_id": "maple-hill", "capacity": 2})).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/rooms/{}/events", room_id(&room)))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );
}

async fn send_raw(app: &Router, uri: &str, content_type: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("x-user-id", HOST)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests_with_a_message() {
    let app = app().await;
    let cases = [
        ("application/json", r#"{"capacity": 2}"#),
        ("application/json", r#"{"course_id": "maple-hill", "capacity": "two"}"#),
        ("application/json", r#"{"course_id": "maple-hill", "capacity": 300}"#),
        ("application/json", r#"{"course_id": "maple-hill", "capacity": 0}"#),
        ("application/json", r#"{"course_id": "maple-hill", "#),
        ("text/plain", r#"{"course_id": "maple-hill", "capacity": 2}"#),
    ];

    for (content_type, body) in cases {
        let (status, error) = send_raw(&app, "/rooms", content_type, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert!(error["message"].is_string(), "{body} -> {error}");
    }

    let (_, error) = send_raw(&app, "/rooms", "application/json", r#"{"capacity": 2}"#).await;
    assert!(error["message"].as_str().unwrap().contains("course_id"));
    let (_, error) = send_raw(
        &app,
        "/rooms",
        "application/json",
        r#"{"course_id": "maple-hill", "capacity": 0}"#,
    )
    .await;
    assert!(error["message"].as_str().unwrap().contains("capacity"));
}

#[tokio::test]
async fn guest_names_are_matched_exactly_across_join_and_scoring() {
    let app = app().await;
    let room = create_room(&app, json!({"course_id": "maple-hill", "capacity": 2})).await;
    let id = room_id(&room);

    let (status, error) = join_guest(&app, &id, " Sam", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error["message"].is_string());

    let started = started_room(&app, &["Sam"]).await;
    let game_id = started["game_id"].as_str().unwrap();
    let uri = format!("/games/{game_id}/scores");
    for (name, expected) in [(" Sam", StatusCode::BAD_REQUEST), ("Sam", StatusCode::OK)] {
        let (status, _) = send(
            &app,
            Method::POST,
            &uri,
            &[],
            Some(json!({"hole": 1, "player": {"kind": "guest", "id": name}, "strokes": 3})),
        )
        .await;
        assert_eq!(status, expected, "{name:?}");
    }
}

#[tokio::test]
async fn room_stream_carries_only_its_own_room_events() {
    let app = app().await;
    let watched = create_room(&app, json!({"course_id": "maple-hill", "capacity": 1})).await;
    let other = create_room(&app, json!({"course_id": "maple-hill", "capacity": 1})).await;
    let watched_id = room_id(&watched);
    let other_id = room_id(&other);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/rooms/{watched_id}/events"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let mut frames = response.into_body().into_data_stream();

    let (status, _) = join_guest(&app, &other_id, "Elsewhere", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = ready_guest(&app, &other_id, "Elsewhere").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = join_guest(&app, &watched_id, "Sam", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, detail) = ready_guest(&app, &watched_id, "Sam").await;
    assert_eq!(status, StatusCode::OK);
    let game_id = detail["game_id"].as_str().unwrap();
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/games/{game_id}/scores"),
        &[],
        Some(json!({"hole": 1, "player": {"kind": "guest", "id": "Sam"}, "strokes": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let mut text = String::new();
    while !text.contains("event: score.recorded") {
        let frame = timeout(Duration::from_secs(5), frames.next())
            .await
            .expect("room stream went quiet")
            .expect("room stream ended")
            .unwrap();
        text.push_str(&String::from_utf8_lossy(&frame));
    }

    let names = text
        .lines()
        .filter_map(|line| line.strip_prefix("event: "))
        .collect::<Vec<_>>();
    assert_eq!(
        names,
        [
            "handshake",
            "participant.joined",
            "participant.ready",
            "room.status_changed",
            "score.recorded"
        ]
    );
    assert!(text.contains(&watched_id));
    assert!(!text.contains(&other_id));
    assert!(!text.contains("Elsewhere"));
}
