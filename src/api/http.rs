//! HTTP server setup with Axum

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use super::rest::{categories, events, search, subscriptions, users};
use super::state::AppState;

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration - allow all origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Events
        .route("/api/events", get(events::list_events).post(events::create_event))
        .route(
            "/api/events/:id",
            get(events::get_event)
                .put(events::edit_event)
                .delete(events::cancel_event),
        )
        .route("/api/events/:id/cover", put(events::update_cover))
        // Attendance
        .route("/api/events/:id/subscribe", post(subscriptions::subscribe))
        .route("/api/events/:id/unsubscribe", post(subscriptions::unsubscribe))
        .route("/api/events/:id/save", post(subscriptions::save))
        .route("/api/events/:id/unsave", post(subscriptions::unsave))
        .route("/api/events/:id/subscribers", get(subscriptions::subscribers))
        .route("/api/events/:id/banlist", get(subscriptions::ban_list))
        .route("/api/events/:id/kick/:user", post(subscriptions::kick))
        .route("/api/events/:id/ban/:user", post(subscriptions::ban))
        .route("/api/events/:id/unban/:user", post(subscriptions::unban))
        // Categories and search
        .route("/api/categories", get(categories::list_categories))
        .route("/api/categories/:id/events", get(categories::category_events))
        .route("/api/search", get(search::search_events))
        // Accounts
        .route("/api/users", post(users::register))
        .route("/api/users/:id", get(users::get_user))
        .route("/api/users/:id/follow", post(users::follow))
        .route("/api/users/:id/unfollow", post(users::unfollow))
        .route("/api/users/:id/followers", get(users::followers))
        .route("/api/users/:id/following", get(users::following))
        .route("/api/users/:id/events/organized", get(users::organized_events))
        .route("/api/users/:id/events/attended", get(users::attended_events))
        .route("/api/users/:id/events/saved", get(users::saved_events))
        .route("/api/users/:id/events/history", get(users::events_history))
        .route("/api/profile", put(users::edit_profile))
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchIndex;
    use crate::store::Database;
    use crate::sync::IndexSynchronizer;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use axum::response::Response;
    use serde_json::{json, Value};
    use tower::util::ServiceExt;
    use uuid::Uuid;

    fn app() -> Router {
        let db = Arc::new(Database::in_memory());
        let sync = IndexSynchronizer::new(Arc::clone(&db), SearchIndex::in_memory());
        create_router(Arc::new(AppState::new(db, sync)))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        user: Option<Uuid>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("x-user-id", user.to_string());
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.clone().oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn register(app: &Router, name: &str) -> Uuid {
        let response = send(
            app,
            Method::POST,
            "/api/users",
            None,
            Some(json!({
                "userName": name,
                "firstName": name,
                "lastName": "Tester",
                "email": format!("{}@example.com", name),
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        body["data"]["id"].as_str().unwrap().parse().unwrap()
    }

    async fn create_event(app: &Router, organizer: Uuid, title: &str, max: u32) -> Uuid {
        let response = send(
            app,
            Method::POST,
            "/api/events",
            Some(organizer),
            Some(json!({
                "title": title,
                "startsAt": "2030-06-01T20:00:00+02:00",
                "durationSecs": 7200,
                "price": 10.0,
                "location": { "longitude": 2.35, "latitude": 48.85 },
                "categoryId": 5,
                "maxAttendees": max,
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        body["data"]["id"].as_str().unwrap().parse().unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = send(&app(), Method::GET, "/health", None, None).await;
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_missing_user_header_is_unauthorized() {
        let app = app();
        let id = Uuid::new_v4();

        let response = send(&app, Method::POST, &format!("/api/events/{}/subscribe", id), None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("/api/events/{}/subscribe", id))
            .header("x-user-id", "not-a-uuid")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_subscribe_flow_and_error_codes() {
        let app = app();
        let organizer = register(&app, "host").await;
        let alice = register(&app, "alice").await;
        let bob = register(&app, "bob").await;
        let event = create_event(&app, organizer, "Jazz Night", 1).await;

        let uri = format!("/api/events/{}/subscribe", event);
        let response = send(&app, Method::POST, &uri, Some(alice), None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(&app, Method::POST, &uri, Some(bob), None).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = json_body(response).await;
        assert_eq!(body["code"], "CONFLICT");

        let response = send(
            &app,
            Method::POST,
            &format!("/api/events/{}/ban/{}", event, alice),
            Some(bob),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = send(&app, Method::GET, &format!("/api/events/{}", Uuid::new_v4()), None, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(&app, Method::GET, &format!("/api/events/{}/subscribers", event), None, None).await;
        let body = json_body(response).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["data"][0]["userName"], "alice");
    }

    #[tokio::test]
    async fn test_search_round_trip() {
        let app = app();
        let organizer = register(&app, "host").await;
        let event = create_event(&app, organizer, "Jazz Night", 0).await;

        let response = send(&app, Method::GET, "/api/search?q=jazz&limit=10", None, None).await;
        let body = json_body(response).await;
        assert_eq!(body["data"][0]["id"], event.to_string());
        assert_eq!(body["data"][0]["categoryName"], "Music");

        let response = send(&app, Method::DELETE, &format!("/api/events/{}", event), Some(organizer), None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(&app, Method::GET, "/api/search?q=jazz", None, None).await;
        assert_eq!(json_body(response).await["total"], 0);

        let response = send(&app, Method::GET, "/api/search?q=", None, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_draft_is_bad_request() {
        let app = app();
        let organizer = register(&app, "host").await;

        let response = send(
            &app,
            Method::POST,
            "/api/events",
            Some(organizer),
            Some(json!({
                "title": "",
                "startsAt": "2030-06-01T20:00:00Z",
                "location": { "longitude": 0.0, "latitude": 0.0 },
                "categoryId": 5,
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_categories_and_follow() {
        let app = app();
        let a = register(&app, "a1").await;
        let b = register(&app, "b1").await;

        let response = send(&app, Method::GET, "/api/categories", None, None).await;
        assert_eq!(json_body(response).await["total"], 8);

        let response = send(&app, Method::POST, &format!("/api/users/{}/follow", b), Some(a), None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(&app, Method::GET, &format!("/api/users/{}", b), None, None).await;
        assert_eq!(json_body(response).await["data"]["followers"], 1);

        let response = send(
            &app,
            Method::PUT,
            "/api/profile",
            Some(a),
            Some(json!({ "biography": "Trumpet" })),
        )
        .await;
        assert_eq!(json_body(response).await["data"]["biography"], "Trumpet");
    }
}
