use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use chrono::{DateTime, Utc};
use serde_json::Value;
use spotle::api::router;
use spotle::storage::{ArtistDraft, ArtistStorage};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    storage: Arc<ArtistStorage>,
}

impl TestApp {
    async fn new() -> Self {
        let storage = Arc::new(ArtistStorage::open_in_memory().await.unwrap());
        storage.init_db().await.unwrap();
        TestApp {
            router: router(storage.clone(), Duration::from_secs(15)),
            storage,
        }
    }

    async fn add_artists(&self, count: usize) {
        for i in 0..count {
            self.storage
                .create(&ArtistDraft::new(format!("Artist {i}"), 3_200_100))
                .await
                .unwrap();
        }
    }

    async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<&str>,
    ) -> (StatusCode, String) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn request_json(
        &self,
        method: Method,
        uri: &str,
        body: Option<&str>,
    ) -> (StatusCode, Value) {
        let (status, text) = self.request(method, uri, body).await;
        (status, serde_json::from_str(&text).unwrap())
    }
}

fn ids(list: &Value) -> Vec<i64> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_liveness() {
    let app = TestApp::new().await;
    let (status, body) = app.request(Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "API Connected");
}

#[tokio::test]
async fn test_empty_table() {
    let app = TestApp::new().await;
    let (status, body) = app.request(Method::GET, "/artists", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
}

#[tokio::test]
async fn test_get_non_existent_artist() {
    let app = TestApp::new().await;
    let (status, body) = app.request_json(Method::GET, "/artist/11", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Artist not found");
}

#[tokio::test]
async fn test_create_artist() {
    let app = TestApp::new().await;
    let before = Utc::now();
    let (status, body) = app
        .request_json(
            Method::POST,
            "/artist",
            Some(r#"{"name":"The Weeknd","monthly_listeners":115683791}"#),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 1);
    assert_eq!(body["name"], "The Weeknd");
    assert_eq!(body["monthly_listeners"], 115_683_791);

    let last_checked: DateTime<Utc> = body["last_checked"].as_str().unwrap().parse().unwrap();
    let drift = (last_checked - before).num_seconds().abs();
    assert!(drift < 5, "last_checked too far from now: {last_checked}");
}

#[tokio::test]
async fn test_create_ignores_client_id_and_timestamp() {
    let app = TestApp::new().await;
    let (status, body) = app
        .request_json(
            Method::POST,
            "/artist",
            Some(r#"{"id":99,"name":"Taylor Swift","monthly_listeners":200100,"last_checked":"2000-01-01T00:00:00Z"}"#),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 1);
    assert_ne!(body["last_checked"], "2000-01-01T00:00:00Z");
}

#[tokio::test]
async fn test_create_ids_strictly_increase() {
    let app = TestApp::new().await;
    let mut previous = 0;
    for name in ["A", "B", "C"] {
        let payload = format!(r#"{{"name":"{name}","monthly_listeners":1}}"#);
        let (status, body) = app
            .request_json(Method::POST, "/artist", Some(&payload))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["id"].as_i64().unwrap();
        assert!(id > previous);
        previous = id;
    }
}

#[tokio::test]
async fn test_create_with_malformed_json() {
    let app = TestApp::new().await;
    let (status, body) = app
        .request(
            Method::POST,
            "/artist",
            Some(r#"{"name":The Weeknd, "monthly_listeners":115683791}"#),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Invalid request"}"#);
    assert_eq!(app.storage.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_create_with_missing_field() {
    let app = TestApp::new().await;
    let (status, body) = app
        .request_json(Method::POST, "/artist", Some(r#"{"name":"The Weeknd"}"#))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request");
}

#[tokio::test]
async fn test_get_artist() {
    let app = TestApp::new().await;
    app.add_artists(1).await;

    let (status, body) = app.request_json(Method::GET, "/artist/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 1);
    assert_eq!(body["name"], "Artist 0");
    assert_eq!(body["monthly_listeners"], 3_200_100);
}

#[tokio::test]
async fn test_get_with_invalid_id() {
    let app = TestApp::new().await;
    for uri in ["/artist/abc", "/artist/0", "/artist/-1"] {
        let (status, body) = app.request_json(Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"], "Invalid artist ID");
    }
}

#[tokio::test]
async fn test_update_artist() {
    let app = TestApp::new().await;
    app.add_artists(1).await;

    let (_, original) = app.request_json(Method::GET, "/artist/1", None).await;
    tokio::time::sleep(Duration::from_millis(5)).await;

    let (status, updated) = app
        .request_json(
            Method::PUT,
            "/artist/1",
            Some(r#"{"id":5,"name":"The Weekend","monthly_listeners":1}"#),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], original["id"]);
    assert_eq!(updated["name"], "The Weekend");
    assert_eq!(updated["monthly_listeners"], 1);
    assert_ne!(updated["last_checked"], original["last_checked"]);

    let (_, fetched) = app.request_json(Method::GET, "/artist/1", None).await;
    assert_eq!(fetched, updated);
}

#[tokio::test]
async fn test_update_with_invalid_id_short_circuits() {
    let app = TestApp::new().await;
    app.add_artists(1).await;

    let (status, body) = app
        .request_json(
            Method::PUT,
            "/artist/abc",
            Some(r#"{"name":"Changed","monthly_listeners":1}"#),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid artist ID");

    let (_, fetched) = app.request_json(Method::GET, "/artist/1", None).await;
    assert_eq!(fetched["name"], "Artist 0");
}

#[tokio::test]
async fn test_update_with_malformed_json() {
    let app = TestApp::new().await;
    app.add_artists(1).await;

    let (status, body) = app
        .request_json(Method::PUT, "/artist/1", Some("{not json"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request");
}

#[tokio::test]
async fn test_update_non_existent_artist() {
    let app = TestApp::new().await;
    let (status, body) = app
        .request_json(
            Method::PUT,
            "/artist/3",
            Some(r#"{"name":"Ghost","monthly_listeners":1}"#),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Artist not found");
    assert_eq!(app.storage.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_delete_artist() {
    let app = TestApp::new().await;
    app.add_artists(1).await;

    let (status, _) = app.request(Method::GET, "/artist/1", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.request(Method::DELETE, "/artist/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"result":"successfully deleted"}"#);

    let (status, _) = app.request(Method::GET, "/artist/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_non_existent_and_invalid_id() {
    let app = TestApp::new().await;

    let (status, body) = app.request_json(Method::DELETE, "/artist/8", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Artist not found");

    let (status, body) = app.request_json(Method::DELETE, "/artist/x", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid artist ID");
}

#[tokio::test]
async fn test_list_count_is_clamped() {
    let app = TestApp::new().await;
    app.add_artists(12).await;

    for (uri, expected) in [
        ("/artists", 10),
        ("/artists?count=0", 10),
        ("/artists?count=11", 10),
        ("/artists?count=abc", 10),
        ("/artists?count=5", 5),
    ] {
        let (status, body) = app.request_json(Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), expected, "{uri}");
    }
}

#[tokio::test]
async fn test_list_start_is_clamped() {
    let app = TestApp::new().await;
    app.add_artists(12).await;

    let (_, from_zero) = app
        .request_json(Method::GET, "/artists?start=0&count=3", None)
        .await;
    let (_, negative) = app
        .request_json(Method::GET, "/artists?start=-1&count=3", None)
        .await;
    assert_eq!(ids(&from_zero), vec![1, 2, 3]);
    assert_eq!(ids(&negative), ids(&from_zero));

    let (_, tail) = app
        .request_json(Method::GET, "/artists?start=10&count=5", None)
        .await;
    assert_eq!(ids(&tail), vec![11, 12]);
}

#[tokio::test]
async fn test_list_with_repeated_query_key() {
    let app = TestApp::new().await;
    app.add_artists(3).await;

    let (status, body) = app
        .request_json(Method::GET, "/artists?count=1&count=2", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![1]);

    let (status, body) = app
        .request_json(Method::GET, "/artists?start=1&start=-5&count=2", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![2, 3]);
}

#[tokio::test]
async fn test_non_utf8_artist_id() {
    let app = TestApp::new().await;
    app.add_artists(1).await;

    for (method, body) in [
        (Method::GET, None),
        (Method::PUT, Some(r#"{"name":"Changed","monthly_listeners":1}"#)),
        (Method::DELETE, None),
    ] {
        let (status, json) = app.request_json(method.clone(), "/artist/%FF", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{method}");
        assert_eq!(json["error"], "Invalid artist ID");
    }
    assert_eq!(app.storage.count().await.unwrap(), 1);
}
