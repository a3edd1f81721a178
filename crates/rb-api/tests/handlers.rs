use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::Utc;
use rb_api::{configure_routes, middleware, AppState};
use rb_core::models::{Counter, NewPost, Post, PostId};
use rb_core::traits::{MockMediaStore, MockPostRepo};
use tower::ServiceExt;

const BOUNDARY: &str = "rusty-board-boundary";

fn post(id: PostId, parent: Option<PostId>, content: &str) -> Post {
    NewPost {
        content: content.into(),
        parent,
        ..Default::default()
    }
    .into_post(id, Utc::now())
}

fn media() -> MockMediaStore {
    let mut media = MockMediaStore::new();
    media.expect_get_url().returning(|id| format!("/u/{id}"));
    media.expect_get_thumbnail_url().returning(|id| format!("/u/thumb_{id}"));
    media
}

fn app(repo: MockPostRepo, media: MockMediaStore) -> Router {
    middleware::apply(configure_routes(Arc::new(AppState {
        repo: Box::new(repo),
        store: Box::new(media),
        max_upload_bytes: 1024,
        board_title: "Rusty-Board".into(),
    })))
}

fn multipart(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Body {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((content_type, data)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"pic\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    Body::from(body)
}

fn form_request(uri: &str, body: Body) -> Request<Body> {
    Request::post(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(body)
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

#[tokio::test]
async fn index_lists_threads_with_classified_lines() {
    let mut repo = MockPostRepo::new();
    repo.expect_list_posts().times(1).returning(|| {
        Ok(vec![
            post(1, None, "first thread\n>be me"),
            post(2, Some(1), ">>1\nbased"),
        ])
    });

    let response = app(repo, media())
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    let html = body_text(response).await;
    assert!(html.contains("id=\"p1\""));
    assert!(html.contains("id=\"p2\""));
    assert!(html.contains("class=\"greentext\""));
    assert!(html.contains("href=\"#p1\""));
}

#[tokio::test]
async fn api_threads_returns_grouping() {
    let mut repo = MockPostRepo::new();
    repo.expect_list_posts().returning(|| {
        Ok(vec![
            post(1, None, "a"),
            post(2, Some(1), "b"),
            post(3, None, "c"),
            post(4, Some(1), "d"),
        ])
    });

    let response = app(repo, media())
        .oneshot(Request::get("/api/threads").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json, serde_json::json!({ "1": [2, 4], "3": [] }));
}

#[tokio::test]
async fn api_post_includes_lines() {
    let mut repo = MockPostRepo::new();
    repo.expect_get_post()
        .withf(|id| *id == 2)
        .returning(|_| Ok(Some(post(2, Some(1), "> 1\n>mfw"))));

    let response = app(repo, media())
        .oneshot(Request::get("/api/posts/2").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["id"], 2);
    assert_eq!(json["parent"], 1);
    assert_eq!(json["lines"][0]["kind"], "reference");
    assert_eq!(json["lines"][0]["reference"], 1);
    assert_eq!(json["lines"][1]["kind"], "greentext");
}

#[tokio::test]
async fn reply_form_for_unknown_post_is_not_found() {
    let mut repo = MockPostRepo::new();
    repo.expect_get_post().returning(|_| Ok(None));

    let response = app(repo, media())
        .oneshot(Request::get("/reply/5").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reply_form_renders_target() {
    let mut repo = MockPostRepo::new();
    repo.expect_get_post().returning(|id| Ok(Some(post(id, None, "op"))));

    let response = app(repo, media())
        .oneshot(Request::get("/reply/5").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("action=\"/reply/5\""));
}

#[tokio::test]
async fn new_post_creates_thread() {
    let mut repo = MockPostRepo::new();
    repo.expect_allocate_post_id().times(1).returning(|| Ok(10));
    repo.expect_create_post()
        .withf(|p| {
            p.id == 10
                && p.parent.is_none()
                && p.title.as_deref() == Some("Based Post")
                && p.content == "allo\n>>3"
                && p.tags == vec!["based".to_string(), "entrepreneur".to_string()]
                && p.image.is_none()
        })
        .times(1)
        .returning(|_| Ok(()));

    let body = multipart(
        &[
            ("title", "Based Post"),
            ("content", "allo\n>>3"),
            ("tags", "based, Entrepreneur"),
        ],
        None,
    );
    let response = app(repo, media())
        .oneshot(form_request("/new-post", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn new_post_with_image_stores_upload() {
    let mut repo = MockPostRepo::new();
    repo.expect_allocate_post_id().returning(|| Ok(11));
    repo.expect_create_post()
        .withf(|p| p.id == 11 && p.image.as_deref() == Some("cafe.png"))
        .times(1)
        .returning(|_| Ok(()));

    let mut store = media();
    store
        .expect_save_upload()
        .withf(|data, content_type| data.as_slice() == b"PNGDATA" && content_type.to_string() == "image/png")
        .times(1)
        .returning(|_, _| Ok("cafe.png".to_string()));

    let body = multipart(&[("content", "pic related")], Some(("image/png", &b"PNGDATA"[..])));
    let response = app(repo, store)
        .oneshot(form_request("/new-post", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn failed_persistence_after_upload_is_internal_error() {
    let mut repo = MockPostRepo::new();
    repo.expect_allocate_post_id().returning(|| Ok(12));
    repo.expect_create_post()
        .times(1)
        .returning(|_| Err(anyhow::anyhow!("disk full")));

    let mut store = media();
    store
        .expect_save_upload()
        .times(1)
        .returning(|_, _| Ok("cafe.png".to_string()));

    let body = multipart(&[("content", "pic related")], Some(("image/png", &b"PNGDATA"[..])));
    let response = app(repo, store)
        .oneshot(form_request("/new-post", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body_text(response).await.contains("disk full"));
}

#[tokio::test]
async fn blank_content_is_rejected() {
    // No expectations: touching the repo would panic the handler.
    let repo = MockPostRepo::new();

    let body = multipart(&[("content", "   ")], None);
    let response = app(repo, media())
        .oneshot(form_request("/new-post", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_image_attachment_is_rejected() {
    let repo = MockPostRepo::new();

    let body = multipart(&[("content", "hi")], Some(("text/html", &b"<p>"[..])));
    let response = app(repo, media())
        .oneshot(form_request("/new-post", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reply_sets_parent() {
    let mut repo = MockPostRepo::new();
    repo.expect_get_post()
        .withf(|id| *id == 1)
        .returning(|_| Ok(Some(post(1, None, "op"))));
    repo.expect_allocate_post_id().returning(|| Ok(2));
    repo.expect_create_post()
        .withf(|p| p.id == 2 && p.parent == Some(1) && p.title.is_none())
        .times(1)
        .returning(|_| Ok(()));

    let body = multipart(&[("content", ">>1\nthis")], None);
    let response = app(repo, media())
        .oneshot(form_request("/reply/1", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn reply_to_unknown_post_is_not_found() {
    let mut repo = MockPostRepo::new();
    repo.expect_get_post().returning(|_| Ok(None));

    let body = multipart(&[("content", "hello?")], None);
    let response = app(repo, media())
        .oneshot(form_request("/reply/404", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upvote_and_report() {
    let mut repo = MockPostRepo::new();
    repo.expect_increment_counter()
        .withf(|id, counter| *id == 1 && *counter == Counter::Upvotes)
        .times(1)
        .returning(|_, _| Ok(true));
    repo.expect_increment_counter()
        .withf(|id, counter| *id == 1 && *counter == Counter::Reports)
        .times(1)
        .returning(|_, _| Ok(true));
    let app = app(repo, media());

    for action in ["upvote", "report"] {
        let response = app
            .clone()
            .oneshot(
                Request::post(format!("/post/1/{action}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
}

#[tokio::test]
async fn counter_on_missing_post_or_unknown_action() {
    let mut repo = MockPostRepo::new();
    repo.expect_increment_counter().returning(|_, _| Ok(false));
    let app = app(repo, media());

    for uri in ["/post/9/downvote", "/post/1/explode"] {
        let response = app
            .clone()
            .oneshot(Request::post(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn storage_failure_is_internal_error() {
    let mut repo = MockPostRepo::new();
    repo.expect_list_posts()
        .returning(|| Err(anyhow::anyhow!("database is locked")));

    let response = app(repo, media())
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body_text(response).await.contains("locked"));
}
