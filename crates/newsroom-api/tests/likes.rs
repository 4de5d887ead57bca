mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn toggle_alternates_and_reports_count() {
    let app = TestApp::new();
    let (_, author) = app.user("author");
    let (_, reader) = app.user("reader");
    let sports = app.category("sports", "sports").await;
    app.article(&author, "Derby day", sports["id"].as_i64()).await;

    let (status, first) = app.post("/news/derby-day/like/", Some(&reader), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, json!({ "liked": true, "likes_count": 1 }));

    let (status, second) = app.post("/news/derby-day/like", Some(&reader), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second, json!({ "liked": false, "likes_count": 0 }));
}

#[tokio::test]
async fn toggle_state_follows_parity() {
    let app = TestApp::new();
    let (_, author) = app.user("author");
    let (_, reader) = app.user("reader");
    app.article(&author, "Odd one out", None).await;

    // Another reader's like stays put while ours flips
    app.post("/news/odd-one-out/like/", Some(&author), json!({})).await;

    let mut last = json!(null);
    for _ in 0..5 {
        let (status, body) = app.post("/news/odd-one-out/like/", Some(&reader), json!({})).await;
        assert_eq!(status, StatusCode::OK);
        last = body;
    }
    assert_eq!(last, json!({ "liked": true, "likes_count": 2 }));

    let (_, article) = app.get("/news/odd-one-out/", None).await;
    assert_eq!(article["likes_count"], 2);
}

#[tokio::test]
async fn toggle_requires_auth_and_existing_article() {
    let app = TestApp::new();
    let (_, author) = app.user("author");
    app.article(&author, "Members only", None).await;

    let (status, body) = app.post("/news/members-only/like/", None, json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Authentication credentials were not provided.");

    let (status, _) = app.post("/news/missing/like/", Some(&author), json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn generic_likes_require_auth() {
    let app = TestApp::new();
    let (status, _) = app.get("/likes/", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.get("/likes/1/", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_belongs_to_caller_and_rejects_duplicates() {
    let app = TestApp::new();
    let (author_id, author) = app.user("author");
    let (reader_id, reader) = app.user("reader");
    let article = app.article(&author, "Weather warning", None).await;

    let (status, like) = app
        .post(
            "/likes/",
            Some(&reader),
            json!({ "news": article["id"], "user": author_id }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{like}");
    assert_eq!(like["user"], reader_id);
    assert_eq!(like["news"], article["id"]);
    assert_eq!(like["is_liked"], true);

    let (status, errors) = app
        .post("/likes/", Some(&reader), json!({ "news": article["id"] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        errors["non_field_errors"][0],
        "The fields user, news must make a unique set."
    );

    let (status, errors) = app.post("/likes/", Some(&reader), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(errors["news"][0], "This field is required.");
}

#[tokio::test]
async fn update_and_delete_like() {
    let app = TestApp::new();
    let (_, author) = app.user("author");
    let (_, reader) = app.user("reader");
    let article = app.article(&author, "Transit strike", None).await;

    let (_, like) = app
        .post("/likes/", Some(&reader), json!({ "news": article["id"] }))
        .await;
    let uri = format!("/likes/{}/", like["id"]);

    let (status, patched) = app
        .request("PATCH", &uri, Some(&author), Some(json!({ "is_liked": false })))
        .await;
    assert_eq!(status, StatusCode::OK, "{patched}");
    assert_eq!(patched["is_liked"], false);
    assert_eq!(patched["news"], article["id"]);

    // Inactive rows don't count towards the article's likes
    let (_, fetched) = app.get("/news/transit-strike/", None).await;
    assert_eq!(fetched["likes_count"], 0);

    let (status, errors) = app
        .request("PUT", &uri, Some(&reader), Some(json!({ "is_liked": true })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(errors["news"][0], "This field is required.");

    let (status, replaced) = app
        .request("PUT", &uri, Some(&reader), Some(json!({ "news": article["id"] })))
        .await;
    assert_eq!(status, StatusCode::OK, "{replaced}");
    assert_eq!(replaced["is_liked"], true);

    let (status, _) = app.request("DELETE", &uri, Some(&reader), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&uri, Some(&reader)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
