use axum::http::StatusCode;
use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use image::{DynamicImage, GenericImageView, ImageBuffer, ImageFormat, Rgb};
use serde_json::Value;
use std::collections::HashSet;
use tempfile::TempDir;
use wasabi::{Config, create_app, store::formats};

fn create_test_config(temp_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.storage.content_directory = temp_dir.path().join("out");
    config.database.url = format!("sqlite://{}", temp_dir.path().join("test.db").display());
    config.feed.default_page_size = 3;
    config
}

async fn setup_server(config: Config) -> TestServer {
    let app = create_app(config).await.unwrap();
    TestServer::new(app).unwrap()
}

fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 50u8])
    });
    formats::encode(&DynamicImage::ImageRgb8(img), ImageFormat::Jpeg, 90).unwrap()
}

/// Upload one image and return `(id, hash)`.
async fn upload(server: &TestServer, workspace: &str, tags: &str) -> (i64, u64) {
    let form = MultipartForm::new()
        .add_text("workspace", workspace)
        .add_text("tags", tags)
        .add_part(
            "file",
            Part::bytes(jpeg(1200, 800))
                .file_name("photo.jpg")
                .mime_type("image/jpeg"),
        );
    let report: Value = server.post("/image").multipart(form).await.json();
    let created = &report["created"][0];
    (created["id"].as_i64().unwrap(), created["hash"].as_u64().unwrap())
}

#[tokio::test]
async fn test_comment_twice_keeps_submission_order() {
    let temp_dir = TempDir::new().unwrap();
    let server = setup_server(create_test_config(&temp_dir)).await;
    let (id, _) = upload(&server, "w1", "").await;

    let first: Value = server
        .post(&format!("/{}/comment", id))
        .form(&[("text", "nice!")])
        .await
        .json();
    assert_eq!(first["comments"].as_array().unwrap().len(), 1);

    let response = server
        .post(&format!("/{}/comment", id))
        .form(&[("text", "nice!")])
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    let comments = body["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 2);
    for comment in comments {
        assert_eq!(comment["text"], "nice!");
        assert_eq!(comment["author"], "User");
        assert!(comment["date"].as_i64().unwrap() > 0);
    }
    assert!(comments[0]["date"].as_i64() <= comments[1]["date"].as_i64());

    let record: Value = server.get(&format!("/json/{}", id)).await.json();
    assert_eq!(record["comments"], body["comments"]);
}

#[tokio::test]
async fn test_comment_validation() {
    let temp_dir = TempDir::new().unwrap();
    let server = setup_server(create_test_config(&temp_dir)).await;
    let (id, _) = upload(&server, "w1", "").await;

    let blank = server
        .post(&format!("/{}/comment", id))
        .form(&[("text", "   ")])
        .await;
    assert_eq!(blank.status_code(), StatusCode::BAD_REQUEST);

    let unknown = server.post("/9999/comment").form(&[("text", "hi")]).await;
    assert_eq!(unknown.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_like_and_share_counters() {
    let temp_dir = TempDir::new().unwrap();
    let server = setup_server(create_test_config(&temp_dir)).await;
    let (id, _) = upload(&server, "w1", "").await;

    let first: Value = server.post(&format!("/{}/like", id)).await.json();
    assert_eq!(first, serde_json::json!({ "likes": 1 }));
    let second: Value = server.post(&format!("/{}/like", id)).await.json();
    assert_eq!(second["likes"], 2);

    let shared: Value = server.post(&format!("/{}/share", id)).await.json();
    assert_eq!(shared, serde_json::json!({ "shares": 1 }));

    let record: Value = server.get(&format!("/json/{}", id)).await.json();
    assert_eq!(record["likes"], 2);
    assert_eq!(record["shares"], 1);

    assert_eq!(
        server.post("/424242/like").await.status_code(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        server.post("/424242/share").await.status_code(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        server.post("/abc/like").await.status_code(),
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_record_lookup_errors() {
    let temp_dir = TempDir::new().unwrap();
    let server = setup_server(create_test_config(&temp_dir)).await;

    assert_eq!(server.get("/json/12345").await.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(server.get("/json/twelve").await.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_thumbnail_is_generated_then_cached() {
    let temp_dir = TempDir::new().unwrap();
    let server = setup_server(create_test_config(&temp_dir)).await;
    let (_, hash) = upload(&server, "w1", "").await;

    let first = server.get(&format!("/thumbnail/{}", hash)).await;
    assert_eq!(first.status_code(), StatusCode::OK);
    assert_eq!(
        first.headers().get("content-type").unwrap().to_str().unwrap(),
        "image/jpeg"
    );
    let thumbnail = image::load_from_memory(first.as_bytes()).unwrap();
    assert_eq!(thumbnail.dimensions(), (600, 400));

    let cache = temp_dir.path().join("out").join(format!("{}.thumb.jpg", hash));
    assert!(cache.is_file());

    let second = server.get(&format!("/thumbnail/{}", hash)).await;
    assert_eq!(second.as_bytes(), first.as_bytes());
}

#[tokio::test]
async fn test_thumbnail_without_output_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let server = setup_server(create_test_config(&temp_dir)).await;

    assert_eq!(
        server.get("/thumbnail/987654").await.status_code(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        server.get("/thumbnail/not-a-hash").await.status_code(),
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_list_pagination_and_tag_filter() {
    let temp_dir = TempDir::new().unwrap();
    let server = setup_server(create_test_config(&temp_dir)).await;

    let mut ids = Vec::new();
    for i in 0..5 {
        let tags = if i % 2 == 0 { "cats, dogs" } else { "dogs" };
        ids.push(upload(&server, "w1", tags).await.0);
    }
    upload(&server, "w2", "cats").await;

    let first: Vec<Value> = server.get("/list?workspace=w1").await.json();
    assert_eq!(first.len(), 3);
    assert_eq!(first[0]["id"].as_i64().unwrap(), ids[4]);

    let mut seen = HashSet::new();
    let mut offset = 0;
    loop {
        let page: Vec<Value> = server
            .get(&format!("/list?workspace=w1&limit=2&offset={}", offset))
            .await
            .json();
        if page.is_empty() {
            break;
        }
        offset += page.len();
        for record in page {
            assert!(seen.insert(record["id"].as_i64().unwrap()));
        }
    }
    assert_eq!(seen.len(), 5);

    let cats: Vec<Value> = server.get("/list?workspace=w1&tag=cats&limit=10").await.json();
    assert_eq!(cats.len(), 3);

    let recent: Vec<Value> = server
        .get("/list?workspace=w1&sort=recent&limit=10")
        .await
        .json();
    assert_eq!(recent.len(), 5);

    let tags: Vec<String> = server.get("/tags?workspace=w1").await.json();
    assert_eq!(tags, vec!["cats", "dogs"]);
}

#[tokio::test]
async fn test_delete_keeps_files_by_default() {
    let temp_dir = TempDir::new().unwrap();
    let server = setup_server(create_test_config(&temp_dir)).await;
    let (id, hash) = upload(&server, "w1", "").await;

    let response = server.delete(&format!("/{}", id)).await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);
    assert_eq!(
        server.get(&format!("/json/{}", id)).await.status_code(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        server.delete(&format!("/{}", id)).await.status_code(),
        StatusCode::NOT_FOUND
    );

    let output = temp_dir.path().join("out").join(format!("{}.out.jpg", hash));
    assert!(output.is_file());
}

#[tokio::test]
async fn test_cascade_delete_removes_artifacts() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = create_test_config(&temp_dir);
    config.storage.cascade_delete = true;
    let server = setup_server(config).await;
    let (id, hash) = upload(&server, "w1", "").await;
    server.get(&format!("/thumbnail/{}", hash)).await;

    server.delete(&format!("/{}", id)).await;

    let out_dir = temp_dir.path().join("out");
    assert!(!out_dir.join(format!("{}.in.jpg", hash)).exists());
    assert!(!out_dir.join(format!("{}.out.jpg", hash)).exists());
    assert!(!out_dir.join(format!("{}.thumb.jpg", hash)).exists());
}

#[tokio::test]
async fn test_filters_and_stats_endpoints() {
    let temp_dir = TempDir::new().unwrap();
    let server = setup_server(create_test_config(&temp_dir)).await;
    upload(&server, "a", "").await;
    upload(&server, "a", "").await;
    upload(&server, "b", "").await;

    let filters: Vec<String> = server.get("/filters").await.json();
    assert!(filters.contains(&"grayscale".to_string()));
    let mut sorted = filters.clone();
    sorted.sort();
    assert_eq!(filters, sorted);

    let stats: Value = server.get("/stats").await.json();
    assert_eq!(stats, serde_json::json!({ "a": 2, "b": 1 }));
}

#[tokio::test]
async fn test_artifact_route_rejects_foreign_names() {
    let temp_dir = TempDir::new().unwrap();
    let server = setup_server(create_test_config(&temp_dir)).await;
    std::fs::write(temp_dir.path().join("out").join("notes.txt"), b"secret").unwrap();

    assert_eq!(server.get("/out/notes.txt").await.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(server.get("/out/1.out.jpg").await.status_code(), StatusCode::NOT_FOUND);
}
