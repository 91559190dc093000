use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use intel_harness::http_store::HttpRecordStore;
use intel_harness_core::csv_record::parse_line;
use intel_harness_core::filter::{DateOp, FilterClause, Operator, TextOp};
use intel_harness_core::models::SearchRequest;
use intel_harness_core::registry::EntityType;
use intel_harness_core::store::{RecordStore, StoreError};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Default)]
struct Seen {
    posts: Arc<Mutex<Vec<Value>>>,
    queries: Arc<Mutex<Vec<String>>>,
}

async fn create_post(State(seen): State<Seen>, Json(body): Json<Value>) -> impl IntoResponse {
    seen.posts.lock().unwrap().push(body.clone());
    if body["title"] == "reject" {
        return (StatusCode::BAD_REQUEST, "title rejected").into_response();
    }
    (StatusCode::CREATED, Json(json!({ "id": 7, "title": body["title"] }))).into_response()
}

async fn search(State(seen): State<Seen>, RawQuery(raw): RawQuery) -> Json<Value> {
    seen.queries.lock().unwrap().push(raw.unwrap_or_default());
    Json(json!({
        "telegram": [{ "name": "leaks", "author": "x" }],
        "forum-posts": [{ "id": "p1", "title": "Zero Day Sale" }],
    }))
}

async fn forums() -> Json<Value> {
    Json(json!([
        { "id": 1, "name": "Breach Forum" },
        { "id": "b2", "name": "XSS" },
        { "name": "no id" },
    ]))
}

async fn start_mock() -> (String, Seen) {
    let seen = Seen::default();
    let app = Router::new()
        .route("/forum-posts/", post(create_post))
        .route("/search", get(search))
        .route("/forums", get(forums))
        .with_state(seen.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), seen)
}

fn store(base: &str) -> HttpRecordStore {
    HttpRecordStore::new(base, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn create_post_sends_payload_and_reads_id() {
    let (base, seen) = start_mock().await;
    let payload = parse_line(
        r#"http://x.com,"My Title",alice,"Hello, world",news,"[{""author"":""bob""}]",1,2024-05-20T10:00:00+0000"#,
        "forum-1",
    )
    .unwrap();

    let created = store(&base).create_post(&payload).await.unwrap();
    assert_eq!(created.id.as_deref(), Some("7"));

    let posts = seen.posts.lock().unwrap();
    assert_eq!(posts[0]["forum_id"], "forum-1");
    assert_eq!(posts[0]["comments"], json!([{ "author": "bob" }]));
    assert_eq!(posts[0]["date"], "2024-05-20T10:00:00+00:00");
}

#[tokio::test]
async fn rejection_carries_status_and_detail() {
    let (base, _seen) = start_mock().await;
    let payload = parse_line("u,reject,a,c,cat,[],0,2024-01-01", "f").unwrap();

    let err = store(&base).create_post(&payload).await.unwrap_err();
    assert_eq!(
        err,
        StoreError::Rejected {
            status: 400,
            detail: "title rejected".to_string()
        }
    );
}

#[tokio::test]
async fn unreachable_store_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let payload = parse_line("u,t,a,c,cat,[],0,2024-01-01", "f").unwrap();
    let err = store(&format!("http://{}", addr))
        .create_post(&payload)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Transport(_)), "{err:?}");
}

#[tokio::test]
async fn search_encodes_request_and_keeps_entity_order() {
    let (base, seen) = start_mock().await;
    let mut request = SearchRequest::new("zero day");
    request.scopes = vec![EntityType::ForumPosts, EntityType::Telegram];
    request.filters = vec![
        FilterClause::new(1, "title", Operator::Text(TextOp::StartsWith), "zero"),
        FilterClause::new(2, "date", Operator::Date(DateOp::After), "2024-01-01T00:00:00Z"),
        FilterClause::new(3, "", Operator::Text(TextOp::Contains), "inert"),
    ];

    let results = store(&base).search(&request).await.unwrap();
    let entities: Vec<&str> = results.entities().map(|e| e.as_str()).collect();
    assert_eq!(entities, vec!["telegram", "forum-posts"]);

    let queries = seen.queries.lock().unwrap();
    assert_eq!(
        queries[0],
        "query=zero+day&entity=forum-posts%2Ctelegram\
         &filter=title:startsWith:zero&filter=date:after:2024-01-01"
    );
}

#[tokio::test]
async fn list_forums_accepts_numeric_ids() {
    let (base, _seen) = start_mock().await;
    let forums = store(&base).list_forums().await.unwrap();
    let ids: Vec<&str> = forums.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "b2"]);
    assert_eq!(forums[0].name, "Breach Forum");
}
