use std::sync::Arc;

use photo_search::app::App;
use photo_search::clock::ManualClock;
use photo_search::feed::HttpFeedGateway;
use photo_search::orchestrator::{SearchPhase, LOAD_FAILED_MESSAGE};
use photo_search::rate_limiter::MAX_REQ_IN_WINDOW;
use photo_search::store::MemoryStore;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn feed_body(count: usize) -> serde_json::Value {
    let items: Vec<_> = (1..=count)
        .map(|i| {
            serde_json::json!({
                "title": format!("Photo {}", i),
                "link": format!("https://example.com/{}", i),
                "author": format!("author {}", i),
                "media": { "m": format!("https://example.com/img/{}.jpg", i) }
            })
        })
        .collect();
    serde_json::json!({ "items": items })
}

fn app_for(server: &MockServer) -> App {
    let gateway = HttpFeedGateway::new(format!("{}/feed", server.uri()), reqwest::Client::new());
    App::with_clock(
        Arc::new(gateway),
        Arc::new(MemoryStore::new()),
        Arc::new(ManualClock::new(0)),
    )
}

#[tokio::test]
async fn startup_fetches_default_query_and_slices_first_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .and(query_param("tags", "nature"))
        .respond_with(ResponseTemplate::new(200).set_body_json(feed_body(25)))
        .expect(1)
        .mount(&server)
        .await;

    let mut app = app_for(&server);
    let startup = app.start();
    app.search.execute(startup).await;

    let state = app.search.state();
    assert_eq!(state.result_items.len(), 12);
    assert_eq!(state.total_result_count, 25);
    assert_eq!(state.result_items[0].title, "Photo 1");
    assert_eq!(app.search.phase(), SearchPhase::Ready);
}

#[tokio::test]
async fn submit_issues_exactly_one_fetch_for_new_tag() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("tags", "nature"))
        .respond_with(ResponseTemplate::new(200).set_body_json(feed_body(25)))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("tags", "cats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(feed_body(5)))
        .expect(1)
        .mount(&server)
        .await;

    let mut app = app_for(&server);
    let startup = app.start();
    app.search.execute(startup).await;

    let next = app.search.go_to_page(1).unwrap();
    app.search.execute(next).await;
    assert_eq!(app.search.state().current_page, 2);
    assert_eq!(app.search.state().result_items[0].title, "Photo 13");

    let request = app.search.submit("cats").unwrap();
    app.search.execute(request).await;

    let state = app.search.state();
    assert_eq!(state.current_page, 1);
    assert_eq!(state.active_query, "cats");
    assert_eq!(state.total_result_count, 5);
    assert_eq!(app.search.history().terms(), ["cats"]);
}

#[tokio::test]
async fn upstream_failure_leaves_clean_failed_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut app = app_for(&server);
    let startup = app.start();
    app.search.execute(startup).await;

    let state = app.search.state();
    assert!(state.result_items.is_empty());
    assert_eq!(state.total_result_count, 0);
    assert_eq!(state.error_message, LOAD_FAILED_MESSAGE);
    assert!(!state.is_loading);
    assert_eq!(app.search.phase(), SearchPhase::Failed);
}

#[tokio::test]
async fn burst_of_searches_is_throttled_without_fetching() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(feed_body(3)))
        .expect(1 + MAX_REQ_IN_WINDOW as u64)
        .mount(&server)
        .await;

    let mut app = app_for(&server);
    let startup = app.start();
    app.search.execute(startup).await;

    for i in 0..=MAX_REQ_IN_WINDOW {
        if let Some(request) = app.search.submit(&format!("tag{}", i)) {
            app.search.execute(request).await;
        }
    }

    let state = app.search.state();
    assert_eq!(state.active_query, format!("tag{}", MAX_REQ_IN_WINDOW - 1));
    assert_eq!(
        state.error_message,
        "Too many requests. Wait ~20 seconds and try again."
    );
}
