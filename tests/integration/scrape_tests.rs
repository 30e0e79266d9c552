//! Integration tests for the scraper
//!
//! These tests use wiremock to serve listing pages and test the full
//! fetch, parse and write cycle end-to-end.

use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tgscout::config::{ConfigLayer, ContentType, RunConfig};
use tgscout::crawler::{run_scrape, Coordinator, FingerprintProvider};
use tgscout::{ConfigError, RunState, ScoutError};
use wiremock::matchers::{header_exists, header_regex, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTING_PATH: &str = "/ratings/channels/news";

/// Creates a configuration without any pacing delay
fn create_test_layer(server: &MockServer, outdir: &Path) -> ConfigLayer {
    ConfigLayer {
        url: Some(format!("{}{}", server.uri(), LISTING_PATH)),
        outdir: Some(outdir.to_path_buf()),
        delay: Some(0.0),
        jitter: Some(0.0),
        retry_floor: Some(0.0),
        max_backoff: Some(0.0),
        max_attempts: Some(3),
        timeout: Some(5.0),
        ..ConfigLayer::default()
    }
}

fn create_test_config(server: &MockServer, outdir: &Path, pages: u32) -> RunConfig {
    RunConfig::try_from(ConfigLayer {
        pages: Some(pages),
        ..create_test_layer(server, outdir)
    })
    .expect("valid test configuration")
}

/// Renders a listing page with one card per (title, count, username)
fn listing_page(entries: &[(&str, &str, &str)]) -> String {
    let cards: String = entries
        .iter()
        .map(|(title, count, username)| {
            format!(
                r#"<div class="card peer-item-row">
                     <a href="/channel/@{username}/stat">
                       <div class="text-truncate font-16">{title}</div>
                     </a>
                     <div class="subscribers">{count}</div>
                     <a href="https://t.me/{username}" class="btn">Open</a>
                   </div>"#
            )
        })
        .collect();

    format!(
        "<html><body><h1>Ratings</h1><div class=\"lists\">{}</div></body></html>",
        cards
    )
}

async fn mount_page(server: &MockServer, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(query_param("page", page.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

fn read_csv(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .expect("CSV file should exist");

    reader
        .records()
        .map(|row| row.unwrap().iter().map(str::to_string).collect())
        .collect()
}

/// Page numbers of the requests received by the server, in order
async fn requested_pages(server: &MockServer) -> Vec<u32> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter_map(|request| {
            request
                .url
                .query_pairs()
                .find(|(key, _)| key == "page")
                .and_then(|(_, value)| value.parse().ok())
        })
        .collect()
}

#[tokio::test]
async fn test_full_scrape_writes_ranked_csv() {
    let server = MockServer::start().await;
    let outdir = TempDir::new().unwrap();

    mount_page(
        &server,
        1,
        listing_page(&[
            ("Новости России", "125 000", "news_russia"),
            ("Tech, Daily", "12.3K", "techdaily"),
        ]),
    )
    .await;
    mount_page(&server, 2, listing_page(&[("Crypto", "1M", "crypto_ch")])).await;

    let report = run_scrape(create_test_config(&server, outdir.path(), 2))
        .await
        .expect("scrape should succeed");

    assert_eq!(report.pages_succeeded, 2);
    assert_eq!(report.records_written, 3);
    assert!(report.is_complete());

    let rows = read_csv(&outdir.path().join("channels.csv"));
    assert_eq!(
        rows,
        vec![
            vec!["title", "subscribers", "link"],
            vec!["Новости России", "125000", "https://t.me/news_russia"],
            vec!["Tech, Daily", "12300", "https://t.me/techdaily"],
            vec!["Crypto", "1000000", "https://t.me/crypto_ch"],
        ]
    );
}

#[tokio::test]
async fn test_pages_fetched_in_order_exactly_once() {
    let server = MockServer::start().await;
    let outdir = TempDir::new().unwrap();

    for page in 1..=4 {
        let username = format!("channel_{}", page);
        let body = listing_page(&[("Channel", "100", username.as_str())]);
        mount_page(&server, page, body).await;
    }

    let report = run_scrape(create_test_config(&server, outdir.path(), 4))
        .await
        .unwrap();

    assert_eq!(requested_pages(&server).await, vec![1, 2, 3, 4]);
    assert_eq!(report.requests_sent, 4);
    assert_eq!(report.records_written, 4);
}

#[tokio::test]
async fn test_self_check_fetches_one_page() {
    let server = MockServer::start().await;
    let outdir = TempDir::new().unwrap();

    let body = listing_page(&[("A", "1", "alpha")]);
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;

    let config = RunConfig::try_from(ConfigLayer {
        pages: Some(25),
        self_check: Some(true),
        ..create_test_layer(&server, outdir.path())
    })
    .unwrap();

    let report = run_scrape(config).await.unwrap();

    assert_eq!(report.pages_requested, 1);
    assert_eq!(requested_pages(&server).await, vec![1]);
}

#[tokio::test]
async fn test_rate_limited_page_is_skipped_after_max_attempts() {
    let server = MockServer::start().await;
    let outdir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;
    mount_page(&server, 2, listing_page(&[("Survivor", "77", "survivor")])).await;

    let report = run_scrape(create_test_config(&server, outdir.path(), 2))
        .await
        .expect("a rate-limited page must not abort the run");

    assert_eq!(report.failed_pages, vec![1]);
    assert_eq!(report.pages_succeeded, 1);
    assert_eq!(report.requests_sent, 4);
    assert_eq!(requested_pages(&server).await, vec![1, 1, 1, 2]);

    let rows = read_csv(&outdir.path().join("channels.csv"));
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1], vec!["Survivor", "77", "https://t.me/survivor"]);
}

#[tokio::test]
async fn test_recovers_after_transient_failures() {
    let server = MockServer::start().await;
    let outdir = TempDir::new().unwrap();

    // First two attempts fail, the third succeeds
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(503).insert_header("retry-after", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, 1, listing_page(&[("Back", "5 000", "back_again")])).await;

    let report = run_scrape(create_test_config(&server, outdir.path(), 1))
        .await
        .unwrap();

    assert_eq!(report.requests_sent, 3);
    assert_eq!(report.records_written, 1);
    assert!(report.is_complete());
}

#[tokio::test]
async fn test_timeout_is_retried() {
    let server = MockServer::start().await;
    let outdir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_page(&[("Slow", "1", "slow_one")]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    mount_page(&server, 2, listing_page(&[("Fast", "2", "fast_one")])).await;

    let config = RunConfig::try_from(ConfigLayer {
        pages: Some(2),
        timeout: Some(0.3),
        max_attempts: Some(2),
        ..create_test_layer(&server, outdir.path())
    })
    .unwrap();

    let report = run_scrape(config).await.unwrap();

    assert_eq!(report.failed_pages, vec![1]);
    assert_eq!(report.requests_sent, 3);
    assert_eq!(report.records_written, 1);
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let server = MockServer::start().await;
    let outdir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let report = run_scrape(create_test_config(&server, outdir.path(), 1))
        .await
        .unwrap();

    assert_eq!(report.failed_pages, vec![1]);
    assert_eq!(report.records_written, 0);

    // Header-only file
    assert_eq!(read_csv(&outdir.path().join("channels.csv")).len(), 1);
}

#[tokio::test]
async fn test_page_without_listing_is_not_retried() {
    let server = MockServer::start().await;
    let outdir = TempDir::new().unwrap();

    let challenge = "<html><body>Проверка браузера</body></html>";
    mount_page(&server, 1, challenge.to_string()).await;
    mount_page(&server, 2, listing_page(&[("Real", "10", "real_one")])).await;

    let report = run_scrape(create_test_config(&server, outdir.path(), 2))
        .await
        .unwrap();

    assert_eq!(report.requests_sent, 2);
    assert_eq!(report.failed_pages, vec![1]);
    assert_eq!(report.records_written, 1);
}

#[tokio::test]
async fn test_duplicate_links_across_pages() {
    let server = MockServer::start().await;
    let outdir = TempDir::new().unwrap();

    let first = listing_page(&[("A", "3", "alpha"), ("B", "2", "bravo")]);
    let second = listing_page(&[("B", "2", "bravo"), ("C", "1", "charlie")]);
    mount_page(&server, 1, first).await;
    mount_page(&server, 2, second).await;

    let report = run_scrape(create_test_config(&server, outdir.path(), 2))
        .await
        .unwrap();

    assert_eq!(report.records_written, 3);
    assert_eq!(report.duplicates_dropped, 1);

    let links: Vec<String> = read_csv(&outdir.path().join("channels.csv"))
        .into_iter()
        .skip(1)
        .map(|row| row[2].clone())
        .collect();
    assert_eq!(
        links,
        [
            "https://t.me/alpha",
            "https://t.me/bravo",
            "https://t.me/charlie",
        ]
    );
}

#[tokio::test]
async fn test_unknown_category_makes_no_request() {
    let server = MockServer::start().await;
    let outdir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = RunConfig::try_from(ConfigLayer {
        url: None,
        category: Some("astrology-memes".to_string()),
        base_url: Some(server.uri()),
        ..create_test_layer(&server, outdir.path())
    })
    .unwrap();

    let result = run_scrape(config).await;

    assert!(matches!(
        result,
        Err(ScoutError::Config(ConfigError::UnknownCategory(_)))
    ));
    assert!(requested_pages(&server).await.is_empty());
    assert!(!outdir.path().join("channels.csv").exists());
}

#[tokio::test]
async fn test_category_resolves_against_base_url() {
    let server = MockServer::start().await;
    let outdir = TempDir::new().unwrap();

    let body = r#"<div class="peer-item-row" data-username="rust_chat">
                    <div class="text-truncate font-16">Rust Chat</div>
                    <div class="members">1 234 members</div>
                  </div>"#;
    Mock::given(method("GET"))
        .and(path("/ratings/chats/tech"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;

    let config = RunConfig::try_from(ConfigLayer {
        url: None,
        category: Some("tech".to_string()),
        content_type: Some(ContentType::Chats),
        base_url: Some(server.uri()),
        ..create_test_layer(&server, outdir.path())
    })
    .unwrap();

    let mut coordinator = Coordinator::new(config, FingerprintProvider::with_seed(5)).unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(coordinator.state(), RunState::Done);
    assert_eq!(report.output_path, outdir.path().join("chats.csv"));
    assert_eq!(
        read_csv(&report.output_path)[1],
        vec!["Rust Chat", "1234", "https://t.me/rust_chat"]
    );
}

#[tokio::test]
async fn test_category_keeps_base_url_path() {
    let server = MockServer::start().await;
    let outdir = TempDir::new().unwrap();

    let body = listing_page(&[("Match", "7", "match_tv")]);
    Mock::given(method("GET"))
        .and(path("/en/ratings/channels/sport"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;

    let config = RunConfig::try_from(ConfigLayer {
        url: None,
        category: Some("sport".to_string()),
        base_url: Some(format!("{}/en", server.uri())),
        ..create_test_layer(&server, outdir.path())
    })
    .unwrap();

    let report = run_scrape(config).await.unwrap();

    assert!(report.listing_url.ends_with("/en/ratings/channels/sport"));
    assert_eq!(report.records_written, 1);
}

#[tokio::test]
async fn test_rerun_overwrites_previous_csv() {
    let server = MockServer::start().await;
    let outdir = TempDir::new().unwrap();
    let csv_path = outdir.path().join("channels.csv");
    let stale = "title,subscribers,link\nstale,1,https://t.me/stale_one\n";
    fs::write(&csv_path, stale).unwrap();

    mount_page(&server, 1, listing_page(&[("Fresh", "9", "fresh_one")])).await;

    run_scrape(create_test_config(&server, outdir.path(), 1))
        .await
        .unwrap();

    let content = fs::read_to_string(&csv_path).unwrap();
    assert!(!content.contains("stale"));
    assert!(content.contains("https://t.me/fresh_one"));
}

#[tokio::test]
async fn test_browser_headers_are_sent() {
    let server = MockServer::start().await;
    let outdir = TempDir::new().unwrap();

    // Comma-free values, since the mock server splits header values on commas
    let fingerprints = FingerprintProvider::with_seed(5)
        .with_user_agents(vec!["Mozilla/5.0 (X11; Linux x86_64) Firefox/125.0".to_string()])
        .with_accept_language("ru-RU");
    let body = listing_page(&[("A", "1", "alpha")]);

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(header_regex("user-agent", r"^Mozilla/5\.0 \(X11"))
        .and(header_regex("accept-language", "^ru-RU$"))
        .and(header_regex("sec-fetch-mode", "^navigate$"))
        .and(header_exists("accept"))
        .and(header_exists("upgrade-insecure-requests"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server, outdir.path(), 1);
    let mut coordinator = Coordinator::new(config, fingerprints).unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.records_written, 1);
    assert_eq!(report.failed_pages, Vec::<u32>::new());
}
