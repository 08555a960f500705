//! Integration tests for the harvester
//!
//! These tests use wiremock to serve a small directory over HTTP and run the
//! full crawl cycle end-to-end through the public service interface.

use firm_harvest::config::{Config, DirectoryConfig, FetcherConfig};
use firm_harvest::output::XLSX_CONTENT_TYPE;
use firm_harvest::{CrawlPhase, HarvestError, Harvester, Record};
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, timeout_ms: u64) -> Config {
    Config {
        directory: DirectoryConfig {
            base_url: base_url.to_string(),
            ..DirectoryConfig::default()
        },
        fetcher: FetcherConfig {
            timeout_ms,
            ..FetcherConfig::default()
        },
        ..Config::default()
    }
}

fn listing_body(links: &[&str], pagination: &str) -> String {
    let items: String = links
        .iter()
        .map(|href| format!(r#"<li><a href="{}">View</a></li>"#, href))
        .collect();
    format!(
        r#"<html><body><div id="results"><ul class="search-results">{}</ul>{}</div></body></html>"#,
        items, pagination
    )
}

fn detail_body(name: &str, website: &str) -> String {
    format!(
        r#"<html><body><h1>{}</h1>
        <dl class="title-list">
            <dt>Address</dt><dd>1 High Street, London</dd>
            <dt>Website</dt><dd>{}</dd>
            <dt>Email address</dt><dd>info@example.com</dd>
        </dl></body></html>"#,
        name, website
    )
}

async fn mount_listing(server: &MockServer, page: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("page", page))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

async fn mount_detail(server: &MockServer, route: &str, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(template.insert_header("content-type", "text/html"))
        .mount(server)
        .await;
}

fn messages(harvester: &Harvester) -> Vec<String> {
    harvester
        .log_since(0)
        .into_iter()
        .map(|entry| entry.message)
        .collect()
}

#[tokio::test]
async fn test_full_crawl_across_two_pages() {
    let mock_server = MockServer::start().await;

    mount_listing(
        &mock_server,
        "1",
        listing_body(
            &["/firms/alpha"],
            r#"<ul class="pagination"><li class="current">1</li><li>2</li></ul>"#,
        ),
    )
    .await;
    mount_listing(
        &mock_server,
        "2",
        listing_body(
            &["/firms/beta"],
            r#"<ul class="pagination"><li>1</li><li class="current">2</li></ul>"#,
        ),
    )
    .await;
    mount_detail(
        &mock_server,
        "/firms/alpha",
        ResponseTemplate::new(200).set_body_string(detail_body("Alpha LLP", "www.alpha.test")),
    )
    .await;
    mount_detail(
        &mock_server,
        "/firms/beta",
        ResponseTemplate::new(200).set_body_string(detail_body("Beta & Co", "www.beta.test")),
    )
    .await;

    let harvester = Harvester::new(create_test_config(&mock_server.uri(), 5_000));
    harvester.start_crawl().expect("Failed to start crawl");

    assert_eq!(harvester.join().await, CrawlPhase::Complete);
    assert_eq!(
        messages(&harvester),
        vec![
            "scraping page 1",
            "scraped firm: Alpha LLP",
            "scraping page 2",
            "scraped firm: Beta & Co",
            "scraping complete",
        ]
    );

    let records = harvester.state().records();
    assert_eq!(
        records[0],
        Record {
            name: "Alpha LLP".to_string(),
            address: Some("1 High Street, London".to_string()),
            website: Some("www.alpha.test".to_string()),
            email: Some("info@example.com".to_string()),
        }
    );
    assert_eq!(records[1].name, "Beta & Co");

    let progress = harvester.progress();
    assert_eq!(progress.current_page, 2);
    assert_eq!(progress.record_count, 2);

    let artifact = harvester.artifact().expect("Report should be available");
    assert_eq!(artifact.filename, "firms.xlsx");
    assert_eq!(artifact.content_type, XLSX_CONTENT_TYPE);
    assert!(artifact.bytes.starts_with(b"PK"));
}

#[tokio::test]
async fn test_slow_detail_page_is_skipped() {
    let mock_server = MockServer::start().await;

    mount_listing(
        &mock_server,
        "1",
        listing_body(&["/firms/slow", "/firms/fast"], ""),
    )
    .await;
    mount_detail(
        &mock_server,
        "/firms/slow",
        ResponseTemplate::new(200)
            .set_body_string(detail_body("Slow Ltd", "www.slow.test"))
            .set_delay(Duration::from_secs(3)),
    )
    .await;
    mount_detail(
        &mock_server,
        "/firms/fast",
        ResponseTemplate::new(200).set_body_string(detail_body("Fast Ltd", "www.fast.test")),
    )
    .await;

    let harvester = Harvester::new(create_test_config(&mock_server.uri(), 300));
    harvester.start_crawl().expect("Failed to start crawl");

    assert_eq!(harvester.join().await, CrawlPhase::Complete);

    let log = messages(&harvester);
    let slow_url = format!("{}/firms/slow", mock_server.uri());
    assert_eq!(log[1], format!("error scraping firm at {}, skipping", slow_url));
    assert_eq!(log[2], "scraped firm: Fast Ltd");

    let records = harvester.state().records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "Fast Ltd");
}

#[tokio::test]
async fn test_detail_without_marker_is_skipped() {
    let mock_server = MockServer::start().await;

    mount_listing(&mock_server, "1", listing_body(&["/firms/moved"], "")).await;
    mount_detail(
        &mock_server,
        "/firms/moved",
        ResponseTemplate::new(200).set_body_string("<html><body><h1>Moved</h1></body></html>"),
    )
    .await;

    let harvester = Harvester::new(create_test_config(&mock_server.uri(), 5_000));
    harvester.start_crawl().expect("Failed to start crawl");

    assert_eq!(harvester.join().await, CrawlPhase::Complete);
    assert!(harvester.state().records().is_empty());
    assert!(messages(&harvester).iter().any(|m| {
        m.starts_with("error scraping firm at ") && m.ends_with("/firms/moved, skipping")
    }));

    // An empty report is still produced
    assert!(harvester.artifact().is_ok());
}

#[tokio::test]
async fn test_listing_server_error_fails_crawl() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let harvester = Harvester::new(create_test_config(&mock_server.uri(), 5_000));
    harvester.start_crawl().expect("Failed to start crawl");

    assert_eq!(harvester.join().await, CrawlPhase::Failed);

    let log = messages(&harvester);
    assert_eq!(log[0], "scraping page 1");
    assert!(log[1].starts_with("error loading page 1"));
    assert!(!log.iter().any(|m| m == "scraping complete"));
    assert!(matches!(harvester.artifact(), Err(HarvestError::NotReady)));
}

#[tokio::test]
async fn test_requests_carry_identification_and_viewport() {
    let mock_server = MockServer::start().await;

    // Only requests with the configured identification get a listing back
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(header("user-agent", "firm-harvest-test/1.0"))
        .and(header("sec-ch-viewport-width", "1280"))
        .and(header("sec-ch-viewport-height", "720"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_body(&[], ""))
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), 5_000);
    config.fetcher.user_agent = "firm-harvest-test/1.0".to_string();

    let harvester = Harvester::new(config);
    harvester.start_crawl().expect("Failed to start crawl");

    assert_eq!(harvester.join().await, CrawlPhase::Complete);
    assert_eq!(
        messages(&harvester),
        vec!["scraping page 1", "scraping complete"]
    );
}

#[tokio::test]
async fn test_page_limit_completes_with_partial_report() {
    let mock_server = MockServer::start().await;

    mount_listing(
        &mock_server,
        "1",
        listing_body(
            &["/firms/alpha"],
            r#"<ul class="pagination"><li class="current">1</li><li>2</li></ul>"#,
        ),
    )
    .await;
    mount_detail(
        &mock_server,
        "/firms/alpha",
        ResponseTemplate::new(200).set_body_string(detail_body("Alpha LLP", "www.alpha.test")),
    )
    .await;

    let mut config = create_test_config(&mock_server.uri(), 5_000);
    config.limits.max_pages = Some(1);

    let harvester = Harvester::new(config);
    harvester.start_crawl().expect("Failed to start crawl");

    assert_eq!(harvester.join().await, CrawlPhase::Complete);

    let log = messages(&harvester);
    assert!(log.contains(&"stopping early: page limit of 1 reached".to_string()));
    assert_eq!(log.last().map(String::as_str), Some("scraping complete"));
    assert_eq!(harvester.state().records().len(), 1);
    assert!(harvester.artifact().is_ok());
}
