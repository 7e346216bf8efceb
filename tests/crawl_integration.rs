//! Integration tests for the lookup client and full crawls.
//!
//! These tests run against a mock lookup endpoint.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use tracau_scrap::words::read_word_list;
use tracau_scrap::{
    CrawlConfig, Crawler, Error, ErrorLog, LookupClient, PhraseMeaning, ResultSet, ResultStore,
    TracauClient, WordListFormat,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn endpoint(server: &MockServer) -> String {
    format!("{}/s/{{word}}/en", server.uri())
}

fn bank_body() -> serde_json::Value {
    let fulltext = concat!(
        r##"<font color="#9e9e9e">[bæŋk]</font>"##,
        r##"<b><font color="#1a76bf">danh từ</font></b>"##,
        r##"<td id="I_C"><font color="#1371BB">▸</font></td><td id="C_C" colspan="2"><font color="#1371BB">bank on</font></td>"##,
        r##"<td id="C_C">tin vào</td>"##,
    );
    json!({
        "sentences": [
            { "fields": { "en": "<em>bank</em>", "vi": "ngân hàng" } },
            { "fields": { "en": "bank account", "vi": "tài khoản ngân hàng" } },
            { "fields": { "en": "I went to the bank.", "vi": "Tôi đã đến ngân hàng." } }
        ],
        "tratu": [{ "fields": { "fulltext": fulltext } }]
    })
}

async fn mount_word(server: &MockServer, word: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/s/{word}/en")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn fast_config() -> CrawlConfig {
    CrawlConfig {
        concurrent_limit: 4,
        batch_size: 10,
        duty_cycle: None,
        save_interval: 1,
        retry_limit: 2,
        retry_delay: Duration::ZERO,
        word_delay: Duration::ZERO,
        batch_pause: Duration::ZERO,
        request_timeout: None,
    }
}

#[tokio::test]
async fn test_fetch_decodes_lookup_body() {
    let server = MockServer::start().await;
    mount_word(&server, "bank", bank_body()).await;

    let client = TracauClient::new(endpoint(&server));
    let response = client.fetch("bank").await.expect("lookup should succeed");

    assert_eq!(response.sentences.len(), 3);
    assert!(response.markup().unwrap().contains("bank on"));
}

#[tokio::test]
async fn test_fetch_encodes_multi_word_queries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/s/bank%20account/en"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sentences": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let client = TracauClient::new(endpoint(&server));
    assert!(client.fetch("bank account").await.is_ok());
}

#[tokio::test]
async fn test_fetch_server_error_is_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = TracauClient::new(endpoint(&server));
    let err = client.fetch("bank").await.unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 503, .. }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_fetch_non_json_body_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>rate limited</html>"))
        .mount(&server)
        .await;

    let client = TracauClient::new(endpoint(&server));
    assert!(matches!(client.fetch("bank").await, Err(Error::Json(_))));
}

#[tokio::test]
async fn test_fetch_unexpected_shape_degrades_to_empty() {
    let server = MockServer::start().await;
    mount_word(&server, "bank", json!(["not", "an", "object"])).await;

    let client = TracauClient::new(endpoint(&server));
    let response = client.fetch("bank").await.expect("shape problems are not errors");
    assert!(response.sentences.is_empty());
    assert!(response.markup().is_none());
}

#[tokio::test]
async fn test_crawl_builds_and_persists_records() {
    let server = MockServer::start().await;
    mount_word(&server, "bank", bank_body()).await;
    mount_word(&server, "shore", json!({ "sentences": [] })).await;
    Mock::given(method("GET"))
        .and(path("/s/broken/en"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let store = ResultStore::new(dir.path().join("data.json"));
    let log = ErrorLog::new(dir.path().join("errors.log"));
    let crawler = Crawler::new(Arc::new(TracauClient::new(endpoint(&server))), fast_config())
        .unwrap()
        .with_store(store.clone())
        .with_error_log(log.clone());

    let words = vec!["bank".to_string(), "broken".to_string(), "shore".to_string()];
    let outcome = crawler.run(&words, ResultSet::new()).await;

    assert_eq!(outcome.stats.processed, 2);
    assert_eq!(outcome.stats.failed, 1);
    assert!(!outcome.results.contains_key("broken"));

    let bank = &outcome.results["bank"];
    assert_eq!(bank.phonetic, "bæŋk");
    assert_eq!(bank.definition.kind, "danh từ");
    assert_eq!(bank.definition.basic_meanings, ["ngân hàng"]);
    assert_eq!(bank.definition.phrases.len(), 2);
    assert_eq!(bank.definition.phrases[0].phrase, "bank account");
    assert_eq!(
        bank.definition.phrases[1].meaning,
        PhraseMeaning::Single("tin vào".into())
    );
    assert_eq!(bank.examples.len(), 1);

    assert_eq!(store.load().await, outcome.results);
    let logged = tokio::fs::read_to_string(log.path()).await.unwrap();
    assert!(logged.contains("\"broken\""));
}

#[tokio::test]
async fn test_crawl_resumes_from_previous_output() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/s/shore/en"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sentences": [] })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/s/bank/en"))
        .respond_with(ResponseTemplate::new(200).set_body_json(bank_body()))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let store = ResultStore::new(dir.path().join("data.json"));
    let mut previous = ResultSet::new();
    previous.insert("bank".into(), tracau_scrap::DictionaryRecord::new("bank"));
    store.save(&previous).await.unwrap();

    let crawler = Crawler::new(Arc::new(TracauClient::new(endpoint(&server))), fast_config())
        .unwrap()
        .with_store(store.clone());
    let existing = store.load().await;
    let words = vec!["bank".to_string(), "shore".to_string()];
    let outcome = crawler.run(&words, existing).await;

    assert_eq!(outcome.stats.skipped, 1);
    assert_eq!(outcome.results.len(), 2);
    assert_eq!(outcome.results["bank"], previous["bank"]);
    assert_eq!(store.load().await.len(), 2);
}

#[tokio::test]
async fn test_json_word_list_reads_in_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("word_list.json");
    tokio::fs::write(&path, r#"["alpha","beta"]"#).await.unwrap();

    let words = read_word_list(&path, WordListFormat::Json).await.unwrap();
    assert_eq!(words, ["alpha", "beta"]);
}
