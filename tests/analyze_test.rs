//! End-to-end analysis tests: orchestrator, HTTP client and mocked endpoint.

mod common;

use std::sync::Mutex;

use argus::config::{DigestConfig, LlmConfig};
use argus::llm::{HttpChatClient, LlmSettings, Sleeper, analyze_commits};
use argus::report::render_report;
use async_trait::async_trait;
use chrono::NaiveDate;
use common::{commit, repo_context};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Records requested waits without sleeping.
#[derive(Default)]
struct NoWait {
    delays: Mutex<Vec<u64>>,
}

#[async_trait]
impl Sleeper for NoWait {
    async fn sleep(&self, secs: u64) {
        self.delays.lock().unwrap().push(secs);
    }
}

fn client_for(server: &MockServer) -> HttpChatClient {
    let settings = LlmSettings {
        base_url: format!("{}/chat", server.uri()),
        api_key: "k".to_string(),
        model: "m".to_string(),
    };
    HttpChatClient::new(settings, &LlmConfig::default()).unwrap()
}

#[tokio::test]
async fn test_always_failing_endpoint_yields_error_records() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(6)
        .mount(&server)
        .await;

    let commits = vec![commit("1111111aaaa", "feat: one"), commit("2222222bbbb", "fix: two")];
    let sleeper = NoWait::default();
    let config = DigestConfig::default();

    let records = analyze_commits(&commits, None, &client_for(&server), &sleeper, &config).await;

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].commit.hash, "1111111aaaa");
    assert_eq!(records[1].commit.hash, "2222222bbbb");
    for record in &records {
        assert!(record.analysis.is_none());
        let error = record.error.as_deref().unwrap();
        assert!(error.contains("after 3 attempts"));
        assert!(error.contains("500"));
    }
    // Fast failures retry after the fast delay; no wait after the last attempt
    assert_eq!(*sleeper.delays.lock().unwrap(), vec![5, 5, 5, 5]);
}

#[tokio::test]
async fn test_level_selects_prompt_depth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_string_contains("🔴 High"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "deep analysis" } }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "brief analysis" } }]
        })))
        .mount(&server)
        .await;

    let mut wide = common::CommitBuilder::new("3333333cccc", "feat: new scheduler");
    for i in 0..6 {
        wide = wide.file(&format!("sched/part{}.py", i), 120, 0);
    }
    let commits = vec![wide.build(), commit("4444444dddd", "chore: tidy")];
    let sleeper = NoWait::default();

    let records = analyze_commits(
        &commits,
        Some(&repo_context()),
        &client_for(&server),
        &sleeper,
        &DigestConfig::default(),
    )
    .await;

    assert_eq!(records[0].analysis.as_deref(), Some("deep analysis"));
    assert_eq!(records[1].analysis.as_deref(), Some("brief analysis"));
}

#[tokio::test]
async fn test_failed_analysis_is_rendered_with_notice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let commits = vec![commit("5555555eeee", "fix: crash on empty batch")];
    let mut config = DigestConfig::default();
    config.rate_limit.retry.max_attempts = 1;

    let records = analyze_commits(
        &commits,
        None,
        &client_for(&server),
        &NoWait::default(),
        &config,
    )
    .await;
    let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let doc = render_report(&repo_context(), date, &commits, Some(records.as_slice()), &config.format);

    assert!(doc.contains("Analysis failed"));
    assert!(doc.contains("_No analysis available._"));
    assert!(doc.contains("failed"));
}
