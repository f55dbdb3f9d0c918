use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use mockito::{Matcher, Server};
use scrapeline_config::{DataSourceEndpoint, ScraperSettings};
use scrapeline_core::{
    DataSourceClient, DiskTranslationCache, HttpDataSourceClient,
    MetadataScraper, ProviderRegistry, RetryPolicy, ScrapeError, SourceError,
    TranslationClient, TranslationError,
    translation::providers::ChatCompletionProvider,
};
use scrapeline_model::{CandidateRecord, SearchTitle, SourceId};
use serde_json::json;
use tokio_util::sync::CancellationToken;

fn endpoint(id: &str, url_template: String) -> DataSourceEndpoint {
    DataSourceEndpoint {
        id: id.to_string(),
        url_template,
        timeout_secs: 5,
    }
}

fn scraper_settings(sources: &[&str]) -> ScraperSettings {
    ScraperSettings {
        enabled_data_sources: sources.iter().map(|s| s.to_string()).collect(),
        ..ScraperSettings::default()
    }
}

fn chat_reply(content: &str) -> String {
    json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] })
        .to_string()
}

#[tokio::test]
async fn scrapes_merges_and_translates_over_http() {
    let mut sources = Server::new_async().await;
    let _a = sources
        .mock("GET", "/a/Example%20Title")
        .with_status(200)
        .with_body(r#"{"Title":"Example Title","Images":["x","y"]}"#)
        .create_async()
        .await;
    let _b = sources
        .mock("GET", "/b/Example%20Title")
        .with_status(200)
        .with_body(
            r#"{"Title":"Example Title","Overview":"A thief...","Images":["y","z"],"Year":2010}"#,
        )
        .create_async()
        .await;

    let mut llm = Server::new_async().await;
    let _title = llm
        .mock("POST", "/chat")
        .match_body(Matcher::Regex("Example Title".into()))
        .with_status(200)
        .with_body(chat_reply("示例标题"))
        .create_async()
        .await;
    let _overview = llm
        .mock("POST", "/chat")
        .match_body(Matcher::Regex("A thief".into()))
        .with_status(200)
        .with_body(chat_reply("一个小偷……"))
        .create_async()
        .await;

    let http = reqwest::Client::new();
    let source_client = HttpDataSourceClient::new(
        http.clone(),
        [
            endpoint("A", format!("{}/a/{{title}}", sources.url())),
            endpoint("B", format!("{}/b/{{title}}", sources.url())),
        ],
    );
    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(ChatCompletionProvider::new(
        "deepseek",
        format!("{}/chat", llm.url()),
        "deepseek-chat",
        "sk-test",
        http,
    )));
    let translator = Arc::new(TranslationClient::new(registry, "deepseek"));

    let scraper = MetadataScraper::new(
        &scraper_settings(&["A", "B"]),
        Arc::new(source_client),
    )
    .unwrap()
    .with_translation(translator, "zh-CN");

    let merged = scraper
        .scrape_by_file_name("/library/Example Title.mkv", &CancellationToken::new())
        .await
        .unwrap()
        .expect("both sources match");

    assert_eq!(merged.title(), Some("示例标题"));
    assert_eq!(merged.overview(), Some("一个小偷……"));
    assert_eq!(
        serde_json::to_value(&merged).unwrap(),
        json!({
            "Title": "示例标题",
            "Overview": "一个小偷……",
            "Images": ["x", "y", "z"],
            "Year": 2010,
        })
    );
}

#[tokio::test]
async fn translation_failure_fails_the_scrape() {
    let mut sources = Server::new_async().await;
    let _a = sources
        .mock("GET", "/Heat")
        .with_status(200)
        .with_body(r#"{"Title":"Heat","Overview":"Cops and robbers"}"#)
        .create_async()
        .await;
    let mut llm = Server::new_async().await;
    let failing = llm
        .mock("POST", "/")
        .with_status(500)
        .with_body("upstream exploded")
        .expect_at_least(2)
        .create_async()
        .await;

    let http = reqwest::Client::new();
    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(ChatCompletionProvider::new(
        "deepseek",
        llm.url(),
        "deepseek-chat",
        "sk-test",
        http.clone(),
    )));
    let translator = TranslationClient::new(registry, "deepseek")
        .with_retry_policy(RetryPolicy::new(2, Duration::from_millis(10)));

    let scraper = MetadataScraper::new(
        &scraper_settings(&["A"]),
        Arc::new(HttpDataSourceClient::new(
            http,
            [endpoint("A", format!("{}/{{title}}", sources.url()))],
        )),
    )
    .unwrap()
    .with_translation(Arc::new(translator), "zh-CN");

    let err = scraper
        .scrape_by_file_name("Heat.mkv", &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ScrapeError::Translation(TranslationError::Exhausted { attempts: 2, .. })
    ));
    failing.assert_async().await;
}

/// Answers after a per-source delay so completion order differs from
/// configured order.
#[derive(Debug)]
struct DelayedSources;

#[async_trait]
impl DataSourceClient for DelayedSources {
    async fn fetch_metadata(
        &self,
        source: &SourceId,
        title: &SearchTitle,
    ) -> Result<CandidateRecord, SourceError> {
        let (delay, overview) = match source.as_str() {
            "slow" => (Duration::from_secs(5), "from slow"),
            "fast" => (Duration::from_millis(10), "from fast"),
            other => return Err(SourceError::UnknownSource(other.to_string())),
        };
        tokio::time::sleep(delay).await;
        Ok(CandidateRecord::with_title(title.as_str()).overview(overview))
    }
}

#[tokio::test(start_paused = true)]
async fn merge_precedence_follows_configuration_not_completion() {
    let scraper = MetadataScraper::new(
        &scraper_settings(&["slow", "fast", "missing"]),
        Arc::new(DelayedSources),
    )
    .unwrap();

    let merged = scraper
        .scrape_by_file_name("Alien.mkv", &CancellationToken::new())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(merged.overview(), Some("from slow"));
    assert_eq!(
        merged.sources(),
        &[SourceId::new("slow").unwrap(), SourceId::new("fast").unwrap()]
    );
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_outstanding_fetches() {
    let scraper =
        MetadataScraper::new(&scraper_settings(&["slow"]), Arc::new(DelayedSources))
            .unwrap();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let err = scraper
        .scrape_by_file_name("Alien.mkv", &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, ScrapeError::Cancelled));
}

#[tokio::test]
async fn disk_cache_survives_a_new_client() {
    let dir = tempfile::tempdir().unwrap();
    let mut llm = Server::new_async().await;
    let once = llm
        .mock("POST", "/")
        .with_status(200)
        .with_body(chat_reply("你好"))
        .expect(1)
        .create_async()
        .await;

    let build = || {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(ChatCompletionProvider::new(
            "deepseek",
            llm.url(),
            "deepseek-chat",
            "sk-test",
            reqwest::Client::new(),
        )));
        TranslationClient::new(registry, "deepseek")
            .with_cache(Arc::new(DiskTranslationCache::new(dir.path())))
    };
    let cancel = CancellationToken::new();

    let first = build().translate("Hello", "zh-CN", &cancel).await.unwrap();
    let second = build().translate("Hello", "zh-CN", &cancel).await.unwrap();

    assert_eq!(first, "你好");
    assert_eq!(second, "你好");
    once.assert_async().await;
}
