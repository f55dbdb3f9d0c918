//! The scrape pipeline: parse, fetch, score, merge, translate.

mod filename;
mod merge;
mod similarity;

use std::{path::Path, sync::Arc};

use futures::{StreamExt, stream::FuturesUnordered};
use scrapeline_config::ScraperSettings;
use scrapeline_model::{CandidateRecord, MergedRecord, SearchTitle, SourceId};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    error::ScrapeError, sources::DataSourceClient,
    translation::TranslationClient,
};

pub use filename::FileNameParser;
pub use merge::merge_candidates;
pub use similarity::similarity;

#[derive(Debug, Clone)]
struct TranslationStage {
    client: Arc<TranslationClient>,
    target_language: String,
}

/// Produces one merged record per media file.
///
/// Source order in the settings is merge precedence. Sources are queried
/// concurrently but their results are always merged in that order, so the
/// output does not depend on response timing.
pub struct MetadataScraper {
    parser: FileNameParser,
    enabled_sources: Vec<SourceId>,
    threshold: f64,
    sources: Arc<dyn DataSourceClient>,
    translation: Option<TranslationStage>,
}

impl std::fmt::Debug for MetadataScraper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataScraper")
            .field("parser", &self.parser)
            .field("enabled_sources", &self.enabled_sources)
            .field("threshold", &self.threshold)
            .field("translation", &self.translation)
            .finish_non_exhaustive()
    }
}

impl MetadataScraper {
    pub fn new(
        settings: &ScraperSettings,
        sources: Arc<dyn DataSourceClient>,
    ) -> Result<Self, ScrapeError> {
        let parser = FileNameParser::new(&settings.file_name_regex)?;
        let enabled_sources = settings
            .enabled_data_sources
            .iter()
            .map(|id| {
                SourceId::new(id.trim()).map_err(|_| {
                    ScrapeError::InvalidConfig(
                        "enabled data source ids must not be blank".into(),
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            parser,
            enabled_sources,
            threshold: settings.match_similarity_threshold,
            sources,
            translation: None,
        })
    }

    /// Translate `Title` and `Overview` of every merged record.
    pub fn with_translation(
        mut self,
        client: Arc<TranslationClient>,
        target_language: impl Into<String>,
    ) -> Self {
        self.translation = Some(TranslationStage {
            client,
            target_language: target_language.into(),
        });
        self
    }

    pub fn parser(&self) -> &FileNameParser {
        &self.parser
    }

    pub fn enabled_sources(&self) -> &[SourceId] {
        &self.enabled_sources
    }

    /// Scrape metadata for the media file at `file_path`.
    ///
    /// `Ok(None)` means no enabled source produced a candidate at or above
    /// the similarity threshold.
    pub async fn scrape_by_file_name<P: AsRef<Path>>(
        &self,
        file_path: P,
        cancel: &CancellationToken,
    ) -> Result<Option<MergedRecord>, ScrapeError> {
        let title = self.parser.parse(file_path.as_ref())?;
        info!("Scraping metadata for '{}'", title);

        let accepted = self.fetch_accepted(&title, cancel).await?;
        let Some(merged) = merge_candidates(accepted) else {
            info!("No source matched '{}'", title);
            return Ok(None);
        };

        debug!(
            "Merged '{}' from {} source(s)",
            title,
            merged.sources().len()
        );

        match &self.translation {
            Some(stage) => self.translate(stage, merged, cancel).await.map(Some),
            None => Ok(Some(merged)),
        }
    }

    /// Query every enabled source and keep, in source order, the candidates
    /// whose title clears the threshold.
    async fn fetch_accepted(
        &self,
        title: &SearchTitle,
        cancel: &CancellationToken,
    ) -> Result<Vec<(SourceId, CandidateRecord)>, ScrapeError> {
        let mut pending: FuturesUnordered<_> = self
            .enabled_sources
            .iter()
            .enumerate()
            .map(|(index, source)| async move {
                (index, source, self.sources.fetch_metadata(source, title).await)
            })
            .collect();

        let collect = async {
            let mut results = Vec::with_capacity(self.enabled_sources.len());
            while let Some(result) = pending.next().await {
                results.push(result);
            }
            results
        };

        let mut results = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ScrapeError::Cancelled),
            results = collect => results,
        };
        results.sort_by_key(|(index, _, _)| *index);

        let mut accepted = Vec::new();
        for (_, source, result) in results {
            let candidate = match result {
                Ok(candidate) => candidate,
                Err(err) => {
                    warn!("Data source {} failed for '{}': {}", source, title, err);
                    continue;
                }
            };

            let Some(candidate_title) = candidate.title.as_deref() else {
                debug!("Data source {} returned no title; skipping", source);
                continue;
            };

            let score = similarity(title.as_str(), candidate_title);
            if score >= self.threshold {
                debug!(
                    "Accepted {} candidate '{}' (score {:.3})",
                    source, candidate_title, score
                );
                accepted.push((source.clone(), candidate));
            } else {
                debug!(
                    "Rejected {} candidate '{}' (score {:.3} < {:.3})",
                    source, candidate_title, score, self.threshold
                );
            }
        }

        Ok(accepted)
    }

    async fn translate(
        &self,
        stage: &TranslationStage,
        merged: MergedRecord,
        cancel: &CancellationToken,
    ) -> Result<MergedRecord, ScrapeError> {
        let translate_field = move |text: Option<&str>| {
            let text = text.map(str::to_owned);
            async move {
                match text {
                    Some(text) => stage
                        .client
                        .translate(&text, &stage.target_language, cancel)
                        .await
                        .map(Some),
                    None => Ok(None),
                }
            }
        };

        let (title, overview) = tokio::try_join!(
            translate_field(merged.title()),
            translate_field(merged.overview()),
        )?;

        Ok(merged.with_translated(title, overview))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::SourceError,
        sources::MockDataSourceClient,
        translation::{ProviderError, ProviderRegistry, TranslationProvider},
    };
    use async_trait::async_trait;
    use mockall::predicate::always;
    use scrapeline_config::constants::DEFAULT_FILE_NAME_REGEX;

    fn settings(sources: &[&str]) -> ScraperSettings {
        ScraperSettings {
            file_name_regex: DEFAULT_FILE_NAME_REGEX.to_string(),
            enabled_data_sources: sources.iter().map(|s| s.to_string()).collect(),
            ..ScraperSettings::default()
        }
    }

    #[derive(Debug)]
    struct Upper;

    #[async_trait]
    impl TranslationProvider for Upper {
        fn id(&self) -> &str {
            "upper"
        }

        async fn translate(
            &self,
            text: &str,
            _target_language: &str,
        ) -> Result<String, ProviderError> {
            Ok(text.to_uppercase())
        }
    }

    #[tokio::test]
    async fn merges_sources_in_configured_order() {
        let mut client = MockDataSourceClient::new();
        client
            .expect_fetch_metadata()
            .with(always(), always())
            .returning(|source, title| match source.as_str() {
                "A" => Ok(CandidateRecord::with_title(title.as_str()).images(["x", "y"])),
                _ => Ok(CandidateRecord::with_title(title.as_str())
                    .overview("A thief...")
                    .images(["y", "z"])),
            });

        let scraper =
            MetadataScraper::new(&settings(&["A", "B"]), Arc::new(client)).unwrap();
        let merged = scraper
            .scrape_by_file_name("Inception.mkv", &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(merged.title(), Some("Inception"));
        assert_eq!(merged.overview(), Some("A thief..."));
        assert_eq!(merged.images().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn below_threshold_candidates_are_dropped() {
        let mut client = MockDataSourceClient::new();
        client
            .expect_fetch_metadata()
            .returning(|_, _| Ok(CandidateRecord::with_title("Totally Different")));

        let scraper =
            MetadataScraper::new(&settings(&["A"]), Arc::new(client)).unwrap();
        let result = scraper
            .scrape_by_file_name("Inception.mkv", &CancellationToken::new())
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn candidate_without_title_never_matches() {
        let mut settings = settings(&["A"]);
        settings.match_similarity_threshold = 0.0;
        let mut client = MockDataSourceClient::new();
        client
            .expect_fetch_metadata()
            .returning(|_, _| Ok(CandidateRecord::default().overview("orphan")));

        let scraper = MetadataScraper::new(&settings, Arc::new(client)).unwrap();
        let result = scraper
            .scrape_by_file_name("Inception.mkv", &CancellationToken::new())
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn failing_source_is_skipped() {
        let mut client = MockDataSourceClient::new();
        client.expect_fetch_metadata().returning(|source, title| {
            if source.as_str() == "A" {
                Err(SourceError::Other("connection reset".into()))
            } else {
                Ok(CandidateRecord::with_title(title.as_str()).overview("from B"))
            }
        });

        let scraper =
            MetadataScraper::new(&settings(&["A", "B"]), Arc::new(client)).unwrap();
        let merged = scraper
            .scrape_by_file_name("Heat.mkv", &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(merged.overview(), Some("from B"));
        assert_eq!(merged.sources().len(), 1);
    }

    #[tokio::test]
    async fn no_enabled_sources_yields_none() {
        let client = MockDataSourceClient::new();
        let scraper = MetadataScraper::new(&settings(&[]), Arc::new(client)).unwrap();
        let result = scraper
            .scrape_by_file_name("Heat.mkv", &CancellationToken::new())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn unparseable_name_is_invalid_input() {
        let client = MockDataSourceClient::new();
        let scraper = MetadataScraper::new(&settings(&["A"]), Arc::new(client)).unwrap();
        let err = scraper
            .scrape_by_file_name("README", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidInput(_)));
    }

    #[test]
    fn blank_source_id_is_invalid_config() {
        let client = MockDataSourceClient::new();
        let err = MetadataScraper::new(&settings(&["A", "  "]), Arc::new(client))
            .unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn translates_title_and_overview_only() {
        let mut client = MockDataSourceClient::new();
        client.expect_fetch_metadata().returning(|_, title| {
            Ok(CandidateRecord::with_title(title.as_str())
                .overview("a heist")
                .images(["poster.jpg"]))
        });
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(Upper));
        let translator = Arc::new(TranslationClient::new(registry, "upper"));

        let scraper = MetadataScraper::new(&settings(&["A"]), Arc::new(client))
            .unwrap()
            .with_translation(translator, "en");
        let merged = scraper
            .scrape_by_file_name("Heat.mkv", &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(merged.title(), Some("HEAT"));
        assert_eq!(merged.overview(), Some("A HEIST"));
        assert_eq!(merged.images().unwrap(), &["poster.jpg".to_string()]);
    }

    #[tokio::test]
    async fn cancelled_scrape_reports_cancelled() {
        let mut client = MockDataSourceClient::new();
        client
            .expect_fetch_metadata()
            .returning(|_, title| Ok(CandidateRecord::with_title(title.as_str())));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let scraper = MetadataScraper::new(&settings(&["A"]), Arc::new(client)).unwrap();
        let err = scraper
            .scrape_by_file_name("Heat.mkv", &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, ScrapeError::Cancelled));
    }
}
