use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::ids::SourceId;

pub const TITLE_FIELD: &str = "Title";
pub const OVERVIEW_FIELD: &str = "Overview";
pub const ACTORS_FIELD: &str = "Actors";
pub const IMAGES_FIELD: &str = "Images";

/// Actor descriptor as reported by a data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Actor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Actor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: None,
            image_url: None,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Key used to detect the same person reported by two sources.
    fn dedup_key(&self) -> String {
        self.name.trim().to_lowercase()
    }
}

/// Raw metadata returned by one data source for one search title.
///
/// Recognized fields use the fixed names `Title`, `Overview`, `Actors` and
/// `Images`; anything else a source returns lands in [`extra`] untouched.
///
/// [`extra`]: CandidateRecord::extra
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    #[serde(rename = "Title", default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        rename = "Overview",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub overview: Option<String>,
    #[serde(rename = "Actors", default, skip_serializing_if = "Option::is_none")]
    pub actors: Option<Vec<Actor>>,
    #[serde(rename = "Images", default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl CandidateRecord {
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn overview(mut self, overview: impl Into<String>) -> Self {
        self.overview = Some(overview.into());
        self
    }

    pub fn images<I, S>(mut self, images: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.images = Some(images.into_iter().map(Into::into).collect());
        self
    }

    pub fn actors(mut self, actors: Vec<Actor>) -> Self {
        self.actors = Some(actors);
        self
    }
}

/// The single reconciled record produced from all accepted candidates.
///
/// Invariants:
/// - a scalar (`Title`, `Overview`, any extra key) is set by the first
///   candidate that carries it and is never overwritten by a later one;
/// - `Actors` and `Images` only grow, deduplicated, in precedence order.
///
/// The only post-merge mutation is [`MergedRecord::with_translated`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedRecord {
    #[serde(rename = "Title", skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(rename = "Overview", skip_serializing_if = "Option::is_none")]
    overview: Option<String>,
    #[serde(rename = "Actors", skip_serializing_if = "Option::is_none")]
    actors: Option<Vec<Actor>>,
    #[serde(rename = "Images", skip_serializing_if = "Option::is_none")]
    images: Option<Vec<String>>,
    #[serde(flatten)]
    extra: BTreeMap<String, serde_json::Value>,
    #[serde(skip)]
    sources: Vec<SourceId>,
}

impl MergedRecord {
    /// Start a merge from the highest-precedence accepted candidate.
    pub fn seed(source: SourceId, candidate: CandidateRecord) -> Self {
        let mut merged = Self {
            title: None,
            overview: None,
            actors: None,
            images: None,
            extra: BTreeMap::new(),
            sources: Vec::new(),
        };
        merged.absorb(source, candidate);
        merged
    }

    /// Fold a lower-precedence candidate into the record.
    pub fn absorb(&mut self, source: SourceId, candidate: CandidateRecord) {
        let CandidateRecord {
            title,
            overview,
            actors,
            images,
            extra,
        } = candidate;

        if self.title.is_none() {
            self.title = title;
        }
        if self.overview.is_none() {
            self.overview = overview;
        }

        if let Some(images) = images {
            let merged = self.images.get_or_insert_with(Vec::new);
            let mut seen: HashSet<String> = merged.iter().cloned().collect();
            for image in images {
                if seen.insert(image.clone()) {
                    merged.push(image);
                }
            }
        }

        if let Some(actors) = actors {
            let merged = self.actors.get_or_insert_with(Vec::new);
            let mut seen: HashSet<String> =
                merged.iter().map(Actor::dedup_key).collect();
            for actor in actors {
                if seen.insert(actor.dedup_key()) {
                    merged.push(actor);
                }
            }
        }

        for (key, value) in extra {
            self.extra.entry(key).or_insert(value);
        }

        if !self.sources.contains(&source) {
            self.sources.push(source);
        }
    }

    /// Replace the translatable fields. Fields absent from the merged
    /// record stay absent.
    pub fn with_translated(
        mut self,
        title: Option<String>,
        overview: Option<String>,
    ) -> Self {
        if self.title.is_some() {
            self.title = title;
        }
        if self.overview.is_some() {
            self.overview = overview;
        }
        self
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn overview(&self) -> Option<&str> {
        self.overview.as_deref()
    }

    pub fn actors(&self) -> Option<&[Actor]> {
        self.actors.as_deref()
    }

    pub fn images(&self) -> Option<&[String]> {
        self.images.as_deref()
    }

    pub fn extra(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.extra
    }

    pub fn sources(&self) -> &[SourceId] {
        &self.sources
    }
}
