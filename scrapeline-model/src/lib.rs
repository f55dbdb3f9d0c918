//! Core data model definitions shared across Scrapeline crates.
#![allow(missing_docs)]

pub mod error;
pub mod ids;
pub mod record;
pub mod title;

pub use error::{ModelError, Result as ModelResult};
pub use ids::SourceId;
pub use record::{
    ACTORS_FIELD, Actor, CandidateRecord, IMAGES_FIELD, MergedRecord,
    OVERVIEW_FIELD, TITLE_FIELD,
};
pub use title::SearchTitle;
