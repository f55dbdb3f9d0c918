use std::path::Path;

use regex::Regex;
use scrapeline_config::{
    constants::TITLE_CAPTURE_GROUP, validation::check_file_name_regex,
};
use scrapeline_model::SearchTitle;
use tracing::debug;

use crate::error::ScrapeError;

/// Extracts a search title from a media file name with a configurable
/// pattern.
///
/// The pattern must expose a named group `title`; both `(?<title>...)` and
/// `(?P<title>...)` spellings are accepted. Only the file name component
/// of the path is matched, never the parent directories.
#[derive(Debug, Clone)]
pub struct FileNameParser {
    pattern: Regex,
}

impl FileNameParser {
    pub fn new(pattern: &str) -> Result<Self, ScrapeError> {
        let pattern = check_file_name_regex(pattern)?;
        Ok(Self { pattern })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Parse the title out of `file_path`.
    pub fn parse<P: AsRef<Path>>(
        &self,
        file_path: P,
    ) -> Result<SearchTitle, ScrapeError> {
        let file_path = file_path.as_ref();
        let file_name = file_path
            .file_name()
            .ok_or_else(|| {
                ScrapeError::InvalidInput(format!(
                    "path '{}' has no file name",
                    file_path.display()
                ))
            })?
            .to_str()
            .ok_or_else(|| {
                ScrapeError::InvalidInput(format!(
                    "file name of '{}' is not valid UTF-8",
                    file_path.display()
                ))
            })?;

        let captures = self.pattern.captures(file_name).ok_or_else(|| {
            ScrapeError::InvalidInput(format!(
                "file name '{file_name}' does not match pattern '{}'",
                self.pattern.as_str()
            ))
        })?;

        let raw = captures
            .name(TITLE_CAPTURE_GROUP)
            .map(|m| m.as_str())
            .unwrap_or_default();

        let title = SearchTitle::new(raw).map_err(|_| {
            ScrapeError::InvalidInput(format!(
                "file name '{file_name}' produced an empty title"
            ))
        })?;

        debug!("Parsed search title '{}' from '{}'", title, file_name);
        Ok(title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrapeline_config::constants::DEFAULT_FILE_NAME_REGEX;

    fn default_parser() -> FileNameParser {
        FileNameParser::new(DEFAULT_FILE_NAME_REGEX).unwrap()
    }

    #[test]
    fn default_pattern_strips_extension() {
        let title = default_parser().parse("Example Title.mkv").unwrap();
        assert_eq!(title.as_str(), "Example Title");
    }

    #[test]
    fn only_the_last_extension_is_removed() {
        let title = default_parser().parse("Alien.Director.Cut.mp4").unwrap();
        assert_eq!(title.as_str(), "Alien.Director.Cut");
    }

    #[test]
    fn directories_are_ignored() {
        let title = default_parser()
            .parse("/media/movies/Heat (1995)/Heat.mkv")
            .unwrap();
        assert_eq!(title.as_str(), "Heat");
    }

    #[test]
    fn file_without_extension_does_not_match() {
        let err = default_parser().parse("README").unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidInput(_)));
    }

    #[test]
    fn empty_capture_is_invalid_input() {
        let parser = FileNameParser::new(r"^(?<title>\d*)-.+$").unwrap();
        let err = parser.parse("-trailer.mkv").unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidInput(msg) if msg.contains("empty title")));
    }

    #[test]
    fn python_style_group_is_accepted() {
        let parser = FileNameParser::new(r"^(?P<title>.+?)\s\(\d{4}\)").unwrap();
        let title = parser.parse("Heat (1995).mkv").unwrap();
        assert_eq!(title.as_str(), "Heat");
    }

    #[test]
    fn pattern_without_title_group_is_rejected() {
        let err = FileNameParser::new(r"(.+)\.\w+$").unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidConfig(_)));
    }

    #[test]
    fn malformed_pattern_is_rejected() {
        let err = FileNameParser::new(r"(?<title>.+").unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidConfig(_)));
    }

    #[test]
    fn root_path_has_no_file_name() {
        let err = default_parser().parse("/").unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidInput(_)));
    }
}
