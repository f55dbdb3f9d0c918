//! Defaults carried over from the plugin configuration this pipeline
//! replaces.

pub const DEFAULT_FILE_NAME_REGEX: &str = r"(?<title>.+)\.\w+$";
pub const DEFAULT_MATCH_SIMILARITY_THRESHOLD: f64 = 0.8;

pub const DEFAULT_TRANSLATION_PROVIDER: &str = "deepseek";
pub const DEFAULT_TARGET_LANGUAGE: &str = "zh-CN";
pub const DEFAULT_TRANSLATION_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_TRANSLATION_RETRY_COUNT: u32 = 2;

pub const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 15;

pub const DEFAULT_PROXY_PORT: u16 = 8080;
pub const DEFAULT_PROXY_PROBE_URL: &str = "https://www.baidu.com";

pub const TITLE_CAPTURE_GROUP: &str = "title";
pub const TITLE_PLACEHOLDER: &str = "{title}";
