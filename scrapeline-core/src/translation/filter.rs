use thiserror::Error;
use tracing::warn;

/// Built-in replacements that keep translated metadata in a neutral,
/// academic register. Applied in order.
const ACADEMIC_RULES: &[(&str, &str)] = &[
    ("妈的", "不恰当的语气词"),
    ("操", "不恰当的动词"),
    ("性交", "性行为"),
    ("嫖娼", "有偿性服务行为"),
];

/// Upper bound on full passes over the rule table in [`ContentFilter::apply`].
const MAX_PASSES: usize = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterRuleError {
    #[error("Filter rule #{index} has an empty pattern")]
    EmptyPattern { index: usize },

    #[error("Replacement '{replacement}' reintroduces filtered term '{pattern}'")]
    ReintroducesPattern {
        replacement: String,
        pattern: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRule {
    pattern: String,
    replacement: String,
}

impl FilterRule {
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }
}

/// Ordered literal find-and-replace over translated text.
///
/// Rule sets are validated on construction so that no replacement contains
/// any pattern of the set. A replacement can still join with neighbouring
/// text into a fresh match, so [`ContentFilter::apply`] repeats the table
/// until the text is stable.
#[derive(Debug, Clone)]
pub struct ContentFilter {
    rules: Vec<FilterRule>,
}

impl Default for ContentFilter {
    fn default() -> Self {
        Self::academic()
    }
}

impl ContentFilter {
    /// The built-in academic rule table.
    pub fn academic() -> Self {
        Self {
            rules: to_rules(ACADEMIC_RULES.iter().copied()),
        }
    }

    pub fn new<I, P, R>(rules: I) -> Result<Self, FilterRuleError>
    where
        I: IntoIterator<Item = (P, R)>,
        P: Into<String>,
        R: Into<String>,
    {
        let rules = to_rules(rules);
        validate(&rules)?;
        Ok(Self { rules })
    }

    /// The built-in table followed by `extra` rules.
    pub fn academic_with<I, P, R>(extra: I) -> Result<Self, FilterRuleError>
    where
        I: IntoIterator<Item = (P, R)>,
        P: Into<String>,
        R: Into<String>,
    {
        let mut rules = to_rules(ACADEMIC_RULES.iter().copied());
        rules.extend(to_rules(extra));
        validate(&rules)?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[FilterRule] {
        &self.rules
    }

    /// Applies the rules in order, pass after pass, until a pass leaves the
    /// text unchanged.
    pub fn apply(&self, text: &str) -> String {
        let mut current = text.to_string();
        for _ in 0..MAX_PASSES {
            let next = self.apply_once(&current);
            if next == current {
                return current;
            }
            current = next;
        }
        warn!(
            passes = MAX_PASSES,
            "content filter did not settle; returning last pass"
        );
        current
    }

    fn apply_once(&self, text: &str) -> String {
        self.rules.iter().fold(text.to_string(), |acc, rule| {
            if acc.contains(rule.pattern.as_str()) {
                acc.replace(rule.pattern.as_str(), &rule.replacement)
            } else {
                acc
            }
        })
    }
}

fn to_rules<I, P, R>(rules: I) -> Vec<FilterRule>
where
    I: IntoIterator<Item = (P, R)>,
    P: Into<String>,
    R: Into<String>,
{
    rules
        .into_iter()
        .map(|(pattern, replacement)| FilterRule {
            pattern: pattern.into(),
            replacement: replacement.into(),
        })
        .collect()
}

fn validate(rules: &[FilterRule]) -> Result<(), FilterRuleError> {
    if let Some(index) = rules.iter().position(|rule| rule.pattern.is_empty())
    {
        return Err(FilterRuleError::EmptyPattern { index });
    }

    for rule in rules {
        if let Some(hit) = rules
            .iter()
            .find(|other| rule.replacement.contains(other.pattern.as_str()))
        {
            return Err(FilterRuleError::ReintroducesPattern {
                replacement: rule.replacement.clone(),
                pattern: hit.pattern.clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_is_valid() {
        assert_eq!(validate(ContentFilter::academic().rules()), Ok(()));
    }

    #[test]
    fn replaces_listed_terms() {
        let filter = ContentFilter::academic();
        assert_eq!(filter.apply("他妈的"), "他不恰当的语气词");
        assert_eq!(filter.apply("涉及嫖娼"), "涉及有偿性服务行为");
    }

    #[test]
    fn text_without_terms_is_untouched() {
        let filter = ContentFilter::academic();
        assert_eq!(filter.apply("一部关于梦境的电影"), "一部关于梦境的电影");
        assert_eq!(filter.apply(""), "");
    }

    #[test]
    fn applying_twice_changes_nothing() {
        let filter = ContentFilter::academic();
        let samples = ["妈的，操场上的性交与嫖娼", "性交易", "操操操", "clean text"];
        for sample in samples {
            let once = filter.apply(sample);
            assert_eq!(filter.apply(&once), once, "sample: {sample}");
            for rule in filter.rules() {
                assert!(!once.contains(rule.pattern()), "{once} still has {}", rule.pattern());
            }
        }
    }

    #[test]
    fn replacements_that_form_new_matches_are_filtered_again() {
        let filter = ContentFilter::new([("aa", "a")]).unwrap();
        let once = filter.apply("aaa");
        assert_eq!(once, "a");
        assert_eq!(filter.apply(&once), once);

        let filter = ContentFilter::new([("ab", "ba")]).unwrap();
        assert_eq!(filter.apply("aab"), "baa");
        assert_eq!(filter.apply("baa"), "baa");
    }

    #[test]
    fn user_rules_joining_builtin_output_settle() {
        let filter = ContentFilter::academic_with([("词词", "词")]).unwrap();
        let once = filter.apply("妈的词词");
        assert_eq!(once, "不恰当的语气词");
        assert_eq!(filter.apply(&once), once);
    }

    #[test]
    fn extra_rules_run_after_builtins() {
        let filter = ContentFilter::academic_with([("暴力", "冲突")]).unwrap();
        assert_eq!(filter.rules().len(), ACADEMIC_RULES.len() + 1);
        assert_eq!(filter.apply("暴力场面"), "冲突场面");
    }

    #[test]
    fn empty_pattern_is_rejected() {
        let err = ContentFilter::new([("", "x")]).unwrap_err();
        assert_eq!(err, FilterRuleError::EmptyPattern { index: 0 });
    }

    #[test]
    fn self_reintroducing_rules_are_rejected() {
        let err = ContentFilter::new([("cat", "concatenate")]).unwrap_err();
        assert!(matches!(err, FilterRuleError::ReintroducesPattern { .. }));

        let err =
            ContentFilter::academic_with([("不恰当", "粗俗")]).unwrap_err();
        assert!(matches!(
            err,
            FilterRuleError::ReintroducesPattern { ref pattern, .. } if pattern == "不恰当"
        ));
    }
}
