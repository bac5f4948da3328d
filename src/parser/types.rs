use std::fmt;
use std::str::FromStr;

/// A parsed feature file
#[derive(Debug, Clone, Default)]
pub struct Feature {
    pub name: String,

    pub description: Option<String>,

    pub tags: Vec<String>,

    /// Report category applied to every scenario that does not set its own
    pub category: Option<String>,

    /// Steps prepended to every scenario
    pub background: Vec<Step>,

    pub scenarios: Vec<Scenario>,

    /// File the feature was read from
    pub source: Option<std::path::PathBuf>,
}

/// A scenario with background steps already applied
#[derive(Debug, Clone, Default)]
pub struct Scenario {
    pub name: String,

    pub tags: Vec<String>,

    pub category: Option<String>,

    pub steps: Vec<Step>,
}

impl Scenario {
    /// Scenario tags followed by the inherited feature tags.
    pub fn effective_tags<'a>(&'a self, feature: &'a Feature) -> impl Iterator<Item = &'a String> {
        self.tags.iter().chain(feature.tags.iter())
    }

    /// Scenario-level settings before feature-level ones: explicit category, then
    /// tags, at each level.
    pub fn effective_category(&self, feature: &Feature) -> Option<String> {
        use crate::runner::category::category_for_tags;

        self.category
            .clone()
            .or_else(|| category_for_tags(&self.tags))
            .or_else(|| feature.category.clone())
            .or_else(|| category_for_tags(&feature.tags))
    }

    /// True when any tag matches any of `wanted` (leading `@` and case ignored).
    pub fn matches_tags(&self, feature: &Feature, wanted: &[String]) -> bool {
        let normalize = |t: &str| t.trim_start_matches('@').to_lowercase();
        self.effective_tags(feature).any(|tag| {
            let tag = normalize(tag);
            wanted.iter().any(|w| normalize(w) == tag)
        })
    }
}

/// Gherkin step keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Given,
    When,
    Then,
    And,
    But,
}

impl Keyword {
    pub const ALL: [Keyword; 5] = [
        Keyword::Given,
        Keyword::When,
        Keyword::Then,
        Keyword::And,
        Keyword::But,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Given => "Given",
            Keyword::When => "When",
            Keyword::Then => "Then",
            Keyword::And => "And",
            Keyword::But => "But",
        }
    }
}

impl FromStr for Keyword {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        Keyword::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow::anyhow!("Unknown step keyword: {}", s))
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One Given/When/Then line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub keyword: Keyword,
    pub text: String,
}

impl Step {
    pub fn new(keyword: Keyword, text: impl Into<String>) -> Self {
        Self {
            keyword,
            text: text.into(),
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.keyword, self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(tags: &[&str], category: Option<&str>) -> Feature {
        Feature {
            name: "Yuba".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            category: category.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_keyword_parsing() {
        assert_eq!("given".parse::<Keyword>().unwrap(), Keyword::Given);
        assert_eq!("But".parse::<Keyword>().unwrap(), Keyword::But);
        assert!("Whenever".parse::<Keyword>().is_err());
    }

    #[test]
    fn test_category_resolution_order() {
        let scenario = Scenario {
            name: "Refresh".to_string(),
            tags: vec!["@arefresh".to_string()],
            ..Default::default()
        };
        assert_eq!(
            scenario.effective_category(&feature(&[], None)).as_deref(),
            Some("ARefresh")
        );
        assert_eq!(
            scenario.effective_category(&feature(&[], Some("ACM"))).as_deref(),
            Some("ARefresh")
        );
        assert_eq!(
            scenario.effective_category(&feature(&["@acm"], None)).as_deref(),
            Some("ARefresh")
        );

        let untagged = Scenario {
            name: "Credits".to_string(),
            ..Default::default()
        };
        assert_eq!(
            untagged.effective_category(&feature(&["@acm"], None)).as_deref(),
            Some("ACM")
        );
        assert_eq!(
            untagged
                .effective_category(&feature(&["@acm"], Some("Performance")))
                .as_deref(),
            Some("Performance")
        );

        let explicit = Scenario {
            category: Some("SIM".to_string()),
            ..scenario
        };
        assert_eq!(
            explicit.effective_category(&feature(&[], Some("ACM"))).as_deref(),
            Some("SIM")
        );
    }

    #[test]
    fn test_tag_filter_uses_feature_tags() {
        let scenario = Scenario {
            name: "Load".to_string(),
            ..Default::default()
        };
        let feature = feature(&["@performance"], None);
        assert!(scenario.matches_tags(&feature, &["performance".to_string()]));
        assert!(scenario.matches_tags(&feature, &["@SIM".to_string(), "@Performance".to_string()]));
        assert!(!scenario.matches_tags(&feature, &["sim".to_string()]));
    }
}
