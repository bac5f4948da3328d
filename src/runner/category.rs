//! Scenario categories and suite-end detection of which category reports to emit.

use std::collections::BTreeSet;

use super::state::{PerformanceRecord, TestResult};

/// Categories that get a dedicated report
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReportCategory {
    Sim,
    Acm,
    ARefresh,
}

impl ReportCategory {
    pub const ALL: [ReportCategory; 3] = [
        ReportCategory::Sim,
        ReportCategory::Acm,
        ReportCategory::ARefresh,
    ];

    /// Label carried by results and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ReportCategory::Sim => "SIM",
            ReportCategory::Acm => "ACM",
            ReportCategory::ARefresh => "ARefresh",
        }
    }

    pub fn report_file(&self) -> &'static str {
        match self {
            ReportCategory::Sim => "sim_report.html",
            ReportCategory::Acm => "acm_report.html",
            ReportCategory::ARefresh => "arefresh_report.html",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReportCategory::Sim => "SIM Performance Report",
            ReportCategory::Acm => "ACM Navigation Report",
            ReportCategory::ARefresh => "ARefresh Page Refresh Report",
        }
    }

    /// Only the SIM report carries timing charts.
    pub fn has_charts(&self) -> bool {
        matches!(self, ReportCategory::Sim)
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

pub const PERFORMANCE: &str = "Performance";
pub const SIGN_IN: &str = "SignIn";
pub const COMPATIBILITY: &str = "Compatibility";

// ARefresh scenarios reuse the ACM navigation but are reported on their own.
const TAG_CATEGORIES: &[(&str, &str)] = &[
    ("arefresh", "ARefresh"),
    ("sim", "SIM"),
    ("acm", "ACM"),
    ("performance", PERFORMANCE),
    ("signin", SIGN_IN),
    ("compatibility", COMPATIBILITY),
];

/// Category label implied by a set of tags. Report categories win over the rest,
/// and ARefresh wins over ACM.
pub fn category_for_tags<S: AsRef<str>>(tags: &[S]) -> Option<String> {
    let normalized: Vec<String> = tags
        .iter()
        .map(|t| t.as_ref().trim_start_matches('@').to_lowercase())
        .collect();

    TAG_CATEGORIES
        .iter()
        .find(|(tag, _)| normalized.iter().any(|t| t == tag))
        .map(|(_, label)| label.to_string())
}

/// Which category reports to emit, and from which signal
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detection {
    pub categories: BTreeSet<ReportCategory>,
    /// True when results were empty and metric tags were used instead
    pub used_fallback: bool,
}

impl Detection {
    pub fn contains(&self, category: ReportCategory) -> bool {
        self.categories.contains(&category)
    }
}

/// Detect categories from result tags, falling back to metric tags only when no
/// result was recorded at all.
pub fn detect(results: &[TestResult], metrics: &[PerformanceRecord]) -> Detection {
    if !results.is_empty() {
        let categories = ReportCategory::ALL
            .into_iter()
            .filter(|c| results.iter().any(|r| r.in_category(c.label())))
            .collect();
        return Detection {
            categories,
            used_fallback: false,
        };
    }

    let categories = ReportCategory::ALL
        .into_iter()
        .filter(|c| metrics.iter().any(|m| m.in_category(c.label())))
        .collect();
    Detection {
        categories,
        used_fallback: true,
    }
}
