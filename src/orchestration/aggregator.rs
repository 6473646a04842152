//! Merge step payloads into the report the final validation gate reads.
//!
//! Each step may report a finding under one of the fixed criterion names in
//! its payload:
//!
//! ```json
//! {"testing": {"passed": false, "issues": ["2 tests failed"], "recommendations": ["fix tests"]}}
//! ```
//!
//! Policy:
//! - A criterion nobody reported on passes, with an advisory recommendation.
//! - A failing criterion only blocks approval through issues that match a
//!   critical keyword (syntax error, cannot run, security vulnerability...).
//!   Every other negative finding becomes a recommendation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::PhaseOutcome;
use crate::config::DEFAULT_CRITICAL_KEYWORDS;
use crate::core::WorkflowContext;
use crate::util::KeywordMatcher;
use crate::{Error, Result};

/// The closed set of validation criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    CodeQuality,
    Documentation,
    Testing,
    Security,
    Ethics,
    Functionality,
}

impl Criterion {
    pub const ALL: [Criterion; 6] = [
        Criterion::CodeQuality,
        Criterion::Documentation,
        Criterion::Testing,
        Criterion::Security,
        Criterion::Ethics,
        Criterion::Functionality,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Criterion::CodeQuality => "code_quality",
            Criterion::Documentation => "documentation",
            Criterion::Testing => "testing",
            Criterion::Security => "security",
            Criterion::Ethics => "ethics",
            Criterion::Functionality => "functionality",
        }
    }

    /// Recommendation attached when nothing was recorded for this criterion.
    pub fn advisory(self) -> &'static str {
        match self {
            Criterion::CodeQuality => "Consider running code quality tools",
            Criterion::Documentation => "Consider adding more documentation",
            Criterion::Testing => "Consider adding more comprehensive tests",
            Criterion::Security => "Consider adding security scanning",
            Criterion::Ethics => "Consider adding ethics review",
            Criterion::Functionality => "Consider exercising the core functionality",
        }
    }
}

impl std::fmt::Display for Criterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Criterion {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Criterion::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| Error::Validation(format!("unknown criterion: {s}")))
    }
}

/// One collaborator's verdict on a criterion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub passed: bool,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl Finding {
    pub fn failed<I, S>(issues: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            passed: false,
            issues: issues.into_iter().map(Into::into).collect(),
            recommendations: Vec::new(),
        }
    }

    /// Read a collaborator payload.
    ///
    /// Objects may omit `passed`, in which case the finding passes when it
    /// lists no issues. A bare boolean is a verdict without details.
    pub fn from_value(criterion: Criterion, value: &Value) -> Self {
        #[derive(Deserialize)]
        struct Raw {
            passed: Option<bool>,
            #[serde(default)]
            issues: Vec<String>,
            #[serde(default)]
            recommendations: Vec<String>,
        }

        match value {
            Value::Bool(passed) => Self {
                passed: *passed,
                ..Default::default()
            },
            Value::Object(_) => match serde_json::from_value::<Raw>(value.clone()) {
                Ok(raw) => Self {
                    passed: raw.passed.unwrap_or(raw.issues.is_empty()),
                    issues: raw.issues,
                    recommendations: raw.recommendations,
                },
                Err(e) => Self::failed([format!("unreadable {criterion} payload: {e}")]),
            },
            other => Self::failed([format!("unrecognized {criterion} payload: {other}")]),
        }
    }
}

/// Merged verdict for one criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionReport {
    pub passed: bool,
    /// Whether any step reported on this criterion.
    pub recorded: bool,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub approved: bool,
    pub criteria: BTreeMap<Criterion, CriterionReport>,
    /// Critical issues that blocked approval.
    pub issues: Vec<String>,
    /// Non-blocking findings from failing criteria.
    pub recommendations: Vec<String>,
}

impl ValidationReport {
    pub fn criterion(&self, criterion: Criterion) -> Option<&CriterionReport> {
        self.criteria.get(&criterion)
    }
}

#[derive(Debug, Clone)]
pub struct OutcomeAggregator {
    critical: KeywordMatcher,
}

impl Default for OutcomeAggregator {
    fn default() -> Self {
        Self {
            critical: KeywordMatcher::new(DEFAULT_CRITICAL_KEYWORDS)
                .unwrap_or_else(|_| KeywordMatcher::empty()),
        }
    }
}

impl OutcomeAggregator {
    pub fn new<S: AsRef<str>>(critical_keywords: &[S]) -> Result<Self> {
        Ok(Self {
            critical: KeywordMatcher::new(critical_keywords)?,
        })
    }

    pub fn is_critical(&self, issue: &str) -> bool {
        self.critical.is_match(issue)
    }

    /// Aggregate every step payload of the given phase outcomes.
    pub fn aggregate(&self, phase_outcomes: &[PhaseOutcome]) -> ValidationReport {
        self.aggregate_payloads(
            phase_outcomes
                .iter()
                .flat_map(|p| p.outcomes.iter().map(|r| &r.outcome.data)),
        )
    }

    /// Aggregate what the context holds: the `validation_results` mapping
    /// plus every namespaced step payload.
    pub fn aggregate_context(&self, ctx: &WorkflowContext) -> ValidationReport {
        let payloads = ctx
            .validation_results()
            .into_iter()
            .chain(ctx.all_step_data().map(|(_, data)| data));
        self.aggregate_payloads(payloads)
    }

    pub fn aggregate_payloads<'a, I>(&self, payloads: I) -> ValidationReport
    where
        I: IntoIterator<Item = &'a Map<String, Value>>,
    {
        let mut findings: BTreeMap<Criterion, Vec<Finding>> = BTreeMap::new();
        for payload in payloads {
            for criterion in Criterion::ALL {
                if let Some(value) = payload.get(criterion.as_str()) {
                    findings
                        .entry(criterion)
                        .or_default()
                        .push(Finding::from_value(criterion, value));
                }
            }
        }

        let mut report = ValidationReport {
            approved: true,
            criteria: BTreeMap::new(),
            issues: Vec::new(),
            recommendations: Vec::new(),
        };

        for criterion in Criterion::ALL {
            let entry = match findings.remove(&criterion) {
                None => CriterionReport {
                    passed: true,
                    recorded: false,
                    issues: Vec::new(),
                    recommendations: vec![criterion.advisory().to_string()],
                },
                Some(list) => self.merge(criterion, list, &mut report),
            };
            report.criteria.insert(criterion, entry);
        }

        info!(
            approved = report.approved,
            blocking = report.issues.len(),
            recommendations = report.recommendations.len(),
            "validation aggregated"
        );
        report
    }

    fn merge(
        &self,
        criterion: Criterion,
        findings: Vec<Finding>,
        report: &mut ValidationReport,
    ) -> CriterionReport {
        let passed = findings.iter().all(|f| f.passed);
        let mut issues = Vec::new();
        let mut recommendations = Vec::new();
        for finding in findings {
            issues.extend(finding.issues);
            recommendations.extend(finding.recommendations);
        }

        if !passed {
            let (critical, minor): (Vec<String>, Vec<String>) =
                issues.iter().cloned().partition(|i| self.is_critical(i));
            if !critical.is_empty() {
                debug!(%criterion, critical = critical.len(), "critical issues block approval");
                report.approved = false;
                report.issues.extend(critical);
            }
            report.recommendations.extend(minor);
            report.recommendations.extend(recommendations.iter().cloned());
        }

        CriterionReport {
            passed,
            recorded: true,
            issues,
            recommendations,
        }
    }
}
