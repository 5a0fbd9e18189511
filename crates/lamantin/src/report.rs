//! Diagnostics collected while routing.

use lamantin_lgraph::EdgeId;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Error,
    Warning,
}

/// A recoverable problem; routing continued with a degraded result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingIssue {
    pub severity: Severity,
    pub message: String,
    #[serde(skip)]
    pub edge: Option<EdgeId>,
}

impl RoutingIssue {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            edge: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            edge: None,
        }
    }

    pub fn with_edge(mut self, edge: EdgeId) -> Self {
        self.edge = Some(edge);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingReport {
    /// Routing slots used at each boundary, boundary `b` lying between layers `b - 1` and `b`.
    pub slots_per_boundary: Vec<usize>,
    pub issues: Vec<RoutingIssue>,
}

impl RoutingReport {
    /// Records `issue` and mirrors it to the log.
    pub fn push_issue(&mut self, issue: RoutingIssue) {
        match issue.severity {
            Severity::Error => tracing::error!(issue = %issue.message, "routing issue"),
            Severity::Warning => tracing::warn!(issue = %issue.message, "routing issue"),
        }
        self.issues.push(issue);
    }
}
