//! Evaluation verdicts and per-check trace entries

use serde::Serialize;

/// The checks the engine performs, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    VpcMembership,
    SecurityGroupMatch,
}

impl CheckKind {
    /// Section header used in the text trace
    pub fn label(self) -> &'static str {
        match self {
            CheckKind::VpcMembership => "VPC connectivity",
            CheckKind::SecurityGroupMatch => "security groups",
        }
    }
}

/// One step of the evaluation trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    pub kind: CheckKind,
    pub passed: bool,
    pub detail: String,
}

impl CheckOutcome {
    pub fn pass(kind: CheckKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            passed: true,
            detail: detail.into(),
        }
    }

    pub fn fail(kind: CheckKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            passed: false,
            detail: detail.into(),
        }
    }
}

/// Terminal verdict of an evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// A security-group rule permits the connection
    Allowed,
    /// Same VPC, but no rule permits the connection
    Blocked,
    /// The resources are not in the same VPC; reachability would depend on
    /// routing or peering we do not analyze
    Indeterminate,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Verdict::Allowed => "allowed",
            Verdict::Blocked => "blocked",
            Verdict::Indeterminate => "indeterminate",
        };
        f.write_str(s)
    }
}

/// Ordered trace of checks plus the final verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub outcomes: Vec<CheckOutcome>,
    pub verdict: Verdict,
}
