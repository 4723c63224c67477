//! Per-step provisioning results.

use serde::Serialize;

/// Provisioning step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// OAuth client upsert.
    Client,
    /// Client role upsert.
    Role,
    /// User upsert.
    User,
    /// Client role assignment.
    RoleMapping,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Client => "client",
            Self::Role => "role",
            Self::User => "user",
            Self::RoleMapping => "role mapping",
        };
        f.write_str(name)
    }
}

/// Outcome of one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum StepOutcome {
    /// The resource did not exist and was created.
    Created,
    /// The resource existed and was replaced.
    Updated,
    /// The resource already existed as required; nothing was sent.
    Unchanged,
    /// The step did not run because a dependency was missing.
    Skipped(String),
    /// The step failed; the run continued.
    Warning(String),
}

impl StepOutcome {
    /// Short status label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
            Self::Skipped(_) => "skipped",
            Self::Warning(_) => "warning",
        }
    }

    /// Detail message, if any.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Skipped(m) | Self::Warning(m) => Some(m),
            _ => None,
        }
    }
}

/// Result of one step against one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// Step kind.
    pub step: Step,
    /// Resource the step acted on (client id, role name, username).
    pub target: String,
    /// Outcome.
    pub outcome: StepOutcome,
}

/// Ordered collection of step results for a whole run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Steps in execution order.
    pub steps: Vec<StepReport>,
}

impl RunReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a step result.
    pub fn record(&mut self, step: Step, target: impl Into<String>, outcome: StepOutcome) {
        self.steps.push(StepReport {
            step,
            target: target.into(),
            outcome,
        });
    }

    /// Whether any step ended in a warning.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.steps
            .iter()
            .any(|s| matches!(s.outcome, StepOutcome::Warning(_)))
    }

    /// Outcome of the first step of the given kind and target.
    #[must_use]
    pub fn outcome(&self, step: Step, target: &str) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|s| s.step == step && s.target == target)
            .map(|s| &s.outcome)
    }
}
