//! Backoff policy for failed service calls
//!
//! Maps each failure kind to a delay (in backoff units) and a continue
//! decision. Every kind currently continues; a worker only stops on budget
//! exhaustion or a stop request.

use std::time::Duration;

use shared::ApiFailure;

/// Failure classes the policy distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    RateLimited,
    TransientServiceError,
    Unknown,
}

impl From<&ApiFailure> for FailureKind {
    fn from(failure: &ApiFailure) -> Self {
        match failure {
            ApiFailure::RateLimitExceeded => FailureKind::RateLimited,
            ApiFailure::ServiceError { .. } | ApiFailure::AuthenticationFailed => FailureKind::TransientServiceError,
            ApiFailure::NetworkError(_) | ApiFailure::InvalidResponse(_) => FailureKind::Unknown,
        }
    }
}

/// Outcome of applying the policy to one failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryDecision {
    pub delay: Duration,
    pub should_continue: bool,
}

/// One policy row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryRule {
    pub units: u32,
    pub should_continue: bool,
}

/// Table-driven retry policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    unit: Duration,
    rate_limited: RetryRule,
    transient: RetryRule,
    unknown: RetryRule,
}

impl RetryPolicy {
    /// Standard policy: 10 / 5 / 3 units, always continue
    pub fn new(unit: Duration) -> Self {
        Self {
            unit,
            rate_limited: RetryRule { units: 10, should_continue: true },
            transient: RetryRule { units: 5, should_continue: true },
            unknown: RetryRule { units: 3, should_continue: true },
        }
    }

    pub fn with_rule(mut self, kind: FailureKind, rule: RetryRule) -> Self {
        match kind {
            FailureKind::RateLimited => self.rate_limited = rule,
            FailureKind::TransientServiceError => self.transient = rule,
            FailureKind::Unknown => self.unknown = rule,
        }
        self
    }

    pub fn unit(&self) -> Duration {
        self.unit
    }

    pub fn rule(&self, kind: FailureKind) -> RetryRule {
        match kind {
            FailureKind::RateLimited => self.rate_limited,
            FailureKind::TransientServiceError => self.transient,
            FailureKind::Unknown => self.unknown,
        }
    }

    pub fn decide(&self, kind: FailureKind) -> RetryDecision {
        let rule = self.rule(kind);
        RetryDecision {
            delay: self.unit.saturating_mul(rule.units),
            should_continue: rule.should_continue,
        }
    }

    pub fn decide_for(&self, failure: &ApiFailure) -> RetryDecision {
        self.decide(FailureKind::from(failure))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}
