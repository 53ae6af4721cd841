// ABOUTME: Non-fatal warning types attached to committed operations
// ABOUTME: External side-channel failures are reported here instead of failing the primary change

use serde::{Deserialize, Serialize};
use std::fmt;

/// External collaborator whose failure never rolls back a committed change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dependency {
    NotificationDispatcher,
    IdentityProvider,
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dependency::NotificationDispatcher => f.write_str("notification dispatcher"),
            Dependency::IdentityProvider => f.write_str("identity provider"),
        }
    }
}

/// A dependency failure captured as a warning on an otherwise successful result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyFailure {
    pub dependency: Dependency,
    pub message: String,
}

impl DependencyFailure {
    pub fn new(dependency: Dependency, message: impl Into<String>) -> Self {
        Self {
            dependency,
            message: message.into(),
        }
    }
}

impl fmt::Display for DependencyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.dependency, self.message)
    }
}

/// Result of a committed operation plus any dependency warnings it produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome<T> {
    pub value: T,
    pub warnings: Vec<DependencyFailure>,
}

impl<T> Outcome<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    /// Attach a warning if one was produced
    pub fn with_warning(mut self, warning: Option<DependencyFailure>) -> Self {
        self.warnings.extend(warning);
        self
    }

    pub fn push_warning(&mut self, warning: DependencyFailure) {
        self.warnings.push(warning);
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn into_inner(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            warnings: self.warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_collects_warnings() {
        let outcome = Outcome::new(7)
            .with_warning(None)
            .with_warning(Some(DependencyFailure::new(
                Dependency::NotificationDispatcher,
                "timed out after 5000ms",
            )));

        assert!(outcome.has_warnings());
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(
            outcome.warnings[0].to_string(),
            "notification dispatcher failed: timed out after 5000ms"
        );

        let mapped = outcome.map(|v| v * 2);
        assert_eq!(mapped.value, 14);
        assert_eq!(mapped.warnings.len(), 1);
    }
}
