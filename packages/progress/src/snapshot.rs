// ABOUTME: Progress snapshot value type and its merge
// ABOUTME: Merge is a field-wise OR, so completed steps never regress

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The five onboarding and production steps, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStep {
    Intake,
    ResumeUpload,
    SessionBooking,
    Production,
    ReviewDelivery,
}

impl ProgressStep {
    pub const ALL: [ProgressStep; 5] = [
        ProgressStep::Intake,
        ProgressStep::ResumeUpload,
        ProgressStep::SessionBooking,
        ProgressStep::Production,
        ProgressStep::ReviewDelivery,
    ];

    /// 1-based position in the pipeline
    pub fn number(&self) -> u8 {
        match self {
            ProgressStep::Intake => 1,
            ProgressStep::ResumeUpload => 2,
            ProgressStep::SessionBooking => 3,
            ProgressStep::Production => 4,
            ProgressStep::ReviewDelivery => 5,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.get(usize::from(number).checked_sub(1)?).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStep::Intake => "intake",
            ProgressStep::ResumeUpload => "resume_upload",
            ProgressStep::SessionBooking => "session_booking",
            ProgressStep::Production => "production",
            ProgressStep::ReviewDelivery => "review_delivery",
        }
    }
}

impl fmt::Display for ProgressStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProgressStep {
    type Err = String;

    /// Accepts a step name or its number
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(number) = s.trim().parse::<u8>() {
            return Self::from_number(number).ok_or_else(|| format!("Invalid step number: {}", s));
        }
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "intake" => Ok(ProgressStep::Intake),
            "resume_upload" | "resume" => Ok(ProgressStep::ResumeUpload),
            "session_booking" | "session" => Ok(ProgressStep::SessionBooking),
            "production" => Ok(ProgressStep::Production),
            "review_delivery" | "review" => Ok(ProgressStep::ReviewDelivery),
            other => Err(format!("Invalid progress step: {}", other)),
        }
    }
}

/// Per-step completion flags from one source. Missing fields read as not completed, so an
/// empty document `{}` is a valid snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressSnapshot {
    pub intake: bool,
    pub resume_upload: bool,
    pub session_booking: bool,
    pub production: bool,
    pub review_delivery: bool,
}

impl ProgressSnapshot {
    /// Server view: milestone flags for steps 1-3. Steps 4-5 have no server signal.
    pub fn from_milestones(milestones: [bool; 3]) -> Self {
        Self {
            intake: milestones[0],
            resume_upload: milestones[1],
            session_booking: milestones[2],
            production: false,
            review_delivery: false,
        }
    }

    pub fn from_steps(steps: [bool; 5]) -> Self {
        Self {
            intake: steps[0],
            resume_upload: steps[1],
            session_booking: steps[2],
            production: steps[3],
            review_delivery: steps[4],
        }
    }

    pub fn steps(&self) -> [bool; 5] {
        [
            self.intake,
            self.resume_upload,
            self.session_booking,
            self.production,
            self.review_delivery,
        ]
    }

    pub fn is_completed(&self, step: ProgressStep) -> bool {
        self.steps()[usize::from(step.number() - 1)]
    }

    /// A copy with `step` marked completed
    pub fn with_completed(mut self, step: ProgressStep) -> Self {
        match step {
            ProgressStep::Intake => self.intake = true,
            ProgressStep::ResumeUpload => self.resume_upload = true,
            ProgressStep::SessionBooking => self.session_booking = true,
            ProgressStep::Production => self.production = true,
            ProgressStep::ReviewDelivery => self.review_delivery = true,
        }
        self
    }

    pub fn merge(&self, other: &ProgressSnapshot) -> ProgressSnapshot {
        ProgressSnapshot {
            intake: self.intake || other.intake,
            resume_upload: self.resume_upload || other.resume_upload,
            session_booking: self.session_booking || other.session_booking,
            production: self.production || other.production,
            review_delivery: self.review_delivery || other.review_delivery,
        }
    }

    pub fn completed_count(&self) -> usize {
        self.steps().iter().filter(|done| **done).count()
    }

    /// Completed steps plus one, capped at the last step
    pub fn current_step(&self) -> u8 {
        // completed_count() is at most 5
        (self.completed_count() as u8 + 1).min(5)
    }
}

/// Reconciled progress as shown to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedProgress {
    pub steps: [bool; 5],
    pub current_step: u8,
}

impl From<ProgressSnapshot> for MergedProgress {
    fn from(snapshot: ProgressSnapshot) -> Self {
        Self {
            steps: snapshot.steps(),
            current_step: snapshot.current_step(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// Every possible snapshot
    fn all_snapshots() -> Vec<ProgressSnapshot> {
        (0u8..32)
            .map(|bits| {
                let mut steps = [false; 5];
                for (i, step) in steps.iter_mut().enumerate() {
                    *step = bits & (1 << i) != 0;
                }
                ProgressSnapshot::from_steps(steps)
            })
            .collect()
    }

    #[test]
    fn test_merge_is_commutative_and_idempotent() {
        for server in all_snapshots() {
            for local in all_snapshots() {
                let merged = server.merge(&local);
                assert_eq!(merged, local.merge(&server));
                assert_eq!(merged.merge(&local), merged);
                assert_eq!(merged.merge(&server), merged);
            }
        }
    }

    #[test]
    fn test_merge_never_regresses_local_progress() {
        for server in all_snapshots() {
            for local in all_snapshots() {
                let merged = server.merge(&local);
                for step in ProgressStep::ALL {
                    if local.is_completed(step) || server.is_completed(step) {
                        assert!(merged.is_completed(step), "{} regressed", step);
                    }
                }
            }
        }
    }

    #[rstest]
    #[case([false, false, false, false, false], 1)]
    #[case([true, false, false, false, false], 2)]
    #[case([false, false, true, false, false], 2)]
    #[case([true, true, true, false, false], 4)]
    #[case([true, true, true, true, false], 5)]
    #[case([true, true, true, true, true], 5)]
    fn test_current_step(#[case] steps: [bool; 5], #[case] expected: u8) {
        assert_eq!(ProgressSnapshot::from_steps(steps).current_step(), expected);
    }

    #[test]
    fn test_empty_document_is_a_valid_snapshot() {
        let snapshot: ProgressSnapshot = serde_json::from_str("{}").unwrap();
        assert_eq!(snapshot, ProgressSnapshot::default());

        let partial: ProgressSnapshot = serde_json::from_str(r#"{"production": true}"#).unwrap();
        assert!(partial.production);
        assert_eq!(partial.completed_count(), 1);
    }

    #[test]
    fn test_server_view_has_no_production_signal() {
        let server = ProgressSnapshot::from_milestones([true, true, true]);
        assert!(!server.production);
        assert!(!server.review_delivery);
        assert_eq!(server.current_step(), 4);
    }

    #[rstest]
    #[case("1", ProgressStep::Intake)]
    #[case("resume", ProgressStep::ResumeUpload)]
    #[case("session-booking", ProgressStep::SessionBooking)]
    #[case("4", ProgressStep::Production)]
    #[case("Review", ProgressStep::ReviewDelivery)]
    fn test_step_parse(#[case] input: &str, #[case] expected: ProgressStep) {
        assert_eq!(input.parse::<ProgressStep>().unwrap(), expected);
    }

    #[test]
    fn test_step_parse_rejects_out_of_range() {
        assert!("0".parse::<ProgressStep>().is_err());
        assert!("6".parse::<ProgressStep>().is_err());
        assert!("onboarding".parse::<ProgressStep>().is_err());
    }
}
