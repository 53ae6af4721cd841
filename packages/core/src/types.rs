// ABOUTME: Domain type definitions for clients, deliveries, and revision requests
// ABOUTME: Status enums carry their transition rules so every caller shares one table

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==================== Clients ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    Onboarding,
    InProduction,
    InReview,
    Completed,
    OnHold,
}

impl ClientStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientStatus::Onboarding => "onboarding",
            ClientStatus::InProduction => "in_production",
            ClientStatus::InReview => "in_review",
            ClientStatus::Completed => "completed",
            ClientStatus::OnHold => "on_hold",
        }
    }
}

impl fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClientStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "onboarding" => Ok(ClientStatus::Onboarding),
            "in_production" => Ok(ClientStatus::InProduction),
            "in_review" => Ok(ClientStatus::InReview),
            "completed" => Ok(ClientStatus::Completed),
            "on_hold" => Ok(ClientStatus::OnHold),
            other => Err(format!("Invalid client status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

/// Server-authoritative onboarding milestones. Once set they are never cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    IntakeSubmitted,
    ResumeUploaded,
    SessionBooked,
}

impl Milestone {
    pub const ALL: [Milestone; 3] = [
        Milestone::IntakeSubmitted,
        Milestone::ResumeUploaded,
        Milestone::SessionBooked,
    ];

    /// Column holding this flag in the `clients` table
    pub fn column(&self) -> &'static str {
        match self {
            Milestone::IntakeSubmitted => "intake_submitted",
            Milestone::ResumeUploaded => "resume_uploaded",
            Milestone::SessionBooked => "session_booked",
        }
    }
}

impl FromStr for Milestone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "intake" | "intake_submitted" => Ok(Milestone::IntakeSubmitted),
            "resume" | "resume_uploaded" => Ok(Milestone::ResumeUploaded),
            "session" | "session_booked" => Ok(Milestone::SessionBooked),
            other => Err(format!("Unknown milestone: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub service_tier_id: Option<String>,
    pub is_rush: bool,
    pub rush_deadline: Option<DateTime<Utc>>,
    pub estimated_delivery: Option<NaiveDate>,

    // Milestone flags (forward-only)
    pub intake_submitted: bool,
    pub resume_uploaded: bool,
    pub session_booked: bool,

    pub status: ClientStatus,
    pub payment_status: PaymentStatus,

    /// Identifier of the linked account in the external identity provider
    pub auth_user_id: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    pub fn milestone(&self, milestone: Milestone) -> bool {
        match milestone {
            Milestone::IntakeSubmitted => self.intake_submitted,
            Milestone::ResumeUploaded => self.resume_uploaded,
            Milestone::SessionBooked => self.session_booked,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientCreateInput {
    pub display_name: String,
    pub email: String,
    pub service_tier_id: Option<String>,
    pub is_rush: bool,
    pub rush_deadline: Option<DateTime<Utc>>,
    pub estimated_delivery: Option<NaiveDate>,
    pub auth_user_id: Option<String>,
}

// ==================== Deliveries ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Delivered,
    RevisionRequested,
    Approved,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::RevisionRequested => "revision_requested",
            DeliveryStatus::Approved => "approved",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    pub id: String,
    pub client_id: String,
    pub title: String,
    pub document_type: String,
    pub file_url: String,
    pub file_size: i64,
    pub status: DeliveryStatus,
    /// Latest entry in the append-only `delivery_versions` log
    pub current_version: i64,
    pub delivered_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Delivery {
    /// `approved_at` is set exactly when the delivery is approved
    pub fn approval_is_consistent(&self) -> bool {
        (self.status == DeliveryStatus::Approved) == self.approved_at.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryCreateInput {
    pub client_id: String,
    pub title: String,
    pub document_type: String,
    pub file_url: String,
    pub file_size: i64,
}

/// Immutable record of one fulfillment of a delivery
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeliveryVersion {
    pub id: String,
    pub delivery_id: String,
    pub version_number: i64,
    pub title: String,
    pub file_url: String,
    pub file_size: i64,
    pub revision_request_id: Option<String>,
    pub delivered_at: DateTime<Utc>,
}

/// Which deliveries the revision title counter scans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersioningScope {
    /// Every delivery in the store
    #[default]
    Global,
    /// Only deliveries belonging to the same client
    Client,
}

impl FromStr for VersioningScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "global" => Ok(VersioningScope::Global),
            "client" => Ok(VersioningScope::Client),
            other => Err(format!("Invalid versioning scope: {}", other)),
        }
    }
}

// ==================== Revision Requests ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RevisionStatus {
    Pending,
    InProgress,
    Completed,
}

impl RevisionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RevisionStatus::Pending => "pending",
            RevisionStatus::InProgress => "in_progress",
            RevisionStatus::Completed => "completed",
        }
    }

    /// Staff-driven transitions. Fulfillment completes a request without consulting this table.
    pub fn can_advance_to(&self, next: RevisionStatus) -> bool {
        matches!(
            (self, next),
            (RevisionStatus::Pending, RevisionStatus::InProgress)
                | (RevisionStatus::Pending, RevisionStatus::Completed)
                | (RevisionStatus::InProgress, RevisionStatus::Completed)
        )
    }

    pub fn is_open(&self) -> bool {
        *self != RevisionStatus::Completed
    }
}

impl fmt::Display for RevisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RevisionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "pending" => Ok(RevisionStatus::Pending),
            "in_progress" => Ok(RevisionStatus::InProgress),
            "completed" => Ok(RevisionStatus::Completed),
            other => Err(format!("Invalid revision status: {}", other)),
        }
    }
}

/// Client-facing reasons offered on the revision form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RevisionReason {
    #[serde(rename = "Something looks incorrect")]
    SomethingIncorrect,
    #[serde(rename = "Missing information")]
    MissingInformation,
    #[serde(rename = "Formatting issues")]
    FormattingIssues,
    #[serde(rename = "Wording or tone")]
    WordingOrTone,
    #[serde(rename = "Other")]
    Other,
}

impl RevisionReason {
    pub const ALL: [RevisionReason; 5] = [
        RevisionReason::SomethingIncorrect,
        RevisionReason::MissingInformation,
        RevisionReason::FormattingIssues,
        RevisionReason::WordingOrTone,
        RevisionReason::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RevisionReason::SomethingIncorrect => "Something looks incorrect",
            RevisionReason::MissingInformation => "Missing information",
            RevisionReason::FormattingIssues => "Formatting issues",
            RevisionReason::WordingOrTone => "Wording or tone",
            RevisionReason::Other => "Other",
        }
    }
}

impl FromStr for RevisionReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RevisionReason::ALL
            .into_iter()
            .find(|reason| reason.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown revision reason: {}", s))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionRequest {
    pub id: String,
    pub delivery_id: String,
    pub client_id: String,
    pub reasons: Vec<RevisionReason>,
    pub custom_reason: Option<String>,
    pub description: String,
    pub attachments: Vec<String>,
    pub status: RevisionStatus,
    /// SLA target; informational only
    pub due_date: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevisionRequestInput {
    pub reasons: Vec<RevisionReason>,
    pub custom_reason: Option<String>,
    pub description: String,
    pub attachments: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfillRevisionInput {
    pub file_url: String,
    pub file_size: i64,
    /// Title to derive the next versioned title from; defaults to the delivery's current title
    pub title: Option<String>,
    pub document_type: Option<String>,
}
