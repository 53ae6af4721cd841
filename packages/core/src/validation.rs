// ABOUTME: Input validation for client, delivery, and revision inputs
// ABOUTME: Every check runs before any write so rejected input leaves the store untouched

use thiserror::Error;

use crate::types::{
    ClientCreateInput, DeliveryCreateInput, FulfillRevisionInput, RevisionRequestInput,
};

/// Maximum length for titles and display names
const MAX_TITLE_LENGTH: usize = 255;

/// Maximum length for revision descriptions
const MAX_DESCRIPTION_LENGTH: usize = 5000;

/// Maximum number of attachments on one revision request
const MAX_ATTACHMENTS: usize = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    #[error("{field} exceeds maximum length of {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("At least one revision reason is required")]
    MissingReason,

    #[error("Too many attachments: {0} (maximum 10)")]
    TooManyAttachments(usize),

    #[error("Invalid file size: {0}")]
    InvalidFileSize(i64),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
}

fn require_text(value: &str, field: &'static str, max: usize) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

/// Validate a file reference handed over by the file store
pub fn validate_file_reference(file_url: &str, file_size: i64) -> Result<(), ValidationError> {
    if file_url.trim().is_empty() {
        return Err(ValidationError::EmptyField("File reference"));
    }
    if file_size < 0 {
        return Err(ValidationError::InvalidFileSize(file_size));
    }
    Ok(())
}

pub fn validate_client_input(input: &ClientCreateInput) -> Result<(), ValidationError> {
    require_text(&input.display_name, "Display name", MAX_TITLE_LENGTH)?;

    let email = input.email.trim();
    if email.is_empty() {
        return Err(ValidationError::EmptyField("Email"));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(ValidationError::InvalidEmail(email.to_string())),
    }
}

pub fn validate_delivery_input(input: &DeliveryCreateInput) -> Result<(), ValidationError> {
    require_text(&input.client_id, "Client", MAX_TITLE_LENGTH)?;
    require_text(&input.title, "Title", MAX_TITLE_LENGTH)?;
    require_text(&input.document_type, "Document type", MAX_TITLE_LENGTH)?;
    validate_file_reference(&input.file_url, input.file_size)
}

/// A revision needs a non-blank description and at least one reason, enumerated or custom
pub fn validate_revision_input(input: &RevisionRequestInput) -> Result<(), ValidationError> {
    let has_custom_reason = input
        .custom_reason
        .as_deref()
        .is_some_and(|reason| !reason.trim().is_empty());

    if input.reasons.is_empty() && !has_custom_reason {
        return Err(ValidationError::MissingReason);
    }

    require_text(&input.description, "Description", MAX_DESCRIPTION_LENGTH)?;

    if input.attachments.len() > MAX_ATTACHMENTS {
        return Err(ValidationError::TooManyAttachments(input.attachments.len()));
    }
    if input.attachments.iter().any(|a| a.trim().is_empty()) {
        return Err(ValidationError::EmptyField("Attachment reference"));
    }

    Ok(())
}

pub fn validate_fulfillment_input(input: &FulfillRevisionInput) -> Result<(), ValidationError> {
    validate_file_reference(&input.file_url, input.file_size)?;
    if let Some(title) = &input.title {
        require_text(title, "Title", MAX_TITLE_LENGTH)?;
    }
    if let Some(document_type) = &input.document_type {
        require_text(document_type, "Document type", MAX_TITLE_LENGTH)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RevisionReason;

    fn revision_input(reasons: Vec<RevisionReason>, description: &str) -> RevisionRequestInput {
        RevisionRequestInput {
            reasons,
            custom_reason: None,
            description: description.to_string(),
            attachments: vec![],
        }
    }

    #[test]
    fn test_revision_requires_reason() {
        let input = revision_input(vec![], "Typo in job title");
        assert_eq!(
            validate_revision_input(&input),
            Err(ValidationError::MissingReason)
        );
    }

    #[test]
    fn test_custom_reason_satisfies_reason_requirement() {
        let mut input = revision_input(vec![], "Typo in job title");
        input.custom_reason = Some("Wrong company name".to_string());
        assert!(validate_revision_input(&input).is_ok());

        input.custom_reason = Some("   ".to_string());
        assert_eq!(
            validate_revision_input(&input),
            Err(ValidationError::MissingReason)
        );
    }

    #[test]
    fn test_revision_requires_description() {
        let input = revision_input(vec![RevisionReason::SomethingIncorrect], "  \n ");
        assert_eq!(
            validate_revision_input(&input),
            Err(ValidationError::EmptyField("Description"))
        );
    }

    #[test]
    fn test_empty_reasons_and_description_rejected() {
        let input = revision_input(vec![], "");
        assert!(validate_revision_input(&input).is_err());
    }

    #[test]
    fn test_attachment_limits() {
        let mut input = revision_input(vec![RevisionReason::Other], "See attached");
        input.attachments = (0..11).map(|i| format!("files/{}.pdf", i)).collect();
        assert_eq!(
            validate_revision_input(&input),
            Err(ValidationError::TooManyAttachments(11))
        );

        input.attachments = vec!["".to_string()];
        assert!(validate_revision_input(&input).is_err());
    }

    #[test]
    fn test_file_reference() {
        assert!(validate_file_reference("files/resume.pdf", 1024).is_ok());
        assert!(validate_file_reference("files/empty.pdf", 0).is_ok());
        assert_eq!(
            validate_file_reference("", 10),
            Err(ValidationError::EmptyField("File reference"))
        );
        assert_eq!(
            validate_file_reference("files/resume.pdf", -1),
            Err(ValidationError::InvalidFileSize(-1))
        );
    }

    #[test]
    fn test_client_email() {
        let mut input = ClientCreateInput {
            display_name: "Dana Whitfield".to_string(),
            email: "dana@example.com".to_string(),
            ..Default::default()
        };
        assert!(validate_client_input(&input).is_ok());

        input.email = "dana.example.com".to_string();
        assert!(matches!(
            validate_client_input(&input),
            Err(ValidationError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_title_length() {
        let input = DeliveryCreateInput {
            client_id: "client-1".to_string(),
            title: "x".repeat(MAX_TITLE_LENGTH + 1),
            document_type: "resume".to_string(),
            file_url: "files/resume.pdf".to_string(),
            file_size: 10,
        };
        assert_eq!(
            validate_delivery_input(&input),
            Err(ValidationError::TooLong {
                field: "Title",
                max: MAX_TITLE_LENGTH
            })
        );
    }

    #[test]
    fn test_fulfillment_rejects_blank_title() {
        let mut input = FulfillRevisionInput {
            file_url: "files/resume-v2.pdf".to_string(),
            file_size: 4096,
            title: None,
            document_type: None,
        };
        assert!(validate_fulfillment_input(&input).is_ok());

        input.title = Some("   ".to_string());
        assert_eq!(
            validate_fulfillment_input(&input),
            Err(ValidationError::EmptyField("Title"))
        );

        input.title = None;
        input.file_size = -1;
        assert_eq!(
            validate_fulfillment_input(&input),
            Err(ValidationError::InvalidFileSize(-1))
        );
    }
}
