// ABOUTME: Delivery state machine and revision request workflow
// ABOUTME: Each transition is one store transaction; notifications go out after commit

use chrono::Utc;
use engage_config::DeliverySettings;
use engage_core::{
    add_business_days, validate_delivery_input, validate_fulfillment_input,
    validate_revision_input, Delivery, DeliveryCreateInput, DeliveryStatus, DeliveryVersion,
    FulfillRevisionInput, Outcome, RevisionRequest, RevisionRequestInput, RevisionStatus,
};
use engage_notifications::{EventType, NotificationEvent, Notifier};
use engage_storage::deliveries::FulfillmentWrite;
use engage_storage::{clients, deliveries, revisions, DeliverableStore, StorageError};
use serde_json::json;
use tracing::{debug, info};

use crate::error::{DeliveryError, DeliveryResult};
use crate::versioning::next_revision_title;

#[derive(Clone)]
pub struct DeliveryService {
    store: DeliverableStore,
    notifier: Notifier,
    settings: DeliverySettings,
}

impl DeliveryService {
    pub fn new(store: DeliverableStore, notifier: Notifier, settings: DeliverySettings) -> Self {
        Self {
            store,
            notifier,
            settings,
        }
    }

    /// Create a delivery in `delivered` and announce it
    pub async fn submit_for_review(
        &self,
        input: DeliveryCreateInput,
    ) -> DeliveryResult<Outcome<Delivery>> {
        validate_delivery_input(&input)?;

        let mut tx = self.store.begin().await?;
        // Surface a missing client as NotFound rather than a foreign key failure
        clients::get_client(&mut tx, &input.client_id).await?;
        let delivery = deliveries::insert_delivery(&mut tx, &input).await?;
        clients::append_history(
            &mut tx,
            &delivery.client_id,
            EventType::DeliveryReady.as_str(),
            Some(&delivery.title),
        )
        .await?;
        tx.commit().await.map_err(StorageError::from)?;

        info!(
            "Delivered {} ({}) to client {}",
            delivery.id, delivery.title, delivery.client_id
        );

        let warning = self
            .notifier
            .notify(NotificationEvent::new(
                EventType::DeliveryReady,
                &delivery.id,
                &delivery.client_id,
                json!({
                    "title": delivery.title,
                    "document_type": delivery.document_type,
                    "file_url": delivery.file_url,
                    "version": delivery.current_version,
                }),
            ))
            .await;

        Ok(Outcome::new(delivery).with_warning(warning))
    }

    /// delivered -> approved. Approving the client's last outstanding delivery also prompts
    /// for a testimonial.
    pub async fn approve(&self, delivery_id: &str) -> DeliveryResult<Outcome<Delivery>> {
        let mut tx = self.store.begin().await?;
        let delivery = deliveries::approve_delivery(&mut tx, delivery_id, Utc::now()).await?;
        let remaining = deliveries::count_unapproved(&mut tx, &delivery.client_id).await?;
        clients::append_history(
            &mut tx,
            &delivery.client_id,
            EventType::DeliveryApproved.as_str(),
            Some(&delivery.title),
        )
        .await?;
        tx.commit().await.map_err(StorageError::from)?;

        info!(
            "Delivery {} approved, {} outstanding for client {}",
            delivery.id, remaining, delivery.client_id
        );

        let mut events = vec![NotificationEvent::new(
            EventType::DeliveryApproved,
            &delivery.id,
            &delivery.client_id,
            json!({ "title": delivery.title }),
        )];
        if remaining == 0 {
            events.push(NotificationEvent::new(
                EventType::TestimonialPrompt,
                &delivery.id,
                &delivery.client_id,
                json!({ "last_approved_title": delivery.title }),
            ));
        }

        let mut outcome = Outcome::new(delivery);
        for warning in self.notifier.notify_all(events).await {
            outcome.push_warning(warning);
        }
        Ok(outcome)
    }

    /// delivered -> revision_requested, opening a pending revision request
    pub async fn request_revision(
        &self,
        delivery_id: &str,
        input: RevisionRequestInput,
    ) -> DeliveryResult<Outcome<RevisionRequest>> {
        validate_revision_input(&input)?;

        let mut tx = self.store.begin().await?;
        let delivery = deliveries::get_delivery(&mut tx, delivery_id).await?;
        let client = clients::get_client(&mut tx, &delivery.client_id).await?;

        deliveries::mark_revision_requested(&mut tx, delivery_id).await?;

        let sla_days = if client.is_rush {
            self.settings.rush_revision_sla_business_days
        } else {
            self.settings.revision_sla_business_days
        };
        let due_date = add_business_days(Utc::now(), sla_days);

        let revision =
            revisions::insert_revision(&mut tx, delivery_id, &client.id, &input, due_date).await?;
        clients::append_history(
            &mut tx,
            &client.id,
            EventType::RevisionRequested.as_str(),
            Some(&delivery.title),
        )
        .await?;
        tx.commit().await.map_err(StorageError::from)?;

        info!(
            "Revision {} requested for delivery {}, due {}",
            revision.id, delivery_id, revision.due_date
        );

        let reasons: Vec<&str> = revision.reasons.iter().map(|r| r.label()).collect();
        let warning = self
            .notifier
            .notify(NotificationEvent::new(
                EventType::RevisionRequested,
                delivery_id,
                &client.id,
                json!({
                    "revision_request_id": revision.id,
                    "reasons": reasons,
                    "custom_reason": revision.custom_reason,
                    "due_date": revision.due_date,
                    "is_rush": client.is_rush,
                }),
            ))
            .await;

        Ok(Outcome::new(revision).with_warning(warning))
    }

    /// Deliver new content for a revision request.
    ///
    /// The delivery gets a versioned title and the new file in place, returns to `delivered`,
    /// and the request is completed whatever its current status. Both records change in one
    /// transaction or not at all.
    pub async fn fulfill_revision(
        &self,
        revision_request_id: &str,
        input: FulfillRevisionInput,
    ) -> DeliveryResult<Outcome<Delivery>> {
        validate_fulfillment_input(&input)?;

        let mut tx = self.store.begin().await?;
        let revision = revisions::get_revision(&mut tx, revision_request_id).await?;
        if !revision.status.is_open() {
            return Err(DeliveryError::ConflictingState(format!(
                "revision request {} is already completed",
                revision.id
            )));
        }

        let current = deliveries::get_delivery(&mut tx, &revision.delivery_id).await?;
        if current.status != DeliveryStatus::RevisionRequested {
            return Err(DeliveryError::ConflictingState(format!(
                "delivery {} is {}, expected {}",
                current.id,
                current.status,
                DeliveryStatus::RevisionRequested
            )));
        }

        let other_titles = deliveries::list_titles_in_scope(
            &mut tx,
            self.settings.versioning_scope,
            &current.client_id,
            &current.id,
        )
        .await?;
        let source_title = input.title.as_deref().unwrap_or(&current.title);
        let title = next_revision_title(source_title, other_titles.iter().map(String::as_str));
        debug!("Versioned title for {}: {}", current.id, title);

        let completed = revisions::update_revision_status(
            &mut tx,
            &revision.id,
            revision.status,
            RevisionStatus::Completed,
        )
        .await?;

        let write = FulfillmentWrite {
            title: &title,
            file_url: &input.file_url,
            file_size: input.file_size,
            document_type: input.document_type.as_deref(),
            revision_request_id: &completed.id,
        };
        let delivery = deliveries::apply_fulfillment(&mut tx, &current.id, &write).await?;

        clients::append_history(
            &mut tx,
            &delivery.client_id,
            EventType::RevisionCompleted.as_str(),
            Some(&delivery.title),
        )
        .await?;
        tx.commit().await.map_err(StorageError::from)?;

        info!(
            "Revision {} fulfilled: delivery {} is now {} (version {})",
            completed.id, delivery.id, delivery.title, delivery.current_version
        );

        let warning = self
            .notifier
            .notify(NotificationEvent::new(
                EventType::RevisionCompleted,
                &delivery.id,
                &delivery.client_id,
                json!({
                    "revision_request_id": completed.id,
                    "title": delivery.title,
                    "file_url": delivery.file_url,
                    "version": delivery.current_version,
                }),
            ))
            .await;

        Ok(Outcome::new(delivery).with_warning(warning))
    }

    /// Staff-driven revision status change: pending -> in_progress -> completed, or
    /// pending -> completed
    pub async fn advance_revision(
        &self,
        revision_request_id: &str,
        next: RevisionStatus,
    ) -> DeliveryResult<Outcome<RevisionRequest>> {
        let mut tx = self.store.begin().await?;
        let revision = revisions::get_revision(&mut tx, revision_request_id).await?;

        if !revision.status.can_advance_to(next) {
            return Err(DeliveryError::InvalidTransition {
                id: revision.id,
                from: revision.status,
                to: next,
            });
        }

        let updated =
            revisions::update_revision_status(&mut tx, &revision.id, revision.status, next).await?;
        clients::append_history(
            &mut tx,
            &updated.client_id,
            &format!("revision_{}", next.as_str()),
            Some(&updated.id),
        )
        .await?;
        tx.commit().await.map_err(StorageError::from)?;

        info!(
            "Revision {} advanced {} -> {}",
            updated.id, revision.status, updated.status
        );

        let mut outcome = Outcome::new(updated);
        if next == RevisionStatus::Completed {
            let warning = self
                .notifier
                .notify(NotificationEvent::new(
                    EventType::RevisionCompleted,
                    &outcome.value.delivery_id,
                    &outcome.value.client_id,
                    json!({ "revision_request_id": outcome.value.id }),
                ))
                .await;
            outcome = outcome.with_warning(warning);
        }
        Ok(outcome)
    }

    pub async fn get_delivery(&self, delivery_id: &str) -> DeliveryResult<Delivery> {
        let mut conn = self.store.acquire().await?;
        Ok(deliveries::get_delivery(&mut conn, delivery_id).await?)
    }

    pub async fn list_client_deliveries(&self, client_id: &str) -> DeliveryResult<Vec<Delivery>> {
        let mut conn = self.store.acquire().await?;
        Ok(deliveries::list_deliveries_for_client(&mut conn, client_id).await?)
    }

    pub async fn list_delivery_versions(
        &self,
        delivery_id: &str,
    ) -> DeliveryResult<Vec<DeliveryVersion>> {
        let mut conn = self.store.acquire().await?;
        deliveries::get_delivery(&mut conn, delivery_id).await?;
        Ok(deliveries::list_versions(&mut conn, delivery_id).await?)
    }

    pub async fn get_revision_request(
        &self,
        revision_request_id: &str,
    ) -> DeliveryResult<RevisionRequest> {
        let mut conn = self.store.acquire().await?;
        Ok(revisions::get_revision(&mut conn, revision_request_id).await?)
    }

    pub async fn list_delivery_revisions(
        &self,
        delivery_id: &str,
    ) -> DeliveryResult<Vec<RevisionRequest>> {
        let mut conn = self.store.acquire().await?;
        Ok(revisions::list_revisions_for_delivery(&mut conn, delivery_id).await?)
    }

    /// All pending and in-progress revision requests for a client, soonest due first
    pub async fn list_open_revisions_for_client(
        &self,
        client_id: &str,
    ) -> DeliveryResult<Vec<RevisionRequest>> {
        let mut conn = self.store.acquire().await?;
        Ok(revisions::list_open_revisions_for_client(&mut conn, client_id).await?)
    }
}
