use super::{Carbure, CarbureError};
use crate::fetch::InvalidationBus;
use crate::screens::{BALANCES, OPERATIONS, TICKETS};
use log::*;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

/// Specify the kinds of operation that move quantities out of a balance.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationKind {
    Cession,
    Transfert,
    Export,
    Devaluation,
}

/// Payload of a new operation.
///
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OperationDraft {
    #[serde(rename = "type")]
    pub kind: OperationKind,
    pub biofuel: String,
    pub customs_category: String,
    pub quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credited_entity: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_depot: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_country: Option<String>,
}

/// Specify the writes a screen can trigger.
///
#[derive(Debug, Clone)]
pub enum Mutation {
    CreateOperation(OperationDraft),
    AcceptOperation { id: u64 },
    RejectOperation { id: u64 },
    DeleteOperation { id: u64 },
    AcceptTicket { id: u64 },
    RejectTicket { id: u64, comment: String },
}

impl Mutation {
    /// Cache keys whose lists are stale once the mutation succeeded.
    ///
    pub fn invalidates(&self) -> &'static [&'static str] {
        match self {
            Mutation::CreateOperation(_)
            | Mutation::AcceptOperation { .. }
            | Mutation::RejectOperation { .. }
            | Mutation::DeleteOperation { .. } => &[BALANCES, OPERATIONS],
            Mutation::AcceptTicket { .. } | Mutation::RejectTicket { .. } => &[TICKETS],
        }
    }

    fn path(&self) -> String {
        match self {
            Mutation::CreateOperation(_) => "/api/tiruert/operations/".to_owned(),
            Mutation::AcceptOperation { id } => format!("/api/tiruert/operations/{}/accept/", id),
            Mutation::RejectOperation { id } => format!("/api/tiruert/operations/{}/reject/", id),
            Mutation::DeleteOperation { id } => format!("/api/tiruert/operations/{}/delete/", id),
            Mutation::AcceptTicket { id } => format!("/api/saf/tickets/{}/accept/", id),
            Mutation::RejectTicket { id, .. } => format!("/api/saf/tickets/{}/reject/", id),
        }
    }

    fn body(&self, entity_id: u64) -> serde_json::Value {
        match self {
            Mutation::CreateOperation(draft) => {
                let mut body = json!(draft);
                body["entity_id"] = json!(entity_id);
                body
            }
            Mutation::RejectTicket { comment, .. } => {
                json!({ "entity_id": entity_id, "comment": comment })
            }
            _ => json!({ "entity_id": entity_id }),
        }
    }
}

/// Performs mutations on behalf of one entity and broadcasts the resulting
/// invalidations.
///
pub struct MutationHandler {
    api: Arc<Carbure>,
    bus: InvalidationBus,
    entity_id: u64,
}

impl MutationHandler {
    pub fn new(api: Arc<Carbure>, bus: InvalidationBus, entity_id: u64) -> Self {
        MutationHandler {
            api,
            bus,
            entity_id,
        }
    }

    /// Perform the mutation. On success every binding registered under one
    /// of its cache keys refreshes; on failure nothing is invalidated.
    ///
    pub async fn handle(&self, mutation: Mutation) -> Result<(), CarbureError> {
        debug!("Processing mutation '{:?}'...", mutation);
        let path = mutation.path();
        if let Err(e) = self
            .api
            .client()
            .post(&path, &mutation.body(self.entity_id))
            .await
        {
            error!("Mutation {} failed: {}", path, e);
            return Err(e);
        }
        let refreshed = self.bus.invalidate(mutation.invalidates());
        info!(
            "Mutation {} done, refreshing {:?} ({} list(s))",
            path,
            mutation.invalidates(),
            refreshed
        );
        Ok(())
    }
}
