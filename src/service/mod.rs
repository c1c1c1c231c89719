//! Lead service collaborator
//!
//! [`LeadService`] is the REST surface the board and the CLI depend on.
//! [`HttpLeadService`] is the production implementation.

pub mod http;

pub use http::HttpLeadService;

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use crate::kanban::KanbanFilter;
use crate::models::{Board, Lead, LeadDraft, LeadId, LeadPatch, Stage, StageDraft, StageId, StageOrder, Statistics};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("cannot reach lead service at {url}: {message}")]
    Transport { url: String, message: String },
    #[error("{method} {path} failed with status {status}: {body}")]
    Status {
        method: String,
        path: String,
        status: u16,
        body: String,
    },
    #[error("unexpected response from {path}: {message}")]
    Decode { path: String, message: String },
}

impl ServiceError {
    /// HTTP status for rejected requests
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// List endpoints answer either with a bare array or a paginated envelope
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Paginated { results: Vec<T> },
    Plain(Vec<T>),
}

impl<T> Listing<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Paginated { results } => results,
            Listing::Plain(items) => items,
        }
    }
}

/// REST operations on leads and lead stages
pub trait LeadService {
    /// `GET /leads/kanban/`
    fn kanban(&self, filter: &KanbanFilter) -> Result<Board, ServiceError>;
    /// `GET /leads/statistics/`
    fn statistics(&self) -> Result<Statistics, ServiceError>;

    fn list_leads(&self, search: Option<&str>) -> Result<Vec<Lead>, ServiceError>;
    fn get_lead(&self, id: LeadId) -> Result<Lead, ServiceError>;
    fn create_lead(&self, draft: &LeadDraft) -> Result<Lead, ServiceError>;
    fn update_lead(&self, id: LeadId, draft: &LeadDraft) -> Result<Lead, ServiceError>;
    fn patch_lead(&self, id: LeadId, patch: &LeadPatch) -> Result<Lead, ServiceError>;
    fn delete_lead(&self, id: LeadId) -> Result<(), ServiceError>;
    /// `POST /leads/{id}/convert/`; the payload and answer are backend-defined
    fn convert_lead(&self, id: LeadId, data: &Map<String, Value>) -> Result<Value, ServiceError>;

    fn list_stages(&self) -> Result<Vec<Stage>, ServiceError>;
    fn create_stage(&self, draft: &StageDraft) -> Result<Stage, ServiceError>;
    fn update_stage(&self, id: StageId, draft: &StageDraft) -> Result<Stage, ServiceError>;
    fn delete_stage(&self, id: StageId) -> Result<(), ServiceError>;
    fn reorder_stages(&self, orders: &[StageOrder]) -> Result<(), ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_accepts_both_shapes() {
        let plain: Listing<i64> = serde_json::from_str("[1, 2, 3]").unwrap();
        assert_eq!(plain.into_vec(), vec![1, 2, 3]);

        let paged: Listing<i64> = serde_json::from_str(r#"{"count": 2, "next": null, "results": [4, 5]}"#).unwrap();
        assert_eq!(paged.into_vec(), vec![4, 5]);
    }

    #[test]
    fn test_status_error_message() {
        let err = ServiceError::Status {
            method: "PATCH".to_string(),
            path: "/leads/3/".to_string(),
            status: 403,
            body: "forbidden".to_string(),
        };
        assert_eq!(err.to_string(), "PATCH /leads/3/ failed with status 403: forbidden");
        assert_eq!(err.status(), Some(403));
        assert!(!err.is_not_found());
    }
}
