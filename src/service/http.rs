use std::time::Duration;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Map, Value};
use ureq::http::Response;
use ureq::typestate::WithBody;
use ureq::{Agent, Body, RequestBuilder};
use crate::config::Settings;
use crate::kanban::KanbanFilter;
use crate::models::{Board, Lead, LeadDraft, LeadId, LeadPatch, Stage, StageDraft, StageId, StageOrder, Statistics};
use crate::service::{LeadService, Listing, ServiceError};

#[derive(Debug, Clone, Copy)]
enum BodyMethod {
    Post,
    Put,
    Patch,
}

impl BodyMethod {
    fn as_str(&self) -> &'static str {
        match self {
            BodyMethod::Post => "POST",
            BodyMethod::Put => "PUT",
            BodyMethod::Patch => "PATCH",
        }
    }
}

/// Blocking JSON client for the lead service
pub struct HttpLeadService {
    agent: Agent,
    base_url: String,
    token: Option<String>,
}

impl HttpLeadService {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        Self {
            agent: Agent::new_with_config(config),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.api_url, settings.token.clone(), settings.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Common headers: JSON accept, request id, bearer token if configured
    fn prepare<B>(&self, req: RequestBuilder<B>, method: &str, path: &str) -> RequestBuilder<B> {
        let request_id = uuid::Uuid::new_v4().to_string();
        log::debug!("{} {} (request {})", method, path, request_id);
        let req = req
            .header("Accept", "application/json")
            .header("X-Request-Id", request_id.as_str());
        match &self.token {
            Some(token) => req.header("Authorization", format!("Bearer {}", token).as_str()),
            None => req,
        }
    }

    fn body_request(&self, method: BodyMethod, path: &str) -> RequestBuilder<WithBody> {
        let url = self.url(path);
        let req = match method {
            BodyMethod::Post => self.agent.post(&url),
            BodyMethod::Put => self.agent.put(&url),
            BodyMethod::Patch => self.agent.patch(&url),
        };
        self.prepare(req, method.as_str(), path)
    }

    /// Turn transport failures and non-2xx statuses into errors
    fn check(
        &self,
        method: &str,
        path: &str,
        result: Result<Response<Body>, ureq::Error>,
    ) -> Result<Response<Body>, ServiceError> {
        let mut response = result.map_err(|e| ServiceError::Transport {
            url: self.url(path),
            message: e.to_string(),
        })?;
        let status = response.status();
        log::debug!("{} {} -> {}", method, path, status.as_u16());
        if status.is_success() {
            return Ok(response);
        }
        let body = response.body_mut().read_to_string().unwrap_or_default();
        log::warn!("{} {} rejected with status {}", method, path, status.as_u16());
        Err(ServiceError::Status {
            method: method.to_string(),
            path: path.to_string(),
            status: status.as_u16(),
            body: body.trim().to_string(),
        })
    }

    fn decode<T: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        result: Result<Response<Body>, ureq::Error>,
    ) -> Result<T, ServiceError> {
        let mut response = self.check(method, path, result)?;
        let text = response.body_mut().read_to_string().map_err(|e| ServiceError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        // Empty bodies (204) decode as null
        let text = if text.trim().is_empty() { "null" } else { text.as_str() };
        serde_json::from_str(text).map_err(|e| ServiceError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, ServiceError> {
        let mut req = self.prepare(self.agent.get(&self.url(path)), "GET", path);
        for (key, value) in query {
            req = req.query(*key, value);
        }
        let result = req.call();
        self.decode("GET", path, result)
    }

    fn send_json<T: DeserializeOwned, B: Serialize>(
        &self,
        method: BodyMethod,
        path: &str,
        body: &B,
    ) -> Result<T, ServiceError> {
        let result = self.body_request(method, path).send_json(body);
        self.decode(method.as_str(), path, result)
    }

    fn send_unit<B: Serialize>(&self, method: BodyMethod, path: &str, body: &B) -> Result<(), ServiceError> {
        let result = self.body_request(method, path).send_json(body);
        self.check(method.as_str(), path, result).map(|_| ())
    }

    fn delete(&self, path: &str) -> Result<(), ServiceError> {
        let result = self.prepare(self.agent.delete(&self.url(path)), "DELETE", path).call();
        self.check("DELETE", path, result).map(|_| ())
    }
}

impl LeadService for HttpLeadService {
    fn kanban(&self, filter: &KanbanFilter) -> Result<Board, ServiceError> {
        self.get_json("/leads/kanban/", &filter.to_query())
    }

    fn statistics(&self) -> Result<Statistics, ServiceError> {
        self.get_json("/leads/statistics/", &[])
    }

    fn list_leads(&self, search: Option<&str>) -> Result<Vec<Lead>, ServiceError> {
        let query: Vec<(&str, String)> = search
            .filter(|s| !s.trim().is_empty())
            .map(|s| vec![("search", s.to_string())])
            .unwrap_or_default();
        let listing: Listing<Lead> = self.get_json("/leads/", &query)?;
        Ok(listing.into_vec())
    }

    fn get_lead(&self, id: LeadId) -> Result<Lead, ServiceError> {
        self.get_json(&format!("/leads/{}/", id), &[])
    }

    fn create_lead(&self, draft: &LeadDraft) -> Result<Lead, ServiceError> {
        self.send_json(BodyMethod::Post, "/leads/", draft)
    }

    fn update_lead(&self, id: LeadId, draft: &LeadDraft) -> Result<Lead, ServiceError> {
        self.send_json(BodyMethod::Put, &format!("/leads/{}/", id), draft)
    }

    fn patch_lead(&self, id: LeadId, patch: &LeadPatch) -> Result<Lead, ServiceError> {
        self.send_json(BodyMethod::Patch, &format!("/leads/{}/", id), patch)
    }

    fn delete_lead(&self, id: LeadId) -> Result<(), ServiceError> {
        self.delete(&format!("/leads/{}/", id))
    }

    fn convert_lead(&self, id: LeadId, data: &Map<String, Value>) -> Result<Value, ServiceError> {
        self.send_json(BodyMethod::Post, &format!("/leads/{}/convert/", id), data)
    }

    fn list_stages(&self) -> Result<Vec<Stage>, ServiceError> {
        let listing: Listing<Stage> = self.get_json("/lead-stages/", &[])?;
        Ok(listing.into_vec())
    }

    fn create_stage(&self, draft: &StageDraft) -> Result<Stage, ServiceError> {
        self.send_json(BodyMethod::Post, "/lead-stages/", draft)
    }

    fn update_stage(&self, id: StageId, draft: &StageDraft) -> Result<Stage, ServiceError> {
        self.send_json(BodyMethod::Put, &format!("/lead-stages/{}/", id), draft)
    }

    fn delete_stage(&self, id: StageId) -> Result<(), ServiceError> {
        self.delete(&format!("/lead-stages/{}/", id))
    }

    fn reorder_stages(&self, orders: &[StageOrder]) -> Result<(), ServiceError> {
        self.send_unit(BodyMethod::Post, "/lead-stages/reorder/", &json!({ "orders": orders }))
    }
}
