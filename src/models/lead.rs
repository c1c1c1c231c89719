use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use chrono::{DateTime, FixedOffset, TimeZone};
use std::fmt;
use crate::models::StageId;
use crate::utils::date::{days_until, deserialize_opt_timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeadId(pub i64);

impl fmt::Display for LeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Outcome of the last call to the lead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Answered,
    NotAnswered,
    ClientAnswered,
    ClientNotAnswered,
    #[serde(other)]
    Unknown,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Answered => "answered",
            CallStatus::NotAnswered => "not_answered",
            CallStatus::ClientAnswered => "client_answered",
            CallStatus::ClientNotAnswered => "client_not_answered",
            CallStatus::Unknown => "unknown",
        }
    }

    /// Parse user input; `Unknown` is never produced here
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "answered" => Some(CallStatus::Answered),
            "not_answered" => Some(CallStatus::NotAnswered),
            "client_answered" => Some(CallStatus::ClientAnswered),
            "client_not_answered" => Some(CallStatus::ClientNotAnswered),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CallStatus::Answered => "Answered",
            CallStatus::NotAnswered => "Not answered",
            CallStatus::ClientAnswered => "Client answered",
            CallStatus::ClientNotAnswered => "Client did not answer",
            CallStatus::Unknown => "",
        }
    }
}

/// How close a lead's follow-up is, in whole days (rounded up)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUpUrgency {
    Overdue(i64),
    Today,
    Soon(i64),
    Planned(i64),
}

impl FollowUpUrgency {
    pub fn from_days(days: i64) -> Self {
        match days {
            d if d < 0 => FollowUpUrgency::Overdue(-d),
            0 => FollowUpUrgency::Today,
            d if d <= 3 => FollowUpUrgency::Soon(d),
            d => FollowUpUrgency::Planned(d),
        }
    }

    pub fn label(&self) -> String {
        match self {
            FollowUpUrgency::Overdue(days) => format!("{} days overdue!", days),
            FollowUpUrgency::Today => "Today!".to_string(),
            FollowUpUrgency::Soon(days) | FollowUpUrgency::Planned(days) => format!("{} days left", days),
        }
    }
}

/// A prospective client tracked through the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    pub stage: StageId,
    #[serde(default)]
    pub is_converted: bool,
    #[serde(default)]
    pub is_considering: bool,
    #[serde(default, deserialize_with = "deserialize_opt_timestamp")]
    pub follow_up_date: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub call_status: Option<CallStatus>,
    #[serde(default, deserialize_with = "deserialize_opt_timestamp")]
    pub created_at: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub source_form: Option<i64>,
    /// Backend fields this client does not interpret, kept for round-trips
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Lead {
    pub fn display_name(&self) -> &str {
        match self.client_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => "Unknown",
        }
    }

    /// Copy of this lead assigned to another stage
    pub fn with_stage(&self, stage: StageId) -> Lead {
        Lead { stage, ..self.clone() }
    }

    pub fn follow_up_urgency<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<FollowUpUrgency> {
        self.follow_up_date
            .as_ref()
            .map(|date| FollowUpUrgency::from_days(days_until(date, now)))
    }
}

/// Body for lead create (POST) and full update (PUT)
#[derive(Debug, Clone, Default, Serialize)]
pub struct LeadDraft {
    pub client_name: String,
    pub phone_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<StageId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up_date: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_status: Option<CallStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_considering: Option<bool>,
}

/// Partial update (PATCH). Only fields that are set are sent;
/// `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LeadPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<StageId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up_date: Option<Option<DateTime<FixedOffset>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_status: Option<Option<CallStatus>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_considering: Option<bool>,
}

impl LeadPatch {
    /// The stage-transition patch: carries only the new stage
    pub fn stage(stage: StageId) -> Self {
        LeadPatch { stage: Some(stage), ..Default::default() }
    }

    pub fn is_empty(&self) -> bool {
        *self == LeadPatch::default()
    }
}
