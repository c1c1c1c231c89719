use serde::{Deserialize, Serialize};
use chrono::{DateTime, TimeZone};
use thiserror::Error;
use crate::models::{FollowUpUrgency, Lead, LeadId, Stage, StageId};
use crate::utils::fuzzy::find_near_matches;

/// Column whose cards can be narrowed to a single source form
pub const FORMS_COLUMN_NAME: &str = "formalar";

/// A stage together with the leads currently shown in it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    #[serde(flatten)]
    pub stage: Stage,
    #[serde(default)]
    pub items: Vec<Lead>,
}

impl Column {
    pub fn is_forms_column(&self) -> bool {
        self.stage.name.trim().to_lowercase() == FORMS_COLUMN_NAME
    }

    /// Items after the source-form filter (which only narrows the forms column)
    pub fn visible_items(&self, form_filter: Option<i64>) -> Vec<&Lead> {
        match form_filter {
            Some(form) if self.is_forms_column() => self.items
                .iter()
                .filter(|lead| lead.source_form == Some(form))
                .collect(),
            _ => self.items.iter().collect(),
        }
    }
}

/// Follow-up counts for the alert banner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FollowUpAlerts {
    pub overdue: usize,
    pub today: usize,
    pub soon: usize,
}

impl FollowUpAlerts {
    pub fn is_empty(&self) -> bool {
        self.overdue == 0 && self.today == 0 && self.soon == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageLookupError {
    #[error("Stage '{input}' not found{}", format_suggestions(.suggestions))]
    NotFound { input: String, suggestions: Vec<String> },
    #[error("Stage name '{0}' matches more than one stage; use the stage id instead")]
    Ambiguous(String),
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(". Did you mean: {}?", suggestions.join(", "))
    }
}

/// Resolve user input (stage id or case-insensitive name) against known stages
pub fn resolve_stage<'a, I>(stages: I, input: &str) -> Result<StageId, StageLookupError>
where
    I: IntoIterator<Item = &'a Stage>,
{
    let stages: Vec<&Stage> = stages.into_iter().collect();
    let input = input.trim();

    if let Ok(raw_id) = input.parse::<i64>() {
        if let Some(stage) = stages.iter().find(|s| s.id == StageId(raw_id)) {
            return Ok(stage.id);
        }
    }

    let by_name: Vec<&&Stage> = stages
        .iter()
        .filter(|s| s.name.eq_ignore_ascii_case(input))
        .collect();
    match by_name.as_slice() {
        [stage] => Ok(stage.id),
        [] => {
            let names: Vec<String> = stages.iter().map(|s| s.name.clone()).collect();
            let suggestions = find_near_matches(input, &names, 2)
                .into_iter()
                .map(|(name, _)| name)
                .collect();
            Err(StageLookupError::NotFound { input: input.to_string(), suggestions })
        }
        _ => Err(StageLookupError::Ambiguous(input.to_string())),
    }
}

/// The kanban board: stages in display order, each with its leads.
/// Rebuilt from the lead service on every full reload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    pub columns: Vec<Column>,
}

impl Board {
    pub fn new(columns: Vec<Column>) -> Self {
        Board { columns }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn stages(&self) -> impl Iterator<Item = &Stage> {
        self.columns.iter().map(|col| &col.stage)
    }

    pub fn column(&self, stage: StageId) -> Option<&Column> {
        self.columns.iter().find(|col| col.stage.id == stage)
    }

    pub fn contains_stage(&self, stage: StageId) -> bool {
        self.column(stage).is_some()
    }

    pub fn find_lead(&self, id: LeadId) -> Option<&Lead> {
        self.columns
            .iter()
            .flat_map(|col| col.items.iter())
            .find(|lead| lead.id == id)
    }

    pub fn lead_count(&self) -> usize {
        self.columns.iter().map(|col| col.items.len()).sum()
    }

    pub fn resolve_stage(&self, input: &str) -> Result<StageId, StageLookupError> {
        resolve_stage(self.stages(), input)
    }

    /// Drop `lead` (by id) from the column of its recorded stage and append
    /// a copy re-assigned to `target` at the end of the target column.
    pub(crate) fn relocate(&mut self, lead: &Lead, target: StageId) {
        let source = lead.stage;
        for col in self.columns.iter_mut() {
            if col.stage.id == source {
                col.items.retain(|item| item.id != lead.id);
            } else if col.stage.id == target {
                col.items.push(lead.with_stage(target));
            }
        }
    }

    pub fn follow_up_alerts<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> FollowUpAlerts {
        let mut alerts = FollowUpAlerts::default();
        for lead in self.columns.iter().flat_map(|col| col.items.iter()) {
            match lead.follow_up_urgency(now) {
                Some(FollowUpUrgency::Overdue(_)) => alerts.overdue += 1,
                Some(FollowUpUrgency::Today) => alerts.today += 1,
                Some(FollowUpUrgency::Soon(_)) => alerts.soon += 1,
                Some(FollowUpUrgency::Planned(_)) | None => {}
            }
        }
        alerts
    }
}
