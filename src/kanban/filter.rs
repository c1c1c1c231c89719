use chrono::NaiveDate;

/// Follow-up bucket filter, evaluated by the lead service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FollowUpFilter {
    #[default]
    All,
    Today,
    Overdue,
    Soon,
    Planned,
    None,
}

impl FollowUpFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            FollowUpFilter::All => "all",
            FollowUpFilter::Today => "today",
            FollowUpFilter::Overdue => "overdue",
            FollowUpFilter::Soon => "soon",
            FollowUpFilter::Planned => "planned",
            FollowUpFilter::None => "none",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "all" => Some(FollowUpFilter::All),
            "today" => Some(FollowUpFilter::Today),
            "overdue" => Some(FollowUpFilter::Overdue),
            "soon" => Some(FollowUpFilter::Soon),
            "planned" => Some(FollowUpFilter::Planned),
            "none" => Some(FollowUpFilter::None),
            _ => None,
        }
    }
}

/// Query applied to every board load and reload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KanbanFilter {
    pub search: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub operator: Option<i64>,
    pub follow_up: FollowUpFilter,
}

impl KanbanFilter {
    /// Query parameters for `GET /leads/kanban/`; unset filters are omitted
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            params.push(("search", search.to_string()));
        }
        if let Some(from) = self.date_from {
            params.push(("date_from", from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = self.date_to {
            params.push(("date_to", to.format("%Y-%m-%d").to_string()));
        }
        if let Some(operator) = self.operator {
            params.push(("operator", operator.to_string()));
        }
        if self.follow_up != FollowUpFilter::All {
            params.push(("follow_up", self.follow_up.as_str().to_string()));
        }
        params
    }
}
