use serde_json::{Map, Value};
use thiserror::Error;
use crate::kanban::{IgnoreReason, KanbanFilter, KanbanStore, Notification, Notifier, Settlement};
use crate::models::{Lead, LeadId, StageId, Statistics};
use crate::service::{LeadService, ServiceError};

pub const MOVE_SUCCESS_MESSAGE: &str = "Lead stage changed";
pub const MOVE_FAILURE_MESSAGE: &str = "Update failed, change reverted";
pub const CONVERT_SUCCESS_MESSAGE: &str = "Lead converted to client";
pub const CONVERT_FAILURE_MESSAGE: &str = "Conversion failed";

/// Result of a drop or a whole move
#[derive(Debug)]
pub enum MoveOutcome {
    /// Nothing changed and no request was sent
    Ignored(IgnoreReason),
    /// The service accepted the new stage
    Committed(Lead),
    /// The service rejected the update; the board was restored
    RolledBack(ServiceError),
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Lead {0} has already been converted")]
    AlreadyConverted(LeadId),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Drives a [`KanbanStore`] against the lead service: loads and reloads the
/// board, runs the optimistic move protocol, and reports outcomes through a
/// [`Notifier`].
pub struct KanbanController<'a, S: LeadService + ?Sized, N: Notifier> {
    service: &'a S,
    notifier: N,
    store: KanbanStore,
    filter: KanbanFilter,
}

impl<'a, S: LeadService + ?Sized, N: Notifier> KanbanController<'a, S, N> {
    pub fn new(service: &'a S, notifier: N, filter: KanbanFilter) -> Self {
        Self {
            service,
            notifier,
            store: KanbanStore::new(),
            filter,
        }
    }

    pub fn store(&self) -> &KanbanStore {
        &self.store
    }

    pub fn filter(&self) -> &KanbanFilter {
        &self.filter
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Change the filter and reload with it
    pub fn apply_filter(&mut self, filter: KanbanFilter) -> Result<(), ServiceError> {
        self.filter = filter;
        self.load()
    }

    /// Full reload of board and statistics.
    ///
    /// A board failure leaves the current board in place. Statistics are
    /// optional: if they fail the board still loads with zeroed counters.
    pub fn load(&mut self) -> Result<(), ServiceError> {
        let board = match self.service.kanban(&self.filter) {
            Ok(board) => board,
            Err(err) => {
                log::error!("Failed to load board: {}", err);
                return Err(err);
            }
        };
        let statistics = self.service.statistics().unwrap_or_else(|err| {
            log::warn!("Failed to load lead statistics: {}", err);
            Statistics::default()
        });
        log::debug!("Loaded board: {} stages, {} leads", board.columns.len(), board.lead_count());
        self.store.replace(board, statistics);
        Ok(())
    }

    /// Start dragging the lead with `lead_id` as currently shown on the board
    pub fn begin_drag(&mut self, lead_id: LeadId) -> Result<(), IgnoreReason> {
        let lead = self.store.board()
            .find_lead(lead_id)
            .cloned()
            .ok_or(IgnoreReason::UnknownLead)?;
        if self.store.begin_drag(&lead) {
            Ok(())
        } else {
            Err(IgnoreReason::Converted)
        }
    }

    /// Drop the dragged lead on `target` and settle the update
    pub fn drop_on(&mut self, target: StageId) -> MoveOutcome {
        let pending = match self.store.drop_on(target) {
            Ok(pending) => pending,
            Err(reason) => {
                log::debug!("Drop on stage {} ignored: {}", target, reason);
                return MoveOutcome::Ignored(reason);
            }
        };

        let lead_id = pending.lead_id();
        let source = pending.source();
        let result = self.service.patch_lead(lead_id, &pending.patch());

        match self.store.settle(pending, result) {
            Settlement::Confirmed(lead) => {
                log::info!("Lead {} moved from stage {} to {}", lead_id, source, target);
                self.notifier.notify(Notification::success(MOVE_SUCCESS_MESSAGE));
                // Authoritative refresh; a failure here keeps the optimistic board
                if let Err(err) = self.load() {
                    log::warn!("Reload after moving lead {} failed: {}", lead_id, err);
                }
                MoveOutcome::Committed(lead)
            }
            Settlement::Reverted(err) => {
                log::warn!("Moving lead {} to stage {} failed, reverted: {}", lead_id, target, err);
                self.notifier.notify(Notification::error(MOVE_FAILURE_MESSAGE));
                MoveOutcome::RolledBack(err)
            }
        }
    }

    pub fn end_drag(&mut self) {
        self.store.end_drag();
    }

    /// Drag `lead_id`, drop it on `target`, end the drag
    pub fn move_lead(&mut self, lead_id: LeadId, target: StageId) -> MoveOutcome {
        if let Err(reason) = self.begin_drag(lead_id) {
            return MoveOutcome::Ignored(reason);
        }
        let outcome = self.drop_on(target);
        self.end_drag();
        outcome
    }

    /// Convert a lead into a client and reload.
    /// Leads missing from the (possibly filtered) board are fetched first.
    pub fn convert(&mut self, lead_id: LeadId, data: &Map<String, Value>) -> Result<Value, ConvertError> {
        let lead = match self.store.board().find_lead(lead_id) {
            Some(lead) => lead.clone(),
            None => self.service.get_lead(lead_id)?,
        };
        if lead.is_converted {
            return Err(ConvertError::AlreadyConverted(lead_id));
        }

        match self.service.convert_lead(lead_id, data) {
            Ok(result) => {
                log::info!("Lead {} converted", lead_id);
                self.notifier.notify(Notification::success(CONVERT_SUCCESS_MESSAGE));
                if let Err(err) = self.load() {
                    log::warn!("Reload after converting lead {} failed: {}", lead_id, err);
                }
                Ok(result)
            }
            Err(err) => {
                self.notifier.notify(Notification::error(CONVERT_FAILURE_MESSAGE));
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use serde_json::json;
    use crate::kanban::{NotificationLevel, RecordingNotifier};
    use crate::models::{Board, LeadDraft, LeadPatch, Stage, StageDraft, StageOrder};

    /// In-memory lead service with switchable failures
    struct FakeService {
        board: RefCell<Board>,
        fail_patch: Cell<bool>,
        fail_kanban: Cell<bool>,
        fail_statistics: Cell<bool>,
        kanban_calls: Cell<usize>,
        patches: RefCell<Vec<(LeadId, LeadPatch)>>,
        conversions: RefCell<Vec<LeadId>>,
    }

    impl FakeService {
        fn new(board: serde_json::Value) -> Self {
            FakeService {
                board: RefCell::new(serde_json::from_value(board).unwrap()),
                fail_patch: Cell::new(false),
                fail_kanban: Cell::new(false),
                fail_statistics: Cell::new(false),
                kanban_calls: Cell::new(0),
                patches: RefCell::new(Vec::new()),
                conversions: RefCell::new(Vec::new()),
            }
        }

        fn rejection(method: &str, path: String) -> ServiceError {
            ServiceError::Status { method: method.to_string(), path, status: 400, body: "rejected".to_string() }
        }

        fn unsupported() -> ServiceError {
            ServiceError::Status { method: "GET".to_string(), path: "/".to_string(), status: 501, body: String::new() }
        }
    }

    impl LeadService for FakeService {
        fn kanban(&self, _filter: &KanbanFilter) -> Result<Board, ServiceError> {
            self.kanban_calls.set(self.kanban_calls.get() + 1);
            if self.fail_kanban.get() {
                return Err(Self::rejection("GET", "/leads/kanban/".to_string()));
            }
            Ok(self.board.borrow().clone())
        }

        fn statistics(&self) -> Result<Statistics, ServiceError> {
            if self.fail_statistics.get() {
                return Err(Self::rejection("GET", "/leads/statistics/".to_string()));
            }
            Ok(Statistics { total: self.board.borrow().lead_count() as u64, ..Default::default() })
        }

        fn list_leads(&self, _search: Option<&str>) -> Result<Vec<Lead>, ServiceError> {
            Err(Self::unsupported())
        }

        fn get_lead(&self, id: LeadId) -> Result<Lead, ServiceError> {
            self.board.borrow().find_lead(id).cloned().ok_or(ServiceError::Status {
                method: "GET".to_string(),
                path: format!("/leads/{}/", id),
                status: 404,
                body: "not found".to_string(),
            })
        }

        fn create_lead(&self, _draft: &LeadDraft) -> Result<Lead, ServiceError> {
            Err(Self::unsupported())
        }

        fn update_lead(&self, _id: LeadId, _draft: &LeadDraft) -> Result<Lead, ServiceError> {
            Err(Self::unsupported())
        }

        fn patch_lead(&self, id: LeadId, patch: &LeadPatch) -> Result<Lead, ServiceError> {
            self.patches.borrow_mut().push((id, patch.clone()));
            if self.fail_patch.get() {
                return Err(Self::rejection("PATCH", format!("/leads/{}/", id)));
            }
            let target = patch.stage.unwrap();
            let mut board = self.board.borrow_mut();
            let lead = board.find_lead(id).unwrap().clone();
            board.relocate(&lead, target);
            Ok(lead.with_stage(target))
        }

        fn delete_lead(&self, _id: LeadId) -> Result<(), ServiceError> {
            Err(Self::unsupported())
        }

        fn convert_lead(&self, id: LeadId, _data: &Map<String, Value>) -> Result<Value, ServiceError> {
            self.conversions.borrow_mut().push(id);
            Ok(json!({"client_id": 100 + id.0}))
        }

        fn list_stages(&self) -> Result<Vec<Stage>, ServiceError> {
            Ok(self.board.borrow().stages().cloned().collect())
        }

        fn create_stage(&self, _draft: &StageDraft) -> Result<Stage, ServiceError> {
            Err(Self::unsupported())
        }

        fn update_stage(&self, _id: StageId, _draft: &StageDraft) -> Result<Stage, ServiceError> {
            Err(Self::unsupported())
        }

        fn delete_stage(&self, _id: StageId) -> Result<(), ServiceError> {
            Err(Self::unsupported())
        }

        fn reorder_stages(&self, _orders: &[StageOrder]) -> Result<(), ServiceError> {
            Err(Self::unsupported())
        }
    }

    fn example_service() -> FakeService {
        FakeService::new(json!([
            {"id": 1, "name": "A", "items": [{"id": 1, "client_name": "L1", "stage": 1}]},
            {"id": 2, "name": "B", "items": [{"id": 2, "client_name": "L2", "stage": 2, "is_converted": true}]}
        ]))
    }

    fn stage_of(controller: &KanbanController<FakeService, RecordingNotifier>, lead: i64) -> StageId {
        controller.store().board().find_lead(LeadId(lead)).unwrap().stage
    }

    #[test]
    fn test_load_fills_store() {
        let service = example_service();
        let mut controller = KanbanController::new(&service, RecordingNotifier::default(), KanbanFilter::default());
        controller.load().unwrap();

        assert_eq!(controller.store().board().columns.len(), 2);
        assert_eq!(controller.store().statistics().total, 2);
    }

    #[test]
    fn test_statistics_failure_still_loads_board() {
        let service = example_service();
        service.fail_statistics.set(true);
        let mut controller = KanbanController::new(&service, RecordingNotifier::default(), KanbanFilter::default());

        controller.load().unwrap();
        assert_eq!(controller.store().board().lead_count(), 2);
        assert_eq!(controller.store().statistics(), Statistics::default());
    }

    #[test]
    fn test_board_failure_keeps_previous_board() {
        let service = example_service();
        let mut controller = KanbanController::new(&service, RecordingNotifier::default(), KanbanFilter::default());
        controller.load().unwrap();

        service.fail_kanban.set(true);
        assert!(controller.load().is_err());
        assert_eq!(controller.store().board().lead_count(), 2);
    }

    #[test]
    fn test_successful_move_notifies_and_reloads() {
        let service = example_service();
        let mut controller = KanbanController::new(&service, RecordingNotifier::default(), KanbanFilter::default());
        controller.load().unwrap();
        assert_eq!(service.kanban_calls.get(), 1);

        let outcome = controller.move_lead(LeadId(1), StageId(2));

        assert!(matches!(outcome, MoveOutcome::Committed(ref lead) if lead.stage == StageId(2)));
        assert_eq!(service.kanban_calls.get(), 2, "a full reload follows the update");
        assert_eq!(*service.patches.borrow(), vec![(LeadId(1), LeadPatch::stage(StageId(2)))]);
        assert_eq!(
            controller.notifier().notifications,
            vec![Notification::success(MOVE_SUCCESS_MESSAGE)]
        );
        assert_eq!(stage_of(&controller, 1), StageId(2));
        assert!(!controller.store().is_dragging());
    }

    #[test]
    fn test_rejected_move_rolls_back() {
        let service = example_service();
        service.fail_patch.set(true);
        let mut controller = KanbanController::new(&service, RecordingNotifier::default(), KanbanFilter::default());
        controller.load().unwrap();
        let before = controller.store().board().clone();

        let outcome = controller.move_lead(LeadId(1), StageId(2));

        assert!(matches!(outcome, MoveOutcome::RolledBack(ServiceError::Status { status: 400, .. })));
        assert_eq!(controller.store().board(), &before);
        assert_eq!(service.kanban_calls.get(), 1, "no reload after a rollback");
        let notes = &controller.notifier().notifications;
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, NotificationLevel::Error);
        assert_eq!(notes[0].message, MOVE_FAILURE_MESSAGE);
    }

    #[test]
    fn test_same_stage_move_sends_nothing() {
        let service = example_service();
        let mut controller = KanbanController::new(&service, RecordingNotifier::default(), KanbanFilter::default());
        controller.load().unwrap();

        let outcome = controller.move_lead(LeadId(1), StageId(1));

        assert!(matches!(outcome, MoveOutcome::Ignored(IgnoreReason::SameStage)));
        assert!(service.patches.borrow().is_empty());
        assert!(controller.notifier().notifications.is_empty());
        assert!(!controller.store().is_dragging());
    }

    #[test]
    fn test_converted_lead_cannot_move() {
        let service = example_service();
        let mut controller = KanbanController::new(&service, RecordingNotifier::default(), KanbanFilter::default());
        controller.load().unwrap();

        assert_eq!(controller.begin_drag(LeadId(2)), Err(IgnoreReason::Converted));
        assert!(matches!(controller.drop_on(StageId(1)), MoveOutcome::Ignored(IgnoreReason::NotDragging)));
        assert!(service.patches.borrow().is_empty());
        assert_eq!(stage_of(&controller, 2), StageId(2));
    }

    #[test]
    fn test_unknown_lead_is_ignored() {
        let service = example_service();
        let mut controller = KanbanController::new(&service, RecordingNotifier::default(), KanbanFilter::default());
        controller.load().unwrap();

        assert!(matches!(
            controller.move_lead(LeadId(99), StageId(2)),
            MoveOutcome::Ignored(IgnoreReason::UnknownLead)
        ));
    }

    #[test]
    fn test_convert() {
        let service = example_service();
        let mut controller = KanbanController::new(&service, RecordingNotifier::default(), KanbanFilter::default());
        controller.load().unwrap();

        let result = controller.convert(LeadId(1), &Map::new()).unwrap();
        assert_eq!(result, json!({"client_id": 101}));
        assert_eq!(*service.conversions.borrow(), vec![LeadId(1)]);
        assert_eq!(controller.notifier().notifications, vec![Notification::success(CONVERT_SUCCESS_MESSAGE)]);
        assert_eq!(service.kanban_calls.get(), 2);

        assert!(matches!(
            controller.convert(LeadId(2), &Map::new()),
            Err(ConvertError::AlreadyConverted(LeadId(2)))
        ));
        assert!(matches!(
            controller.convert(LeadId(42), &Map::new()),
            Err(ConvertError::Service(ref err)) if err.is_not_found()
        ));
        assert_eq!(service.conversions.borrow().len(), 1);
    }

    #[test]
    fn test_apply_filter_reloads() {
        let service = example_service();
        let mut controller = KanbanController::new(&service, RecordingNotifier::default(), KanbanFilter::default());
        let filter = KanbanFilter { search: Some("L1".to_string()), ..Default::default() };

        controller.apply_filter(filter.clone()).unwrap();
        assert_eq!(controller.filter(), &filter);
        assert_eq!(service.kanban_calls.get(), 1);
    }
}
