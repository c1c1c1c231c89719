//! Kanban stage store
//!
//! Owns the in-memory board and the drag interaction. Every change goes
//! through a transition method:
//!
//! - `begin_drag` / `end_drag` move the interaction between idle and dragging
//! - `drop_on` applies the optimistic move and hands back a [`PendingMove`]
//!   describing the partial update the caller must send
//! - `settle` confirms or rolls back that move once the service answers
//! - `replace` installs an authoritative board after a reload

use std::fmt;
use crate::models::{Board, Lead, LeadId, LeadPatch, StageId, Statistics};
use crate::service::ServiceError;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    /// Copy of the lead taken when the drag started
    Dragging(Lead),
}

/// Why a drop (or move request) changed nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NotDragging,
    SameStage,
    UnknownStage,
    Converted,
    UnknownLead,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            IgnoreReason::NotDragging => "no lead is being moved",
            IgnoreReason::SameStage => "lead is already in that stage",
            IgnoreReason::UnknownStage => "stage is not on the board",
            IgnoreReason::Converted => "converted leads cannot change stage",
            IgnoreReason::UnknownLead => "lead is not on the board",
        };
        f.write_str(text)
    }
}

/// An optimistic move waiting for the lead service's answer
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMove {
    lead: Lead,
    target: StageId,
    snapshot: Board,
}

impl PendingMove {
    pub fn lead_id(&self) -> LeadId {
        self.lead.id
    }

    pub fn source(&self) -> StageId {
        self.lead.stage
    }

    pub fn target(&self) -> StageId {
        self.target
    }

    /// Board as it was before the optimistic move
    pub fn snapshot(&self) -> &Board {
        &self.snapshot
    }

    /// The partial update to send: only the stage changes
    pub fn patch(&self) -> LeadPatch {
        LeadPatch::stage(self.target)
    }
}

#[derive(Debug)]
pub enum Settlement {
    Confirmed(Lead),
    Reverted(ServiceError),
}

#[derive(Debug, Default)]
pub struct KanbanStore {
    board: Board,
    statistics: Statistics,
    drag: DragState,
}

impl KanbanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn statistics(&self) -> Statistics {
        self.statistics
    }

    pub fn drag_state(&self) -> &DragState {
        &self.drag
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging(_))
    }

    /// Install an authoritative board. The drag marker is left alone; only
    /// `end_drag` clears it.
    pub fn replace(&mut self, board: Board, statistics: Statistics) {
        self.board = board;
        self.statistics = statistics;
    }

    /// Start dragging `lead`. Converted leads are refused (returns false).
    pub fn begin_drag(&mut self, lead: &Lead) -> bool {
        if lead.is_converted {
            return false;
        }
        self.drag = DragState::Dragging(lead.clone());
        true
    }

    /// Drop the in-flight lead on `target`.
    ///
    /// The same-stage check compares against the copy taken at drag start.
    /// On success the board already shows the lead at the end of the target
    /// column and the returned move must be settled.
    pub fn drop_on(&mut self, target: StageId) -> Result<PendingMove, IgnoreReason> {
        let lead = match &self.drag {
            DragState::Idle => return Err(IgnoreReason::NotDragging),
            DragState::Dragging(lead) => lead.clone(),
        };
        if lead.stage == target {
            return Err(IgnoreReason::SameStage);
        }
        if !self.board.contains_stage(target) {
            return Err(IgnoreReason::UnknownStage);
        }

        let snapshot = self.board.clone();
        self.board.relocate(&lead, target);
        Ok(PendingMove { lead, target, snapshot })
    }

    /// Apply the service's answer to a pending move.
    /// A failure restores the board exactly as it was before the drop.
    pub fn settle(&mut self, pending: PendingMove, result: Result<Lead, ServiceError>) -> Settlement {
        match result {
            Ok(lead) => Settlement::Confirmed(lead),
            Err(err) => {
                self.board = pending.snapshot;
                Settlement::Reverted(err)
            }
        }
    }

    pub fn end_drag(&mut self) {
        self.drag = DragState::Idle;
    }
}
