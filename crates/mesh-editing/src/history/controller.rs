//! Focus-routed undo controller with drag transactions.

use std::collections::HashMap;

use polyedit_config::HistoryConfig;
use tracing::{debug, warn};

use crate::error::StateError;
use crate::session::{EditingSession, SessionEvent};

use super::capture::Capture;
use super::record::{Record, Undoable};
use super::stack::HistoryStack;
use super::{CaptureKind, Focus, HistoryDirection, HistoryFacet};

/// Owns one history stack per facet, the focus and pending drag captures
///
/// New records go to the stack of the focused facet, and undo/redo act on
/// that stack only. Undo and redo are refused while any drag is pending so
/// the pending Before capture keeps describing live state.
#[derive(Debug)]
pub struct UndoController {
    document: HistoryStack,
    document_list: HistoryStack,
    view: HistoryStack,
    focus: Focus,
    /// Before captures of open drag transactions, one per kind
    pending: HashMap<CaptureKind, Capture>,
}

impl Default for UndoController {
    fn default() -> Self {
        Self::new(&HistoryConfig::default())
    }
}

impl UndoController {
    pub fn new(config: &HistoryConfig) -> Self {
        Self {
            document: HistoryStack::new(config.max_depth),
            document_list: HistoryStack::new(config.max_depth),
            view: HistoryStack::new(config.max_depth),
            focus: Focus::default(),
            pending: HashMap::new(),
        }
    }

    // ========================================================================
    // Focus and stacks
    // ========================================================================

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn set_focus(&mut self, focus: Focus) {
        if self.focus != focus {
            debug!("history: focus {:?} -> {:?}", self.focus, focus);
            self.focus = focus;
        }
    }

    pub fn stack(&self, facet: HistoryFacet) -> &HistoryStack {
        match facet {
            HistoryFacet::Document => &self.document,
            HistoryFacet::DocumentList => &self.document_list,
            HistoryFacet::View => &self.view,
        }
    }

    fn stack_mut(&mut self, facet: HistoryFacet) -> &mut HistoryStack {
        match facet {
            HistoryFacet::Document => &mut self.document,
            HistoryFacet::DocumentList => &mut self.document_list,
            HistoryFacet::View => &mut self.view,
        }
    }

    fn focused(&self) -> &HistoryStack {
        self.stack(self.focus.facet())
    }

    /// Push a prebuilt record onto the focused stack
    pub fn push(&mut self, record: Record) {
        let facet = self.focus.facet();
        debug!("history: push '{}' onto {:?}", record.label(), facet);
        self.stack_mut(facet).push(record);
    }

    fn commit(&mut self, session: &mut EditingSession, record: Record) {
        let label = record.label().to_string();
        self.push(record);
        session.push_event(SessionEvent::RecordPushed {
            facet: self.focus.facet(),
            label,
        });
    }

    // ========================================================================
    // Undo / redo
    // ========================================================================

    pub fn can_undo(&self) -> bool {
        !self.is_any_drag_pending() && self.focused().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        !self.is_any_drag_pending() && self.focused().can_redo()
    }

    /// Undo on the focused stack
    ///
    /// Returns true if a record was reverted, false if there was nothing to
    /// undo or a drag is pending.
    pub fn undo(&mut self, session: &mut EditingSession) -> bool {
        self.try_undo(session).is_ok()
    }

    /// Redo on the focused stack
    pub fn redo(&mut self, session: &mut EditingSession) -> bool {
        self.try_redo(session).is_ok()
    }

    pub fn try_undo(&mut self, session: &mut EditingSession) -> Result<(), StateError> {
        self.step(session, HistoryDirection::Undo)
    }

    pub fn try_redo(&mut self, session: &mut EditingSession) -> Result<(), StateError> {
        self.step(session, HistoryDirection::Redo)
    }

    fn step(
        &mut self,
        session: &mut EditingSession,
        direction: HistoryDirection,
    ) -> Result<(), StateError> {
        if self.is_any_drag_pending() {
            warn!("history: {:?} refused while a drag is pending", direction);
            return Err(StateError::DragInProgress);
        }

        let facet = self.focus.facet();
        let stack = self.stack_mut(facet);
        let record = match direction {
            HistoryDirection::Undo => stack.step_back().ok_or(StateError::NothingToUndo),
            HistoryDirection::Redo => stack.step_forward().ok_or(StateError::NothingToRedo),
        }
        .inspect_err(|err| debug!("history: {}", err))?;

        if let Err(err) = record.apply(direction, session) {
            warn!(
                "history: {:?} of '{}' could not restore state: {}",
                direction,
                record.label(),
                err
            );
        }
        session.finish_history_apply(facet, direction, record.label());
        debug!("history: {:?} '{}' on {:?}", direction, record.label(), facet);
        Ok(())
    }

    /// Label of the record the next undo reverts
    pub fn undo_label(&self) -> Option<&str> {
        self.focused().peek_undo().map(|r| r.label())
    }

    /// Label of the record the next redo reapplies
    pub fn redo_label(&self) -> Option<&str> {
        self.focused().peek_redo().map(|r| r.label())
    }

    // ========================================================================
    // Drag transactions
    // ========================================================================

    /// Capture the Before side of a continuous gesture
    ///
    /// Returns `Ok(false)` when there is nothing to capture (no active
    /// document for a document kind). A second begin for a kind that is
    /// already pending is rejected.
    pub fn begin_drag(
        &mut self,
        session: &EditingSession,
        kind: CaptureKind,
    ) -> Result<bool, StateError> {
        if self.pending.contains_key(&kind) {
            warn!("history: begin_drag({:?}) while one is pending", kind);
            return Err(StateError::DragAlreadyPending(kind));
        }
        match Capture::take(kind, session) {
            Some(capture) => {
                debug!("history: begin_drag({:?})", kind);
                self.pending.insert(kind, capture);
                Ok(true)
            }
            None => {
                debug!("history: begin_drag({:?}) without an active document", kind);
                Ok(false)
            }
        }
    }

    /// Capture the After side and push one record if anything changed
    ///
    /// Returns whether a record was pushed.
    pub fn end_drag(
        &mut self,
        session: &mut EditingSession,
        kind: CaptureKind,
        label: &str,
    ) -> bool {
        let Some(before) = self.pending.remove(&kind) else {
            debug!("history: end_drag({:?}) without begin_drag", kind);
            return false;
        };
        let Some(after) = Capture::take(before.kind(), session) else {
            warn!("history: end_drag({:?}) lost the active document", kind);
            return false;
        };
        match before.into_record(after, label) {
            Some(record) => {
                self.commit(session, record);
                true
            }
            None => false,
        }
    }

    /// Forget a pending Before capture
    ///
    /// Mutations made since `begin_drag` stay applied and unrecorded.
    pub fn cancel_drag(&mut self, kind: CaptureKind) -> bool {
        let cancelled = self.pending.remove(&kind).is_some();
        if cancelled {
            debug!("history: cancel_drag({:?})", kind);
        }
        cancelled
    }

    pub fn is_drag_pending(&self, kind: CaptureKind) -> bool {
        self.pending.contains_key(&kind)
    }

    pub fn is_any_drag_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Run a one-shot edit between a Before and an After capture
    ///
    /// Returns the edit's result and whether a record was pushed.
    pub fn track<R>(
        &mut self,
        session: &mut EditingSession,
        kind: CaptureKind,
        label: &str,
        edit: impl FnOnce(&mut EditingSession) -> R,
    ) -> Result<(R, bool), StateError> {
        if self.pending.contains_key(&kind) {
            warn!("history: track({:?}) during a pending drag of that kind", kind);
            return Err(StateError::DragInProgress);
        }

        let before = Capture::take(kind, session);
        let result = edit(session);

        let record = before.and_then(|before| {
            let after = Capture::take(kind, session)?;
            before.into_record(after, label)
        });
        let recorded = match record {
            Some(record) => {
                self.commit(session, record);
                true
            }
            None => false,
        };
        Ok((result, recorded))
    }

    /// Drop all history and pending drags
    pub fn clear(&mut self) {
        for facet in HistoryFacet::ALL {
            self.stack_mut(facet).clear();
        }
        self.pending.clear();
        debug!("history: cleared");
    }
}
