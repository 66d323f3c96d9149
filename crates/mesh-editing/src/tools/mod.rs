//! Pointer-driven edit tools
//!
//! Each tool is a strategy behind [`EditTool`]. The [`ToolRegistry`] maps a
//! [`ToolKind`] to a factory and the [`ToolBox`] owns the active instance,
//! forwarding pointer input to it. Tools never touch global state: every
//! call receives a [`ToolContext`] with the session, the history and the
//! host's projector.

mod move_tool;
mod orbit;
mod select;

use std::collections::BTreeMap;
use std::fmt;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::history::UndoController;
use crate::selection::{Projector, ScreenRect, SelectionOperations};
use crate::session::EditingSession;

pub use move_tool::MoveTool;
pub use orbit::OrbitTool;
pub use select::SelectTool;

/// Available tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum ToolKind {
    /// Click and box selection (default)
    #[default]
    Select,
    /// Drag selected vertices
    Move,
    /// Orbit the camera
    Orbit,
}

/// Pointer input in screen space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Cursor position, same units as the hit-test thresholds
    pub screen: Vec2,
    /// Cursor ray intersected with the host's working plane, if any
    pub world: Option<Vec3>,
    /// Shift held: toggle instead of replace
    pub additive: bool,
}

impl PointerEvent {
    pub fn at(screen: Vec2) -> Self {
        Self {
            screen,
            world: None,
            additive: false,
        }
    }

    pub fn with_world(mut self, world: Vec3) -> Self {
        self.world = Some(world);
        self
    }

    pub fn additive(mut self, additive: bool) -> Self {
        self.additive = additive;
        self
    }
}

/// Something a tool wants drawn on top of the viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayPrimitive {
    /// Rubber band of a box selection
    SelectionRect(ScreenRect),
    /// Transform pivot in world space
    Pivot(Vec3),
}

/// Everything a tool may read or change
pub struct ToolContext<'a> {
    pub session: &'a mut EditingSession,
    pub history: &'a mut UndoController,
    pub operations: &'a SelectionOperations,
    pub projector: &'a dyn Projector,
}

/// Strategy interface implemented by every tool
pub trait EditTool: fmt::Debug {
    fn kind(&self) -> ToolKind;

    fn activate(&mut self, _ctx: &mut ToolContext<'_>) {}

    /// Finish or abandon any gesture in progress
    fn deactivate(&mut self, _ctx: &mut ToolContext<'_>) {}

    fn pointer_down(&mut self, ctx: &mut ToolContext<'_>, event: &PointerEvent);

    fn pointer_drag(&mut self, ctx: &mut ToolContext<'_>, event: &PointerEvent);

    fn pointer_up(&mut self, ctx: &mut ToolContext<'_>, event: &PointerEvent);

    fn overlay(&self, _session: &EditingSession) -> Vec<OverlayPrimitive> {
        Vec::new()
    }
}

type ToolFactory = fn() -> Box<dyn EditTool>;

/// Enum-keyed tool factories
#[derive(Clone)]
pub struct ToolRegistry {
    factories: BTreeMap<ToolKind, ToolFactory>,
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("kinds", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ToolRegistry {
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registry with the select, move and orbit tools
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(ToolKind::Select, || Box::new(SelectTool::default()));
        registry.register(ToolKind::Move, || Box::new(MoveTool::default()));
        registry.register(ToolKind::Orbit, || Box::new(OrbitTool::default()));
        registry
    }

    /// Register or replace the factory for `kind`
    pub fn register(&mut self, kind: ToolKind, factory: ToolFactory) {
        self.factories.insert(kind, factory);
    }

    pub fn create(&self, kind: ToolKind) -> Option<Box<dyn EditTool>> {
        self.factories.get(&kind).map(|factory| factory())
    }

    pub fn contains(&self, kind: ToolKind) -> bool {
        self.factories.contains_key(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = ToolKind> + '_ {
        self.factories.keys().copied()
    }
}

/// Owns the active tool and routes pointer input to it
#[derive(Debug, Default)]
pub struct ToolBox {
    registry: ToolRegistry,
    active: Option<Box<dyn EditTool>>,
}

impl ToolBox {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry,
            active: None,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn active_kind(&self) -> Option<ToolKind> {
        self.active.as_ref().map(|tool| tool.kind())
    }

    /// Make `kind` the active tool and store it in the view state
    ///
    /// Returns false if it is already active or not registered.
    pub fn switch(&mut self, ctx: &mut ToolContext<'_>, kind: ToolKind) -> bool {
        if !self.activate(ctx, kind) {
            return false;
        }
        ctx.session.view_mut().active_tool = kind;
        true
    }

    /// Follow the view state's tool, e.g. after an undo restored it
    pub fn sync(&mut self, ctx: &mut ToolContext<'_>) -> bool {
        let kind = ctx.session.view().active_tool;
        self.activate(ctx, kind)
    }

    fn activate(&mut self, ctx: &mut ToolContext<'_>, kind: ToolKind) -> bool {
        if self.active_kind() == Some(kind) {
            return false;
        }
        let Some(mut tool) = self.registry.create(kind) else {
            warn!("tools: no tool registered for {:?}", kind);
            return false;
        };
        if let Some(mut previous) = self.active.take() {
            previous.deactivate(ctx);
        }
        tool.activate(ctx);
        debug!("tools: active tool {:?}", kind);
        self.active = Some(tool);
        true
    }

    pub fn pointer_down(&mut self, ctx: &mut ToolContext<'_>, event: &PointerEvent) {
        if let Some(tool) = self.active.as_mut() {
            tool.pointer_down(ctx, event);
        }
    }

    pub fn pointer_drag(&mut self, ctx: &mut ToolContext<'_>, event: &PointerEvent) {
        if let Some(tool) = self.active.as_mut() {
            tool.pointer_drag(ctx, event);
        }
    }

    pub fn pointer_up(&mut self, ctx: &mut ToolContext<'_>, event: &PointerEvent) {
        if let Some(tool) = self.active.as_mut() {
            tool.pointer_up(ctx, event);
        }
    }

    pub fn overlay(&self, session: &EditingSession) -> Vec<OverlayPrimitive> {
        self.active
            .as_ref()
            .map(|tool| tool.overlay(session))
            .unwrap_or_default()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::top_view;
    use super::*;
    use crate::document::test_fixtures::quad;

    #[test]
    fn test_registry_defaults() {
        let registry = ToolRegistry::with_defaults();
        let kinds: Vec<_> = registry.kinds().collect();
        assert_eq!(kinds, vec![ToolKind::Select, ToolKind::Move, ToolKind::Orbit]);
        assert_eq!(registry.create(ToolKind::Orbit).map(|t| t.kind()), Some(ToolKind::Orbit));
        assert!(ToolRegistry::empty().create(ToolKind::Select).is_none());
    }

    #[test]
    fn test_switch_updates_view_and_sync_follows() {
        let mut session = EditingSession::new();
        session.add_document(quad());
        let mut history = UndoController::default();
        let operations = SelectionOperations::default();
        let mut tools = ToolBox::default();
        let mut ctx = ToolContext {
            session: &mut session,
            history: &mut history,
            operations: &operations,
            projector: &top_view,
        };

        assert!(tools.switch(&mut ctx, ToolKind::Move));
        assert!(!tools.switch(&mut ctx, ToolKind::Move));
        assert_eq!(ctx.session.view().active_tool, ToolKind::Move);

        ctx.session.view_mut().active_tool = ToolKind::Orbit;
        assert!(tools.sync(&mut ctx));
        assert_eq!(tools.active_kind(), Some(ToolKind::Orbit));
    }

    #[test]
    fn test_unregistered_tool_is_refused() {
        let mut session = EditingSession::new();
        let mut history = UndoController::default();
        let operations = SelectionOperations::default();
        let mut tools = ToolBox::new(ToolRegistry::empty());
        let mut ctx = ToolContext {
            session: &mut session,
            history: &mut history,
            operations: &operations,
            projector: &top_view,
        };

        assert!(!tools.switch(&mut ctx, ToolKind::Select));
        assert_eq!(tools.active_kind(), None);
        assert!(tools.overlay(ctx.session).is_empty());
    }
}
