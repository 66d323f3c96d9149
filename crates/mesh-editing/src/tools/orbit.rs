//! Camera orbit tool.

use glam::Vec2;
use tracing::warn;

use crate::history::{CaptureKind, Focus};

use super::{EditTool, PointerEvent, ToolContext, ToolKind};

#[derive(Debug, Clone, Copy)]
struct OrbitDrag {
    last: Vec2,
    /// Focus to restore when the drag ends
    previous_focus: Focus,
}

/// Orbits the camera around its target
///
/// Focus moves to the camera for the duration of the drag, so the orbit is
/// recorded on the view history.
#[derive(Debug, Default)]
pub struct OrbitTool {
    drag: Option<OrbitDrag>,
}

impl OrbitTool {
    const LABEL: &'static str = "Orbit Camera";

    fn finish(&mut self, ctx: &mut ToolContext<'_>) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        ctx.history.end_drag(ctx.session, CaptureKind::View, Self::LABEL);
        ctx.history.set_focus(drag.previous_focus);
    }
}

impl EditTool for OrbitTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Orbit
    }

    fn deactivate(&mut self, ctx: &mut ToolContext<'_>) {
        self.finish(ctx);
    }

    fn pointer_down(&mut self, ctx: &mut ToolContext<'_>, event: &PointerEvent) {
        match ctx.history.begin_drag(ctx.session, CaptureKind::View) {
            Ok(_) => {
                self.drag = Some(OrbitDrag {
                    last: event.screen,
                    previous_focus: ctx.history.focus(),
                });
                ctx.history.set_focus(Focus::Camera);
            }
            Err(err) => warn!("orbit: {}", err),
        }
    }

    fn pointer_drag(&mut self, ctx: &mut ToolContext<'_>, event: &PointerEvent) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        let delta = event.screen - drag.last;
        drag.last = event.screen;
        ctx.session.view_mut().camera.orbit(delta.x, delta.y);
    }

    fn pointer_up(&mut self, ctx: &mut ToolContext<'_>, event: &PointerEvent) {
        self.pointer_drag(ctx, event);
        self.finish(ctx);
    }
}
