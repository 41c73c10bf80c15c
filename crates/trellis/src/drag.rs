//! Pointer-driven row reordering.
//!
//! The drag controller is a three-step state machine driven by the host's
//! pointer events: [`button_press`](TreeList::button_press) arms it,
//! [`drag_motion`](TreeList::drag_motion) tracks the pointer and keeps an
//! insertion marker on screen, and [`button_release`](TreeList::button_release)
//! either performs the structural move or, when the pointer never left the
//! pressed row, treats the gesture as a click.
//!
//! All transient feedback (the marker line or rectangle and the optional
//! floating drag icon) is drawn through the [`RenderSurface`] handed into the
//! entry points. Marker drawing is XOR-style: drawing the same primitive
//! twice erases it, so the controller never needs a full redraw to move the
//! marker.

use crate::render::{Point, Rect, RenderSurface, Stroke};
use crate::tree::{NodeId, TreeList};

/// Where a dropped row lands relative to the drop target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InsertPos {
    /// In front of the target, as its preceding sibling.
    Before,
    /// Behind the target, as its following sibling.
    #[default]
    After,
    /// As the target's first child.
    AsChild,
}

/// Side length of the square expander hit area, in pixels.
const EXPANDER_SIZE: i32 = 8;

/// Drag bookkeeping carried between press, motion and release.
#[derive(Debug, Default)]
pub(crate) struct DragState {
    pub(crate) in_drag: bool,
    pub(crate) source: Option<NodeId>,
    pub(crate) target: Option<NodeId>,
    /// Flat-list index of the row the press landed on, for click detection.
    pub(crate) press_row: Option<usize>,
    /// Flat-list index the insertion marker is currently drawn at.
    pub(crate) marker_row: Option<usize>,
    /// Whether the marker is a rectangle (drop-as-child) rather than a line.
    pub(crate) rect: bool,
    pub(crate) pos: InsertPos,
    pub(crate) icon_shown: bool,
}

impl DragState {
    /// Drop any bookkeeping that refers to a node being deleted.
    pub(crate) fn forget(&mut self, node: NodeId) {
        if self.target == Some(node) {
            self.target = None;
            self.marker_row = None;
            self.rect = false;
        }
        if self.source == Some(node) {
            self.source = None;
            self.target = None;
            self.press_row = None;
            self.marker_row = None;
            self.rect = false;
            self.in_drag = false;
        }
    }
}

// ============================================================================
// Pointer event entry points
// ============================================================================

impl TreeList {
    /// Whether a drag gesture is currently armed.
    pub fn is_dragging(&self) -> bool {
        self.drag.in_drag
    }

    /// Handle a primary-button press at widget coordinates `(x, y)`.
    ///
    /// A press on the expander hit area of a row with children (or a
    /// double-click anywhere on such a row) toggles its expansion. Any other
    /// press arms a drag when the list is reorderable; whether it turns into
    /// a drag or a click is decided by the motion that follows.
    pub fn button_press(
        &mut self,
        x: i32,
        y: i32,
        double_click: bool,
        surface: &mut dyn RenderSurface,
    ) {
        let Some(row) = self.row_at_y(y) else {
            return;
        };
        let Some(node) = self.nth_visible(row) else {
            return;
        };

        self.drag.press_row = Some(row);

        let has_children = self.arena[node].children.is_some();
        if has_children && (double_click || self.is_hot_spot(node, row, x, y)) {
            self.toggle_expansion(node);
        } else if self.reorderable && !self.drag.in_drag {
            surface.grab_pointer();
            self.drag.in_drag = true;
            self.drag.source = Some(node);
            self.drag.target = None;
            self.drag.marker_row = None;
            self.drag.rect = false;
            tracing::trace!(target: "trellis::drag", row, "drag armed");
        }
    }

    /// Handle pointer motion while the primary button is held.
    ///
    /// Does nothing until the pointer leaves the pressed row, so an ordinary
    /// click with a little jitter never shows a marker. Leaving the widget
    /// bounds hides the marker without cancelling the drag; moving back in
    /// picks it up again.
    pub fn drag_motion(&mut self, x: i32, y: i32, surface: &mut dyn RenderSurface) {
        if !self.reorderable || !self.drag.in_drag {
            return;
        }
        let Some(source) = self.drag.source else {
            return;
        };

        // The drag proper starts once the pointer leaves the pressed row.
        if self.drag.target.is_none() {
            if let Some(press) = self.drag.press_row {
                if self.row_at_y(y) == Some(press) {
                    return;
                }
            }
        }

        if self.use_drag_icons {
            let tree_column = self.tree_column();
            let icon = self.arena[source].row.cells[tree_column].pixmap().cloned();
            if let Some(icon) = icon {
                let at = Point::new(x - icon.width() as i32 / 2, y - icon.height() as i32);
                if self.drag.icon_shown {
                    surface.move_drag_icon(at);
                } else {
                    surface.show_drag_icon(&icon, at);
                    self.drag.icon_shown = true;
                }
            }
        }

        if self.out_of_bounds(x, y) {
            self.clear_marker(surface);
            return;
        }
        let Some(row) = self.row_at_y(y) else {
            self.clear_marker(surface);
            return;
        };
        let Some(node) = self.nth_visible(row) else {
            return;
        };

        // The top and bottom quarters of a row mean "drop beside it"; the
        // middle half means "drop into it".
        let rel = y - self.row_top_y(row);
        let pos = if rel < self.row_height / 4 {
            InsertPos::Before
        } else if self.row_height - rel < self.row_height / 4 {
            InsertPos::After
        } else {
            InsertPos::AsChild
        };

        if Some(row) == self.drag.marker_row && pos == self.drag.pos {
            return;
        }

        if pos != InsertPos::AsChild {
            self.clear_marker(surface);
            self.drag.pos = pos;
            self.drag.target = Some(node);
            self.drag.marker_row = Some(row);
            self.drag.rect = false;
            self.draw_marker(surface);
        } else if !self.arena[node].is_leaf {
            // A leaf cannot take children; the old marker stays put.
            self.clear_marker(surface);
            self.drag.pos = pos;
            self.drag.target = Some(node);
            self.drag.marker_row = Some(row);
            self.drag.rect = true;
            self.draw_marker(surface);
        }
    }

    /// Handle the primary-button release that ends the gesture.
    ///
    /// With a marker on screen this performs the drop; without one it is a
    /// click, which toggles the selection of the pressed row (unless the
    /// press already toggled expansion on the expander hit area).
    pub fn button_release(&mut self, x: i32, y: i32, surface: &mut dyn RenderSurface) {
        if self.drag.in_drag {
            surface.release_pointer();
            self.drag.in_drag = false;
        }
        if self.drag.icon_shown {
            surface.hide_drag_icon();
            self.drag.icon_shown = false;
        }

        let press_row = self.drag.press_row.take();

        if self.drag.marker_row.is_some() {
            self.clear_marker(surface);
            self.drop_at_marker(x, y);
            self.drag.source = None;
            self.drag.target = None;
            return;
        }

        if let (Some(press), Some(row)) = (press_row, self.row_at_y(y)) {
            if row == press {
                if let Some(node) = self.nth_visible(row) {
                    let on_expander =
                        self.arena[node].children.is_some() && self.is_hot_spot(node, row, x, y);
                    if !on_expander {
                        self.toggle_selection(node);
                    }
                }
            }
        }
        self.drag.source = None;
        self.drag.target = None;
    }
}

// ============================================================================
// Hit testing and marker drawing
// ============================================================================

impl TreeList {
    /// The flat-list index under pixel row `y`, if any.
    fn row_at_y(&self, y: i32) -> Option<usize> {
        let y = y + self.voffset;
        if y < 0 || self.row_height <= 0 {
            return None;
        }
        let row = (y / self.row_height) as usize;
        (row < self.visible_count()).then_some(row)
    }

    /// Top pixel of flat-list row `row`.
    fn row_top_y(&self, row: usize) -> i32 {
        row as i32 * self.row_height - self.voffset
    }

    /// Whether `(x, y)` falls on the expander glyph of `node` drawn at
    /// flat-list index `row`.
    fn is_hot_spot(&self, node: NodeId, row: usize, x: i32, y: i32) -> bool {
        let level = self.arena[node].level as i32;
        let x0 = (level - 1) * self.indent + (self.indent - EXPANDER_SIZE) / 2;
        let y0 = self.row_top_y(row) + (self.row_height - EXPANDER_SIZE) / 2;
        x >= x0 && x <= x0 + EXPANDER_SIZE && y >= y0 && y <= y0 + EXPANDER_SIZE
    }

    fn out_of_bounds(&self, x: i32, y: i32) -> bool {
        let last_bottom = self.visible_count() as i32 * self.row_height - self.voffset;
        x < 0
            || y < -3
            || x > self.viewport_width
            || y > self.viewport_height + 3
            || y > last_bottom + 3
    }

    /// XOR-draw the marker described by the current drag state. Calling this
    /// twice with unchanged state erases the marker.
    fn draw_marker(&self, surface: &mut dyn RenderSurface) {
        let (Some(row), Some(target)) = (self.drag.marker_row, self.drag.target) else {
            return;
        };
        let level = self.arena[target].level as i32;
        let x0 = self.indent * level;
        let stroke = Stroke::default();

        if self.drag.rect {
            let bottom = self.row_top_y(row) + self.row_height;
            surface.draw_rect(
                Rect::new(
                    x0,
                    bottom - self.row_height - 1,
                    self.viewport_width - x0 - 1,
                    self.row_height + 1,
                ),
                &stroke,
            );
        } else {
            let y = match self.drag.pos {
                InsertPos::After => self.row_top_y(row) + self.row_height,
                _ => self.row_top_y(row) - 1,
            };
            surface.draw_line(Point::new(x0, y), Point::new(self.viewport_width, y), &stroke);
        }
    }

    /// Erase the marker if one is on screen.
    fn clear_marker(&mut self, surface: &mut dyn RenderSurface) {
        if self.drag.marker_row.is_some() {
            self.draw_marker(surface);
            self.drag.marker_row = None;
            self.drag.rect = false;
        }
    }

    /// Perform the structural move the marker promised, if it is legal.
    fn drop_at_marker(&mut self, x: i32, y: i32) {
        let (Some(source), Some(target)) = (self.drag.source, self.drag.target) else {
            return;
        };
        if self.out_of_bounds(x, y) {
            return;
        }
        if source == target {
            tracing::trace!(target: "trellis::drag", "drop on self rejected");
            return;
        }
        // A subtree cannot be dropped into itself.
        if self.arena[source].children.is_some() && self.is_ancestor(source, target) {
            tracing::trace!(target: "trellis::drag", "drop into own subtree rejected");
            return;
        }

        match self.drag.pos {
            InsertPos::After => {
                if self.arena[target].sibling != Some(source) {
                    self.move_node(source, self.arena[target].parent, self.arena[target].sibling);
                }
            }
            InsertPos::Before => {
                if self.arena[source].sibling != Some(target) {
                    self.move_node(source, self.arena[target].parent, Some(target));
                }
            }
            InsertPos::AsChild => {
                if !self.arena[target].is_leaf && self.arena[target].children != Some(source) {
                    self.move_node(source, Some(target), self.arena[target].children);
                }
            }
        }
    }
}
