//! Selection manager: an ordered selection list kept consistent with the
//! per-row state flag.
//!
//! Every selection transition goes through [`TreeList::select`] or
//! [`TreeList::unselect`], which emit `row_selected` / `row_unselected`
//! after the state has changed. The selection list records selection order;
//! its last element is the most recently selected row.

use crate::tree::{NodeId, TreeList};
use crate::row::RowState;

/// How many rows may be selected at once, and how clicks behave.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SelectionMode {
    /// At most one row; clicking a selected row unselects it.
    #[default]
    Single,
    /// Exactly one row once anything is selected; clicking a selected row
    /// keeps it selected.
    Browse,
    /// Any number of rows; clicking toggles.
    Multiple,
    /// Selection is driven by an external rubber-band controller; the
    /// click/toggle paths here do nothing.
    Extended,
}

impl TreeList {
    pub fn selection_mode(&self) -> SelectionMode {
        self.selection_mode
    }

    /// Switch selection mode, pruning the selection to fit:
    ///
    /// - to `Multiple`: everything stays selected
    /// - to `Browse`: only the most recently selected row stays
    /// - to `Single` or `Extended`: everything is unselected
    pub fn set_selection_mode(&mut self, mode: SelectionMode) {
        if mode == self.selection_mode {
            return;
        }
        self.selection_mode = mode;

        if mode == SelectionMode::Multiple {
            return;
        }

        let doomed: Vec<NodeId> = match mode {
            SelectionMode::Browse => {
                let len = self.selection.len();
                if len > 1 {
                    self.selection[..len - 1].to_vec()
                } else {
                    Vec::new()
                }
            }
            _ => self.selection.clone(),
        };

        if doomed.is_empty() {
            return;
        }

        let thaw = !self.is_frozen();
        if thaw {
            self.freeze();
        }
        for node in doomed {
            self.unselect(node);
        }
        if thaw {
            self.thaw();
        }
    }

    /// Selected rows, in selection order.
    pub fn selection(&self) -> &[NodeId] {
        &self.selection
    }

    pub fn is_selected(&self, node: NodeId) -> bool {
        self.arena
            .get(node)
            .is_some_and(|r| r.row.state == RowState::Selected)
    }

    /// Select `node`. In single and browse mode any other selected row is
    /// unselected first, with its own `row_unselected` emission. No-op if
    /// the row is already selected.
    pub fn select(&mut self, node: NodeId) {
        if !self.arena.contains_key(node) {
            tracing::warn!(target: "trellis::selection", "select: stale node handle");
            return;
        }
        if self.arena[node].row.state == RowState::Selected {
            return;
        }

        if matches!(
            self.selection_mode,
            SelectionMode::Single | SelectionMode::Browse
        ) {
            let others: Vec<NodeId> = self
                .selection
                .iter()
                .copied()
                .filter(|&n| n != node)
                .collect();
            for other in others {
                self.unselect(other);
            }
        }

        self.arena[node].row.state = RowState::Selected;
        self.selection.push(node);
        self.row_selected.emit(node);
        self.queue_refresh();
    }

    /// Unselect `node`. No-op if the row is not selected.
    pub fn unselect(&mut self, node: NodeId) {
        if !self.arena.contains_key(node) {
            tracing::warn!(target: "trellis::selection", "unselect: stale node handle");
            return;
        }
        if self.arena[node].row.state != RowState::Selected {
            return;
        }

        self.selection.retain(|&n| n != node);
        self.arena[node].row.state = RowState::Normal;
        self.row_unselected.emit(node);
        self.queue_refresh();
    }

    /// The click behavior: toggle according to the selection mode.
    pub fn toggle_selection(&mut self, node: NodeId) {
        if !self.arena.contains_key(node) {
            return;
        }
        match self.selection_mode {
            SelectionMode::Single | SelectionMode::Multiple => {
                if self.is_selected(node) {
                    self.unselect(node);
                } else {
                    self.select(node);
                }
            }
            SelectionMode::Browse => {
                // Browse never empties the selection by clicking.
                if !self.is_selected(node) {
                    self.select(node);
                }
            }
            SelectionMode::Extended => {}
        }
    }

    /// Select `node` and every descendant (the whole forest when `None`).
    /// Only meaningful in multiple mode; any other mode is a no-op.
    pub fn select_recursive(&mut self, node: Option<NodeId>) {
        if self.selection_mode != SelectionMode::Multiple {
            return;
        }
        self.for_subtree(node, Self::select);
    }

    /// Unselect `node` and every descendant (the whole forest when `None`).
    /// Refused in browse mode (browse keeps one row selected) and in
    /// extended mode.
    pub fn unselect_recursive(&mut self, node: Option<NodeId>) {
        if matches!(
            self.selection_mode,
            SelectionMode::Browse | SelectionMode::Extended
        ) {
            return;
        }
        self.for_subtree(node, Self::unselect);
    }

    fn for_subtree(&mut self, node: Option<NodeId>, apply: fn(&mut Self, NodeId)) {
        if let Some(n) = node {
            if !self.arena.contains_key(n) {
                return;
            }
        }
        let thaw = !self.is_frozen();
        if thaw {
            self.freeze();
        }
        for id in self.collect_post_order(node) {
            apply(self, id);
        }
        if thaw {
            self.thaw();
        }
    }
}
