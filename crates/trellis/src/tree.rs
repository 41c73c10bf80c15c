//! The tree/list hybrid.
//!
//! A [`TreeList`] stores a forest of rows in an arena and simultaneously
//! threads every *visible* row onto a flat, doubly-linked row list. The flat
//! list is what a renderer iterates, what y-coordinates map onto, and what
//! the visible row count describes. Collapsing a subtree physically detaches
//! its run of rows from the flat list (the run keeps its internal threading),
//! so expanding later is a single splice at the attachment point.
//!
//! # Example
//!
//! ```
//! use trellis::{NodeInfo, TreeList};
//!
//! let mut list = TreeList::new(2, 0).unwrap();
//! let root = list.insert(None, None, NodeInfo::branch("etc")).unwrap();
//! let child = list.insert(Some(root), None, NodeInfo::leaf("hosts")).unwrap();
//! list.set_cell_text(child, 1, "412 B");
//!
//! assert_eq!(list.visible_count(), 2);
//! list.collapse(root);
//! assert_eq!(list.visible_count(), 1);
//! ```

use std::any::Any;
use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};
use trellis_core::{Result, Signal, TrellisError};

use crate::drag::DragState;
use crate::render::{LineStyle, Pixmap};
use crate::row::{Cell, CellShift, CellType, Row, RowData, RowState};
use crate::selection::SelectionMode;
use crate::sort::{default_compare, NodeCompare};

new_key_type! {
    /// Stable handle to a row in a [`TreeList`].
    ///
    /// Handles stay valid until the row is removed; a handle to a removed
    /// row is detected and the operation becomes a logged no-op.
    pub struct NodeId;
}

/// Arena payload: one row plus its tree links.
///
/// `prev`/`next` thread the flat visible list. A collapsed subtree's rows
/// are absent from the flat list but keep their internal `prev`/`next`
/// chain; the head of such a detached run has `prev == None`.
#[derive(Debug)]
pub(crate) struct TreeRow {
    pub(crate) row: Row,
    pub(crate) parent: Option<NodeId>,
    pub(crate) sibling: Option<NodeId>,
    pub(crate) children: Option<NodeId>,
    pub(crate) prev: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
    /// Depth in the forest; roots are level 1.
    pub(crate) level: usize,
    pub(crate) is_leaf: bool,
    pub(crate) expanded: bool,
    pub(crate) pixmap_closed: Option<Pixmap>,
    pub(crate) pixmap_opened: Option<Pixmap>,
}

impl TreeRow {
    fn new(columns: usize) -> Self {
        Self {
            row: Row::new(columns),
            parent: None,
            sibling: None,
            children: None,
            prev: None,
            next: None,
            level: 0,
            is_leaf: false,
            expanded: false,
            pixmap_closed: None,
            pixmap_opened: None,
        }
    }
}

/// Tree-column description of a node, used by [`TreeList::insert`] and
/// [`TreeList::set_node_info`].
#[derive(Clone, Debug, Default)]
pub struct NodeInfo {
    /// Text shown in the tree column.
    pub text: String,
    /// Pixels between the tree-column pixmap and its text.
    pub spacing: u8,
    /// Pixmap shown while the node is collapsed.
    pub pixmap_closed: Option<Pixmap>,
    /// Pixmap shown while the node is expanded.
    pub pixmap_opened: Option<Pixmap>,
    /// Leaf nodes can never receive children.
    pub is_leaf: bool,
    /// Initial expanded state; ignored for leaves.
    pub expanded: bool,
}

impl NodeInfo {
    /// A leaf node with the given tree-column text.
    pub fn leaf(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_leaf: true,
            ..Self::default()
        }
    }

    /// An expanded branch node with the given tree-column text.
    pub fn branch(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            expanded: true,
            ..Self::default()
        }
    }

    /// A collapsed branch node with the given tree-column text.
    pub fn collapsed_branch(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Attach closed/open pixmaps for the tree column.
    pub fn with_pixmaps(mut self, closed: Pixmap, opened: Pixmap) -> Self {
        self.pixmap_closed = Some(closed);
        self.pixmap_opened = Some(opened);
        self
    }
}

/// The tree/list hybrid widget core.
///
/// See the [module documentation](self) for the data model. All mutation is
/// single-threaded and cooperative; signals fire synchronously after the
/// structure has reached its new state.
pub struct TreeList {
    pub(crate) arena: SlotMap<NodeId, TreeRow>,
    columns: usize,
    tree_column: usize,

    /// Head of the flat visible row list (the first root, if any).
    pub(crate) row_head: Option<NodeId>,
    /// Cached tail of the flat visible row list.
    pub(crate) row_tail: Option<NodeId>,
    /// Number of rows on the flat list.
    pub(crate) rows: usize,

    freeze_count: usize,

    pub(crate) selection: Vec<NodeId>,
    pub(crate) selection_mode: SelectionMode,

    pub(crate) compare: Rc<NodeCompare>,
    pub(crate) auto_sort: bool,

    pub(crate) indent: i32,
    pub(crate) line_style: LineStyle,
    pub(crate) reorderable: bool,
    pub(crate) use_drag_icons: bool,
    pub(crate) row_height: i32,
    pub(crate) voffset: i32,
    pub(crate) viewport_width: i32,
    pub(crate) viewport_height: i32,
    pub(crate) drag: DragState,

    /// Emitted after a row enters the selection.
    pub row_selected: Signal<NodeId>,
    /// Emitted after a row leaves the selection.
    pub row_unselected: Signal<NodeId>,
    /// Emitted after a subtree is expanded.
    pub subtree_expanded: Signal<NodeId>,
    /// Emitted after a subtree is collapsed.
    pub subtree_collapsed: Signal<NodeId>,
    /// Emitted after a subtree is re-parented or re-ordered.
    pub subtree_moved: Signal<NodeId>,
    /// Deferred-redraw request; emitted at most once per logical operation.
    pub refresh: Signal<()>,
}

// ============================================================================
// Construction and configuration
// ============================================================================

impl TreeList {
    /// Create a list with `columns` columns; `tree_column` is the column the
    /// tree structure (indentation, expander, connector lines) renders into.
    pub fn new(columns: usize, tree_column: usize) -> Result<Self> {
        if columns == 0 {
            return Err(TrellisError::NoColumns);
        }
        if tree_column >= columns {
            return Err(TrellisError::TreeColumnOutOfRange {
                tree_column,
                columns,
            });
        }

        Ok(Self {
            arena: SlotMap::with_key(),
            columns,
            tree_column,
            row_head: None,
            row_tail: None,
            rows: 0,
            freeze_count: 0,
            selection: Vec::new(),
            selection_mode: SelectionMode::Single,
            compare: Rc::new(default_compare),
            auto_sort: false,
            indent: 20,
            line_style: LineStyle::Solid,
            reorderable: false,
            use_drag_icons: true,
            row_height: 20,
            voffset: 0,
            viewport_width: 0,
            viewport_height: 0,
            drag: DragState::default(),
            row_selected: Signal::new(),
            row_unselected: Signal::new(),
            subtree_expanded: Signal::new(),
            subtree_collapsed: Signal::new(),
            subtree_moved: Signal::new(),
            refresh: Signal::new(),
        })
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn tree_column(&self) -> usize {
        self.tree_column
    }

    /// Pixel indent per tree level.
    pub fn indent(&self) -> i32 {
        self.indent
    }

    pub fn set_indent(&mut self, indent: i32) {
        if indent >= 0 && indent != self.indent {
            self.indent = indent;
            self.queue_refresh();
        }
    }

    pub fn line_style(&self) -> LineStyle {
        self.line_style
    }

    pub fn set_line_style(&mut self, line_style: LineStyle) {
        if line_style != self.line_style {
            self.line_style = line_style;
            self.queue_refresh();
        }
    }

    /// Whether rows can be re-ordered with the pointer.
    pub fn reorderable(&self) -> bool {
        self.reorderable
    }

    pub fn set_reorderable(&mut self, reorderable: bool) {
        self.reorderable = reorderable;
    }

    pub fn use_drag_icons(&self) -> bool {
        self.use_drag_icons
    }

    pub fn set_use_drag_icons(&mut self, use_icons: bool) {
        self.use_drag_icons = use_icons;
    }

    /// Uniform row height in pixels, used for y↔row mapping.
    pub fn row_height(&self) -> i32 {
        self.row_height
    }

    pub fn set_row_height(&mut self, height: i32) {
        if height > 0 {
            self.row_height = height;
        }
    }

    /// Vertical scroll offset in pixels.
    pub fn set_scroll_offset(&mut self, voffset: i32) {
        self.voffset = voffset;
    }

    /// Size of the visible viewport, for drag hit-testing.
    pub fn set_viewport(&mut self, width: i32, height: i32) {
        self.viewport_width = width;
        self.viewport_height = height;
    }
}

// ============================================================================
// Structure queries
// ============================================================================

impl TreeList {
    /// Total number of rows in the arena, visible or not.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Number of rows on the flat visible list.
    pub fn visible_count(&self) -> usize {
        self.rows
    }

    /// Whether `node` refers to a live row.
    pub fn contains(&self, node: NodeId) -> bool {
        self.arena.contains_key(node)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.arena.get(node).and_then(|r| r.parent)
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.arena.get(node).and_then(|r| r.children)
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.arena.get(node).and_then(|r| r.sibling)
    }

    /// Depth of `node`; roots are level 1.
    pub fn level(&self, node: NodeId) -> Option<usize> {
        self.arena.get(node).map(|r| r.level)
    }

    pub fn is_leaf(&self, node: NodeId) -> bool {
        self.arena.get(node).is_some_and(|r| r.is_leaf)
    }

    pub fn is_expanded(&self, node: NodeId) -> bool {
        self.arena.get(node).is_some_and(|r| r.expanded)
    }

    /// First root of the forest.
    pub fn first(&self) -> Option<NodeId> {
        self.row_head
    }

    /// Whether `node` is an ancestor of `child`.
    pub fn is_ancestor(&self, node: NodeId, child: NodeId) -> bool {
        let mut cur = self.arena.get(child).and_then(|r| r.parent);
        while let Some(p) = cur {
            if p == node {
                return true;
            }
            cur = self.arena[p].parent;
        }
        false
    }

    /// Whether `node` lies in the subtree rooted at `root` (the whole forest
    /// when `None`). A node is in its own subtree.
    pub fn subtree_contains(&self, root: Option<NodeId>, node: NodeId) -> bool {
        if !self.arena.contains_key(node) {
            return false;
        }
        match root {
            None => true,
            Some(r) => r == node || self.is_ancestor(r, node),
        }
    }

    /// Whether every ancestor of `node` is expanded, i.e. whether the row is
    /// on the flat visible list.
    pub fn is_visible(&self, node: NodeId) -> bool {
        if !self.arena.contains_key(node) {
            return false;
        }
        let mut cur = node;
        while let Some(p) = self.arena[cur].parent {
            if !self.arena[p].expanded {
                return false;
            }
            cur = p;
        }
        true
    }

    /// The structurally last node of the subtree rooted at `node`: the
    /// deepest descendant reached by always following the last sibling,
    /// regardless of expansion.
    pub fn last(&self, node: NodeId) -> Option<NodeId> {
        if !self.arena.contains_key(node) {
            return None;
        }
        let mut cur = node;
        loop {
            while let Some(s) = self.arena[cur].sibling {
                cur = s;
            }
            match self.arena[cur].children {
                Some(c) => cur = c,
                None => return Some(cur),
            }
        }
    }

    /// The last row of `node`'s *attached* run: `node` itself when collapsed
    /// or childless, otherwise the recursively last visible descendant.
    pub(crate) fn last_visible(&self, node: NodeId) -> NodeId {
        let tree_row = &self.arena[node];
        match tree_row.children {
            Some(first) if tree_row.expanded => {
                let mut cur = first;
                while let Some(s) = self.arena[cur].sibling {
                    cur = s;
                }
                self.last_visible(cur)
            }
            _ => node,
        }
    }

    /// Iterate the flat visible row list in order.
    pub fn visible_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.row_head, move |&n| self.arena[n].next)
    }

    /// The node at flat-list position `index`.
    pub fn nth_visible(&self, index: usize) -> Option<NodeId> {
        self.visible_nodes().nth(index)
    }

    /// The flat-list position of `node`, if it is visible.
    pub fn visible_index(&self, node: NodeId) -> Option<usize> {
        self.visible_nodes().position(|n| n == node)
    }
}

// ============================================================================
// Traversal
// ============================================================================

impl TreeList {
    /// Visit the subtree rooted at `node` (the whole forest when `None`)
    /// depth-first with children before their parent. The next sibling is
    /// captured before each visit, so visitors may delete the visited node.
    pub fn post_order<F: FnMut(NodeId)>(&self, node: Option<NodeId>, visit: &mut F) {
        let mut child = match node {
            Some(n) => self.arena.get(n).and_then(|r| r.children),
            None => self.row_head,
        };
        while let Some(c) = child {
            let next = self.arena[c].sibling;
            self.post_order(Some(c), visit);
            child = next;
        }
        if let Some(n) = node {
            visit(n);
        }
    }

    /// Visit the subtree rooted at `node` (the whole forest when `None`)
    /// depth-first with each parent before its children.
    pub fn pre_order<F: FnMut(NodeId)>(&self, node: Option<NodeId>, visit: &mut F) {
        if let Some(n) = node {
            visit(n);
        }
        let mut child = match node {
            Some(n) => self.arena.get(n).and_then(|r| r.children),
            None => self.row_head,
        };
        while let Some(c) = child {
            let next = self.arena[c].sibling;
            self.pre_order(Some(c), visit);
            child = next;
        }
    }

    /// Collect a subtree post-order; the mutation paths traverse first and
    /// apply after, so the visitor cannot observe a half-updated structure.
    pub(crate) fn collect_post_order(&self, node: Option<NodeId>) -> Vec<NodeId> {
        let mut ids = Vec::new();
        self.post_order(node, &mut |n| ids.push(n));
        ids
    }
}

// ============================================================================
// Freeze / thaw
// ============================================================================

impl TreeList {
    /// Suspend refresh notification. Calls nest.
    pub fn freeze(&mut self) {
        self.freeze_count += 1;
    }

    /// Release one freeze. When the count reaches zero a single `refresh`
    /// is emitted for everything that happened while frozen.
    pub fn thaw(&mut self) {
        if self.freeze_count > 0 {
            self.freeze_count -= 1;
        }
        if self.freeze_count == 0 {
            self.refresh.emit(());
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.freeze_count > 0
    }

    /// Emit `refresh` unless frozen.
    pub(crate) fn queue_refresh(&self) {
        if self.freeze_count == 0 {
            self.refresh.emit(());
        }
    }
}

// ============================================================================
// Link / unlink
// ============================================================================

impl TreeList {
    /// Splice `child` (with its attached run of rows) into the forest as a
    /// child of `parent`, in front of `sibling` (append when `None`).
    ///
    /// `child` must currently be unlinked; its attached run is whatever
    /// still hangs off its `next` chain (the detached rows of an expanded
    /// subtree travel with it).
    pub(crate) fn link(&mut self, child: NodeId, parent: Option<NodeId>, sibling: Option<NodeId>) {
        if let Some(s) = sibling {
            if self.arena[s].parent != parent {
                tracing::warn!(
                    target: "trellis::tree",
                    "link: sibling is not a child of the given parent"
                );
                return;
            }
            if s == child {
                tracing::warn!(target: "trellis::tree", "link: child and sibling are the same node");
                return;
            }
        }
        if parent == Some(child) {
            tracing::warn!(target: "trellis::tree", "link: cannot link a node under itself");
            return;
        }

        // Measure the run travelling with child.
        let mut run_len = 1usize;
        let mut run_end = child;
        while let Some(n) = self.arena[run_end].next {
            run_end = n;
            run_len += 1;
        }

        self.arena[child].parent = parent;
        self.arena[child].sibling = sibling;

        let visible = match parent {
            Some(p) => {
                let visible = self.is_visible(p);
                if visible && self.arena[p].expanded {
                    self.rows += run_len;
                }
                visible
            }
            None => {
                self.rows += run_len;
                true
            }
        };

        // A sibling that is not actually on the child chain degrades to append.
        let sibling = match sibling {
            Some(s) if !self.chain_contains(parent, s) => {
                self.arena[child].sibling = None;
                None
            }
            other => other,
        };

        match sibling {
            Some(sib) => {
                // Fix the sibling-chain predecessor.
                let chain_head = self.chain_head(parent);
                if chain_head != Some(sib) {
                    let mut cur = chain_head.expect("non-empty child chain");
                    while self.arena[cur].sibling != Some(sib) {
                        cur = self.arena[cur].sibling.expect("sibling on chain");
                    }
                    self.arena[cur].sibling = Some(child);
                }
                if let Some(p) = parent {
                    if self.arena[p].children == Some(sib) {
                        self.arena[p].children = Some(child);
                    }
                }

                // Splice the run into the flat (or detached) chain before sib.
                if self.row_head == Some(sib) {
                    self.row_head = Some(child);
                }
                let sib_prev = self.arena[sib].prev;
                if let Some(sp) = sib_prev {
                    self.arena[sp].next = Some(child);
                }
                self.arena[child].prev = sib_prev;
                self.arena[run_end].next = Some(sib);
                self.arena[sib].prev = Some(run_end);
            }
            None => {
                match self.chain_head(parent) {
                    Some(head) => {
                        // Append to the sibling chain, splicing after the
                        // last sibling's attached run.
                        let mut last_sib = head;
                        while let Some(s) = self.arena[last_sib].sibling {
                            last_sib = s;
                        }
                        self.arena[last_sib].sibling = Some(child);

                        let after = self.last_visible(last_sib);
                        let after_next = self.arena[after].next;
                        self.arena[run_end].next = after_next;
                        if let Some(an) = after_next {
                            self.arena[an].prev = Some(run_end);
                        }
                        self.arena[after].next = Some(child);
                        self.arena[child].prev = Some(after);
                    }
                    None => match parent {
                        Some(p) => {
                            self.arena[p].children = Some(child);
                            if self.arena[p].expanded {
                                let p_next = self.arena[p].next;
                                self.arena[run_end].next = p_next;
                                if let Some(pn) = p_next {
                                    self.arena[pn].prev = Some(run_end);
                                }
                                self.arena[p].next = Some(child);
                                self.arena[child].prev = Some(p);
                            } else {
                                // Parent is collapsed: the run becomes the
                                // parent's detached run.
                                self.arena[child].prev = None;
                                self.arena[run_end].next = None;
                            }
                        }
                        None => {
                            self.row_head = Some(child);
                            self.arena[child].prev = None;
                            self.arena[run_end].next = None;
                        }
                    },
                }
            }
        }

        // Recompute cached levels for the whole relinked subtree, parents
        // before children.
        let mut ids = Vec::new();
        self.pre_order(Some(child), &mut |n| ids.push(n));
        for id in ids {
            self.arena[id].level = match self.arena[id].parent {
                Some(p) => self.arena[p].level + 1,
                None => 1,
            };
        }

        // Tail cache: the run became the new end of the flat list when the
        // list was empty or the old tail now points at the run.
        if self.row_tail.is_none()
            || self.row_tail.and_then(|t| self.arena[t].next) == Some(child)
        {
            self.row_tail = Some(run_end);
        }

        if visible {
            self.queue_refresh();
        }
    }

    /// Detach `node` and its attached run from the flat list and remove it
    /// from its parent's child chain. The run keeps its internal threading,
    /// and `node.sibling` is left untouched for the caller.
    pub(crate) fn unlink(&mut self, node: NodeId) {
        let visible = self.is_visible(node);

        // Tail cache: the run contains the tail iff the run reaches the end
        // of the flat list.
        if visible {
            let run_holds_tail = self.arena[node].next.is_none()
                || (self.arena[node].children.is_some()
                    && self.row_tail.is_some_and(|t| self.is_ancestor(node, t)));
            if run_holds_tail {
                self.row_tail = self.arena[node].prev;
            }
        }

        // Walk past the attached run: every following row at a deeper level.
        let level = self.arena[node].level;
        let mut run_rows = 0usize;
        let mut after = self.arena[node].next;
        while let Some(a) = after {
            if self.arena[a].level <= level {
                break;
            }
            after = self.arena[a].next;
            run_rows += 1;
        }

        // Detach the run from the chain around it.
        if let Some(a) = after {
            let run_end = self.arena[a].prev.expect("run end precedes after");
            self.arena[run_end].next = None;
            self.arena[a].prev = self.arena[node].prev;
        }
        if let Some(p) = self.arena[node].prev {
            self.arena[p].next = after;
        }
        self.arena[node].prev = None;

        // Remove from the parent's (or root) child chain.
        let sibling = self.arena[node].sibling;
        match self.arena[node].parent {
            Some(parent) => {
                if self.arena[parent].children == Some(node) {
                    self.arena[parent].children = sibling;
                    if sibling.is_none() {
                        // Last child removed: the parent reverts to a
                        // collapsed, childless branch.
                        self.arena[parent].expanded = false;
                        if let Some(closed) = self.arena[parent].pixmap_closed.clone() {
                            self.set_tree_cell_pixmap(parent, Some(closed));
                        }
                    }
                } else {
                    let mut cur = self.arena[parent].children.expect("parent has children");
                    while self.arena[cur].sibling != Some(node) {
                        cur = self.arena[cur].sibling.expect("node on child chain");
                    }
                    self.arena[cur].sibling = sibling;
                }
            }
            None => {
                if self.row_head == Some(node) {
                    self.row_head = sibling;
                } else {
                    let mut cur = self.row_head.expect("node is a non-first root");
                    while self.arena[cur].sibling != Some(node) {
                        cur = self.arena[cur].sibling.expect("node on root chain");
                    }
                    self.arena[cur].sibling = sibling;
                }
            }
        }

        if visible {
            self.rows -= run_rows + 1;
            self.queue_refresh();
        }
    }

    /// Head of the child chain under `parent` (the root chain when `None`).
    pub(crate) fn chain_head(&self, parent: Option<NodeId>) -> Option<NodeId> {
        match parent {
            Some(p) => self.arena[p].children,
            None => self.row_head,
        }
    }

    /// Whether `node` is on the child chain under `parent`.
    fn chain_contains(&self, parent: Option<NodeId>, node: NodeId) -> bool {
        let mut cur = self.chain_head(parent);
        while let Some(c) = cur {
            if c == node {
                return true;
            }
            cur = self.arena[c].sibling;
        }
        false
    }

    /// Replace the pixmap slot of the tree-column cell, keeping its text.
    fn set_tree_cell_pixmap(&mut self, node: NodeId, pixmap: Option<Pixmap>) {
        let column = self.tree_column;
        match &mut self.arena[node].row.cells[column] {
            Cell::PixText {
                pixmap: slot, ..
            } => *slot = pixmap,
            cell @ Cell::Empty => {
                if let Some(pm) = pixmap {
                    *cell = Cell::Pixmap(pm);
                }
            }
            Cell::Pixmap(slot) => {
                if let Some(pm) = pixmap {
                    *slot = pm;
                }
            }
            Cell::Text(_) => {}
        }
    }
}

// ============================================================================
// Insert / remove / clear
// ============================================================================

impl TreeList {
    /// Insert a new row as a child of `parent` (a root when `None`), in
    /// front of `sibling` (appended when `None`).
    ///
    /// Returns `None` when `parent` is a leaf or `sibling` is not a child of
    /// `parent`. Under auto-sort the `sibling` hint is ignored and the
    /// comparator picks the position.
    pub fn insert(
        &mut self,
        parent: Option<NodeId>,
        sibling: Option<NodeId>,
        info: NodeInfo,
    ) -> Option<NodeId> {
        if let Some(p) = parent {
            if !self.arena.contains_key(p) {
                tracing::warn!(target: "trellis::tree", "insert: stale parent handle");
                return None;
            }
            if self.arena[p].is_leaf {
                return None;
            }
        }
        if let Some(s) = sibling {
            if !self.arena.contains_key(s) {
                tracing::warn!(target: "trellis::tree", "insert: stale sibling handle");
                return None;
            }
            if self.arena[s].parent != parent {
                tracing::warn!(
                    target: "trellis::tree",
                    "insert: sibling is not a child of the given parent"
                );
                return None;
            }
        }

        let node = self.arena.insert(TreeRow::new(self.columns));
        let expanded = info.expanded;
        self.apply_node_info(node, &info, expanded);

        let sibling = if self.auto_sort {
            self.sorted_position(node, parent)
        } else {
            sibling
        };

        self.link(node, parent, sibling);
        Some(node)
    }

    /// Remove `node` and its whole subtree. Row destructors run and pixmap
    /// handles are released exactly once per deleted row; deleted rows leave
    /// the selection list silently.
    pub fn remove(&mut self, node: NodeId) {
        if !self.arena.contains_key(node) {
            tracing::warn!(target: "trellis::tree", "remove: stale node handle");
            return;
        }

        let thaw = self.freeze_count == 0;
        if thaw {
            self.freeze();
        }

        self.unlink(node);
        for id in self.collect_post_order(Some(node)) {
            if self.arena[id].row.state == RowState::Selected {
                self.selection.retain(|&n| n != id);
            }
            self.drag.forget(id);
            self.arena.remove(id);
        }

        if thaw {
            self.thaw();
        }
    }

    /// Remove every row. Faster than repeated [`remove`](Self::remove): the
    /// selection is dropped wholesale and rows are deleted without
    /// per-row unlinking.
    pub fn clear(&mut self) {
        self.selection.clear();

        let doomed = self.collect_post_order(None);
        self.row_head = None;
        self.row_tail = None;
        self.rows = 0;
        for id in doomed {
            self.arena.remove(id);
        }

        self.drag = DragState::default();
        self.queue_refresh();
    }
}

// ============================================================================
// Expand / collapse
// ============================================================================

impl TreeList {
    /// Expand `node`, splicing its detached child run back into the flat
    /// list. No-op for leaves and already-expanded nodes.
    pub fn expand(&mut self, node: NodeId) {
        if !self.arena.contains_key(node) || self.arena[node].is_leaf {
            return;
        }
        if self.arena[node].expanded {
            return;
        }
        self.expand_node(node);
        self.subtree_expanded.emit(node);
    }

    /// Collapse `node`, detaching its child run from the flat list. No-op
    /// for leaves and already-collapsed nodes.
    pub fn collapse(&mut self, node: NodeId) {
        if !self.arena.contains_key(node) || self.arena[node].is_leaf {
            return;
        }
        if !self.arena[node].expanded {
            return;
        }
        self.collapse_node(node);
        self.subtree_collapsed.emit(node);
    }

    /// Expand a collapsed node or collapse an expanded one.
    pub fn toggle_expansion(&mut self, node: NodeId) {
        if !self.arena.contains_key(node) || self.arena[node].is_leaf {
            return;
        }
        if self.arena[node].expanded {
            self.collapse(node);
        } else {
            self.expand(node);
        }
    }

    /// Expand `node` and every descendant (the whole forest when `None`),
    /// children before parents, under a single freeze/thaw.
    pub fn expand_recursive(&mut self, node: Option<NodeId>) {
        if let Some(n) = node {
            if !self.arena.contains_key(n) || self.arena[n].is_leaf {
                return;
            }
        }

        let thaw = self.freeze_count == 0;
        if thaw {
            self.freeze();
        }
        for id in self.collect_post_order(node) {
            if !self.arena[id].is_leaf && !self.arena[id].expanded {
                self.expand_node(id);
                self.subtree_expanded.emit(id);
            }
        }
        if thaw {
            self.thaw();
        }
    }

    /// Collapse `node` and every descendant (the whole forest when `None`),
    /// children before parents, under a single freeze/thaw.
    pub fn collapse_recursive(&mut self, node: Option<NodeId>) {
        if let Some(n) = node {
            if !self.arena.contains_key(n) || self.arena[n].is_leaf {
                return;
            }
        }

        let thaw = self.freeze_count == 0;
        if thaw {
            self.freeze();
        }
        for id in self.collect_post_order(node) {
            if self.arena[id].expanded {
                self.collapse_node(id);
                self.subtree_collapsed.emit(id);
            }
        }
        if thaw {
            self.thaw();
        }
    }

    fn expand_node(&mut self, node: NodeId) {
        let visible = self.is_visible(node);

        self.arena[node].expanded = true;
        if let Some(opened) = self.arena[node].pixmap_opened.clone() {
            self.set_tree_cell_pixmap(node, Some(opened));
        }

        let Some(children) = self.arena[node].children else {
            if visible {
                self.queue_refresh();
            }
            return;
        };

        // Splice the detached run in after node.
        let mut run_end = children;
        let mut run_len = 1usize;
        while let Some(n) = self.arena[run_end].next {
            run_end = n;
            run_len += 1;
        }

        let node_next = self.arena[node].next;
        self.arena[run_end].next = node_next;
        match node_next {
            Some(nn) => self.arena[nn].prev = Some(run_end),
            None => {
                if visible {
                    self.row_tail = Some(run_end);
                }
            }
        }
        self.arena[node].next = Some(children);
        self.arena[children].prev = Some(node);

        if visible {
            self.rows += run_len;
            self.queue_refresh();
        }
    }

    fn collapse_node(&mut self, node: NodeId) {
        let visible = self.is_visible(node);

        self.arena[node].expanded = false;
        if let Some(closed) = self.arena[node].pixmap_closed.clone() {
            self.set_tree_cell_pixmap(node, Some(closed));
        }

        let Some(children) = self.arena[node].children else {
            if visible {
                self.queue_refresh();
            }
            return;
        };

        // Walk past the child run (everything deeper than node) and cut it
        // out of the chain.
        let level = self.arena[node].level;
        let mut run_len = 0usize;
        let mut after = Some(children);
        while let Some(a) = after {
            if self.arena[a].level <= level {
                break;
            }
            after = self.arena[a].next;
            run_len += 1;
        }

        match after {
            Some(a) => {
                let run_end = self.arena[a].prev.expect("run end precedes after");
                self.arena[run_end].next = None;
                self.arena[node].next = Some(a);
                self.arena[a].prev = Some(node);
            }
            None => {
                self.arena[node].next = None;
                if visible {
                    self.row_tail = Some(node);
                }
            }
        }
        self.arena[children].prev = None;

        if visible {
            self.rows -= run_len;
            self.queue_refresh();
        }
    }
}

// ============================================================================
// Move
// ============================================================================

impl TreeList {
    /// Move `node` (with its subtree) to become a child of `new_parent`, in
    /// front of `new_sibling` (appended when `None`).
    ///
    /// Rejected silently when `new_parent` is a leaf or lies inside `node`'s
    /// own subtree. Under auto-sort the sibling hint is replaced by the
    /// comparator position, and a move that keeps the same parent is a
    /// no-op.
    pub fn move_node(
        &mut self,
        node: NodeId,
        new_parent: Option<NodeId>,
        new_sibling: Option<NodeId>,
    ) {
        if !self.arena.contains_key(node) {
            tracing::warn!(target: "trellis::tree", "move_node: stale node handle");
            return;
        }
        if let Some(s) = new_sibling {
            if !self.arena.contains_key(s) || self.arena[s].parent != new_parent {
                tracing::warn!(
                    target: "trellis::tree",
                    "move_node: sibling is not a child of the given parent"
                );
                return;
            }
        }
        if let Some(p) = new_parent {
            if !self.arena.contains_key(p) || self.arena[p].is_leaf {
                return;
            }
            // Moving under a descendant (or itself) would create a cycle.
            let mut cur = Some(p);
            while let Some(a) = cur {
                if a == node {
                    return;
                }
                cur = self.arena[a].parent;
            }
        }

        let new_sibling = if self.auto_sort {
            if new_parent == self.arena[node].parent {
                return;
            }
            self.sorted_position(node, new_parent)
        } else {
            new_sibling
        };

        if new_parent == self.arena[node].parent && new_sibling == self.arena[node].sibling {
            return;
        }

        let thaw = self.freeze_count == 0;
        if thaw {
            self.freeze();
        }
        self.unlink(node);
        self.link(node, new_parent, new_sibling);
        if thaw {
            self.thaw();
        }

        self.subtree_moved.emit(node);
    }
}

// ============================================================================
// Node info and cells
// ============================================================================

impl TreeList {
    /// Replace the tree-column description of `node`.
    ///
    /// Turning a node into a leaf removes any existing children first.
    /// Changing the expanded flag of a branch that stays a branch goes
    /// through the regular expand/collapse path, signals included.
    pub fn set_node_info(&mut self, node: NodeId, info: NodeInfo) {
        if !self.arena.contains_key(node) {
            tracing::warn!(target: "trellis::tree", "set_node_info: stale node handle");
            return;
        }

        let old_leaf = self.arena[node].is_leaf;
        let old_expanded = self.arena[node].expanded;

        if info.is_leaf && self.arena[node].children.is_some() {
            let mut child = self.arena[node].children;
            while let Some(c) = child {
                child = self.arena[c].sibling;
                self.remove(c);
            }
        }

        // Apply with the old expanded flag; the expand/collapse below
        // bridges the difference so the flat list stays consistent.
        self.apply_node_info(node, &info, old_expanded);

        if !info.is_leaf && !old_leaf {
            if info.expanded && !old_expanded {
                self.expand(node);
            } else if !info.expanded && old_expanded {
                self.collapse(node);
            }
        }
        if !info.is_leaf {
            self.arena[node].expanded = info.expanded;
        }

        self.queue_refresh();
    }

    /// The tree-column description of `node`.
    pub fn node_info(&self, node: NodeId) -> Option<NodeInfo> {
        let tree_row = self.arena.get(node)?;
        let cell = &tree_row.row.cells[self.tree_column];
        let spacing = match cell {
            Cell::PixText { spacing, .. } => *spacing,
            _ => 0,
        };
        Some(NodeInfo {
            text: cell.text().unwrap_or("").to_string(),
            spacing,
            pixmap_closed: tree_row.pixmap_closed.clone(),
            pixmap_opened: tree_row.pixmap_opened.clone(),
            is_leaf: tree_row.is_leaf,
            expanded: tree_row.expanded,
        })
    }

    /// Store `info` on the row: swap the pixmap snapshots, set the leaf
    /// flag, and rebuild the tree-column cell. `expanded` is the flag the
    /// flat list currently reflects.
    fn apply_node_info(&mut self, node: NodeId, info: &NodeInfo, expanded: bool) {
        let tree_row = &mut self.arena[node];
        tree_row.pixmap_closed = info.pixmap_closed.clone();
        tree_row.pixmap_opened = info.pixmap_opened.clone();
        tree_row.is_leaf = info.is_leaf;
        tree_row.expanded = !info.is_leaf && expanded;

        let pixmap = if expanded {
            info.pixmap_opened.clone()
        } else {
            info.pixmap_closed.clone()
        };
        tree_row.row.cells[self.tree_column] = Cell::PixText {
            text: info.text.clone(),
            spacing: info.spacing,
            pixmap,
        };
    }

    fn valid_cell(&self, node: NodeId, column: usize, op: &'static str) -> bool {
        if !self.arena.contains_key(node) {
            tracing::warn!(target: "trellis::tree", "{op}: stale node handle");
            return false;
        }
        if column >= self.columns {
            tracing::warn!(target: "trellis::tree", column, "{op}: column out of range");
            return false;
        }
        true
    }

    /// Set a plain-text cell. The tree column must be changed through
    /// [`set_node_info`](Self::set_node_info) instead.
    pub fn set_cell_text(&mut self, node: NodeId, column: usize, text: impl Into<String>) {
        if !self.valid_cell(node, column, "set_cell_text") {
            return;
        }
        if column == self.tree_column {
            tracing::warn!(
                target: "trellis::tree",
                "set_cell_text: tree column is managed through set_node_info"
            );
            return;
        }
        self.arena[node].row.cells[column] = Cell::Text(text.into());
        self.queue_refresh();
    }

    /// Text of a plain-text cell.
    pub fn cell_text(&self, node: NodeId, column: usize) -> Option<&str> {
        match self.arena.get(node)?.row.cells.get(column)? {
            Cell::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Set a pixmap-only cell.
    pub fn set_cell_pixmap(&mut self, node: NodeId, column: usize, pixmap: Pixmap) {
        if !self.valid_cell(node, column, "set_cell_pixmap") {
            return;
        }
        if column == self.tree_column {
            self.set_tree_cell_pixmap(node, Some(pixmap));
        } else {
            self.arena[node].row.cells[column] = Cell::Pixmap(pixmap);
        }
        self.queue_refresh();
    }

    /// Pixmap of a pixmap or pixmap+text cell.
    pub fn cell_pixmap(&self, node: NodeId, column: usize) -> Option<&Pixmap> {
        self.arena.get(node)?.row.cells.get(column)?.pixmap()
    }

    /// Set a pixmap+text cell.
    pub fn set_cell_pixtext(
        &mut self,
        node: NodeId,
        column: usize,
        text: impl Into<String>,
        spacing: u8,
        pixmap: Pixmap,
    ) {
        if !self.valid_cell(node, column, "set_cell_pixtext") {
            return;
        }
        self.arena[node].row.cells[column] = Cell::PixText {
            text: text.into(),
            spacing,
            pixmap: Some(pixmap),
        };
        self.queue_refresh();
    }

    /// Text, spacing, and pixmap of a pixmap+text cell.
    pub fn cell_pixtext(&self, node: NodeId, column: usize) -> Option<(&str, u8, Option<&Pixmap>)> {
        match self.arena.get(node)?.row.cells.get(column)? {
            Cell::PixText {
                text,
                spacing,
                pixmap,
            } => Some((text, *spacing, pixmap.as_ref())),
            _ => None,
        }
    }

    /// The type of a cell.
    pub fn cell_type(&self, node: NodeId, column: usize) -> Option<CellType> {
        Some(self.arena.get(node)?.row.cells.get(column)?.cell_type())
    }

    /// Per-cell draw offsets in pixels.
    pub fn set_shift(&mut self, node: NodeId, column: usize, vertical: i16, horizontal: i16) {
        if !self.valid_cell(node, column, "set_shift") {
            return;
        }
        self.arena[node].row.shifts[column] = CellShift {
            vertical,
            horizontal,
        };
        self.queue_refresh();
    }

    pub fn shift(&self, node: NodeId, column: usize) -> Option<CellShift> {
        self.arena.get(node)?.row.shifts.get(column).copied()
    }

    /// Text of the tree column, whatever the cell type. Used by the default
    /// comparator.
    pub(crate) fn tree_cell_text(&self, node: NodeId) -> &str {
        self.arena[node].row.cells[self.tree_column]
            .text()
            .unwrap_or("")
    }
}

// ============================================================================
// Row attributes and user data
// ============================================================================

impl TreeList {
    pub fn set_foreground(&mut self, node: NodeId, color: Option<crate::render::Color>) {
        if let Some(tree_row) = self.arena.get_mut(node) {
            tree_row.row.foreground = color;
            self.queue_refresh();
        }
    }

    pub fn set_background(&mut self, node: NodeId, color: Option<crate::render::Color>) {
        if let Some(tree_row) = self.arena.get_mut(node) {
            tree_row.row.background = color;
            self.queue_refresh();
        }
    }

    /// Attach user data to a row. Any previous data is dropped first (its
    /// destroy notifier runs).
    pub fn set_row_data(&mut self, node: NodeId, data: RowData) {
        if let Some(tree_row) = self.arena.get_mut(node) {
            tree_row.row.data = Some(data);
        }
    }

    /// The row's user data.
    pub fn row_data(&self, node: NodeId) -> Option<&dyn Any> {
        self.arena.get(node)?.row.data.as_ref().map(RowData::get)
    }

    /// Pre-order search for the first row (starting at `start`, the whole
    /// forest when `None`) whose user data satisfies `predicate`. Rows
    /// without data are skipped.
    pub fn find_by_row_data<F>(&self, start: Option<NodeId>, predicate: F) -> Option<NodeId>
    where
        F: Fn(&dyn Any) -> bool,
    {
        let mut found = None;
        self.pre_order(start, &mut |n| {
            if found.is_none() {
                if let Some(data) = self.arena[n].row.data.as_ref() {
                    if predicate(data.get()) {
                        found = Some(n);
                    }
                }
            }
        });
        found
    }
}
