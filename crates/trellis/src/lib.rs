//! A tree/list hybrid widget core.
//!
//! [`TreeList`] stores a forest of rows threaded onto a single flat list of
//! visible rows, so rendering and hit-testing always work in flat row
//! indices while the structure stays a tree. Collapsing a branch physically
//! detaches its subtree run from the flat list (keeping the run's internal
//! order); expanding splices it back.
//!
//! On top of that core sit four cooperating pieces:
//!
//! - selection ([`SelectionMode`]): single, browse, multiple and extended
//!   policies over the same selection list;
//! - sorting: a pluggable three-way comparator, one-shot or automatic;
//! - drag reordering ([`InsertPos`]): pointer press/motion/release gestures
//!   that re-link rows, with XOR marker feedback;
//! - a rendering boundary ([`RowAppearance`], [`RenderSurface`]): the core
//!   never draws rows itself, it describes them.
//!
//! State changes are announced through [`Signal`]s on the list
//! (`row_selected`, `subtree_expanded`, `subtree_moved`, ...), which fire
//! synchronously after the structure has reached its new state.
//!
//! # Example
//!
//! ```
//! use trellis::{NodeInfo, TreeList};
//!
//! let mut list = TreeList::new(2, 0).unwrap();
//! let root = list.insert(None, None, NodeInfo::branch("src")).unwrap();
//! let file = list.insert(Some(root), None, NodeInfo::leaf("main.rs")).unwrap();
//! list.set_cell_text(file, 1, "4 KiB");
//!
//! assert_eq!(list.visible_count(), 2);
//! list.collapse(root);
//! assert_eq!(list.visible_count(), 1);
//! ```

mod drag;
mod render;
mod row;
mod selection;
mod sort;
mod tree;

pub use drag::InsertPos;
pub use render::{
    Color, ExpanderGlyph, LineStyle, Pixmap, Point, Rect, RenderSurface, RowAppearance, Stroke,
};
pub use row::{Cell, CellShift, CellType, RowData, RowState};
pub use selection::SelectionMode;
pub use sort::NodeCompare;
pub use tree::{NodeId, NodeInfo, TreeList};

pub use trellis_core::{ConnectionGuard, ConnectionId, Result, Signal, TrellisError};
