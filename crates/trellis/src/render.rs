//! Rendering adapter: the contract between the tree/list core and whatever
//! actually puts pixels on screen.
//!
//! The core never draws rows itself. A renderer asks for a
//! [`RowAppearance`] per visible row and draws it however it likes. The only
//! drawing the core initiates directly is transient drag feedback (insertion
//! markers and the optional drag icon), which goes through the
//! [`RenderSurface`] trait handed into the drag entry points.

use std::fmt;
use std::sync::Arc;

use crate::row::Cell;
use crate::tree::{NodeId, TreeList};

/// A point in widget coordinates, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in widget coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// An RGBA color with 8 bits per channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    /// An opaque color from RGB components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Stroke parameters for marker drawing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stroke {
    pub color: Color,
    pub width: u32,
}

impl Default for Stroke {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            width: 1,
        }
    }
}

/// Style of the connector lines drawn between tree rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineStyle {
    #[default]
    Solid,
    Dotted,
    None,
}

/// Which expander glyph a row should show in its tree column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExpanderGlyph {
    /// Leaf rows and childless rows show no expander.
    None,
    /// The row has children and is collapsed.
    Closed,
    /// The row has children and is expanded.
    Open,
}

/// A shared, immutable pixmap handle.
///
/// Cloning the handle is the acquire half of the pixmap lifecycle and
/// dropping it the release half; the underlying storage is freed when the
/// last handle goes away. [`Pixmap::ref_count`] exposes the live handle
/// count, which tests use to verify release-on-delete.
#[derive(Clone)]
pub struct Pixmap {
    inner: Arc<PixmapData>,
}

struct PixmapData {
    width: u32,
    height: u32,
}

impl Pixmap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            inner: Arc::new(PixmapData { width, height }),
        }
    }

    pub fn width(&self) -> u32 {
        self.inner.width
    }

    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// Number of live handles to the underlying pixmap.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

/// Two handles are equal when they share the same underlying pixmap.
impl PartialEq for Pixmap {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Pixmap {}

impl fmt::Debug for Pixmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pixmap")
            .field("width", &self.inner.width)
            .field("height", &self.inner.height)
            .finish()
    }
}

/// The drawing and pointer services the drag controller needs from the host.
///
/// Marker drawing is XOR-style: drawing the same line or rectangle a second
/// time erases it. The controller relies on this to clear markers without a
/// full redraw.
pub trait RenderSurface {
    /// Draw (or erase) an XOR line between two points.
    fn draw_line(&mut self, from: Point, to: Point, stroke: &Stroke);

    /// Draw (or erase) an XOR rectangle outline.
    fn draw_rect(&mut self, rect: Rect, stroke: &Stroke);

    /// Capture the pointer for the duration of a drag.
    fn grab_pointer(&mut self);

    /// Release a previously captured pointer.
    fn release_pointer(&mut self);

    /// Show the floating drag icon at the given position.
    fn show_drag_icon(&mut self, icon: &Pixmap, at: Point);

    /// Reposition the floating drag icon.
    fn move_drag_icon(&mut self, at: Point);

    /// Destroy the floating drag icon.
    fn hide_drag_icon(&mut self);
}

/// Everything a renderer needs to draw one visible row.
#[derive(Clone, Debug)]
pub struct RowAppearance {
    pub node: NodeId,
    /// Depth in the tree; roots are level 1.
    pub level: usize,
    pub is_leaf: bool,
    pub expanded: bool,
    pub selected: bool,
    pub foreground: Option<Color>,
    pub background: Option<Color>,
    /// Cell contents, one per column.
    pub cells: Vec<Cell>,
    pub expander: ExpanderGlyph,
    /// Connector-line topology: one flag per ancestor level, outermost
    /// first. `true` means the vertical line at that depth continues past
    /// this row because the ancestor has a later sibling.
    pub connectors: Vec<bool>,
    /// Whether this row is the last of its sibling chain (the connector at
    /// the row's own depth ends in an L rather than a T).
    pub is_last_sibling: bool,
    /// Pixel indent of the tree column contents.
    pub indent: i32,
    pub line_style: LineStyle,
}

impl TreeList {
    /// Build the appearance description for a row.
    ///
    /// Returns `None` if the node is not in the list.
    pub fn row_appearance(&self, node: NodeId) -> Option<RowAppearance> {
        let tree_row = self.arena.get(node)?;

        let expander = if tree_row.is_leaf || tree_row.children.is_none() {
            ExpanderGlyph::None
        } else if tree_row.expanded {
            ExpanderGlyph::Open
        } else {
            ExpanderGlyph::Closed
        };

        // Connector flags for each ancestor level, outermost first.
        let mut connectors = Vec::with_capacity(tree_row.level.saturating_sub(1));
        let mut ancestor = tree_row.parent;
        while let Some(a) = ancestor {
            connectors.push(self.arena[a].sibling.is_some());
            ancestor = self.arena[a].parent;
        }
        connectors.reverse();

        Some(RowAppearance {
            node,
            level: tree_row.level,
            is_leaf: tree_row.is_leaf,
            expanded: tree_row.expanded,
            selected: tree_row.row.state == crate::row::RowState::Selected,
            foreground: tree_row.row.foreground,
            background: tree_row.row.background,
            cells: tree_row.row.cells.clone(),
            expander,
            connectors,
            is_last_sibling: tree_row.sibling.is_none(),
            indent: (tree_row.level as i32 - 1) * self.indent(),
            line_style: self.line_style(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeInfo;

    #[test]
    fn test_pixmap_handle_identity() {
        let a = Pixmap::new(8, 8);
        let b = a.clone();
        let c = Pixmap::new(8, 8);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.ref_count(), 2);
        drop(b);
        assert_eq!(a.ref_count(), 1);
    }

    #[test]
    fn test_row_appearance_expander() {
        let mut list = TreeList::new(1, 0).unwrap();
        let root = list.insert(None, None, NodeInfo::branch("root")).unwrap();
        let leaf = list
            .insert(Some(root), None, NodeInfo::leaf("leaf"))
            .unwrap();

        assert_eq!(
            list.row_appearance(root).unwrap().expander,
            ExpanderGlyph::Open
        );
        list.collapse(root);
        assert_eq!(
            list.row_appearance(root).unwrap().expander,
            ExpanderGlyph::Closed
        );
        assert_eq!(
            list.row_appearance(leaf).unwrap().expander,
            ExpanderGlyph::None
        );
    }

    #[test]
    fn test_row_appearance_connectors() {
        // root1            connectors for `inner` below:
        //  +- mid1         depth 1: root1 has a later sibling -> true
        //  |   +- inner    depth 2: mid1 has a later sibling -> true
        //  +- mid2
        // root2
        let mut list = TreeList::new(1, 0).unwrap();
        let root1 = list.insert(None, None, NodeInfo::branch("root1")).unwrap();
        let _root2 = list.insert(None, None, NodeInfo::branch("root2")).unwrap();
        let mid1 = list
            .insert(Some(root1), None, NodeInfo::branch("mid1"))
            .unwrap();
        let _mid2 = list
            .insert(Some(root1), None, NodeInfo::branch("mid2"))
            .unwrap();
        let inner = list
            .insert(Some(mid1), None, NodeInfo::leaf("inner"))
            .unwrap();

        let appearance = list.row_appearance(inner).unwrap();
        assert_eq!(appearance.level, 3);
        assert_eq!(appearance.connectors, vec![true, true]);
        assert!(appearance.is_last_sibling);

        let appearance = list.row_appearance(mid1).unwrap();
        assert_eq!(appearance.connectors, vec![true]);
        assert!(!appearance.is_last_sibling);

        // mid2 is the last child: the line at its own depth ends here, and
        // inner's depth-2 connector would be false in a tree without it.
        let appearance = list.row_appearance(_mid2).unwrap();
        assert_eq!(appearance.connectors, vec![true]);
        assert!(appearance.is_last_sibling);
    }

    #[test]
    fn test_row_appearance_indent_tracks_level() {
        let mut list = TreeList::new(1, 0).unwrap();
        list.set_indent(16);
        let root = list.insert(None, None, NodeInfo::branch("root")).unwrap();
        let child = list
            .insert(Some(root), None, NodeInfo::leaf("child"))
            .unwrap();

        assert_eq!(list.row_appearance(root).unwrap().indent, 0);
        assert_eq!(list.row_appearance(child).unwrap().indent, 16);
    }
}
