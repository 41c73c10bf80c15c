//! Row storage: cell contents, selection state, and per-row user data.

use std::any::Any;
use std::fmt;

use crate::render::{Color, Pixmap};

/// Discriminant of a [`Cell`], for cheap type queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellType {
    /// Nothing has been stored in the cell.
    Empty,
    /// Plain text.
    Text,
    /// A pixmap only.
    Pixmap,
    /// A pixmap followed by text.
    PixText,
}

/// Contents of a single cell.
///
/// The tree column of a row is always a [`Cell::Text`] or [`Cell::PixText`];
/// the tree keeps its pixmap slot in sync with the row's expanded state.
#[derive(Clone, Debug)]
pub enum Cell {
    Empty,
    Text(String),
    Pixmap(Pixmap),
    PixText {
        text: String,
        /// Pixels between the pixmap and the text.
        spacing: u8,
        pixmap: Option<Pixmap>,
    },
}

impl Cell {
    /// The cell's type discriminant.
    pub fn cell_type(&self) -> CellType {
        match self {
            Cell::Empty => CellType::Empty,
            Cell::Text(_) => CellType::Text,
            Cell::Pixmap(_) => CellType::Pixmap,
            Cell::PixText { .. } => CellType::PixText,
        }
    }

    /// The cell's text, if it has any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Cell::Text(text) => Some(text),
            Cell::PixText { text, .. } => Some(text),
            _ => None,
        }
    }

    /// The cell's pixmap, if it has one.
    pub fn pixmap(&self) -> Option<&Pixmap> {
        match self {
            Cell::Pixmap(pixmap) => Some(pixmap),
            Cell::PixText { pixmap, .. } => pixmap.as_ref(),
            _ => None,
        }
    }
}

/// Selection state of a row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RowState {
    #[default]
    Normal,
    Selected,
}

/// Per-cell draw offsets, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellShift {
    pub vertical: i16,
    pub horizontal: i16,
}

/// User data attached to a row, with an optional destroy notifier.
///
/// The notifier runs exactly once: when the owning row is deleted, when the
/// data is replaced, or when the whole list is dropped.
pub struct RowData {
    value: Box<dyn Any>,
    destroy: Option<Box<dyn FnOnce()>>,
}

impl RowData {
    /// Wrap a value with no destroy notifier.
    pub fn new<T: Any>(value: T) -> Self {
        Self {
            value: Box::new(value),
            destroy: None,
        }
    }

    /// Wrap a value with a destroy notifier.
    pub fn with_destroy<T: Any, F: FnOnce() + 'static>(value: T, destroy: F) -> Self {
        Self {
            value: Box::new(value),
            destroy: Some(Box::new(destroy)),
        }
    }

    /// The wrapped value.
    pub fn get(&self) -> &dyn Any {
        self.value.as_ref()
    }
}

impl Drop for RowData {
    fn drop(&mut self) {
        if let Some(destroy) = self.destroy.take() {
            destroy();
        }
    }
}

impl fmt::Debug for RowData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowData")
            .field("has_destroy", &self.destroy.is_some())
            .finish_non_exhaustive()
    }
}

/// One row of the list: a fixed-width vector of cells plus row attributes.
#[derive(Debug)]
pub(crate) struct Row {
    pub(crate) cells: Vec<Cell>,
    pub(crate) shifts: Vec<CellShift>,
    pub(crate) state: RowState,
    pub(crate) foreground: Option<Color>,
    pub(crate) background: Option<Color>,
    pub(crate) data: Option<RowData>,
}

impl Row {
    pub(crate) fn new(columns: usize) -> Self {
        Self {
            cells: (0..columns).map(|_| Cell::Empty).collect(),
            shifts: vec![CellShift::default(); columns],
            state: RowState::Normal,
            foreground: None,
            background: None,
            data: None,
        }
    }
}
