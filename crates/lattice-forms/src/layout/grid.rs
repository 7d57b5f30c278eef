//! Grid placement and the panels it produces.

use std::sync::Arc;

use lattice_forms_core::{ColumnSpan, GRID_COLUMNS};

use super::PropertyGridItem;
use crate::logging::targets;

/// Where one piece of content landed on the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridCell<T> {
    /// The placed content.
    pub content: T,
    /// Zero-based row.
    pub row: usize,
    /// Zero-based starting column.
    pub column: usize,
    /// Number of columns occupied.
    pub column_span: usize,
}

/// What a panel cell holds.
#[derive(Debug, Clone)]
pub enum PanelContent {
    /// One bound property.
    Item(Arc<PropertyGridItem>),
    /// A titled group.
    Group(GroupFrame),
    /// An untitled panel (the default group).
    Panel(Panel),
}

impl PanelContent {
    /// The height the content needs.
    pub fn height(&self, row_height: f32) -> f32 {
        match self {
            Self::Item(_) => row_height,
            Self::Group(frame) => frame.height(),
            Self::Panel(panel) => panel.height(),
        }
    }
}

/// A panel cell with its vertical position.
#[derive(Debug, Clone)]
pub struct PanelCell {
    /// The content.
    pub content: PanelContent,
    /// Zero-based row.
    pub row: usize,
    /// Zero-based starting column.
    pub column: usize,
    /// Number of columns occupied.
    pub column_span: usize,
    /// Offset of the cell's row from the panel top.
    pub y: f32,
    /// Height of the cell's row.
    pub height: f32,
}

/// Content laid out on the grid.
#[derive(Debug, Clone, Default)]
pub struct Panel {
    cells: Vec<PanelCell>,
    row_heights: Vec<f32>,
    column_count: usize,
}

impl Panel {
    /// The placed cells, in placement order.
    pub fn cells(&self) -> &[PanelCell] {
        &self.cells
    }

    /// The height of each row.
    pub fn row_heights(&self) -> &[f32] {
        &self.row_heights
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.row_heights.len()
    }

    /// Number of grid columns; `0` for an empty panel.
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// Total height.
    pub fn height(&self) -> f32 {
        self.row_heights.iter().sum()
    }

    /// Whether nothing was placed.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Every property item, descending into groups and nested panels.
    pub fn items(&self) -> Vec<Arc<PropertyGridItem>> {
        let mut items = Vec::new();
        self.collect_items(&mut items);
        items
    }

    fn collect_items(&self, items: &mut Vec<Arc<PropertyGridItem>>) {
        for cell in &self.cells {
            match &cell.content {
                PanelContent::Item(item) => items.push(item.clone()),
                PanelContent::Group(frame) => frame.panel.collect_items(items),
                PanelContent::Panel(panel) => panel.collect_items(items),
            }
        }
    }
}

/// A titled frame around a group's panel.
#[derive(Debug, Clone)]
pub struct GroupFrame {
    title: String,
    panel: Panel,
    title_height: f32,
}

impl GroupFrame {
    /// Create a frame.
    pub fn new(title: impl Into<String>, panel: Panel, title_height: f32) -> Self {
        Self {
            title: title.into(),
            panel,
            title_height,
        }
    }

    /// The frame title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The framed panel.
    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    /// Title plus panel height.
    pub fn height(&self) -> f32 {
        self.title_height + self.panel.height()
    }
}

/// Places content on a six-column grid.
#[derive(Debug, Clone, Copy)]
pub struct GridLayout {
    row_height: f32,
}

impl GridLayout {
    /// Create a layout with a fixed item row height.
    pub fn new(row_height: f32) -> Self {
        Self { row_height }
    }

    /// The item row height.
    pub fn row_height(&self) -> f32 {
        self.row_height
    }

    /// Assign rows and columns.
    ///
    /// Spans are clamped into `[1, GRID_COLUMNS]`; [`ColumnSpan::None`]
    /// entries are dropped.
    pub fn place<T>(&self, entries: impl IntoIterator<Item = (T, ColumnSpan)>) -> Vec<GridCell<T>> {
        let mut cells = Vec::new();
        let mut row = 0;
        let mut column = 0;
        for (content, span) in entries {
            let Some(columns) = span.columns() else {
                tracing::trace!(target: targets::LAYOUT, "skipping cell with no span");
                continue;
            };
            let column_span = columns.clamp(1, GRID_COLUMNS);
            if column + column_span > GRID_COLUMNS {
                row += 1;
                column = 0;
            }
            cells.push(GridCell {
                content,
                row,
                column,
                column_span,
            });
            column += column_span;
            if column == GRID_COLUMNS {
                row += 1;
                column = 0;
            }
        }
        cells
    }

    /// Lay out property items with a uniform row height.
    pub fn arrange_items(&self, items: impl IntoIterator<Item = Arc<PropertyGridItem>>) -> Panel {
        let cells = self.place(items.into_iter().map(|item| {
            let span = item.column_span();
            (PanelContent::Item(item), span)
        }));
        let Some(last_row) = cells.iter().map(|c| c.row).max() else {
            return Panel::default();
        };
        let row_heights = vec![self.row_height; last_row + 1];
        self.finish(cells, row_heights)
    }

    /// Lay out nested content; each row is as tall as its tallest cell.
    pub fn compose(&self, entries: impl IntoIterator<Item = (PanelContent, ColumnSpan)>) -> Panel {
        let cells = self.place(entries);
        let Some(last_row) = cells.iter().map(|c| c.row).max() else {
            return Panel::default();
        };
        let mut row_heights = vec![0.0_f32; last_row + 1];
        for cell in &cells {
            let height = cell.content.height(self.row_height);
            row_heights[cell.row] = row_heights[cell.row].max(height);
        }
        self.finish(cells, row_heights)
    }

    fn finish(&self, cells: Vec<GridCell<PanelContent>>, row_heights: Vec<f32>) -> Panel {
        let mut offsets = Vec::with_capacity(row_heights.len());
        let mut y = 0.0;
        for height in &row_heights {
            offsets.push(y);
            y += height;
        }
        let cells = cells
            .into_iter()
            .map(|cell| PanelCell {
                y: offsets[cell.row],
                height: row_heights[cell.row],
                content: cell.content,
                row: cell.row,
                column: cell.column,
                column_span: cell.column_span,
            })
            .collect();
        Panel {
            cells,
            row_heights,
            column_count: GRID_COLUMNS,
        }
    }
}
