use serde::{Deserialize, Serialize};

use crate::{
    foundation::error::{ReelError, ReelResult},
    overlay::{
        model::OverlayModel,
        template::{Overlay, compile},
    },
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Row {
    Top,
    Middle,
    Bottom,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Column {
    Left,
    Center,
    Right,
}

/// A position on the 3x3 grid. The center cell is never used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub row: Row,
    pub column: Column,
}

const CELLS: [(&str, Cell); 8] = [
    ("top_left", Cell::new(Row::Top, Column::Left)),
    ("top", Cell::new(Row::Top, Column::Center)),
    ("top_right", Cell::new(Row::Top, Column::Right)),
    ("left", Cell::new(Row::Middle, Column::Left)),
    ("right", Cell::new(Row::Middle, Column::Right)),
    ("bottom_left", Cell::new(Row::Bottom, Column::Left)),
    ("bottom", Cell::new(Row::Bottom, Column::Center)),
    ("bottom_right", Cell::new(Row::Bottom, Column::Right)),
];

impl Cell {
    pub const fn new(row: Row, column: Column) -> Self {
        Self { row, column }
    }
}

/// Overlay templates per grid cell, as written in configuration. Empty strings are
/// treated like absent cells.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutSpec {
    pub top_left: Option<String>,
    pub top: Option<String>,
    pub top_right: Option<String>,
    pub left: Option<String>,
    pub right: Option<String>,
    pub bottom_left: Option<String>,
    pub bottom: Option<String>,
    pub bottom_right: Option<String>,
}

impl Default for LayoutSpec {
    fn default() -> Self {
        Self {
            top_left: Some("{file}".to_owned()),
            top: None,
            top_right: Some("{folder}".to_owned()),
            left: None,
            right: None,
            bottom_left: Some("WARN".to_owned()),
            bottom: None,
            bottom_right: Some("{index:video}".to_owned()),
        }
    }
}

impl LayoutSpec {
    /// Only the warning cell, bottom-left.
    pub fn warning_only() -> Self {
        Self {
            top_left: None,
            top: None,
            top_right: None,
            left: None,
            right: None,
            bottom_left: Some("WARN".to_owned()),
            bottom: None,
            bottom_right: None,
        }
    }

    fn templates(&self) -> [Option<&str>; 8] {
        [
            &self.top_left,
            &self.top,
            &self.top_right,
            &self.left,
            &self.right,
            &self.bottom_left,
            &self.bottom,
            &self.bottom_right,
        ]
        .map(|t| t.as_deref().filter(|s| !s.is_empty()))
    }
}

/// Compiled overlays for the eight outer cells.
#[derive(Debug)]
pub struct Layout {
    cells: Vec<(Cell, Overlay)>,
}

impl Layout {
    /// Compile every cell of `spec`. Fails on the first template error, or when no cell
    /// shows the integrity warning.
    pub fn compile(spec: &LayoutSpec) -> ReelResult<Self> {
        let mut cells = Vec::new();
        for ((name, cell), template) in CELLS.iter().zip(spec.templates()) {
            let Some(template) = template else {
                continue;
            };
            let overlay = compile(template).map_err(|mut e| {
                e.message = format!("cell '{name}': {}", e.message);
                ReelError::Template(e)
            })?;
            cells.push((*cell, overlay));
        }

        if !cells.iter().any(|(_, o)| o.is_warning()) {
            return Err(ReelError::config(
                "layout must bind at least one cell to WARN so integrity warnings stay visible",
            ));
        }
        Ok(Self { cells })
    }

    pub fn cells(&self) -> impl Iterator<Item = (Cell, &Overlay)> {
        self.cells.iter().map(|(c, o)| (*c, o))
    }

    /// Render every cell, dropping empty results.
    pub fn render(&self, model: &OverlayModel) -> Vec<(Cell, String)> {
        self.cells
            .iter()
            .map(|(c, o)| (*c, o.render(model)))
            .filter(|(_, text)| !text.is_empty())
            .collect()
    }
}
