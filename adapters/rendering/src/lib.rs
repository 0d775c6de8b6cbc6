#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Gated Caves adapters.
//!
//! Levels are presented as character frames: one glyph per cell, rows printed
//! from the top of the map (highest `y`) down so the picture matches the
//! coordinate system used by the generators.

use anyhow::{Context, Result as AnyResult};
use gated_caves_core::{CellKind, Grid, Item, Position};
use std::{error::Error, fmt, io::Write};

/// Glyph drawn on the player's cell.
pub const PLAYER_GLYPH: char = '@';

/// Glyph used for a tile kind.
#[must_use]
pub const fn tile_glyph(kind: CellKind) -> char {
    match kind {
        CellKind::Floor => '.',
        CellKind::Wall => '#',
        CellKind::Mountain => '^',
        CellKind::ShallowWater => '~',
        CellKind::MediumWater => '=',
        CellKind::DeepWater => '%',
    }
}

/// Glyph used for an item lying on the map.
#[must_use]
pub const fn item_glyph(item: Item) -> char {
    match item {
        Item::Boat => 'B',
        Item::Goat => 'G',
        Item::Pickaxe => 'P',
    }
}

/// Grid of glyphs ready to be printed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextFrame {
    glyphs: Grid<char>,
}

impl TextFrame {
    /// Draws every tile of a composed level.
    #[must_use]
    pub fn from_terrain(terrain: &Grid<CellKind>) -> Self {
        Self {
            glyphs: terrain.map(|_, kind| tile_glyph(*kind)),
        }
    }

    /// Draws a raw cave snapshot where `true` marks a wall.
    #[must_use]
    pub fn from_cave(cave: &Grid<bool>) -> Self {
        Self {
            glyphs: cave.map(|_, wall| {
                if *wall {
                    tile_glyph(CellKind::Wall)
                } else {
                    tile_glyph(CellKind::Floor)
                }
            }),
        }
    }

    /// Width and height of the frame in cells.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        self.glyphs.dimensions()
    }

    /// Overdraws a single cell with a marker glyph.
    pub fn mark(&mut self, position: Position, glyph: char) -> Result<(), RenderingError> {
        if self.glyphs.set(position, glyph) {
            Ok(())
        } else {
            Err(RenderingError::MarkerOutOfBounds { position })
        }
    }

    /// Rows of the frame from top to bottom.
    #[must_use]
    pub fn rows(&self) -> Vec<String> {
        let (width, _) = self.glyphs.dimensions();
        let width = usize::try_from(width).unwrap_or(usize::MAX).max(1);
        self.glyphs
            .cells()
            .chunks(width)
            .rev()
            .map(|row| row.iter().collect())
            .collect()
    }
}

impl fmt::Display for TextFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Presentation {
    /// Heading printed above the frame.
    pub title: String,
    /// Frame content that should be displayed.
    pub frame: TextFrame,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(title: T, frame: TextFrame) -> Self
    where
        T: Into<String>,
    {
        Self {
            title: title.into(),
            frame,
        }
    }
}

/// Rendering backend capable of presenting Gated Caves frames.
pub trait RenderingBackend {
    /// Presents a single frame.
    fn present(&mut self, presentation: &Presentation) -> AnyResult<()>;
}

/// Backend that prints frames to any writer.
#[derive(Debug)]
pub struct TextBackend<W> {
    out: W,
}

impl<W: Write> TextBackend<W> {
    /// Creates a backend printing to `out`.
    #[must_use]
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    /// Returns the underlying writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RenderingBackend for TextBackend<W> {
    fn present(&mut self, presentation: &Presentation) -> AnyResult<()> {
        writeln!(self.out, "{}", presentation.title).context("failed to write frame title")?;
        write!(self.out, "{}", presentation.frame).context("failed to write frame")?;
        self.out.flush().context("failed to flush frame")?;
        Ok(())
    }
}

/// Errors that can occur when drawing frames.
#[derive(Debug, PartialEq, Eq)]
pub enum RenderingError {
    /// A marker was placed outside the frame.
    MarkerOutOfBounds {
        /// Position that failed validation.
        position: Position,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MarkerOutOfBounds { position } => {
                write!(
                    f,
                    "marker at ({}, {}) lies outside the frame",
                    position.x(),
                    position.y()
                )
            }
        }
    }
}

impl Error for RenderingError {}
