#![allow(clippy::missing_errors_doc)]

use std::{error::Error, fmt};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use gated_caves_core::{CellKind, Grid, Position};
use gated_caves_rendering::tile_glyph;
use gated_caves_system_bootstrap::{Level, Placement};
use serde::{Deserialize, Serialize};

const LAYOUT_DOMAIN: &str = "caves";
const LAYOUT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded layout payload.
pub(crate) const LAYOUT_HEADER: &str = "caves:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

const TILE_KINDS: [CellKind; 6] = [
    CellKind::Floor,
    CellKind::Wall,
    CellKind::Mountain,
    CellKind::ShallowWater,
    CellKind::MediumWater,
    CellKind::DeepWater,
];

/// Snapshot of a generated level that fits on a single line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct LevelLayout {
    /// Number of columns contained in the grid.
    pub width: u32,
    /// Number of rows contained in the grid.
    pub height: u32,
    /// Seed the level was generated from.
    pub seed: u64,
    /// Tile glyphs, one string per row, starting at `y = 0`.
    pub rows: Vec<String>,
    /// Cell the player starts on.
    pub spawn: Position,
    /// Items lying on the level.
    pub items: Vec<Placement>,
}

impl LevelLayout {
    /// Captures the tiles, spawn and items of a level.
    #[must_use]
    pub(crate) fn from_level(level: &Level) -> Self {
        let tiles = level.tiles();
        let (width, height) = tiles.dimensions();
        let row_length = usize::try_from(width).unwrap_or(usize::MAX).max(1);
        let rows = tiles
            .cells()
            .chunks(row_length)
            .map(|row| row.iter().map(|kind| tile_glyph(*kind)).collect())
            .collect();

        Self {
            width,
            height,
            seed: level.seed(),
            rows,
            spawn: level.spawn(),
            items: level.items().to_vec(),
        }
    }

    /// Rebuilds the level, checking the rows against the declared dimensions.
    pub(crate) fn into_level(self) -> Result<Level, LayoutTransferError> {
        let mut rows = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let kinds = row
                .chars()
                .map(kind_from_glyph)
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(kinds);
        }

        let tiles = Grid::from_rows(rows).ok_or(LayoutTransferError::RaggedRows)?;
        if tiles.dimensions() != (self.width, self.height) {
            return Err(LayoutTransferError::DimensionMismatch {
                declared: (self.width, self.height),
                actual: tiles.dimensions(),
            });
        }

        Ok(Level::new(self.seed, tiles, self.spawn, self.items))
    }

    /// Encodes the layout into a single-line string suitable for clipboard transfer.
    pub(crate) fn encode(&self) -> Result<String, LayoutTransferError> {
        let payload = SerializableLayout {
            seed: self.seed,
            rows: self.rows.clone(),
            spawn: self.spawn,
            items: self.items.clone(),
        };
        let json = serde_json::to_vec(&payload).map_err(LayoutTransferError::InvalidPayload)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!("{LAYOUT_HEADER}:{}x{}:{encoded}", self.width, self.height))
    }

    /// Decodes a layout from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, LayoutTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(LayoutTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(LayoutTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(LayoutTransferError::MissingVersion)?;
        let dimensions = parts.next().ok_or(LayoutTransferError::MissingDimensions)?;
        let payload = parts.next().ok_or(LayoutTransferError::MissingPayload)?;

        if domain != LAYOUT_DOMAIN {
            return Err(LayoutTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != LAYOUT_VERSION {
            return Err(LayoutTransferError::UnsupportedVersion(version.to_owned()));
        }

        let (width, height) = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(LayoutTransferError::InvalidEncoding)?;
        let decoded: SerializableLayout =
            serde_json::from_slice(&bytes).map_err(LayoutTransferError::InvalidPayload)?;

        Ok(Self {
            width,
            height,
            seed: decoded.seed,
            rows: decoded.rows,
            spawn: decoded.spawn,
            items: decoded.items,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SerializableLayout {
    seed: u64,
    rows: Vec<String>,
    spawn: Position,
    items: Vec<Placement>,
}

fn kind_from_glyph(glyph: char) -> Result<CellKind, LayoutTransferError> {
    TILE_KINDS
        .into_iter()
        .find(|kind| tile_glyph(*kind) == glyph)
        .ok_or(LayoutTransferError::InvalidTile(glyph))
}

/// Errors that can occur while decoding layout transfer strings.
#[derive(Debug)]
pub(crate) enum LayoutTransferError {
    /// The provided string was empty or contained only whitespace.
    EmptyPayload,
    /// The prefix segment was missing from the encoded layout.
    MissingPrefix,
    /// The encoded layout did not contain a version segment.
    MissingVersion,
    /// The encoded layout did not include grid dimensions.
    MissingDimensions,
    /// The encoded layout did not include the payload segment.
    MissingPayload,
    /// The encoded layout used an unexpected prefix segment.
    InvalidPrefix(String),
    /// The encoded layout used an unsupported version identifier.
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed from the encoded layout.
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    InvalidEncoding(base64::DecodeError),
    /// The payload could not be serialised or deserialised.
    InvalidPayload(serde_json::Error),
    /// A row contained a character that is not a tile glyph.
    InvalidTile(char),
    /// The rows had different lengths.
    RaggedRows,
    /// The rows did not match the dimensions in the header.
    DimensionMismatch {
        /// Dimensions named in the header.
        declared: (u32, u32),
        /// Dimensions of the decoded rows.
        actual: (u32, u32),
    },
}

impl fmt::Display for LayoutTransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "layout string was empty"),
            Self::MissingPrefix => write!(f, "layout string is missing the prefix"),
            Self::MissingVersion => write!(f, "layout string is missing the version"),
            Self::MissingDimensions => write!(f, "layout string is missing the grid dimensions"),
            Self::MissingPayload => write!(f, "layout string is missing the payload"),
            Self::InvalidPrefix(prefix) => write!(f, "layout prefix '{prefix}' is not supported"),
            Self::UnsupportedVersion(version) => {
                write!(f, "layout version '{version}' is not supported")
            }
            Self::InvalidDimensions(dimensions) => {
                write!(f, "could not parse grid dimensions '{dimensions}'")
            }
            Self::InvalidEncoding(error) => {
                write!(f, "could not decode layout payload: {error}")
            }
            Self::InvalidPayload(error) => {
                write!(f, "could not parse layout payload: {error}")
            }
            Self::InvalidTile(glyph) => write!(f, "'{glyph}' is not a tile glyph"),
            Self::RaggedRows => write!(f, "layout rows have different lengths"),
            Self::DimensionMismatch { declared, actual } => write!(
                f,
                "layout declares {}x{} tiles but holds {}x{}",
                declared.0, declared.1, actual.0, actual.1
            ),
        }
    }
}

impl Error for LayoutTransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) => Some(error),
            _ => None,
        }
    }
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), LayoutTransferError> {
    let (width, height) = dimensions
        .split_once(['x', 'X'])
        .ok_or_else(|| LayoutTransferError::InvalidDimensions(dimensions.to_owned()))?;

    let width = width
        .trim()
        .parse::<u32>()
        .map_err(|_| LayoutTransferError::InvalidDimensions(dimensions.to_owned()))?;
    let height = height
        .trim()
        .parse::<u32>()
        .map_err(|_| LayoutTransferError::InvalidDimensions(dimensions.to_owned()))?;

    if width == 0 || height == 0 {
        return Err(LayoutTransferError::InvalidDimensions(
            dimensions.to_owned(),
        ));
    }

    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gated_caves_core::Item;

    fn small_level() -> Level {
        let tiles = Grid::from_rows(vec![
            vec![CellKind::Floor, CellKind::ShallowWater, CellKind::Floor],
            vec![CellKind::Mountain, CellKind::Wall, CellKind::DeepWater],
        ])
        .expect("rectangular");
        Level::new(
            42,
            tiles,
            Position::new(0, 0),
            vec![Placement {
                item: Item::Boat,
                position: Position::new(2, 0),
            }],
        )
    }

    #[test]
    fn round_trip_level_layout() {
        let level = small_level();
        let layout = LevelLayout::from_level(&level);

        let encoded = layout.encode().expect("layout encodes");
        assert!(encoded.starts_with(&format!("{LAYOUT_HEADER}:3x2:")));

        let decoded = LevelLayout::decode(&encoded).expect("layout decodes");
        assert_eq!(decoded, layout);
        assert_eq!(decoded.into_level().expect("rows are valid"), level);
    }

    #[test]
    fn rows_start_at_the_bottom_of_the_map() {
        let layout = LevelLayout::from_level(&small_level());

        assert_eq!(layout.rows, vec![".~.".to_owned(), "^#%".to_owned()]);
    }

    #[test]
    fn foreign_prefix_is_rejected() {
        let error = LevelLayout::decode("maze:v1:3x2:e30").expect_err("wrong domain");

        let LayoutTransferError::InvalidPrefix(prefix) = error else {
            panic!("expected an invalid prefix");
        };
        assert_eq!(prefix, "maze");
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        let error = LevelLayout::decode("caves:v1:0x2:e30").expect_err("empty grid");

        assert!(matches!(error, LayoutTransferError::InvalidDimensions(_)));
    }

    #[test]
    fn unknown_glyphs_are_rejected() {
        let mut layout = LevelLayout::from_level(&small_level());
        layout.rows[0] = ".?.".to_owned();

        assert!(matches!(
            layout.into_level(),
            Err(LayoutTransferError::InvalidTile('?'))
        ));
    }

    #[test]
    fn rows_must_match_the_declared_dimensions() {
        let mut layout = LevelLayout::from_level(&small_level());
        layout.height = 5;

        assert!(matches!(
            layout.into_level(),
            Err(LayoutTransferError::DimensionMismatch {
                declared: (3, 5),
                actual: (3, 2),
            })
        ));
    }
}
