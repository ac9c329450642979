use std::{error::Error, fmt, str::FromStr};

use lawn_defence_core::{CellCoord, DefenderKind};

/// Delimiter separating the row, column and kind of a placement order.
const FIELD_DELIMITER: char = ':';

/// Defender the headless run places as soon as it is affordable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PlacementOrder {
    /// Cell the defender should occupy.
    pub(crate) cell: CellCoord,
    /// Kind of defender to place.
    pub(crate) kind: DefenderKind,
}

impl FromStr for PlacementOrder {
    type Err = PlacementOrderError;

    /// Parses `row:column:kind`, for example `2:0:peashooter`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(PlacementOrderError::Empty);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let row = parts.next().ok_or(PlacementOrderError::MissingRow)?;
        let column = parts.next().ok_or(PlacementOrderError::MissingColumn)?;
        let kind = parts.next().ok_or(PlacementOrderError::MissingKind)?;
        if parts.next().is_some() {
            return Err(PlacementOrderError::TrailingFields(trimmed.to_owned()));
        }

        let row = parse_index(row)?;
        let column = parse_index(column)?;
        let kind = DefenderKind::from_name(kind.trim())
            .ok_or_else(|| PlacementOrderError::UnknownKind(kind.trim().to_owned()))?;

        Ok(Self {
            cell: CellCoord::new(row, column),
            kind,
        })
    }
}

/// Errors that can occur while parsing placement orders.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum PlacementOrderError {
    /// The order was empty or contained only whitespace.
    Empty,
    /// The order did not contain a row.
    MissingRow,
    /// The order did not contain a column.
    MissingColumn,
    /// The order did not contain a defender kind.
    MissingKind,
    /// The order carried more than three fields.
    TrailingFields(String),
    /// A row or column was not a non-negative integer.
    InvalidIndex(String),
    /// The defender kind is not known.
    UnknownKind(String),
}

impl fmt::Display for PlacementOrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "placement order was empty"),
            Self::MissingRow => write!(f, "placement order is missing the row"),
            Self::MissingColumn => write!(f, "placement order is missing the column"),
            Self::MissingKind => write!(f, "placement order is missing the defender kind"),
            Self::TrailingFields(order) => {
                write!(f, "placement order '{order}' has too many fields")
            }
            Self::InvalidIndex(index) => write!(f, "could not parse cell index '{index}'"),
            Self::UnknownKind(kind) => {
                let known: Vec<&str> = DefenderKind::ALL.iter().map(|kind| kind.name()).collect();
                write!(f, "unknown defender '{kind}' (expected one of {})", known.join(", "))
            }
        }
    }
}

impl Error for PlacementOrderError {}

fn parse_index(value: &str) -> Result<u32, PlacementOrderError> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| PlacementOrderError::InvalidIndex(value.to_owned()))
}
