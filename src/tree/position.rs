//! Placement modes and positions
//!
//! A node is placed under its parent at a position drawn from the
//! enumeration of its own mode: `left`/`right` for normal accounts and the
//! four quadrants for premium accounts. Every quadrant also belongs to one
//! coarse side, which is what binary pairing counts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::TreeError;

/// Scoring and placement scheme of a node
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Normal,
    Premium,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Premium => "premium",
        }
    }

    pub fn is_premium(&self) -> bool {
        matches!(self, Self::Premium)
    }

    /// Positions a node of this mode may be placed at
    pub fn positions(&self) -> &'static [Position] {
        match self {
            Self::Normal => &[Position::Left, Position::Right],
            Self::Premium => &[
                Position::LeftLeft,
                Position::LeftRight,
                Position::RightLeft,
                Position::RightRight,
            ],
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Self::Normal),
            "premium" => Ok(Self::Premium),
            other => Err(TreeError::BadRequest(format!("Unknown mode '{}'", other))),
        }
    }
}

/// Coarse branch used by binary pairing
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

/// Fine branch used by premium pairing
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum Quadrant {
    LeftLeft,
    LeftRight,
    RightLeft,
    RightRight,
}

impl Quadrant {
    pub fn side(&self) -> Side {
        match self {
            Self::LeftLeft | Self::LeftRight => Side::Left,
            Self::RightLeft | Self::RightRight => Side::Right,
        }
    }
}

/// Placement of a node relative to its parent
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum Position {
    Left,
    Right,
    LeftLeft,
    LeftRight,
    RightLeft,
    RightRight,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::LeftLeft => "leftLeft",
            Self::LeftRight => "leftRight",
            Self::RightLeft => "rightLeft",
            Self::RightRight => "rightRight",
        }
    }

    /// The mode whose enumeration contains this position
    pub fn mode(&self) -> Mode {
        match self {
            Self::Left | Self::Right => Mode::Normal,
            _ => Mode::Premium,
        }
    }

    pub fn side(&self) -> Side {
        match self {
            Self::Left | Self::LeftLeft | Self::LeftRight => Side::Left,
            Self::Right | Self::RightLeft | Self::RightRight => Side::Right,
        }
    }

    pub fn quadrant(&self) -> Option<Quadrant> {
        match self {
            Self::LeftLeft => Some(Quadrant::LeftLeft),
            Self::LeftRight => Some(Quadrant::LeftRight),
            Self::RightLeft => Some(Quadrant::RightLeft),
            Self::RightRight => Some(Quadrant::RightRight),
            Self::Left | Self::Right => None,
        }
    }

    /// Parse a position and check it belongs to `mode`'s enumeration
    pub fn parse_for(mode: Mode, raw: &str) -> Result<Self, TreeError> {
        let invalid = || TreeError::InvalidPosition {
            position: raw.to_string(),
            mode: mode.to_string(),
        };
        let position = raw.parse::<Position>().map_err(|_| invalid())?;
        if position.mode() != mode {
            return Err(invalid());
        }
        Ok(position)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Position {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "leftLeft" => Ok(Self::LeftLeft),
            "leftRight" => Ok(Self::LeftRight),
            "rightLeft" => Ok(Self::RightLeft),
            "rightRight" => Ok(Self::RightRight),
            other => Err(TreeError::BadRequest(format!(
                "Unknown position '{}'",
                other
            ))),
        }
    }
}
