//! The two mini-games sharing the canvas. Each game is a plain state machine
//! advanced by the frame loop and poked by gesture events; neither knows about
//! the DOM.

use std::fmt;
use std::str::FromStr;

pub mod cricket;
pub mod flappy;

pub use cricket::{CricketGame, CricketMode, LastShot, SwingOutcome};
pub use flappy::{FlapOutcome, FlappyGame, FlappyMode, FlappyPhysics, Pipe};

/// Canvas size the simulations lay themselves out in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Arena {
    pub width: f64,
    pub height: f64,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            width: 480.0,
            height: 640.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ActiveGame {
    Flappy,
    Cricket,
}

impl ActiveGame {
    pub fn as_str(self) -> &'static str {
        match self {
            ActiveGame::Flappy => "flappy",
            ActiveGame::Cricket => "cricket",
        }
    }
}

impl fmt::Display for ActiveGame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownGame(pub String);

impl fmt::Display for UnknownGame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown game '{}' (use flappy or cricket)", self.0)
    }
}

impl std::error::Error for UnknownGame {}

impl FromStr for ActiveGame {
    type Err = UnknownGame;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flappy" => Ok(ActiveGame::Flappy),
            "cricket" => Ok(ActiveGame::Cricket),
            _ => Err(UnknownGame(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_game_parse_is_case_insensitive() {
        assert_eq!("Flappy".parse::<ActiveGame>(), Ok(ActiveGame::Flappy));
        assert_eq!(" CRICKET ".parse::<ActiveGame>(), Ok(ActiveGame::Cricket));
        assert!("pong".parse::<ActiveGame>().is_err());
        assert_eq!(ActiveGame::Cricket.to_string(), "cricket");
    }
}
