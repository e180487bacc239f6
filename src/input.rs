//! Translation of raw keyboard keys and device tokens into game actions.

use std::fmt;

use crate::board::Direction;
use crate::game::Action;

/// Keys the local player can press.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Space,
}

impl Key {
    pub fn action(&self) -> Action {
        match self {
            Key::Up => Action::Move(Direction::Up),
            Key::Down => Action::Move(Direction::Down),
            Key::Left => Action::Move(Direction::Left),
            Key::Right => Action::Move(Direction::Right),
            Key::Enter | Key::Space => Action::Confirm,
        }
    }

    /// Parses a typed key name, as read line by line from a terminal.
    pub fn from_word(word: &str) -> Option<Key> {
        match word.trim().to_lowercase().as_str() {
            "up" | "w" => Some(Key::Up),
            "down" | "s" => Some(Key::Down),
            "left" | "a" => Some(Key::Left),
            "right" | "d" => Some(Key::Right),
            "enter" | "" => Some(Key::Enter),
            "space" => Some(Key::Space),
            _ => None,
        }
    }
}

/// Maps a device token onto an action.
///
/// Tokens are trimmed and lowercased first. Single-letter keypad codes are
/// expanded to their full names. Anything else yields `None`.
pub fn parse_token(raw: &str) -> Option<Action> {
    let token = raw.trim().to_lowercase();
    let canonical = match token.as_str() {
        "a" => "arriba",
        "b" => "abajo",
        "c" => "izquierda",
        "d" => "derecha",
        "s" => "select",
        other => other,
    };
    match canonical {
        "arriba" => Some(Action::Move(Direction::Up)),
        "abajo" => Some(Action::Move(Direction::Down)),
        "izquierda" => Some(Action::Move(Direction::Left)),
        "derecha" => Some(Action::Move(Direction::Right)),
        "select" => Some(Action::Confirm),
        _ => None,
    }
}

/// The newest record reported by the remote feed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reading {
    pub id: Option<String>,
    pub token: String,
}

impl Reading {
    pub fn new(id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            token: token.into(),
        }
    }

    pub fn action(&self) -> Option<Action> {
        parse_token(&self.token)
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{} ({})", self.token.trim(), id),
            None => f.write_str(self.token.trim()),
        }
    }
}

/// Decides when two readings count as the same button press.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum DedupPolicy {
    /// Compare the feed's record identifier, falling back to the token when
    /// a record carries none.
    #[default]
    #[value(name = "id")]
    Identifier,
    /// Compare the normalized token only. The same token twice in a row is
    /// one press; it becomes actionable again after a different token.
    #[value(name = "token")]
    Token,
}

impl DedupPolicy {
    pub fn key(&self, reading: &Reading) -> String {
        let token = || format!("token:{}", reading.token.trim().to_lowercase());
        match (self, &reading.id) {
            (DedupPolicy::Identifier, Some(id)) => format!("id:{id}"),
            (DedupPolicy::Identifier, None) | (DedupPolicy::Token, _) => token(),
        }
    }
}
