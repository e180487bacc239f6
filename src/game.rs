//! The turn reducer: the only code that changes the board, the cursor or the turn.

use std::fmt;

use crate::board::{Board, Direction, Mark, Position};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Move(Direction),
    Confirm,
}

/// Complete state of one game.
///
/// Values are immutable; every transition returns the next state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Game {
    board: Board,
    cursor: Position,
    turn: Mark,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            cursor: Position::default(),
            turn: Mark::X,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn cursor(&self) -> Position {
        self.cursor
    }

    pub fn turn(&self) -> Mark {
        self.turn
    }

    pub fn apply(&self, action: Action) -> Game {
        match action {
            Action::Move(direction) => self.move_cursor(direction),
            Action::Confirm => self.confirm(),
        }
    }

    pub fn move_cursor(&self, direction: Direction) -> Game {
        Game {
            cursor: self.cursor.step(direction),
            ..*self
        }
    }

    /// Places the current mark under the cursor and passes the turn.
    /// An occupied square leaves the game untouched.
    pub fn confirm(&self) -> Game {
        if !self.board.is_valid_move(self.cursor) {
            return *self;
        }
        Game {
            board: self.board.mark(self.cursor, self.turn),
            turn: self.turn.swap(),
            ..*self
        }
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, squares) in self.board.rows().enumerate() {
            if row > 0 {
                f.write_str("---+---+---\n")?;
            }
            let line: Vec<String> = squares
                .iter()
                .enumerate()
                .map(|(col, square)| {
                    let glyph = square.map_or_else(|| " ".to_string(), |m| m.to_string());
                    if self.cursor == (Position { row, col }) {
                        format!("[{glyph}]")
                    } else {
                        format!(" {glyph} ")
                    }
                })
                .collect();
            writeln!(f, "{}", line.join("|"))?;
        }
        write!(f, "{} to play", self.turn)
    }
}
