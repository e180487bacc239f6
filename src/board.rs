use std::fmt;

pub const SIZE: usize = 3;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn swap(&self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::X => f.write_str("X"),
            Mark::O => f.write_str("O"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// A square on the board, addressed by row then column.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self {
            row: row % SIZE,
            col: col % SIZE,
        }
    }

    /// Moves one square, wrapping around the edges.
    pub fn step(&self, direction: Direction) -> Position {
        let Position { row, col } = *self;
        match direction {
            Direction::Up => Position::new(row + SIZE - 1, col),
            Direction::Down => Position::new(row + 1, col),
            Direction::Left => Position::new(row, col + SIZE - 1),
            Direction::Right => Position::new(row, col + 1),
        }
    }

    fn index(&self) -> usize {
        self.row * SIZE + self.col
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Board {
    squares: [Option<Mark>; SIZE * SIZE],
}

impl Board {
    pub fn new() -> Self {
        let squares = [None; SIZE * SIZE];
        Self { squares }
    }

    pub fn get(&self, position: Position) -> Option<Mark> {
        self.squares[position.index()]
    }

    pub fn mark(&self, position: Position, mark: Mark) -> Board {
        let mut new_board = *self;
        new_board.squares[position.index()] = Some(mark);
        new_board
    }

    pub fn is_valid_move(&self, position: Position) -> bool {
        self.get(position).is_none()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Option<Mark>]> {
        self.squares.chunks(SIZE)
    }

    pub fn marked(&self) -> usize {
        self.squares.iter().filter(|square| square.is_some()).count()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.rows().enumerate() {
            if i > 0 {
                f.write_str("---+---+---\n")?;
            }
            let ds: Vec<String> = row
                .iter()
                .map(|square| square.map_or_else(|| " ".to_string(), |m| m.to_string()))
                .collect();
            writeln!(f, " {} | {} | {}", ds[0], ds[1], ds[2])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIRECTIONS: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    fn all_positions() -> impl Iterator<Item = Position> {
        (0..SIZE).flat_map(|row| (0..SIZE).map(move |col| Position { row, col }))
    }

    #[test]
    fn step_stays_on_the_board() {
        for position in all_positions() {
            for direction in DIRECTIONS {
                let next = position.step(direction);
                assert!(next.row < SIZE && next.col < SIZE, "{next:?}");
            }
        }
    }

    #[test]
    fn opposite_steps_cancel_out() {
        for position in all_positions() {
            assert_eq!(position.step(Direction::Up).step(Direction::Down), position);
            assert_eq!(position.step(Direction::Down).step(Direction::Up), position);
            assert_eq!(position.step(Direction::Left).step(Direction::Right), position);
            assert_eq!(position.step(Direction::Right).step(Direction::Left), position);
        }
    }

    #[test]
    fn step_wraps_at_the_edges() {
        let origin = Position::default();
        assert_eq!(origin.step(Direction::Up), Position { row: 2, col: 0 });
        assert_eq!(origin.step(Direction::Left), Position { row: 0, col: 2 });
        let corner = Position { row: 2, col: 2 };
        assert_eq!(corner.step(Direction::Down), Position { row: 0, col: 2 });
        assert_eq!(corner.step(Direction::Right), Position { row: 2, col: 0 });
    }

    #[test]
    fn mark_leaves_the_original_board_alone() {
        let board = Board::new();
        let center = Position::new(1, 1);
        let marked = board.mark(center, Mark::O);

        assert!(board.is_valid_move(center));
        assert_eq!(marked.get(center), Some(Mark::O));
        assert!(!marked.is_valid_move(center));
        assert_eq!(marked.marked(), 1);
    }

    #[test]
    fn display_draws_rows_top_down() {
        let board = Board::new()
            .mark(Position::new(0, 0), Mark::X)
            .mark(Position::new(2, 1), Mark::O);
        let expected = " X |   |  \n---+---+---\n   |   |  \n---+---+---\n   | O |  \n";
        assert_eq!(board.to_string(), expected);
    }
}
