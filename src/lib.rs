use sodium::{Cell, CellLoop, SodiumCtx, Stream};

mod board;
pub mod config;
pub mod feed;
mod game;
mod input;

pub use board::{Board, Direction, Mark, Position, SIZE};
pub use game::{Action, Game};
pub use input::{parse_token, DedupPolicy, Key, Reading};

/// The game controller.
///
/// Keyboard keys drive X and device readings drive O. Each source is gated on
/// the turn held in `game`, so input from the idle side is dropped rather than
/// queued. Every accepted action is folded into `game` by [`Game::apply`].
pub struct Triqui {
    pub game: Cell<Game>,
    pub actions: Stream<Action>,
    pub last_reading: Cell<Option<Reading>>,
}

struct RemoteInput {
    actions: Stream<Action>,
    consumed: Cell<Option<Reading>>,
}

impl Triqui {
    pub fn new(
        ctx: &SodiumCtx,
        keys: &Stream<Key>,
        readings: &Stream<Reading>,
        dedup: DedupPolicy,
    ) -> Triqui {
        ctx.transaction(|| {
            let game_cell_loop: CellLoop<Game> = ctx.new_cell_loop();
            let game_cell_fwd = game_cell_loop.cell();

            let local_turn = game_cell_fwd.map(|game: &Game| game.turn() == Mark::X);
            let remote_turn = game_cell_fwd.map(|game: &Game| game.turn() == Mark::O);

            let local_actions = keys.gate(&local_turn).map(|key: &Key| key.action());

            let RemoteInput {
                actions: remote_actions,
                consumed,
            } = RemoteInput::new(ctx, readings, &remote_turn, dedup);

            let actions = local_actions.or_else(&remote_actions);

            let game_cell = actions
                .snapshot(&game_cell_fwd, |action: &Action, game: &Game| {
                    game.apply(*action)
                })
                .hold(Game::new());
            game_cell_loop.loop_(&game_cell);

            Triqui {
                game: game_cell,
                actions,
                last_reading: consumed,
            }
        })
    }
}

impl RemoteInput {
    fn new(
        ctx: &SodiumCtx,
        readings: &Stream<Reading>,
        active: &Cell<bool>,
        dedup: DedupPolicy,
    ) -> RemoteInput {
        let last_key_loop: CellLoop<Option<String>> = ctx.new_cell_loop();
        let last_key_fwd = last_key_loop.cell();

        let fresh_readings = readings
            .snapshot(
                &last_key_fwd,
                move |reading: &Reading, last_key: &Option<String>| {
                    let key = dedup.key(reading);
                    if last_key.as_deref() == Some(key.as_str()) {
                        None
                    } else {
                        Some(reading.clone())
                    }
                },
            )
            .filter_option();

        // Only readings taken while O is to play count as consumed; anything
        // else stays eligible for the next poll.
        let consumed_stream = fresh_readings.gate(active);
        let consumed = consumed_stream
            .map(|reading: &Reading| Some(reading.clone()))
            .hold(None);

        let last_key = consumed.map(move |reading: &Option<Reading>| {
            reading.as_ref().map(|reading| dedup.key(reading))
        });
        last_key_loop.loop_(&last_key);

        let actions = consumed_stream
            .map(|reading: &Reading| reading.action())
            .filter_option();

        RemoteInput { actions, consumed }
    }
}
