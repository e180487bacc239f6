use std::sync::{Arc, Mutex};

use sodium::{SodiumCtx, StreamSink};

use triqui::{Action, DedupPolicy, Direction, Game, Key, Mark, Position, Reading, Triqui};

struct Harness {
    keys: StreamSink<Key>,
    readings: StreamSink<Reading>,
    triqui: Triqui,
    _ctx: SodiumCtx,
}

impl Harness {
    fn new(dedup: DedupPolicy) -> Harness {
        let ctx = SodiumCtx::new();
        let (keys, readings, triqui) = ctx.transaction(|| {
            let keys: StreamSink<Key> = ctx.new_stream_sink();
            let readings: StreamSink<Reading> = ctx.new_stream_sink();
            let triqui = Triqui::new(&ctx, &keys.stream(), &readings.stream(), dedup);
            (keys, readings, triqui)
        });
        Harness {
            keys,
            readings,
            triqui,
            _ctx: ctx,
        }
    }

    fn game(&self) -> Game {
        self.triqui.game.sample()
    }

    fn remote(&self, id: &str, token: &str) {
        self.readings.send(Reading::new(id, token));
    }
}

#[test]
fn starts_with_an_empty_board() {
    let h = Harness::new(DedupPolicy::Identifier);
    let game = h.game();

    assert_eq!(game, Game::new());
    assert_eq!(game.turn(), Mark::X);
    assert_eq!(game.cursor(), Position::new(0, 0));
    assert_eq!(game.board().marked(), 0);
    assert_eq!(h.triqui.last_reading.sample(), None);
}

#[test]
fn keyboard_then_device_round() {
    let h = Harness::new(DedupPolicy::Identifier);

    h.keys.send(Key::Enter);
    assert_eq!(h.game().board().get(Position::new(0, 0)), Some(Mark::X));
    assert_eq!(h.game().turn(), Mark::O);

    h.remote("r1", "arriba");
    assert_eq!(h.game().cursor(), Position::new(2, 0));

    let before = h.game();
    h.remote("r1", "arriba");
    assert_eq!(h.game(), before);

    h.remote("r2", "select");
    assert_eq!(h.game().board().get(Position::new(2, 0)), Some(Mark::O));
    assert_eq!(h.game().turn(), Mark::X);
}

#[test]
fn keyboard_is_ignored_on_the_device_turn() {
    let h = Harness::new(DedupPolicy::Identifier);
    h.keys.send(Key::Space);
    let before = h.game();

    h.keys.send(Key::Right);
    h.keys.send(Key::Enter);

    assert_eq!(h.game(), before);
}

#[test]
fn device_is_ignored_on_the_keyboard_turn() {
    let h = Harness::new(DedupPolicy::Identifier);

    h.remote("r1", "derecha");
    h.remote("r2", "select");

    assert_eq!(h.game(), Game::new());
    assert_eq!(h.triqui.last_reading.sample(), None);
}

#[test]
fn reading_seen_while_idle_is_acted_on_once_o_plays() {
    let h = Harness::new(DedupPolicy::Identifier);

    h.remote("r1", "abajo");
    h.keys.send(Key::Enter);
    h.remote("r1", "abajo");
    assert_eq!(h.game().cursor(), Position::new(1, 0));

    h.remote("r1", "abajo");
    assert_eq!(h.game().cursor(), Position::new(1, 0));
}

#[test]
fn unknown_tokens_change_nothing() {
    let h = Harness::new(DedupPolicy::Identifier);
    h.keys.send(Key::Enter);
    let before = h.game();

    h.remote("r1", "xyz");
    h.remote("r2", "");

    assert_eq!(h.game(), before);
    assert_eq!(h.triqui.last_reading.sample(), Some(Reading::new("r2", "")));
}

#[test]
fn device_cannot_overwrite_a_mark() {
    let h = Harness::new(DedupPolicy::Identifier);
    h.keys.send(Key::Enter);

    h.remote("r1", "s");
    assert_eq!(h.game().board().get(Position::new(0, 0)), Some(Mark::X));
    assert_eq!(h.game().turn(), Mark::O);

    h.remote("r2", "d");
    h.remote("r3", "s");
    assert_eq!(h.game().board().get(Position::new(0, 1)), Some(Mark::O));
    assert_eq!(h.game().turn(), Mark::X);
}

#[test]
fn same_token_with_new_id_repeats_under_id_policy() {
    let h = Harness::new(DedupPolicy::Identifier);
    h.keys.send(Key::Enter);

    h.remote("r1", "derecha");
    h.remote("r2", "derecha");

    assert_eq!(h.game().cursor(), Position::new(0, 2));
}

#[test]
fn token_policy_needs_a_different_token_in_between() {
    let h = Harness::new(DedupPolicy::Token);
    h.keys.send(Key::Enter);

    h.remote("r1", "derecha");
    h.remote("r2", "DERECHA ");
    assert_eq!(h.game().cursor(), Position::new(0, 1));

    h.remote("r3", "abajo");
    h.remote("r4", "derecha");
    assert_eq!(h.game().cursor(), Position::new(1, 2));
}

#[test]
fn actions_stream_reports_accepted_input_only() {
    let h = Harness::new(DedupPolicy::Identifier);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let _listener = h.triqui.actions.listen({
        let seen = Arc::clone(&seen);
        move |action: &Action| seen.lock().unwrap().push(*action)
    });

    h.remote("r0", "arriba");
    h.keys.send(Key::Down);
    h.keys.send(Key::Enter);
    h.keys.send(Key::Up);
    h.remote("r1", "izquierda");
    h.remote("r1", "izquierda");

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            Action::Move(Direction::Down),
            Action::Confirm,
            Action::Move(Direction::Left),
        ]
    );
}
