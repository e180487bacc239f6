use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use sodium as na;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use triqui::{
    config::Settings,
    feed::{HttpFeed, PollStats, Poller},
    Game, Key, Mark, Position, Reading, Triqui, SIZE,
};
use tui::{
    backend::{Backend, CrosstermBackend},
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Paragraph, Widget},
    Frame, Terminal,
};

/// Tic-tac-toe for a keyboard player and a remote keypad device.
#[derive(Parser)]
#[command(name = "triqui", version, about)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    /// Where log output goes while the board owns the terminal.
    #[arg(long, default_value = "triqui.log")]
    log_file: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_file)?;

    let settings = cli.settings;
    info!(feed_url = %settings.feed_url, dedup = ?settings.dedup, "starting triqui");

    let feed = HttpFeed::new(settings.feed_url.clone(), settings.request_timeout())?;
    let poller = Poller::new(feed, settings.poll_interval());
    let stats = poller.stats();
    let (reading_tx, mut reading_rx) = mpsc::unbounded_channel();
    let poll_task = poller.spawn(reading_tx);

    let ctx = na::SodiumCtx::new();
    let (keys, readings, triqui) = ctx.transaction(|| {
        let keys: na::StreamSink<Key> = ctx.new_stream_sink();
        let readings: na::StreamSink<Reading> = ctx.new_stream_sink();
        let triqui = Triqui::new(&ctx, &keys.stream(), &readings.stream(), settings.dedup);
        (keys, readings, triqui)
    });

    let Triqui {
        game, last_reading, ..
    } = triqui;
    let ui = Ui {
        game,
        last_reading,
        stats,
    };

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &ui, &keys, &readings, &mut reading_rx);

    poll_task.abort();
    reading_rx.close();

    // restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    info!(final_state = %ui.game.sample(), "triqui closed");
    res
}

fn init_tracing(path: &Path) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    ui: &Ui,
    keys: &na::StreamSink<Key>,
    readings: &na::StreamSink<Reading>,
    reading_rx: &mut mpsc::UnboundedReceiver<Reading>,
) -> anyhow::Result<()> {
    loop {
        terminal.draw(|f| ui.draw(f))?;

        while let Ok(reading) = reading_rx.try_recv() {
            readings.send(reading);
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    code => {
                        if let Some(key) = to_key(code) {
                            keys.send(key);
                        }
                    }
                }
            }
        }
    }
}

fn to_key(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::Up => Some(Key::Up),
        KeyCode::Down => Some(Key::Down),
        KeyCode::Left => Some(Key::Left),
        KeyCode::Right => Some(Key::Right),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Char(' ') => Some(Key::Space),
        _ => None,
    }
}

struct Ui {
    game: na::Cell<Game>,
    last_reading: na::Cell<Option<Reading>>,
    stats: Arc<PollStats>,
}

impl Ui {
    fn draw<B: Backend>(&self, f: &mut Frame<B>) {
        let game = self.game.sample();

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .margin(2)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)].as_ref())
            .split(f.size());
        let block = Block::default().title("Triqui").borders(Borders::ALL);
        self.draw_board(f, &game, block.inner(chunks[0]));
        f.render_widget(block, chunks[0]);

        let block = Block::default().title("Game Info").borders(Borders::ALL);
        let info = Paragraph::new(self.info_lines(&game)).block(block);
        f.render_widget(info, chunks[1]);
    }

    fn info_lines(&self, game: &Game) -> Vec<Spans<'static>> {
        let player = match game.turn() {
            Mark::X => "Player 1 (keyboard)",
            Mark::O => "Player 2 (device)",
        };
        let last = self
            .last_reading
            .sample()
            .map_or_else(|| "-".to_string(), |reading| reading.to_string());
        vec![
            Spans::from(vec![
                Span::raw("Turn: "),
                Span::styled(
                    format!("{} {}", game.turn(), player),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ]),
            Spans::from(""),
            Spans::from(format!("Last device input: {last}")),
            Spans::from(format!("Feed errors: {}", self.stats.failures())),
            Spans::from(""),
            Spans::from("Player 1: arrows + Enter/Space"),
            Spans::from("Player 2: device keypad"),
            Spans::from("q / Esc: quit"),
        ]
    }

    fn draw_board<B: Backend>(&self, f: &mut Frame<B>, game: &Game, area: Rect) {
        let thirds = [
            Constraint::Percentage(5),
            Constraint::Percentage(30),
            Constraint::Percentage(30),
            Constraint::Percentage(30),
            Constraint::Percentage(5),
        ];
        let vchunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(0)
            .constraints(thirds.as_ref())
            .split(area);

        for row in 0..SIZE {
            let hchunks = Layout::default()
                .direction(Direction::Horizontal)
                .margin(0)
                .horizontal_margin(3)
                .constraints(thirds.as_ref())
                .split(vchunks[row + 1]);

            for col in 0..SIZE {
                let position = Position { row, col };
                let chunk = hchunks[col + 1];
                let mut block = Block::default().borders(square_borders(position));
                if game.cursor() == position {
                    block = block.style(Style::default().bg(Color::DarkGray));
                }
                f.render_widget(RenderMark(game.board().get(position)), block.inner(chunk));
                f.render_widget(block, chunk);
            }
        }
    }
}

/// Inner grid lines only, so the squares read as a tic-tac-toe board.
fn square_borders(position: Position) -> Borders {
    let mut borders = Borders::ALL;
    if position.row == 0 {
        borders ^= Borders::TOP;
    }
    if position.row == SIZE - 1 {
        borders ^= Borders::BOTTOM;
    }
    if position.col == 0 {
        borders ^= Borders::LEFT;
    }
    if position.col == SIZE - 1 {
        borders ^= Borders::RIGHT;
    }
    borders
}

struct RenderMark(Option<Mark>);

impl Widget for RenderMark {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(mark) = self.0 else {
            return;
        };
        if area.width == 0 || area.height == 0 {
            return;
        }
        let color = match mark {
            Mark::X => Color::Cyan,
            Mark::O => Color::Yellow,
        };
        let style = Style::default().fg(color).add_modifier(Modifier::BOLD);
        let paragraph = Paragraph::new(mark.to_string())
            .style(style)
            .alignment(Alignment::Center);
        let middle = Rect {
            y: area.y + area.height / 2,
            height: 1,
            ..area
        };
        paragraph.render(middle, buf);
    }
}
