use clap::Parser;
use sodium::{SodiumCtx, StreamSink};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use triqui::{
    config::Settings,
    feed::{HttpFeed, Poller},
    Game, Key, Reading, Triqui,
};

/// Line-oriented triqui: type up/down/left/right, then enter or space.
#[derive(Parser)]
#[command(name = "triqui-cli", version, about)]
struct Cli {
    #[command(flatten)]
    settings: Settings,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = Cli::parse().settings;
    let feed = HttpFeed::new(settings.feed_url.clone(), settings.request_timeout())?;
    info!(feed_url = feed.url(), "polling device feed");

    let (reading_tx, mut reading_rx) = mpsc::unbounded_channel();
    let poll_task = Poller::new(feed, settings.poll_interval()).spawn(reading_tx);

    let ctx = SodiumCtx::new();

    let (kb_input, device_input, _listeners) = ctx.transaction(|| {
        let mut listeners = Vec::new();
        let kb_input: StreamSink<Key> = ctx.new_stream_sink();
        let device_input: StreamSink<Reading> = ctx.new_stream_sink();

        let triqui = Triqui::new(
            &ctx,
            &kb_input.stream(),
            &device_input.stream(),
            settings.dedup,
        );

        println!("Welcome to Triqui!\n");
        println!("{}\n", triqui.game.sample());

        listeners.push(
            triqui
                .last_reading
                .updates()
                .listen(|reading: &Option<Reading>| {
                    if let Some(reading) = reading {
                        println!("device pressed {reading}");
                    }
                }),
        );
        listeners.push(
            triqui
                .game
                .updates()
                .listen(|game: &Game| println!("{}\n", game)),
        );

        (kb_input, device_input, listeners)
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match Key::from_word(&line) {
                    Some(key) => kb_input.send(key),
                    None => println!("unknown key {:?}, try up/down/left/right/enter/space", line.trim()),
                }
            }
            reading = reading_rx.recv() => {
                let Some(reading) = reading else {
                    break;
                };
                debug!(%reading, "forwarding device reading");
                device_input.send(reading);
            }
        }
    }

    poll_task.abort();
    Ok(())
}
