mod app;
mod clipboard;
mod config;
mod error;
mod event;
mod git;
mod message;
#[cfg(test)]
mod testing;
mod tui;
mod types;
mod ui;

use std::panic;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::app::App;
use crate::clipboard::SystemClipboard;
use crate::config::Config;
use crate::event::Event;
use crate::git::LocalRepository;
use crate::message::{Message, Task};
use crate::tui::EventHandler;
use crate::ui::Common;

/// Browse a git repository in the terminal.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the repository
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Base URL shown in the clone command
    #[arg(long)]
    public_url: Option<String>,

    /// Write logs here instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let writer = match &args.log_file {
        Some(path) => BoxMakeWriter::new(std::sync::Mutex::new(std::fs::File::create(path)?)),
        None => BoxMakeWriter::new(std::io::stderr),
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
        .init();

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = tui::restore();
        original_hook(panic_info);
    }));

    let mut config = Config::load();
    if let Some(url) = args.public_url {
        config.ssh.public_url = url;
    }

    let repo = LocalRepository::open(&args.path)?;
    let common = Common::new(config, Arc::new(SystemClipboard));

    let result = run(common, Arc::new(repo)).await;

    tui::restore()?;

    result
}

/// Run a task in the background and feed its message back into the loop.
fn spawn(task: Task, tx: &mpsc::UnboundedSender<Message>) {
    let tx = tx.clone();
    tokio::spawn(async move {
        let msg = task.resolve().await;
        if !matches!(msg, Message::None) {
            tx.send(msg).ok();
        }
    });
}

async fn run(
    common: Common,
    repo: Arc<LocalRepository>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut terminal = tui::init()?;
    let size = terminal.size()?;

    let (msg_tx, mut msg_rx) = mpsc::unbounded_channel::<Message>();
    let mut events = EventHandler::new(common.config.render_rate());
    let mut app = App::new(common);

    let mut tasks = app.update(Message::Resize {
        width: size.width,
        height: size.height,
    });
    tasks.extend(app.init(repo));
    for task in tasks {
        spawn(task, &msg_tx);
    }

    loop {
        tokio::select! {
            Some(event) = events.next() => {
                if event.is_quit() {
                    break;
                }

                match event {
                    Event::Render => {
                        terminal.draw(|frame| ui::render(frame, &app))?;
                    }
                    _ => {
                        let msg = app.handle_event(event);
                        if !matches!(msg, Message::None) {
                            msg_tx.send(msg)?;
                        }
                    }
                }
            }
            Some(msg) = msg_rx.recv() => {
                for task in app.update(msg) {
                    spawn(task, &msg_tx);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
