use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::message::{Message, Task};

const FRAMES: &[&str] = &["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque token telling which spinner a tick belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpinnerId(u64);

impl SpinnerId {
    fn next() -> Self {
        SpinnerId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Loading indicator. Every spinner gets a fresh identity, so ticks scheduled
/// for a replaced spinner are recognisably stale.
#[derive(Debug, Clone)]
pub struct Spinner {
    id: SpinnerId,
    frame: usize,
    interval: Duration,
}

impl Spinner {
    pub fn new(interval: Duration) -> Self {
        Self {
            id: SpinnerId::next(),
            frame: 0,
            interval,
        }
    }

    pub fn id(&self) -> SpinnerId {
        self.id
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Schedule the next tick for this spinner.
    pub fn tick(&self) -> Task {
        let id = self.id;
        let interval = self.interval;
        Task::new(async move {
            tokio::time::sleep(interval).await;
            Message::SpinnerTick(id)
        })
    }

    pub fn update(&mut self, msg: &Message) -> Vec<Task> {
        match msg {
            Message::SpinnerTick(id) if *id == self.id => {
                self.frame = (self.frame + 1) % FRAMES.len();
                vec![self.tick()]
            }
            _ => Vec::new(),
        }
    }

    pub fn view(&self) -> &'static str {
        FRAMES[self.frame % FRAMES.len()]
    }
}
