//! Single-writer task per theater.
//!
//! The task owns its [`Theater`] outright. Inbound RPCs reach it as
//! [`Command`]s over an mpsc channel and the playback clock is awaited in the
//! same `select!`, so commands and timer expiries are applied one at a time.
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use super::{timer, Theater, TheaterError};
use crate::{
    models::{HelloResults, MediaInfo, QueueItem, TheaterSummary},
    state::{ConnId, Connection},
};

const COMMAND_BACKLOG: usize = 64;

type Reply<T> = oneshot::Sender<T>;

#[derive(Debug)]
pub enum Command {
    Enter   { conn: Connection, reply: Reply<Result<(), TheaterError>> },
    Leave   { conn: ConnId },
    Hello   { conn: ConnId, name: String, reply: Reply<HelloResults> },
    Enqueue { conn: ConnId, media: MediaInfo, reply: Reply<Result<(), TheaterError>> },
    Deque   { index: i64, reply: Reply<Option<QueueItem>> },
    Pause   { position: Option<f64>, reply: Reply<Result<bool, TheaterError>> },
    Resume  { reply: Reply<Result<bool, TheaterError>> },
    Seek    { position: f64, reply: Reply<Result<bool, TheaterError>> },
    Summary { reply: Reply<TheaterSummary> },
}

/// Cheap, cloneable capability to talk to one theater task.
#[derive(Clone, Debug)]
pub struct TheaterHandle {
    id:   String,
    name: String,
    tx:   mpsc::Sender<Command>,
}

impl TheaterHandle {
    /// Move `theater` onto its own task.
    pub fn spawn(theater: Theater) -> Self {
        let (tx, rx) = mpsc::channel(COMMAND_BACKLOG);
        let handle = Self { id: theater.id().to_owned(), name: theater.name().to_owned(), tx };
        tokio::spawn(run(theater, rx));
        handle
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn name(&self) -> &str { &self.name }

    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<T, TheaterError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(make(reply)).await.map_err(|_| TheaterError::Closed)?;
        rx.await.map_err(|_| TheaterError::Closed)
    }

    pub async fn enter(&self, conn: Connection) -> Result<(), TheaterError> {
        self.request(|reply| Command::Enter { conn, reply }).await?
    }

    pub async fn leave(&self, conn: ConnId) {
        self.tx.send(Command::Leave { conn }).await.ok();
    }

    pub async fn hello(&self, conn: ConnId, name: String) -> Result<HelloResults, TheaterError> {
        self.request(|reply| Command::Hello { conn, name, reply }).await
    }

    pub async fn enqueue(&self, conn: ConnId, media: MediaInfo) -> Result<(), TheaterError> {
        self.request(|reply| Command::Enqueue { conn, media, reply }).await?
    }

    pub async fn remove_at(&self, index: i64) -> Result<Option<QueueItem>, TheaterError> {
        self.request(|reply| Command::Deque { index, reply }).await
    }

    pub async fn pause(&self, position: Option<f64>) -> Result<bool, TheaterError> {
        self.request(|reply| Command::Pause { position, reply }).await?
    }

    pub async fn resume(&self) -> Result<bool, TheaterError> {
        self.request(|reply| Command::Resume { reply }).await?
    }

    pub async fn seek(&self, position: f64) -> Result<bool, TheaterError> {
        self.request(|reply| Command::Seek { position, reply }).await?
    }

    pub async fn summary(&self) -> Result<TheaterSummary, TheaterError> {
        self.request(|reply| Command::Summary { reply }).await
    }
}

async fn run(mut theater: Theater, mut rx: mpsc::Receiver<Command>) {
    info!(theater = %theater.id(), name = %theater.name(), "theater open");
    loop {
        let deadline = theater.deadline();
        tokio::select! {
            biased;
            _ = timer::expiry(deadline) => theater.on_timer_fired(),
            cmd = rx.recv() => match cmd {
                Some(cmd) => apply(&mut theater, cmd),
                None      => break,
            },
        }
        debug_assert!(theater.consistent(), "theater state out of sync: {theater:?}");
    }
    info!(theater = %theater.id(), "theater closed");
}

fn apply(theater: &mut Theater, cmd: Command) {
    debug!(theater = %theater.id(), ?cmd, "command");
    match cmd {
        Command::Enter { conn, reply } => {
            reply.send(theater.enter(&conn)).ok();
        }
        Command::Leave { conn } => theater.leave(conn),
        Command::Hello { conn, name, reply } => {
            reply.send(theater.hello(conn, name)).ok();
        }
        Command::Enqueue { conn, media, reply } => {
            let submitted_by = theater.username(conn);
            reply.send(theater.enqueue(QueueItem { media, submitted_by })).ok();
        }
        Command::Deque { index, reply } => {
            reply.send(theater.remove_at(index)).ok();
        }
        Command::Pause { position, reply } => {
            reply.send(theater.pause(position)).ok();
        }
        Command::Resume { reply } => {
            reply.send(theater.resume()).ok();
        }
        Command::Seek { position, reply } => {
            reply.send(theater.seek(position)).ok();
        }
        Command::Summary { reply } => {
            reply.send(theater.summary()).ok();
        }
    }
}
