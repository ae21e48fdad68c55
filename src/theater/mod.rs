//! One theater: queue, now-playing item, playback clock and occupants.
//!
//! `Theater` itself is synchronous. It is owned by a single task (see
//! [`handle`]) which is the only place its methods are called from, so every
//! mutation, including timer driven advancement, happens in one total order.
pub mod handle;
pub mod queue;
pub mod timer;

use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::{
    models::{HelloResults, QueueItem, RoomState, TheaterSummary},
    rpc::responses::{Dequeued, Enqueued, Join, NowPlaying, Pausing, Response, Resuming, Seeking},
    state::{ConnId, Connection, Tx},
};
pub use handle::TheaterHandle;
use queue::PlayQueue;
use timer::{Timer, TimerError};

/// Pad added to every scheduled duration to absorb client start-up skew.
pub const GRACE_PERIOD: f64 = 5.0;

pub const ANONYMOUS: &str = "anonymous";

const ID_ALPHABET: [char; 36] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R',
    'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
];

pub fn new_id() -> String {
    nanoid::nanoid!(4, &ID_ALPHABET)
}

/// What the playback clock does when it runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Advance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Idle,
    Playing,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TheaterError {
    #[error("the queue is full")]
    QueueFull,

    #[error("every seat is taken")]
    Full,

    #[error("position {0} is outside the playing media")]
    BadPosition(f64),

    #[error(transparent)]
    Timer(#[from] TimerError),

    #[error("theater is no longer running")]
    Closed,
}

#[derive(Debug)]
struct Occupant {
    tx:   Tx,
    name: Option<String>,
}

#[derive(Debug)]
pub struct Theater {
    id:            String,
    name:          String,
    #[allow(dead_code)]
    password:      Option<String>,
    auth_required: bool,
    seats:         usize,
    occupants:     HashMap<ConnId, Occupant>,
    usernames:     Vec<String>,
    paused:        bool,
    queue:         PlayQueue,
    now_playing:   Option<QueueItem>,
    timer:         Timer<Transition>,
}

impl Theater {
    pub fn new(id: String, name: String, password: Option<String>, auth_required: bool, seats: usize) -> Self {
        Self {
            id,
            name,
            password,
            auth_required,
            seats,
            occupants: HashMap::new(),
            usernames: Vec::new(),
            paused: false,
            queue: PlayQueue::default(),
            now_playing: None,
            timer: Timer::new(),
        }
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn name(&self) -> &str { &self.name }

    /* ------------ 進出場 ------------ */
    pub fn enter(&mut self, conn: &Connection) -> Result<(), TheaterError> {
        if self.occupants.len() >= self.seats {
            return Err(TheaterError::Full);
        }
        self.occupants.insert(conn.id, Occupant { tx: conn.tx.clone(), name: None });
        debug!(theater = %self.id, conn = %conn.id, occupancy = self.occupants.len(), "occupant entered");
        Ok(())
    }

    pub fn leave(&mut self, conn: ConnId) {
        if let Some(gone) = self.occupants.remove(&conn) {
            if let Some(name) = gone.name {
                self.unseat(&name);
            }
            debug!(theater = %self.id, %conn, occupancy = self.occupants.len(), "occupant left");
        }
    }

    fn unseat(&mut self, name: &str) {
        if let Some(pos) = self.usernames.iter().position(|n| n == name) {
            self.usernames.remove(pos);
        }
    }

    /// Snapshot for a newcomer, then announce and seat them.
    pub fn hello(&mut self, conn: ConnId, name: String) -> HelloResults {
        let results = HelloResults {
            occupants: self.usernames.clone(),
            queue:     self.queue.snapshot(),
            roomstate: self.room_state(),
        };
        self.broadcast(&Join { user: &name });

        if let Some(occupant) = self.occupants.get_mut(&conn) {
            if let Some(old) = occupant.name.replace(name.clone()) {
                self.unseat(&old);
            }
        }
        self.usernames.push(name);
        results
    }

    pub fn username(&self, conn: ConnId) -> String {
        self.occupants
            .get(&conn)
            .and_then(|o| o.name.clone())
            .unwrap_or_else(|| ANONYMOUS.into())
    }

    /* ------------ 佇列 ------------ */
    pub fn enqueue(&mut self, item: QueueItem) -> Result<(), TheaterError> {
        // unplayable media never reaches the queue
        timer::checked_duration(item.media.duration + GRACE_PERIOD)?;
        let notice = Enqueued {
            url:          &item.media.url,
            media:        Some(&item.media),
            submitted_by: &item.submitted_by,
        }
        .notice();
        self.queue.push(item).map_err(|_| TheaterError::QueueFull)?;
        self.send_all(notice);

        // NOWPLAYING must follow ENQUEUED
        if self.now_playing.is_none() {
            self.pop_next()?;
        }
        Ok(())
    }

    /// Move the head of the queue to now-playing and arm the clock for it.
    pub fn pop_next(&mut self) -> Result<Advance, TheaterError> {
        self.paused = false;
        let Some(item) = self.queue.pop_front() else {
            self.timer.abort();
            if self.now_playing.take().is_some() {
                info!(theater = %self.id, "queue drained");
                self.broadcast(&NowPlaying { media: None, submitted_by: None });
            }
            return Ok(Advance::Idle);
        };

        if let Err(e) = self.timer.schedule(item.media.duration + GRACE_PERIOD, Transition::Advance) {
            self.timer.abort();
            if self.now_playing.take().is_some() {
                self.broadcast(&NowPlaying { media: None, submitted_by: None });
            }
            return Err(e.into());
        }
        info!(theater = %self.id, url = %item.media.url, duration = item.media.duration, "now playing");
        self.broadcast(&NowPlaying {
            media:        Some(&item.media),
            submitted_by: Some(&item.submitted_by),
        });
        self.now_playing = Some(item);
        Ok(Advance::Playing)
    }

    pub fn remove_at(&mut self, index: i64) -> Option<QueueItem> {
        let removed = self.queue.remove_at(index)?;
        self.broadcast(&Dequeued { index, url: Some(&removed.media.url) });
        Some(removed)
    }

    /* ------------ 播放控制 ------------ */
    /// `Ok(false)` when there was nothing to pause.
    pub fn pause(&mut self, position: Option<f64>) -> Result<bool, TheaterError> {
        if self.paused || self.now_playing.is_none() {
            return Ok(false);
        }
        debug!(theater = %self.id, elapsed = ?self.timer.elapsed(), "pausing");
        self.timer.pause()?;
        self.paused = true;
        self.broadcast(&Pausing { position });
        Ok(true)
    }

    pub fn resume(&mut self) -> Result<bool, TheaterError> {
        if !self.paused || self.now_playing.is_none() {
            return Ok(false);
        }
        self.timer.resume()?;
        self.paused = false;
        self.broadcast(&Resuming {});
        Ok(true)
    }

    /// Seeking always leaves playback running, even from a paused state.
    pub fn seek(&mut self, position: f64) -> Result<bool, TheaterError> {
        let Some(item) = &self.now_playing else { return Ok(false) };
        let duration = item.media.duration;
        if !position.is_finite() || !(0.0..=duration).contains(&position) {
            return Err(TheaterError::BadPosition(position));
        }
        self.timer.abort();
        self.timer.schedule((duration - position) + GRACE_PERIOD, Transition::Advance)?;
        self.paused = false;
        self.broadcast(&Seeking { position });
        Ok(true)
    }

    /* ------------ 計時器 ------------ */
    pub fn deadline(&self) -> Option<tokio::time::Instant> { self.timer.deadline() }

    pub fn on_timer_fired(&mut self) {
        if let Some(Transition::Advance) = self.timer.fire() {
            if let Err(e) = self.pop_next() {
                warn!(theater = %self.id, err = %e, "could not advance queue");
            }
        }
    }

    /* ------------ 狀態查詢 ------------ */
    /// Playing iff the clock is live; paused iff the clock is paused.
    pub(crate) fn consistent(&self) -> bool {
        let clock_live = self.timer.is_running() || self.timer.is_paused();
        self.now_playing.is_some() == clock_live
            && self.paused == self.timer.is_paused()
            && self.queue.len() <= queue::MAX_QUEUE_LEN
    }

    pub fn room_state(&self) -> RoomState {
        let Some(item) = &self.now_playing else {
            return RoomState { nowplaying: String::new(), position: 0.0, paused: self.paused };
        };
        let duration = item.media.duration;
        let remaining = self.timer.remaining().map_or(0.0, |d| d.as_secs_f64());
        RoomState {
            nowplaying: item.media.url.clone(),
            position:   (duration + GRACE_PERIOD - remaining).clamp(0.0, duration),
            paused:     self.paused,
        }
    }

    pub fn summary(&self) -> TheaterSummary {
        TheaterSummary {
            id:            self.id.clone(),
            name:          self.name.clone(),
            auth_required: self.auth_required,
            seats:         self.seats,
            occupancy:     self.occupants.len(),
        }
    }

    /* ------------ 廣播 ------------ */
    pub fn broadcast<R: Response>(&mut self, msg: &R) {
        self.send_all(msg.notice());
    }

    fn send_all(&mut self, frame: String) {
        let stale: Vec<ConnId> = self
            .occupants
            .iter()
            .filter(|(_, o)| o.tx.send(frame.clone()).is_err())
            .map(|(id, _)| *id)
            .collect();
        for conn in stale {
            self.leave(conn);
        }
    }
}
