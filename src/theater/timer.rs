//! Pausable playback countdown.
//!
//! The timer is plain state measured against `tokio::time::Instant`; it never
//! spawns. Whoever owns it awaits [`expiry`] on [`Timer::deadline`] and then
//! calls [`Timer::fire`], which hands back the registered transition at most
//! once per arm.
use std::time::Duration;
use tokio::time::{self, Instant};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TimerError {
    #[error("invalid timer duration: {0}s")]
    InvalidDuration(f64),

    #[error("timer could not be paused, expiry already due")]
    PauseFailed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Idle,
    Armed,
    Running { started_at: Instant, deadline: Instant },
    Paused  { remaining: Duration },
    Fired,
    Aborted,
}

#[derive(Debug)]
pub struct Timer<E> {
    duration:  Duration,
    phase:     Phase,
    on_expiry: Option<E>,
}

impl<E: Clone> Default for Timer<E> {
    fn default() -> Self { Self::new() }
}

impl<E: Clone> Timer<E> {
    pub fn new() -> Self {
        Self { duration: Duration::ZERO, phase: Phase::Idle, on_expiry: None }
    }

    /// Arm for `secs` seconds and start right away, replacing any prior arm.
    pub fn schedule(&mut self, secs: f64, on_expiry: E) -> Result<(), TimerError> {
        self.reschedule(secs)?;
        self.set_callback(on_expiry);
        self.start()
    }

    pub fn set_callback(&mut self, on_expiry: E) {
        self.on_expiry = Some(on_expiry);
    }

    /// Drop the current wait and set a fresh duration without starting it.
    pub fn reschedule(&mut self, secs: f64) -> Result<(), TimerError> {
        let duration = checked_duration(secs)?;
        self.abort();
        self.duration = duration;
        self.phase = Phase::Armed;
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), TimerError> {
        let now = Instant::now();
        let deadline = now
            .checked_add(self.duration)
            .ok_or(TimerError::InvalidDuration(self.duration.as_secs_f64()))?;
        self.phase = Phase::Running { started_at: now, deadline };
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), TimerError> {
        let Phase::Running { deadline, .. } = self.phase else { return Ok(()) };
        let now = Instant::now();
        if now >= deadline {
            return Err(TimerError::PauseFailed);
        }
        self.phase = Phase::Paused { remaining: deadline - now };
        Ok(())
    }

    /// Stays paused if the remaining time cannot be re-armed.
    pub fn resume(&mut self) -> Result<(), TimerError> {
        let Phase::Paused { remaining } = self.phase else { return Ok(()) };
        let now = Instant::now();
        let deadline = now
            .checked_add(remaining)
            .ok_or(TimerError::InvalidDuration(remaining.as_secs_f64()))?;
        self.duration = remaining;
        self.phase = Phase::Running { started_at: now, deadline };
        Ok(())
    }

    pub fn abort(&mut self) {
        if matches!(self.phase, Phase::Armed | Phase::Running { .. } | Phase::Paused { .. }) {
            self.phase = Phase::Aborted;
        }
    }

    pub fn elapsed(&self) -> Option<Duration> {
        match self.phase {
            Phase::Running { started_at, .. } => Some(Instant::now() - started_at),
            _ => None,
        }
    }

    pub fn remaining(&self) -> Option<Duration> {
        match self.phase {
            Phase::Running { deadline, .. } => {
                Some(deadline.saturating_duration_since(Instant::now()))
            }
            Phase::Paused { remaining } => Some(remaining),
            _ => None,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.phase {
            Phase::Running { deadline, .. } => Some(deadline),
            _ => None,
        }
    }

    pub fn is_running(&self) -> bool { matches!(self.phase, Phase::Running { .. }) }
    pub fn is_paused(&self)  -> bool { matches!(self.phase, Phase::Paused { .. }) }

    /// Consume an expiry. Yields the callback only when the running deadline
    /// has been reached; a paused, aborted or already fired timer yields nothing.
    pub fn fire(&mut self) -> Option<E> {
        match self.phase {
            Phase::Running { deadline, .. } if Instant::now() >= deadline => {
                self.phase = Phase::Fired;
                self.on_expiry.clone()
            }
            _ => None,
        }
    }
}

/// A duration that can be armed from now: finite, non-negative and
/// representable as a deadline.
pub fn checked_duration(secs: f64) -> Result<Duration, TimerError> {
    let duration = Duration::try_from_secs_f64(secs).map_err(|_| TimerError::InvalidDuration(secs))?;
    Instant::now()
        .checked_add(duration)
        .map(|_| duration)
        .ok_or(TimerError::InvalidDuration(secs))
}

/// Resolves at `deadline`; never resolves when there is none.
pub async fn expiry(deadline: Option<Instant>) {
    match deadline {
        Some(at) => time::sleep_until(at).await,
        None     => std::future::pending::<()>().await,
    }
}
