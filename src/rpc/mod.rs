pub mod dispatch;
pub mod frame;
pub mod methods;
pub mod registry;
pub mod responses;

use std::sync::Arc;
use serde::Serialize;

use crate::{
    resolver::{MediaResolver, ResolveError},
    state::Connection,
    theater::{timer::TimerError, TheaterError, TheaterHandle},
};
use responses::{Ack, ErrReply, Response, Results};

/* ------------ 業務錯誤 → ERR ------------ */
#[derive(thiserror::Error, Debug)]
pub enum RpcError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Theater(#[from] TheaterError),
}

impl RpcError {
    pub fn reply(&self) -> ErrReply {
        use TheaterError as T;
        let (err, code, reason) = match self {
            Self::Resolve(ResolveError::Fetch(_)) => {
                ("FETCHINFO", 3, "Could not fetch information on the requested media.")
            }
            Self::Resolve(ResolveError::PartialInfo(_))
            | Self::Theater(T::Timer(TimerError::InvalidDuration(_))) => {
                ("PARTIALINFO", 3, "The requested media did not have a playable length.")
            }
            Self::Theater(T::QueueFull) => ("QUEUEFULL", 4, "The queue cannot take any more media."),
            Self::Theater(T::Timer(TimerError::PauseFailed)) => {
                ("PAUSEFAILED", 5, "Playback could not be paused, the media already ended.")
            }
            Self::Theater(T::BadPosition(_)) => {
                ("BADPOSITION", 6, "The requested position is outside the media.")
            }
            Self::Theater(T::Full | T::Closed) => ("UNAVAILABLE", 7, "The theater is unavailable."),
        };
        ErrReply {
            err,
            code,
            reason:  Some(reason.into()),
            details: Some(self.to_string()),
        }
    }
}

/* ------------ 連線上下文 ------------ */
/// Everything a handler may touch on behalf of one socket.
#[derive(Clone)]
pub struct Session {
    pub theater:  TheaterHandle,
    pub conn:     Connection,
    pub resolver: Arc<dyn MediaResolver>,
}

/// One decoded request: the session plus the caller's request id.
pub struct Call {
    pub session: Session,
    pub rid:     i64,
}

impl Call {
    pub fn theater(&self) -> &TheaterHandle { &self.session.theater }

    pub fn ok(&self) {
        self.session.conn.send(Ack {}.frame(self.rid));
    }

    pub fn res<T: Serialize>(&self, output: T) {
        self.session.conn.send(Results { output }.frame(self.rid));
    }

    pub fn err(&self, e: &RpcError) {
        self.session.conn.send(e.reply().frame(self.rid));
    }
}
