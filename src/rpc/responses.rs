//! Outbound frames: direct replies (OK / ERR / RESULTS) and room notifications.
use serde::Serialize;

use super::frame::{self, NOTIFY_RID};
use crate::models::MediaInfo;

pub trait Response: Serialize {
    const METHOD: &'static str;

    fn frame(&self, rid: i64) -> String {
        frame::encode(rid, Self::METHOD, self)
    }

    /// Frame addressed to the whole room.
    fn notice(&self) -> String {
        self.frame(NOTIFY_RID)
    }
}

macro_rules! response {
    ($ty:ty => $method:literal) => {
        impl Response for $ty {
            const METHOD: &'static str = $method;
        }
    };
}

/* ------------ 直接回覆 ------------ */
#[derive(Debug, Serialize)]
pub struct Ack {}

#[derive(Debug, Serialize)]
pub struct ErrReply {
    pub err:     &'static str,
    pub code:    u16,
    pub reason:  Option<String>,
    pub details: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Results<T> {
    pub output: T,
}

impl<T: Serialize> Response for Results<T> {
    const METHOD: &'static str = "RESULTS";
}

/* ------------ 廣播 ------------ */
#[derive(Debug, Serialize)]
pub struct Join<'a> {
    pub user: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Enqueued<'a> {
    pub url:          &'a str,
    pub media:        Option<&'a MediaInfo>,
    pub submitted_by: &'a str,
}

#[derive(Debug, Serialize)]
pub struct Dequeued<'a> {
    pub index: i64,
    pub url:   Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NowPlaying<'a> {
    pub media:        Option<&'a MediaInfo>,
    pub submitted_by: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct Pausing {
    pub position: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct Resuming {}

#[derive(Debug, Serialize)]
pub struct Seeking {
    pub position: f64,
}

response!(Ack => "OK");
response!(ErrReply => "ERR");
response!(Join<'_> => "JOIN");
response!(Enqueued<'_> => "ENQUEUED");
response!(Dequeued<'_> => "DEQUEUED");
response!(NowPlaying<'_> => "NOWPLAYING");
response!(Pausing => "PAUSING");
response!(Resuming => "RESUMING");
response!(Seeking => "SEEKING");
