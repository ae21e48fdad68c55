//! Per-frame dispatch: decode, look up, run the handler.
//!
//! Frame-level garbage is dropped without a reply. Handler failures are
//! business errors and go back to the caller as ERR.
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tracing::{debug, warn};

use super::{
    frame::{self, FrameError},
    registry::{Lookup, Registry},
    Call, Session,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dropped {
    TooLong,
    Malformed,
    BadRequestId,
    UnknownMethod,
    BadPayload,
}

impl From<FrameError> for Dropped {
    fn from(e: FrameError) -> Self {
        match e {
            FrameError::TooLong(_) => Self::TooLong,
            FrameError::Shape      => Self::Malformed,
            FrameError::RequestId  => Self::BadRequestId,
        }
    }
}

impl From<Lookup> for Dropped {
    fn from(e: Lookup) -> Self {
        match e {
            Lookup::UnknownMethod => Self::UnknownMethod,
            Lookup::BadPayload    => Self::BadPayload,
        }
    }
}

/// Counters for dropped frames, surfaced on `/info`.
#[derive(Debug, Default)]
pub struct DropStats {
    too_long:       AtomicU64,
    malformed:      AtomicU64,
    bad_request_id: AtomicU64,
    unknown_method: AtomicU64,
    bad_payload:    AtomicU64,
}

impl DropStats {
    fn record(&self, why: Dropped) {
        let counter = match why {
            Dropped::TooLong       => &self.too_long,
            Dropped::Malformed     => &self.malformed,
            Dropped::BadRequestId  => &self.bad_request_id,
            Dropped::UnknownMethod => &self.unknown_method,
            Dropped::BadPayload    => &self.bad_payload,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self, why: Dropped) -> u64 {
        match why {
            Dropped::TooLong       => self.too_long.load(Ordering::Relaxed),
            Dropped::Malformed     => self.malformed.load(Ordering::Relaxed),
            Dropped::BadRequestId  => self.bad_request_id.load(Ordering::Relaxed),
            Dropped::UnknownMethod => self.unknown_method.load(Ordering::Relaxed),
            Dropped::BadPayload    => self.bad_payload.load(Ordering::Relaxed),
        }
    }

    pub fn total(&self) -> u64 {
        [
            Dropped::TooLong,
            Dropped::Malformed,
            Dropped::BadRequestId,
            Dropped::UnknownMethod,
            Dropped::BadPayload,
        ]
        .into_iter()
        .map(|why| self.count(why))
        .sum()
    }
}

pub struct Dispatcher {
    registry: Registry,
    stats:    Arc<DropStats>,
}

impl Dispatcher {
    pub fn new(registry: Registry) -> Self {
        let mut methods: Vec<_> = registry.methods().collect();
        methods.sort_unstable();
        debug!(?methods, "rpc methods registered");
        Self { registry, stats: Arc::default() }
    }

    pub fn stats(&self) -> &DropStats { &self.stats }

    /// Handle one inbound frame. `Err` means it was dropped; the connection
    /// stays usable either way.
    pub async fn dispatch(&self, session: &Session, raw: &str) -> Result<(), Dropped> {
        match self.prepare(session, raw) {
            Ok((call_rid, fut)) => {
                if let Err(e) = fut.await {
                    warn!(conn = %session.conn.id, rid = call_rid, err = %e, "request failed");
                    let call = Call { session: session.clone(), rid: call_rid };
                    call.err(&e);
                }
                Ok(())
            }
            Err(why) => {
                self.stats.record(why);
                debug!(conn = %session.conn.id, len = raw.len(), reason = ?why, "frame dropped");
                Err(why)
            }
        }
    }

    fn prepare(
        &self,
        session: &Session,
        raw: &str,
    ) -> Result<(i64, super::registry::HandlerFuture), Dropped> {
        let frame = frame::parse(raw)?;
        debug!(conn = %session.conn.id, rid = frame.rid, method = frame.method, "request");
        let call = Call { session: session.clone(), rid: frame.rid };
        let fut = self.registry.prepare(frame.method, call, frame.payload)?;
        Ok((frame.rid, fut))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::MediaInfo,
        resolver::{MediaResolver, ResolveError},
        rpc::registry,
        state::Connection,
        theater::{tests::drain, Theater, TheaterHandle},
    };
    use futures_util::future::BoxFuture;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    /// Knows `https://x/a` (120s), `https://x/live` (no duration) and
    /// `https://x/huge` (a length no clock can reach).
    struct FakeResolver;

    impl MediaResolver for FakeResolver {
        fn resolve<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<MediaInfo, ResolveError>> {
            Box::pin(async move {
                match url {
                    "https://x/a" => Ok(MediaInfo { url: url.into(), title: "A".into(), duration: 120.0 }),
                    "https://x/live" => Err(ResolveError::PartialInfo("duration".into())),
                    "https://x/huge" => Ok(MediaInfo { url: url.into(), title: "H".into(), duration: 1e19 }),
                    _ => Err(ResolveError::Fetch("404 Not Found".into())),
                }
            })
        }
    }

    async fn setup() -> (Dispatcher, Session, UnboundedReceiver<String>) {
        let theater = TheaterHandle::spawn(Theater::new("ABCD".into(), "Theater 1".into(), None, false, 8));
        let (tx, rx) = unbounded_channel();
        let conn = Connection::new(tx);
        theater.enter(conn.clone()).await.unwrap();
        let session = Session { theater, conn, resolver: Arc::new(FakeResolver) };
        (Dispatcher::new(registry::v0()), session, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn enqueue_into_empty_room_plays() {
        let (d, s, mut rx) = setup().await;
        d.dispatch(&s, r#"1 HELLO {"name":"alice"}"#).await.unwrap();
        assert_eq!(
            drain(&mut rx),
            [
                r#"0 JOIN {"user":"alice"}"#,
                r#"1 RESULTS {"output":{"occupants":[],"queue":[],"roomstate":{"nowplaying":"","position":0.0,"paused":false}}}"#,
            ]
        );

        d.dispatch(&s, r#"1 ENQUEUE {"url":"https://x/a"}"#).await.unwrap();
        let media = r#"{"url":"https://x/a","title":"A","duration":120.0}"#;
        assert_eq!(
            drain(&mut rx),
            [
                format!(r#"0 ENQUEUED {{"url":"https://x/a","media":{media},"submittedBy":"alice"}}"#),
                format!(r#"0 NOWPLAYING {{"media":{media},"submittedBy":"alice"}}"#),
                "1 OK {}".to_string(),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn resolver_failures_reply_err() {
        let (d, s, mut rx) = setup().await;
        d.dispatch(&s, r#"1 ENQUEUE {"url":"https://x/live"}"#).await.unwrap();
        let frames = drain(&mut rx);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].starts_with(r#"1 ERR {"err":"PARTIALINFO","code":3,"#));

        d.dispatch(&s, r#"2 ENQUEUE {"url":"https://x/gone"}"#).await.unwrap();
        assert!(drain(&mut rx)[0].starts_with(r#"2 ERR {"err":"FETCHINFO","code":3,"#));

        let summary = s.theater.summary().await.unwrap();
        assert_eq!(summary.occupancy, 1);
        d.dispatch(&s, r#"3 HELLO {"name":"bob"}"#).await.unwrap();
        assert!(drain(&mut rx)[1].contains(r#""queue":[],"roomstate":{"nowplaying":"""#));
    }

    #[tokio::test(start_paused = true)]
    async fn unplayable_media_is_refused_and_theater_survives() {
        let (d, s, mut rx) = setup().await;
        d.dispatch(&s, r#"1 ENQUEUE {"url":"https://x/huge"}"#).await.unwrap();
        let frames = drain(&mut rx);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].starts_with(r#"1 ERR {"err":"PARTIALINFO","code":3,"#));

        d.dispatch(&s, r#"2 ENQUEUE {"url":"https://x/a"}"#).await.unwrap();
        assert_eq!(drain(&mut rx).last().unwrap(), "2 OK {}");
        assert_eq!(s.theater.summary().await.unwrap().occupancy, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn seek_while_paused_resumes() {
        let (d, s, mut rx) = setup().await;
        d.dispatch(&s, r#"1 ENQUEUE {"url":"https://x/a"}"#).await.unwrap();
        d.dispatch(&s, r#"2 PAUSE {}"#).await.unwrap();
        drain(&mut rx);

        d.dispatch(&s, r#"5 SEEK {"position":30}"#).await.unwrap();
        assert_eq!(drain(&mut rx), [r#"0 SEEKING {"position":30.0}"#, "5 OK {}"]);

        d.dispatch(&s, r#"6 HELLO {"name":"carol"}"#).await.unwrap();
        let hello = drain(&mut rx).pop().unwrap();
        assert!(hello.ends_with(r#""roomstate":{"nowplaying":"https://x/a","position":30.0,"paused":false}}}"#));
    }

    #[tokio::test(start_paused = true)]
    async fn pause_twice_acks_both_notifies_once() {
        let (d, s, mut rx) = setup().await;
        d.dispatch(&s, r#"1 ENQUEUE {"url":"https://x/a"}"#).await.unwrap();
        drain(&mut rx);

        d.dispatch(&s, r#"2 PAUSE {"position":12.5}"#).await.unwrap();
        d.dispatch(&s, r#"3 PAUSE {}"#).await.unwrap();
        d.dispatch(&s, r#"4 RESUME {}"#).await.unwrap();
        d.dispatch(&s, r#"5 RESUME {}"#).await.unwrap();
        assert_eq!(
            drain(&mut rx),
            [r#"0 PAUSING {"position":12.5}"#, "2 OK {}", "3 OK {}", "0 RESUMING {}", "4 OK {}", "5 OK {}"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_frames_are_dropped_quietly() {
        let (d, s, mut rx) = setup().await;
        let huge = format!(r#"1 ENQUEUE {{"url":"https://x/{}"}}"#, "a".repeat(1100));

        assert_eq!(d.dispatch(&s, &huge).await, Err(Dropped::TooLong));
        assert_eq!(d.dispatch(&s, "RESUME").await, Err(Dropped::Malformed));
        assert_eq!(d.dispatch(&s, "one RESUME {}").await, Err(Dropped::BadRequestId));
        assert_eq!(d.dispatch(&s, "1 REWIND {}").await, Err(Dropped::UnknownMethod));
        assert_eq!(d.dispatch(&s, r#"1 SEEK {"position":"soon"}"#).await, Err(Dropped::BadPayload));
        assert_eq!(d.dispatch(&s, "1 DEQUE not json").await, Err(Dropped::BadPayload));
        assert!(drain(&mut rx).is_empty());
        assert_eq!(d.stats().total(), 6);
        assert_eq!(d.stats().count(Dropped::BadPayload), 2);

        d.dispatch(&s, r#"7 ENQUEUE {"url":"https://x/a"}"#).await.unwrap();
        assert_eq!(drain(&mut rx).last().unwrap(), "7 OK {}");
    }

    #[tokio::test(start_paused = true)]
    async fn deque_out_of_range_still_acks() {
        let (d, s, mut rx) = setup().await;
        d.dispatch(&s, r#"1 DEQUE {"index":4}"#).await.unwrap();
        assert_eq!(drain(&mut rx), ["1 OK {}"]);
    }
}
