//! `"<rid> <METHOD> <json>"` text frames.
use serde::Serialize;

pub const MAX_FRAME_LEN: usize = 1024;

/// rid reserved for room-wide notifications.
pub const NOTIFY_RID: i64 = 0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame<'a> {
    pub rid:     i64,
    pub method:  &'a str,
    pub payload: &'a str,
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame is {0} bytes, limit is {MAX_FRAME_LEN}")]
    TooLong(usize),

    #[error("frame does not have three space separated parts")]
    Shape,

    #[error("request id is not an integer")]
    RequestId,
}

pub fn parse(raw: &str) -> Result<Frame<'_>, FrameError> {
    if raw.len() > MAX_FRAME_LEN {
        return Err(FrameError::TooLong(raw.len()));
    }
    let mut parts = raw.splitn(3, ' ');
    let (Some(rid), Some(method), Some(payload)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(FrameError::Shape);
    };
    let rid = rid.parse::<i64>().map_err(|_| FrameError::RequestId)?;
    Ok(Frame { rid, method, payload })
}

pub fn encode<T: Serialize + ?Sized>(rid: i64, method: &str, payload: &T) -> String {
    let json = serde_json::to_string(payload).unwrap_or_else(|e| {
        tracing::error!(method, err = %e, "payload failed to serialize");
        "{}".into()
    });
    format!("{rid} {method} {json}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn splits_on_first_two_spaces() {
        let f = parse(r#"7 ENQUEUE {"url": "https://x/a b"}"#).unwrap();
        assert_eq!(f.rid, 7);
        assert_eq!(f.method, "ENQUEUE");
        assert_eq!(f.payload, r#"{"url": "https://x/a b"}"#);
    }

    #[test]
    fn rejects_wrong_shape() {
        assert_eq!(parse("1 RESUME"), Err(FrameError::Shape));
        assert_eq!(parse(""), Err(FrameError::Shape));
        assert_eq!(parse("x RESUME {}"), Err(FrameError::RequestId));
        assert_eq!(parse("1.5 RESUME {}"), Err(FrameError::RequestId));
    }

    #[test]
    fn rejects_oversize() {
        let raw = format!("1 ENQUEUE {{\"url\":\"{}\"}}", "a".repeat(MAX_FRAME_LEN));
        assert_eq!(parse(&raw), Err(FrameError::TooLong(raw.len())));

        let exact = format!("1 X {}", "a".repeat(MAX_FRAME_LEN - 4));
        assert_eq!(exact.len(), MAX_FRAME_LEN);
        assert!(parse(&exact).is_ok());
    }

    #[test]
    fn encodes_with_rid_and_tag() {
        assert_eq!(encode(0, "SEEKING", &json!({"position": 30.0})), r#"0 SEEKING {"position":30.0}"#);
    }
}
