use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/* ------------ 媒體 / 佇列 ------------ */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub url:      String,
    pub title:    String,
    pub duration: f64,     // seconds
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    pub media:        MediaInfo,
    pub submitted_by: String,
}

/* ------------ 房間狀態 (HELLO) ------------ */
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomState {
    pub nowplaying: String,   // url, "" when idle
    pub position:   f64,
    pub paused:     bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HelloResults {
    pub occupants: Vec<String>,
    pub queue:     Vec<QueueItem>,
    pub roomstate: RoomState,
}

/* ------------ REST 摘要 ------------ */
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TheaterSummary {
    pub id:            String,
    pub name:          String,
    pub auth_required: bool,
    pub seats:         usize,
    pub occupancy:     usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub version:        &'static str,
    pub protocol:       &'static str,
    pub started_at:     DateTime<Utc>,
    pub dropped_frames: u64,
}

impl ServerInfo {
    pub fn new(started_at: DateTime<Utc>, dropped_frames: u64) -> Self {
        Self {
            version: concat!("Cinema ", env!("CARGO_PKG_VERSION")),
            protocol: "0-alpha.0+0",
            started_at,
            dropped_frames,
        }
    }
}
