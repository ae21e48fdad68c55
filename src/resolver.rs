//! Media-info lookup. The theater only needs `{url, title, duration}` for a
//! link; the actual extraction happens in an external agent over HTTP.
use std::time::Duration;

use futures_util::future::BoxFuture;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::models::MediaInfo;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    #[error("could not fetch media info: {0}")]
    Fetch(String),

    #[error("media info is missing a usable duration: {0}")]
    PartialInfo(String),
}

/// Longest media the theaters will schedule (one week).
pub const MAX_MEDIA_SECS: f64 = 7.0 * 24.0 * 60.0 * 60.0;

pub trait MediaResolver: Send + Sync {
    fn resolve<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<MediaInfo, ResolveError>>;
}

/// Body returned by the agent. Every field is optional on the wire.
#[derive(Debug, Default, Deserialize)]
pub struct ResolvedMedia {
    pub url:      Option<String>,
    pub title:    Option<serde_json::Value>,
    pub duration: Option<serde_json::Value>,
}

impl ResolvedMedia {
    pub fn into_media(self, requested: &str) -> Result<MediaInfo, ResolveError> {
        let duration = match self.duration {
            None | Some(serde_json::Value::Null) => {
                return Err(ResolveError::PartialInfo("duration".into()));
            }
            Some(v) => parse_seconds(&v)
                .ok_or_else(|| ResolveError::PartialInfo(format!("duration {v}")))?,
        };
        let title = match self.title {
            Some(serde_json::Value::String(s)) => s,
            _ => String::new(),
        };
        Ok(MediaInfo {
            url: self.url.unwrap_or_else(|| requested.to_owned()),
            title,
            duration,
        })
    }
}

fn parse_seconds(v: &serde_json::Value) -> Option<f64> {
    let secs = match v {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    (secs.is_finite() && (0.0..=MAX_MEDIA_SECS).contains(&secs)).then_some(secs)
}

/* ------------ HTTP agent ------------ */
pub struct HttpResolver {
    client:   Client,
    endpoint: String,
}

impl HttpResolver {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        let endpoint = format!("{}/api/v0/media_info", base_url.trim_end_matches('/'));
        Ok(Self { client, endpoint })
    }

    async fn fetch(&self, url: &str) -> Result<MediaInfo, ResolveError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "url": url }))
            .send()
            .await
            .map_err(|e| ResolveError::Fetch(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(ResolveError::Fetch(format!("{status}: {text}")));
        }

        let body: ResolvedMedia = resp
            .json()
            .await
            .map_err(|e| ResolveError::Fetch(format!("parse error: {e}")))?;
        body.into_media(url)
    }
}

impl MediaResolver for HttpResolver {
    fn resolve<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<MediaInfo, ResolveError>> {
        Box::pin(async move {
            let res = self.fetch(url).await;
            if let Err(e) = &res {
                tracing::warn!(%url, err = %e, "media resolve failed");
            }
            res
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(raw: &str) -> ResolvedMedia {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn full_body_becomes_media() {
        let m = body(r#"{"url":"https://x/a","title":"A","duration":120}"#)
            .into_media("https://x/a")
            .unwrap();
        assert_eq!(m, MediaInfo { url: "https://x/a".into(), title: "A".into(), duration: 120.0 });
    }

    #[test]
    fn missing_duration_is_partial() {
        let err = body(r#"{"url":"https://x/a","title":"A"}"#).into_media("https://x/a");
        assert!(matches!(err, Err(ResolveError::PartialInfo(_))));
        let err = body(r#"{"duration":null}"#).into_media("https://x/a");
        assert!(matches!(err, Err(ResolveError::PartialInfo(_))));
        let err = body(r#"{"duration":-3}"#).into_media("https://x/a");
        assert!(matches!(err, Err(ResolveError::PartialInfo(_))));
    }

    #[test]
    fn overlong_duration_is_partial() {
        for raw in [r#"{"duration":1e19}"#, r#"{"duration":"1e300"}"#, r#"{"duration":604801}"#] {
            let err = body(raw).into_media("https://x/a");
            assert!(matches!(err, Err(ResolveError::PartialInfo(_))), "{raw}");
        }
        let week = body(r#"{"duration":604800}"#).into_media("https://x/a").unwrap();
        assert_eq!(week.duration, MAX_MEDIA_SECS);
    }

    #[test]
    fn loose_fields_are_tolerated() {
        let m = body(r#"{"title":7,"duration":"61.5"}"#).into_media("https://x/b").unwrap();
        assert_eq!(m.url, "https://x/b");
        assert_eq!(m.title, "");
        assert_eq!(m.duration, 61.5);
    }
}
