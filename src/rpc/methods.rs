//! v0 request payloads and their handlers.
use serde::Deserialize;
use tracing::debug;

use super::{registry::Method, Call, RpcError};

/* ------------ HELLO ------------ */
#[derive(Debug, Deserialize)]
pub struct Hello {
    pub name: String,
    // 尚未驗證密碼
    #[serde(default, alias = "passwd")]
    pub password: Option<String>,
}

impl Method for Hello {
    const NAME: &'static str = "HELLO";

    async fn handle(self, call: Call) -> Result<(), RpcError> {
        if self.password.is_some() {
            debug!(name = %self.name, "password supplied but not checked");
        }
        let results = call.theater().hello(call.session.conn.id, self.name).await?;
        call.res(results);
        Ok(())
    }
}

/* ------------ ENQUEUE ------------ */
#[derive(Debug, Deserialize)]
pub struct Enqueue {
    pub url: String,
}

impl Method for Enqueue {
    const NAME: &'static str = "ENQUEUE";

    async fn handle(self, call: Call) -> Result<(), RpcError> {
        // 先查媒體資訊 (外部呼叫), 不佔用影廳
        let media = call.session.resolver.resolve(&self.url).await?;
        debug!(url = %media.url, title = %media.title, duration = media.duration, "media resolved");
        call.theater().enqueue(call.session.conn.id, media).await?;
        call.ok();
        Ok(())
    }
}

/* ------------ DEQUE ------------ */
#[derive(Debug, Deserialize)]
pub struct Deque {
    pub index: i64,
}

impl Method for Deque {
    const NAME: &'static str = "DEQUE";

    async fn handle(self, call: Call) -> Result<(), RpcError> {
        call.theater().remove_at(self.index).await?;
        call.ok();
        Ok(())
    }
}

/* ------------ PAUSE / RESUME / SEEK ------------ */
#[derive(Debug, Deserialize)]
pub struct Pause {
    #[serde(default)]
    pub position: Option<f64>,
}

impl Method for Pause {
    const NAME: &'static str = "PAUSE";

    async fn handle(self, call: Call) -> Result<(), RpcError> {
        call.theater().pause(self.position).await?;
        call.ok();
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct Resume {}

impl Method for Resume {
    const NAME: &'static str = "RESUME";

    async fn handle(self, call: Call) -> Result<(), RpcError> {
        call.theater().resume().await?;
        call.ok();
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct Seek {
    pub position: f64,
}

impl Method for Seek {
    const NAME: &'static str = "SEEK";

    async fn handle(self, call: Call) -> Result<(), RpcError> {
        call.theater().seek(self.position).await?;
        call.ok();
        Ok(())
    }
}
