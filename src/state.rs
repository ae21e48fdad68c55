use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::theater::TheaterHandle;

pub type Tx = mpsc::UnboundedSender<String>;

/* ------------ 連線 ------------ */
pub type ConnId = Uuid;

/// Outbound side of one socket. Replies and room notifications share the
/// same queue, so a connection sees frames in the order they were produced.
#[derive(Clone, Debug)]
pub struct Connection {
    pub id: ConnId,
    pub tx: Tx,
}

impl Connection {
    pub fn new(tx: Tx) -> Self {
        Self { id: Uuid::new_v4(), tx }
    }

    /// False once the socket's writer is gone.
    pub fn send(&self, frame: String) -> bool {
        self.tx.send(frame).is_ok()
    }
}

/* ------------ 影廳 ------------ */
/// Theaters by id; listing follows the order they were opened in.
#[derive(Clone, Default)]
pub struct TheaterMap(Arc<RwLock<Theaters>>);

#[derive(Default)]
struct Theaters {
    by_id: HashMap<String, TheaterHandle>,
    order: Vec<String>,
}

impl TheaterMap {
    pub async fn insert(&self, handle: TheaterHandle) {
        let mut map = self.0.write().await;
        let id = handle.id().to_owned();
        if map.by_id.insert(id.clone(), handle).is_none() {
            map.order.push(id);
        }
    }

    pub async fn get(&self, id: &str) -> Option<TheaterHandle> {
        self.0.read().await.by_id.get(id).cloned()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.0.read().await.by_id.contains_key(id)
    }

    /// Unused theater id, for seeding the pool at startup.
    pub async fn fresh_id(&self) -> String {
        loop {
            let id = crate::theater::new_id();
            if !self.contains(&id).await {
                return id;
            }
        }
    }

    pub async fn all(&self) -> Vec<TheaterHandle> {
        let map = self.0.read().await;
        map.order.iter().filter_map(|id| map.by_id.get(id).cloned()).collect()
    }
}

/* ------------ 啟動時間 (/info) ------------ */
#[derive(Clone, Copy, Debug)]
pub struct StartedAt(pub chrono::DateTime<chrono::Utc>);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theater::Theater;

    #[tokio::test]
    async fn lists_theaters_in_opening_order() {
        let theaters = TheaterMap::default();
        for n in 1..=12 {
            let id = theaters.fresh_id().await;
            let theater = Theater::new(id, format!("Theater {n}"), None, false, 8);
            theaters.insert(TheaterHandle::spawn(theater)).await;
        }
        let names: Vec<String> = theaters.all().await.iter().map(|t| t.name().to_owned()).collect();
        let expected: Vec<String> = (1..=12).map(|n| format!("Theater {n}")).collect();
        assert_eq!(names, expected);

        let first = theaters.all().await[0].clone();
        theaters.insert(first.clone()).await;
        assert_eq!(theaters.all().await.len(), 12);
        assert!(theaters.contains(first.id()).await);
    }
}
