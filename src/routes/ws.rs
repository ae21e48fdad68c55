use axum::{
    extract::{ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade}, Path, Extension},
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    error::{AppErr, AppResult},
    resolver::MediaResolver,
    rpc::{dispatch::Dispatcher, Session},
    state::{Connection, TheaterMap},
    theater::TheaterHandle,
};

pub fn router() -> Router {
    Router::new().route("/theaters/:id/rpc/ws", get(ws_handler))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(id): Path<String>,
    Extension(theaters): Extension<TheaterMap>,
    Extension(dispatcher): Extension<Arc<Dispatcher>>,
    Extension(resolver): Extension<Arc<dyn MediaResolver>>,
) -> AppResult<impl IntoResponse> {
    let instance = format!("/theaters/{id}/rpc/ws");
    let theater = theaters.get(&id).await.ok_or_else(|| AppErr::NotFound(instance.clone()))?;
    let summary = theater.summary().await.map_err(|_| AppErr::NotFound(instance.clone()))?;
    if summary.occupancy >= summary.seats {
        info!(theater = %id, occupancy = summary.occupancy, seats = summary.seats, "no seats left");
        return Err(AppErr::Full(instance));
    }
    Ok(ws.on_upgrade(move |s| occupant_ws(s, theater, dispatcher, resolver)))
}

/* ---------------- per occupant ---------------- */
async fn occupant_ws(
    sock: WebSocket,
    theater: TheaterHandle,
    dispatcher: Arc<Dispatcher>,
    resolver: Arc<dyn MediaResolver>,
) {
    let (mut sink, mut stream) = sock.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let conn = Connection::new(tx);

    /* 進場 (seats may have filled since the upgrade check) */
    if let Err(e) = theater.enter(conn.clone()).await {
        warn!(theater = %theater.id(), conn = %conn.id, err = %e, "could not seat occupant");
        let bye = CloseFrame { code: close_code::AGAIN, reason: e.to_string().into() };
        sink.send(Message::Close(Some(bye))).await.ok();
        return;
    }
    info!(theater = %theater.id(), conn = %conn.id, "occupant connected");

    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sink.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
    });

    let session = Session { theater: theater.clone(), conn: conn.clone(), resolver };
    while let Some(msg) = stream.next().await {
        match msg {
            Ok(Message::Text(raw)) => {
                dispatcher.dispatch(&session, &raw).await.ok();
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(conn = %conn.id, err = %e, "socket error");
                break;
            }
        }
    }

    /* 離場 */
    theater.leave(conn.id).await;
    writer.abort();
    info!(theater = %theater.id(), conn = %conn.id, "occupant disconnected");
}
