use axum::Router;

pub mod info;
pub mod theaters;
pub mod ws;

pub fn router() -> Router {
    Router::new()
        .merge(info::router())
        .nest("/api/v0", theaters::router().merge(ws::router()))
}
