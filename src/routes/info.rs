use axum::{routing::get, Extension, Json, Router};
use axum::http::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{error::Problem, models::ServerInfo, rpc::dispatch::Dispatcher, state::StartedAt};

pub fn router() -> Router {
    Router::new()
        .route("/", get(index))
        .route("/info", get(info))
        .route("/api", get(openapi))
}

async fn index() -> Problem {
    Problem::new(
        "/errors/all-systems-go",
        "All Systems Ready!",
        StatusCode::OK,
        "Nothing is wrong, and this response merely exists to inform the operators everything is ok.",
        "/".into(),
    )
}

async fn info(
    Extension(started): Extension<StartedAt>,
    Extension(dispatcher): Extension<Arc<Dispatcher>>,
) -> Json<ServerInfo> {
    Json(ServerInfo::new(started.0, dispatcher.stats().total()))
}

async fn openapi() -> Json<Value> {
    Json(openapi_doc())
}

fn problem(description: &str) -> Value {
    json!({
        "description": description,
        "content": { "application/problem+json": { "schema": { "$ref": "#/components/schemas/Problem" } } }
    })
}

/// Hand-maintained OpenAPI 3 description of the HTTP surface.
fn openapi_doc() -> Value {
    let summary = json!({ "$ref": "#/components/schemas/TheaterSummary" });
    let schemas = json!({
        "Problem": { "type": "object", "properties": {
            "type": { "type": "string" }, "title": { "type": "string" }, "status": { "type": "integer" },
            "detail": { "type": "string" }, "instance": { "type": "string" }
        } },
        "TheaterSummary": { "type": "object", "properties": {
            "id": { "type": "string" }, "name": { "type": "string" }, "authRequired": { "type": "boolean" },
            "seats": { "type": "integer" }, "occupancy": { "type": "integer" }
        } },
        "ServerInfo": { "type": "object", "properties": {
            "version": { "type": "string" }, "protocol": { "type": "string" },
            "startedAt": { "type": "string", "format": "date-time" }, "droppedFrames": { "type": "integer" }
        } }
    });
    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "Cinema",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Synchronized group playback. Theater control happens over the RPC WebSocket."
        },
        "paths": {
            "/": { "get": { "summary": "Readiness", "responses": { "200": problem("All systems ready") } } },
            "/info": { "get": {
                "summary": "Server information",
                "responses": { "200": { "description": "ServerInfo", "content": { "application/json": {
                    "schema": { "$ref": "#/components/schemas/ServerInfo" } } } } }
            } },
            "/api/v0/theaters": {
                "get": {
                    "summary": "List theaters",
                    "responses": { "200": { "description": "Theater summaries", "content": { "application/json": {
                        "schema": { "type": "array", "items": summary } } } } }
                },
                "post": { "summary": "Create a theater", "responses": { "501": problem("Not implemented") } }
            },
            "/api/v0/theaters/{id}": { "get": {
                "summary": "Query one theater",
                "parameters": [{ "name": "id", "in": "path", "required": true, "schema": { "type": "string" } }],
                "responses": {
                    "200": { "description": "Theater summary", "content": { "application/json": { "schema": summary } } },
                    "404": problem("No such theater")
                }
            } },
            "/api/v0/theaters/{id}/rpc/ws": { "get": {
                "summary": "Join a theater's RPC WebSocket",
                "parameters": [{ "name": "id", "in": "path", "required": true, "schema": { "type": "string" } }],
                "responses": {
                    "101": { "description": "Switching protocols" },
                    "404": problem("No such theater"),
                    "409": problem("Theater is full")
                }
            } }
        },
        "components": { "schemas": schemas }
    })
}
