use axum::{extract::Path, routing::get, Extension, Json, Router};

use crate::{
    error::{AppErr, AppResult},
    models::TheaterSummary,
    state::TheaterMap,
};

pub fn router() -> Router {
    Router::new()
        .route("/theaters", get(list_theaters).post(create_theater))
        .route("/theaters/:id", get(query_theater))
}

async fn list_theaters(Extension(theaters): Extension<TheaterMap>) -> Json<Vec<TheaterSummary>> {
    let mut out = Vec::new();
    for theater in theaters.all().await {
        if let Ok(summary) = theater.summary().await {
            out.push(summary);
        }
    }
    Json(out)
}

async fn query_theater(
    Extension(theaters): Extension<TheaterMap>,
    Path(id): Path<String>,
) -> AppResult<Json<TheaterSummary>> {
    let not_found = || AppErr::NotFound(format!("/theaters/{id}"));
    let theater = theaters.get(&id).await.ok_or_else(not_found)?;
    let summary = theater.summary().await.map_err(|_| not_found())?;
    Ok(Json(summary))
}

// 建立影廳尚未開放
async fn create_theater() -> AppErr {
    AppErr::Unimplemented("/theaters".into())
}
