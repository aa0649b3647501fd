//! Article resource: CRUD handlers and schema.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};

use crate::api::AppState;
use crate::store::Migration;

/// Schema changes owned by this resource, consumed once at startup.
pub fn migrations() -> Vec<Migration> {
    vec![Migration {
        id: "0001_initial",
        up: "CREATE TABLE article (
            id    SERIAL                 NOT NULL,
            title character varying(256) NOT NULL,
            slug  character varying(128) NOT NULL,
            PRIMARY KEY (id)
        )",
    }]
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Article {
    pub id: i32,
    pub title: String,
    pub slug: String,
}

#[derive(Debug, Deserialize)]
pub struct ArticlePayload {
    pub title: String,
    pub slug: String,
}

/// Store failure surfaced to the client as a plain 500; the cause is logged.
struct ApiError(sqlx::Error);

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "store error");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
    }
}

fn article_from_row(row: sqlx::postgres::PgRow) -> Article {
    Article {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_articles).post(create_article))
        .route(
            "/{id}",
            get(get_article).put(update_article).delete(delete_article),
        )
}

async fn list_articles(State(pool): State<PgPool>) -> Result<Json<Vec<Article>>, ApiError> {
    let rows = sqlx::query("SELECT id, title, slug FROM article ORDER BY id")
        .fetch_all(&pool)
        .await?;
    Ok(Json(rows.into_iter().map(article_from_row).collect()))
}

async fn get_article(
    State(pool): State<PgPool>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    let row = sqlx::query("SELECT id, title, slug FROM article WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?;
    match row {
        Some(row) => Ok(Json(article_from_row(row)).into_response()),
        None => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}

async fn create_article(
    State(pool): State<PgPool>,
    Json(payload): Json<ArticlePayload>,
) -> Result<Response, ApiError> {
    let row = sqlx::query("INSERT INTO article (title, slug) VALUES ($1, $2) RETURNING id, title, slug")
        .bind(&payload.title)
        .bind(&payload.slug)
        .fetch_one(&pool)
        .await?;
    Ok((StatusCode::CREATED, Json(article_from_row(row))).into_response())
}

async fn update_article(
    State(pool): State<PgPool>,
    Path(id): Path<i32>,
    Json(payload): Json<ArticlePayload>,
) -> Result<Response, ApiError> {
    let row = sqlx::query(
        "UPDATE article SET title = $1, slug = $2 WHERE id = $3 RETURNING id, title, slug",
    )
    .bind(&payload.title)
    .bind(&payload.slug)
    .bind(id)
    .fetch_optional(&pool)
    .await?;
    match row {
        Some(row) => Ok(Json(article_from_row(row)).into_response()),
        None => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}

async fn delete_article(
    State(pool): State<PgPool>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("DELETE FROM article WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;
    if result.rows_affected() == 0 {
        Ok(StatusCode::NOT_FOUND)
    } else {
        Ok(StatusCode::NO_CONTENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_ids_are_unique_and_ordered() {
        let set = migrations();
        let mut ids: Vec<_> = set.iter().map(|m| m.id).collect();
        let original = ids.clone();
        ids.sort();
        ids.dedup();
        assert_eq!(ids, original);
    }

    #[test]
    fn test_payload_rejects_missing_fields() {
        let err = serde_json::from_str::<ArticlePayload>(r#"{"title": "only"}"#);
        assert!(err.is_err());
    }
}
