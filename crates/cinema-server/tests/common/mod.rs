// Shared test utilities for integration tests
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use cinema_db::entities::{director, genre, movie};
use cinema_db::AppState;
use cinema_server::{build_router, ServerConfig};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use tower::ServiceExt;

pub struct TestApp {
    pub db: DatabaseConnection,
    pub router: Router,
}

/// Fresh in-memory database, migrated, with two genres and two directors:
/// genre 1 "Drama", genre 2 "Comedy", director 1 "X", director 2 "Y".
pub async fn spawn_app() -> TestApp {
    let db = cinema_db::connect(&cinema_db::DatabaseConfig::in_memory())
        .await
        .expect("connect to in-memory sqlite");
    cinema_migration::Migrator::up(&db, None)
        .await
        .expect("run migrations");

    for name in ["Drama", "Comedy"] {
        genre::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .expect("seed genre");
    }
    for name in ["X", "Y"] {
        director::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .expect("seed director");
    }

    let state = Arc::new(AppState { db: db.clone() });
    let router = build_router(state, &ServerConfig::default());
    TestApp { db, router }
}

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        json: Option<serde_json::Value>,
    ) -> (StatusCode, String) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match json {
            Some(value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(value.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        let resp = self.router.clone().oneshot(req).await.expect("oneshot");
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("read body");
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    pub async fn get_json(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        let (status, body) = self.request(Method::GET, uri, None).await;
        let value = serde_json::from_str(&body).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    /// Inserts a movie directly, bypassing the HTTP layer.
    pub async fn insert_movie(&self, title: &str, genre_id: i32, director_id: i32) -> i32 {
        movie::ActiveModel {
            title: Set(title.to_string()),
            description: Set(format!("{title} description")),
            trailer: Set(format!("https://example.com/{title}")),
            year: Set(2000),
            rating: Set(7.5),
            genre_id: Set(genre_id),
            director_id: Set(director_id),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .expect("insert movie")
        .id
    }
}

pub fn movie_payload(title: &str, genre_id: i32, director_id: i32) -> serde_json::Value {
    serde_json::json!({
        "title": title,
        "description": "D",
        "trailer": "u",
        "year": 2000,
        "rating": 5.0,
        "genre_id": genre_id,
        "director_id": director_id,
    })
}
