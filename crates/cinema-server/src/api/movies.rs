use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult, JoinType, QueryFilter,
    QueryOrder, QuerySelect, QueryTrait, RelationTrait, Select, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiError;
use cinema_db::entities::{director, genre, movie};
use cinema_db::AppState;

/// A movie joined with its genre and director names.
#[derive(Debug, Clone, PartialEq, Serialize, FromQueryResult)]
pub struct MovieResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub rating: f64,
    pub trailer: String,
    pub genre: String,
    pub director: String,
}

#[derive(Debug, Default, PartialEq)]
pub struct MovieFilter {
    pub director_id: Option<i32>,
    pub genre_id: Option<i32>,
}

impl MovieFilter {
    /// Builds the filter from raw query pairs. A repeated key keeps its first
    /// value, an empty value counts as absent, unknown keys are ignored.
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, ApiError> {
        Ok(Self {
            director_id: first_id(pairs, "director_id")?,
            genre_id: first_id(pairs, "genre_id")?,
        })
    }
}

fn first_id(pairs: &[(String, String)], key: &str) -> Result<Option<i32>, ApiError> {
    match pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.trim()) {
        None | Some("") => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|e| ApiError::BadQuery(format!("{key}: invalid integer {v:?}: {e}"))),
    }
}

/// Full movie payload, required by both POST and PUT.
#[derive(Debug, Clone, Deserialize)]
pub struct MovieRequest {
    pub title: String,
    pub description: String,
    pub trailer: String,
    pub year: i32,
    pub rating: f64,
    pub genre_id: i32,
    pub director_id: i32,
}

impl MovieRequest {
    fn into_active_model(self) -> movie::ActiveModel {
        let mut active: movie::ActiveModel = Default::default();
        self.overwrite(&mut active);
        active
    }

    fn overwrite(self, active: &mut movie::ActiveModel) {
        active.title = Set(self.title);
        active.description = Set(self.description);
        active.trailer = Set(self.trailer);
        active.year = Set(self.year);
        active.rating = Set(self.rating);
        active.genre_id = Set(self.genre_id);
        active.director_id = Set(self.director_id);
    }
}

/// PATCH payload. Every field that is present (and not `null`) is applied.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateMovieRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub trailer: Option<String>,
    pub year: Option<i32>,
    pub rating: Option<f64>,
    pub genre_id: Option<i32>,
    pub director_id: Option<i32>,
}

impl UpdateMovieRequest {
    /// Copies the supplied fields onto `active`; returns whether anything was set.
    fn apply(self, active: &mut movie::ActiveModel) -> bool {
        let mut changed = false;
        if let Some(title) = self.title {
            active.title = Set(title);
            changed = true;
        }
        if let Some(description) = self.description {
            active.description = Set(description);
            changed = true;
        }
        if let Some(trailer) = self.trailer {
            active.trailer = Set(trailer);
            changed = true;
        }
        if let Some(year) = self.year {
            active.year = Set(year);
            changed = true;
        }
        if let Some(rating) = self.rating {
            active.rating = Set(rating);
            changed = true;
        }
        if let Some(genre_id) = self.genre_id {
            active.genre_id = Set(genre_id);
            changed = true;
        }
        if let Some(director_id) = self.director_id {
            active.director_id = Set(director_id);
            changed = true;
        }
        changed
    }
}

/// Movies inner-joined with genres and directors. Rows with a dangling
/// foreign key drop out of the result.
fn joined_movies() -> Select<movie::Entity> {
    movie::Entity::find()
        .select_only()
        .columns([
            movie::Column::Id,
            movie::Column::Title,
            movie::Column::Description,
            movie::Column::Rating,
            movie::Column::Trailer,
        ])
        .column_as(genre::Column::Name, "genre")
        .column_as(director::Column::Name, "director")
        .join(JoinType::InnerJoin, movie::Relation::Genre.def())
        .join(JoinType::InnerJoin, movie::Relation::Director.def())
        .order_by_asc(movie::Column::Id)
}

/// GET /movies/
pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<Vec<MovieResponse>>, ApiError> {
    let Query(pairs) = query?;
    let filter = MovieFilter::from_pairs(&pairs)?;

    let movies = joined_movies()
        .apply_if(filter.director_id, |q, id| {
            q.filter(movie::Column::DirectorId.eq(id))
        })
        .apply_if(filter.genre_id, |q, id| q.filter(movie::Column::GenreId.eq(id)))
        .into_model::<MovieResponse>()
        .all(&state.db)
        .await?;

    Ok(Json(movies))
}

/// POST /movies/
pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<MovieRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload?;

    let txn = state.db.begin().await?;
    let created = body.into_active_model().insert(&txn).await?;
    txn.commit().await?;

    tracing::info!(movie_id = created.id, "movie created");

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/movies/{}", created.id))],
        format!("Movie with id {} created", created.id),
    ))
}

/// GET /movies/:id
pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<MovieResponse>, ApiError> {
    let Path(id) = id?;

    joined_movies()
        .filter(movie::Column::Id.eq(id))
        .into_model::<MovieResponse>()
        .one(&state.db)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// PATCH /movies/:id
pub async fn update_movie(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdateMovieRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;

    let txn = state.db.begin().await?;
    let existing = movie::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(ApiError::NotFound)?;

    // Existence is checked first so an unknown id is a 404 whatever the body.
    let Json(body) = payload?;

    let mut active: movie::ActiveModel = existing.into();
    if body.apply(&mut active) {
        active.update(&txn).await?;
    }
    txn.commit().await?;

    tracing::info!(movie_id = id, "movie updated");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /movies/:id
pub async fn replace_movie(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<MovieRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;

    let txn = state.db.begin().await?;
    let existing = movie::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(ApiError::NotFound)?;

    let Json(body) = payload?;

    let mut active: movie::ActiveModel = existing.into();
    body.overwrite(&mut active);
    active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(movie_id = id, "movie replaced");
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /movies/:id
pub async fn delete_movie(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;

    let txn = state.db.begin().await?;
    let result = movie::Entity::delete_by_id(id).exec(&txn).await?;
    if result.rows_affected == 0 {
        return Err(ApiError::NotFound);
    }
    txn.commit().await?;

    tracing::info!(movie_id = id, "movie deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::ActiveValue;

    fn full_request() -> MovieRequest {
        MovieRequest {
            title: "Stalker".into(),
            description: "A guide leads two men into the Zone".into(),
            trailer: "https://example.com/stalker".into(),
            year: 1979,
            rating: 8.1,
            genre_id: 1,
            director_id: 2,
        }
    }

    #[test]
    fn test_movie_request_deserialization() {
        let json = r#"{"title":"T","description":"D","trailer":"u","year":2000,"rating":5,"genre_id":1,"director_id":1}"#;
        let req: MovieRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.title, "T");
        assert_eq!(req.year, 2000);
        assert_eq!(req.rating, 5.0);
    }

    #[test]
    fn test_movie_request_missing_field_fails() {
        let json = r#"{"title":"T","description":"D","trailer":"u","year":2000,"rating":5.0,"genre_id":1}"#;
        let err = serde_json::from_str::<MovieRequest>(json).unwrap_err();
        assert!(err.to_string().contains("director_id"));
    }

    #[test]
    fn test_movie_request_wrong_type_fails() {
        let json = r#"{"title":"T","description":"D","trailer":"u","year":"2000","rating":5.0,"genre_id":1,"director_id":1}"#;
        assert!(serde_json::from_str::<MovieRequest>(json).is_err());
    }

    #[test]
    fn test_into_active_model_leaves_id_unset() {
        let active = full_request().into_active_model();
        assert!(matches!(active.id, ActiveValue::NotSet));
        assert!(matches!(&active.title, ActiveValue::Set(t) if t == "Stalker"));
        assert!(matches!(active.director_id, ActiveValue::Set(2)));
    }

    #[test]
    fn test_update_request_applies_every_supplied_field() {
        let req: UpdateMovieRequest =
            serde_json::from_str(r#"{"title":"A","description":"B"}"#).unwrap();
        let mut active: movie::ActiveModel = Default::default();
        assert!(req.apply(&mut active));
        assert!(matches!(&active.title, ActiveValue::Set(t) if t == "A"));
        assert!(matches!(&active.description, ActiveValue::Set(d) if d == "B"));
        assert!(matches!(active.year, ActiveValue::NotSet));
    }

    #[test]
    fn test_update_request_ignores_nulls_and_unknown_keys() {
        let req: UpdateMovieRequest =
            serde_json::from_str(r#"{"title":null,"poster":"x"}"#).unwrap();
        let mut active: movie::ActiveModel = Default::default();
        assert!(!req.apply(&mut active));
        assert!(matches!(active.title, ActiveValue::NotSet));
    }

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_filter_empty_value_is_absent() {
        let filter =
            MovieFilter::from_pairs(&pairs(&[("director_id", ""), ("genre_id", "3")])).unwrap();
        assert_eq!(filter.director_id, None);
        assert_eq!(filter.genre_id, Some(3));
    }

    #[test]
    fn test_filter_repeated_key_keeps_first_value() {
        let filter =
            MovieFilter::from_pairs(&pairs(&[("director_id", "1"), ("director_id", "2")]))
                .unwrap();
        assert_eq!(filter.director_id, Some(1));
        assert_eq!(filter.genre_id, None);
    }

    #[test]
    fn test_filter_ignores_unknown_keys() {
        let filter = MovieFilter::from_pairs(&pairs(&[("sort", "title")])).unwrap();
        assert_eq!(filter, MovieFilter::default());
    }

    #[test]
    fn test_filter_rejects_non_integer() {
        let err = MovieFilter::from_pairs(&pairs(&[("genre_id", "drama")])).unwrap_err();
        assert!(matches!(err, ApiError::BadQuery(_)));
    }

    #[test]
    fn test_movie_response_serialization() {
        let resp = MovieResponse {
            id: 1,
            title: "T".into(),
            description: "D".into(),
            rating: 5.0,
            trailer: "u".into(),
            genre: "Drama".into(),
            director: "X".into(),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["genre"], "Drama");
        assert_eq!(json["director"], "X");
        assert!(json.get("genre_id").is_none());
        assert!(json.get("year").is_none());
    }
}
