use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Multipart, Query, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
};

use crate::{
    AppState,
    error::{AppError, AppResult},
    importer,
    models::{
        ListMoviesParams, MessageResponse, MovieFilter, MoviePage, MovieQuery, SortField,
        SortOrder,
    },
};

const DEFAULT_PAGE: u64 = 1;
const DEFAULT_PER_PAGE: u64 = 10;

struct UploadedFile {
    name: String,
    data: Vec<u8>,
}

pub async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<MessageResponse>> {
    let Ok(mut multipart) = multipart else {
        return Err(AppError::bad_request("No file part"));
    };

    let Some(file) = read_file_field(&mut multipart).await? else {
        return Err(AppError::bad_request("No file part"));
    };

    if file.name.is_empty() {
        return Err(AppError::bad_request("No file selected"));
    }

    if !importer::is_csv_file_name(&file.name) {
        return Err(AppError::bad_request("Invalid file type, must be a CSV"));
    }

    importer::import_upload(&state.store, &state.config.upload_dir, &file.name, &file.data).await?;

    Ok(Json(MessageResponse { message: "File uploaded and data saved successfully" }))
}

/// Finds the `file` part. A part without a file name counts as present but
/// unnamed.
async fn read_file_field(multipart: &mut Multipart) -> AppResult<Option<UploadedFile>> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await.map_err(multipart_error)?;
        return Ok(Some(UploadedFile { name, data: data.to_vec() }));
    }
    Ok(None)
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(err.body_text())
    }
}

pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListMoviesParams>,
) -> AppResult<Json<MoviePage>> {
    let query = movie_query(params)?;
    let (total, movies) = state.store.list(&query).await?;

    Ok(Json(MoviePage {
        total,
        page: query.page,
        per_page: query.per_page,
        movies: movies.into_iter().map(Into::into).collect(),
    }))
}

fn movie_query(params: ListMoviesParams) -> AppResult<MovieQuery> {
    let sort_order = match params.sort_order.as_deref() {
        None => SortOrder::default(),
        Some(s) => s.parse().map_err(|_| AppError::bad_request("Invalid sort order"))?,
    };

    let sort_by = match params.sort_by.as_deref() {
        None => SortField::default(),
        Some(s) => s.parse().map_err(|_| AppError::bad_request("Invalid sort field"))?,
    };

    let page = positive(params.page.as_deref()).unwrap_or(DEFAULT_PAGE);
    let per_page = positive(params.per_page.as_deref()).unwrap_or(DEFAULT_PER_PAGE);

    Ok(MovieQuery {
        filter: MovieFilter { original_language: params.language.filter(|l| !l.is_empty()) },
        sort_by,
        sort_order,
        page,
        per_page,
    })
}

fn positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse::<u64>().ok()).filter(|&n| n > 0)
}
