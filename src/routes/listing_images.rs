use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Extension, Json};
use tokio_util::io::ReaderStream;

use crate::auth::UserContext;
use crate::error::AppError;
use crate::models::image::{ListingCodeResponse, UploadResponse};
use crate::naming::{self, ImageName};
use crate::services::upload_service::{self, IncomingImage};
use crate::state::AppState;

/// Multipart intake: up to 20 parts under the `images` field plus an
/// optional `listingCode` text field. Sequence numbers follow arrival
/// order within this request.
pub async fn upload_images(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut listing_code: Option<String> = None;
    let mut parts: Vec<IncomingImage> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "images" => {
                if parts.len() >= state.config.max_batch_files {
                    return Err(AppError::TooManyFiles {
                        max_files: state.config.max_batch_files,
                    });
                }
                let original_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read file part: {e}")))?;
                parts.push(IncomingImage {
                    original_name,
                    content_type,
                    data,
                });
            }
            "listingCode" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read listingCode: {e}")))?;
                if !text.is_empty() {
                    listing_code = Some(text);
                }
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    let listing_code = match listing_code {
        Some(code) => {
            if !naming::is_valid_listing_code(&code) {
                return Err(AppError::BadRequest(format!(
                    "Listing code {code:?} must be alphanumeric"
                )));
            }
            code
        }
        None => naming::generate_listing_code(),
    };

    let image_urls = upload_service::store_batch(&state, &user.user_id, &listing_code, parts).await?;

    Ok(Json(UploadResponse {
        message: "Upload successful!".to_string(),
        count: image_urls.len(),
        image_urls,
    }))
}

pub async fn generate_code(
    Extension(user): Extension<UserContext>,
) -> Json<ListingCodeResponse> {
    let listing_code = naming::generate_listing_code();
    tracing::debug!(user_id = %user.user_id, listing_code = %listing_code, "Listing code issued");
    Json(ListingCodeResponse { listing_code })
}

/// Canonical serving endpoint. The user/listing segments are part of the
/// URL contract but the lookup is by filename alone, as in the upload
/// response paths. A missing or non-conforming name never 404s — the
/// client gets a placeholder image instead.
pub async fn serve_image(
    State(state): State<AppState>,
    Path((_user_id_hex, _listing_code, filename)): Path<(String, String, String)>,
) -> Result<Response, AppError> {
    if ImageName::decode(&filename).is_none() {
        return Ok(placeholder(&state));
    }
    match stream_image(&state, &filename).await? {
        Some(resp) => Ok(resp),
        None => Ok(placeholder(&state)),
    }
}

/// Static-style path matching the URLs returned by the upload endpoint.
pub async fn serve_upload_path(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    match stream_image(&state, &filename).await? {
        Some(resp) => Ok(resp),
        None => Err(AppError::NotFound(format!("Image {filename} not found"))),
    }
}

fn placeholder(state: &AppState) -> Response {
    Redirect::temporary(&state.config.placeholder_image_url).into_response()
}

async fn stream_image(state: &AppState, filename: &str) -> Result<Option<Response>, AppError> {
    let path = state.config.listings_dir().join(filename);
    let file = match tokio::fs::File::open(&path).await {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let len = file.metadata().await?.len();

    let content_type = mime_guess::from_path(filename)
        .first_or_octet_stream()
        .to_string();
    let stream = ReaderStream::new(file);
    let body = Body::from_stream(stream);

    let response = Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", content_type)
        .header("Content-Length", len.to_string())
        .header("Cache-Control", "public, max-age=31536000")
        .body(body)
        .unwrap();

    Ok(Some(response))
}
