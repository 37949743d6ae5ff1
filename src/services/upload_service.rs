use crate::error::AppError;
use crate::naming::ImageName;
use crate::state::AppState;
use bytes::Bytes;
use tokio::io::AsyncWriteExt;

use super::quota;

/// Declared content types accepted for listing images. Checked as declared
/// by the client — there is no signature sniffing.
pub const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// One file part as received from the multipart stream, in arrival order.
#[derive(Debug)]
pub struct IncomingImage {
    pub original_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Validate and persist one upload batch, returning the public paths in
/// request order.
///
/// Sequence numbers are assigned 1-based by arrival order within this
/// request only; the counter is the loop index, threaded through the batch,
/// never shared state. Two independent requests for the same listing both
/// start at 1 — reconciling the resulting sequence is the auditor's job.
///
/// All validation, including the single quota check, happens before the
/// first write. A failed write aborts the remaining files and surfaces a
/// 500; files already written in this batch stay on disk (no rollback).
pub async fn store_batch(
    state: &AppState,
    user_id: &str,
    listing_code: &str,
    parts: Vec<IncomingImage>,
) -> Result<Vec<String>, AppError> {
    if parts.is_empty() {
        return Err(AppError::NoFilesProvided);
    }
    if parts.len() > state.config.max_batch_files {
        return Err(AppError::TooManyFiles {
            max_files: state.config.max_batch_files,
        });
    }

    let mut named: Vec<(ImageName, &IncomingImage)> = Vec::with_capacity(parts.len());
    for (index, part) in parts.iter().enumerate() {
        if part.data.len() as u64 > state.config.max_file_bytes {
            return Err(AppError::FileTooLarge {
                max_bytes: state.config.max_file_bytes,
            });
        }
        if !ALLOWED_MIME_TYPES.contains(&part.content_type.as_str()) {
            return Err(AppError::UnsupportedMediaType(part.content_type.clone()));
        }

        let sequence = index as u32 + 1;
        let name = ImageName::new(user_id, listing_code, sequence, &part.original_name)?;
        named.push((name, part));
    }

    let dir = state.config.listings_dir();
    tokio::fs::create_dir_all(&dir).await?;

    let used = quota::ensure_within_quota(&dir, state.config.quota_ceiling_bytes).await?;

    let mut urls = Vec::with_capacity(named.len());
    for (name, part) in named {
        let filename = name.to_string();
        let path = dir.join(&filename);

        let result: std::io::Result<()> = async {
            let mut file = tokio::fs::File::create(&path).await?;
            file.write_all(&part.data).await?;
            file.flush().await?;
            Ok(())
        }
        .await;

        if let Err(e) = result {
            tracing::error!(
                user_id_hex = %name.user_id_hex,
                listing_code = %name.listing_code,
                filename = %filename,
                "Image write failed: {e}"
            );
            return Err(AppError::StorageWrite(e.to_string()));
        }

        tracing::debug!(filename = %filename, size = part.data.len(), "Image stored");
        urls.push(format!("/uploads/listings/{filename}"));
    }

    tracing::info!(
        user_id = %user_id,
        listing_code = %listing_code,
        count = urls.len(),
        dir_bytes_before = used,
        "Upload batch stored"
    );

    Ok(urls)
}
