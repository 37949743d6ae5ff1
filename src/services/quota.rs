use crate::error::AppError;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct DirStats {
    pub files: u64,
    pub bytes: u64,
}

/// Count and aggregate size of the regular files directly inside `dir`.
///
/// One level only; subdirectories and other entry types are skipped. The
/// numbers are recomputed by scanning on every call — there is no cached
/// counter to invalidate.
pub async fn directory_stats(dir: &Path) -> std::io::Result<DirStats> {
    let mut stats = DirStats::default();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let meta = entry.metadata().await?;
        if meta.is_file() {
            stats.files += 1;
            stats.bytes += meta.len();
        }
    }
    Ok(stats)
}

pub async fn directory_size(dir: &Path) -> std::io::Result<u64> {
    Ok(directory_stats(dir).await?.bytes)
}

/// Check the directory against the quota ceiling, returning the current
/// aggregate size when there is room. The boundary is inclusive: a
/// directory sitting exactly at the ceiling is already over quota.
///
/// Check-then-act: nothing stops two concurrent batches from both passing
/// and jointly overshooting. The ceiling is a soft limit, not an invariant.
pub async fn ensure_within_quota(dir: &Path, ceiling: u64) -> Result<u64, AppError> {
    let used = directory_size(dir).await?;
    if used >= ceiling {
        return Err(AppError::QuotaExceeded { used, ceiling });
    }
    Ok(used)
}
