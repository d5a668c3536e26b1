//! Video streaming endpoints (/videos/*)
//!
//! Serves the stored asset behind an approval so the dashboard's `<video>`
//! element can preview it. Range requests are honored for seeking; the body
//! is streamed straight off the file handle, so a mid-stream I/O failure
//! aborts the response without buffering the whole asset first.

use axum::{
    Router,
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use std::io::SeekFrom;
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use super::auth::AuthUser;
use crate::AppState;
use crate::domain::approvals;
use crate::services::error::ApiError;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/videos/{id}", get(stream_video))
        .route("/videos/{id}/thumbnail", get(get_thumbnail))
}

/// Stored paths may be relative to MEDIA_ROOT or absolute.
fn resolve_media_path(media_root: Option<&FsPath>, stored: &str) -> PathBuf {
    let path = PathBuf::from(stored);
    if path.is_relative() {
        if let Some(root) = media_root {
            return root.join(path);
        }
    }
    path
}

/// Parse a `Range: bytes=<start>-<end?>` header against a file of `total`
/// bytes, returning the inclusive range to serve.
///
/// Malformed syntax and unsatisfiable ranges (start past EOF, start > end)
/// return `None` and the caller falls back to a full 200 response, matching
/// lenient real-world client handling. `end` defaults to and is clamped at
/// the last byte.
fn parse_range(header: Option<&str>, total: u64) -> Option<(u64, u64)> {
    let spec = header?.strip_prefix("bytes=")?;
    let (start, end) = spec.split_once('-')?;
    let start: u64 = start.trim().parse().ok()?;
    let end: u64 = match end.trim() {
        "" => total.checked_sub(1)?,
        s => s.parse().ok()?,
    };
    let end = end.min(total.saturating_sub(1));
    if start > end || start >= total {
        return None;
    }
    Some((start, end))
}

/// Derive the cached thumbnail location for a video: `<stem>_thumb.jpg`
/// next to the asset.
fn thumbnail_path(video_path: &FsPath) -> PathBuf {
    let stem = video_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("video");
    video_path.with_file_name(format!("{stem}_thumb.jpg"))
}

/// GET /videos/:id - Stream the video for an approval, honoring Range
async fn stream_video(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let approval = approvals::get(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("video"))?;

    let path = resolve_media_path(state.media_root.as_deref(), &approval.video_path);
    let total = tokio::fs::metadata(&path)
        .await
        .map_err(|_| ApiError::NotFound("video file"))?
        .len();

    let mut file = tokio::fs::File::open(&path)
        .await
        .map_err(|e| ApiError::internal("open video file", e))?;

    let range = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok());

    let response = match parse_range(range, total) {
        Some((start, end)) => {
            let len = end - start + 1;
            file.seek(SeekFrom::Start(start))
                .await
                .map_err(|e| ApiError::internal("seek video file", e))?;
            Response::builder()
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_TYPE, "video/mp4")
                .header(header::ACCEPT_RANGES, "bytes")
                .header(header::CONTENT_LENGTH, len)
                .header(
                    header::CONTENT_RANGE,
                    format!("bytes {start}-{end}/{total}"),
                )
                .body(Body::from_stream(ReaderStream::new(file.take(len))))
        }
        None => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "video/mp4")
            .header(header::ACCEPT_RANGES, "bytes")
            .header(header::CONTENT_LENGTH, total)
            .body(Body::from_stream(ReaderStream::new(file))),
    };

    response.map_err(|e| ApiError::internal("build video response", e))
}

const PLACEHOLDER_SVG: &str = r##"<svg width="320" height="568" xmlns="http://www.w3.org/2000/svg">
  <rect width="320" height="568" fill="#1a1a2e"/>
  <text x="50%" y="50%" fill="#ffffff" font-size="24" text-anchor="middle" dominant-baseline="middle">Video Preview</text>
</svg>"##;

/// GET /videos/:id/thumbnail - Cached thumbnail, or an SVG placeholder
async fn get_thumbnail(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let approval = approvals::get(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("video"))?;

    let video = resolve_media_path(state.media_root.as_deref(), &approval.video_path);
    let thumb = thumbnail_path(&video);

    match tokio::fs::read(&thumb).await {
        Ok(bytes) => Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes).into_response()),
        Err(_) => Ok((
            [(header::CONTENT_TYPE, "image/svg+xml")],
            PLACEHOLDER_SVG,
        )
            .into_response()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_range_header() {
        assert_eq!(parse_range(None, 1000), None);
    }

    #[test]
    fn test_explicit_range() {
        assert_eq!(parse_range(Some("bytes=100-199"), 1000), Some((100, 199)));
        assert_eq!(parse_range(Some("bytes=0-0"), 1000), Some((0, 0)));
    }

    #[test]
    fn test_open_ended_range() {
        assert_eq!(parse_range(Some("bytes=900-"), 1000), Some((900, 999)));
        assert_eq!(parse_range(Some("bytes=0-"), 1000), Some((0, 999)));
    }

    #[test]
    fn test_end_clamped_to_file_size() {
        assert_eq!(parse_range(Some("bytes=0-5000"), 1000), Some((0, 999)));
    }

    #[test]
    fn test_malformed_ranges_fall_back() {
        assert_eq!(parse_range(Some("100-199"), 1000), None);
        assert_eq!(parse_range(Some("bytes=abc-"), 1000), None);
        assert_eq!(parse_range(Some("bytes=-500"), 1000), None);
        assert_eq!(parse_range(Some("bytes="), 1000), None);
    }

    #[test]
    fn test_unsatisfiable_ranges_fall_back() {
        assert_eq!(parse_range(Some("bytes=1000-"), 1000), None);
        assert_eq!(parse_range(Some("bytes=500-100"), 1000), None);
        assert_eq!(parse_range(Some("bytes=0-"), 0), None);
    }

    #[test]
    fn test_thumbnail_path_derivation() {
        assert_eq!(
            thumbnail_path(FsPath::new("/data/videos/reel_42.mp4")),
            PathBuf::from("/data/videos/reel_42_thumb.jpg")
        );
        assert_eq!(
            thumbnail_path(FsPath::new("clip.mp4")),
            PathBuf::from("clip_thumb.jpg")
        );
    }

    #[test]
    fn test_resolve_media_path() {
        assert_eq!(
            resolve_media_path(Some(FsPath::new("/media")), "account_1/reel.mp4"),
            PathBuf::from("/media/account_1/reel.mp4")
        );
        assert_eq!(
            resolve_media_path(Some(FsPath::new("/media")), "/abs/reel.mp4"),
            PathBuf::from("/abs/reel.mp4")
        );
        assert_eq!(
            resolve_media_path(None, "account_1/reel.mp4"),
            PathBuf::from("account_1/reel.mp4")
        );
    }
}
