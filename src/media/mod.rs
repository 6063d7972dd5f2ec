// src/media/mod.rs
mod cloudinary;
mod memory;

pub use cloudinary::CloudinaryMediaStore;
pub use memory::MemoryMediaStore;

use crate::domain::PropertyImage;
use base64::Engine;
use thiserror::Error;

pub const ALLOWED_FORMATS: [&str; 4] = ["jpg", "png", "jpeg", "webp"];

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{0}")]
    InvalidFormat(String),
    #[error("image upload failed: {0}")]
    Upload(String),
    #[error("image delete failed: {0}")]
    Delete(String),
}

/// Hosted image storage. Sources are http(s) URLs or base64 data URIs.
pub trait MediaStore: Send + Sync {
    fn upload(&self, source: &str) -> Result<PropertyImage, MediaError>;

    fn delete(&self, public_id: &str) -> Result<(), MediaError>;
}

/// Rejects sources the media host would refuse anyway, before any network call.
pub fn validate_source(source: &str) -> Result<(), MediaError> {
    let source = source.trim();

    if source.starts_with("http://") || source.starts_with("https://") {
        let parsed = url::Url::parse(source)
            .map_err(|e| MediaError::InvalidFormat(format!("invalid image url: {e}")))?;
        if parsed.host_str().is_none() {
            return Err(MediaError::InvalidFormat("image url has no host".into()));
        }
        return Ok(());
    }

    let Some(rest) = source.strip_prefix("data:") else {
        return Err(MediaError::InvalidFormat(
            "image must be an http(s) url or a data uri".into(),
        ));
    };
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| MediaError::InvalidFormat("malformed data uri".into()))?;
    let media_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| MediaError::InvalidFormat("data uri must be base64".into()))?;

    let mime: mime::Mime = media_type
        .parse()
        .map_err(|_| MediaError::InvalidFormat(format!("unknown media type {media_type}")))?;
    if mime.type_() != mime::IMAGE || !ALLOWED_FORMATS.contains(&mime.subtype().as_str()) {
        return Err(MediaError::InvalidFormat(format!(
            "unsupported image format {mime}"
        )));
    }

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| MediaError::InvalidFormat(format!("image payload is not base64: {e}")))?;
    if bytes.is_empty() {
        return Err(MediaError::InvalidFormat("image payload is empty".into()));
    }
    Ok(())
}

/// Uploads running at once for one request.
const UPLOAD_CONCURRENCY: usize = 4;

/// Uploads the sources in small concurrent batches, keeping their order. If
/// any upload fails, no further batch starts, the ones that succeeded are
/// released and the first error is returned.
pub fn upload_all(
    store: &dyn MediaStore,
    sources: &[String],
) -> Result<Vec<PropertyImage>, MediaError> {
    let mut results: Vec<Result<PropertyImage, MediaError>> = Vec::with_capacity(sources.len());

    for batch in sources.chunks(UPLOAD_CONCURRENCY) {
        std::thread::scope(|s| {
            let handles: Vec<_> = batch
                .iter()
                .map(|source| {
                    std::thread::Builder::new()
                        .name("media-upload".into())
                        .spawn_scoped(s, move || store.upload(source))
                })
                .collect();

            for handle in handles {
                results.push(match handle {
                    Ok(h) => h
                        .join()
                        .unwrap_or_else(|_| Err(MediaError::Upload("upload worker panicked".into()))),
                    Err(e) => Err(MediaError::Upload(format!("could not start upload worker: {e}"))),
                });
            }
        });

        if results.iter().any(Result::is_err) {
            break;
        }
    }

    let mut uploaded = Vec::with_capacity(results.len());
    let mut first_error = None;
    for result in results {
        match result {
            Ok(image) => uploaded.push(image),
            Err(e) if first_error.is_none() => first_error = Some(e),
            Err(e) => log::warn!("additional upload failure: {e}"),
        }
    }

    match first_error {
        Some(e) => {
            release_all(store, &uploaded);
            Err(e)
        }
        None => Ok(uploaded),
    }
}

/// Best-effort deletion; failures are logged and otherwise ignored.
pub fn release_all(store: &dyn MediaStore, images: &[PropertyImage]) {
    for image in images {
        if let Err(e) = store.delete(&image.public_id) {
            log::warn!("could not release image {}: {e}", image.public_id);
        }
    }
}
