use super::{validate_source, MediaError, MediaStore};
use crate::domain::PropertyImage;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

/// In-process media store for development without media host credentials, and for tests.
#[derive(Debug, Default)]
pub struct MemoryMediaStore {
    images: Mutex<HashMap<String, String>>,
    next_id: AtomicU64,
    fail_uploads: AtomicBool,
    fail_deletes: AtomicBool,
}

impl MemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.images.lock().map(|m| m.len()).unwrap_or_default()
    }

    #[cfg(test)]
    pub fn contains(&self, public_id: &str) -> bool {
        self.images
            .lock()
            .map(|m| m.contains_key(public_id))
            .unwrap_or(false)
    }

    /// Uploads accepted so far, including ones deleted since.
    #[cfg(test)]
    pub fn upload_count(&self) -> u64 {
        self.next_id.load(Ordering::SeqCst)
    }

    /// Simulate the remote host being down for uploads.
    #[cfg(test)]
    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Simulate the remote host being down for deletes.
    #[cfg(test)]
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

impl MediaStore for MemoryMediaStore {
    fn upload(&self, source: &str) -> Result<PropertyImage, MediaError> {
        validate_source(source)?;
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(MediaError::Upload("media host unavailable".into()));
        }

        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let public_id = format!("real-estate/mem-{n}");
        let url = format!("memory://{public_id}");

        self.images
            .lock()
            .map_err(|_| MediaError::Upload("media store lock poisoned".into()))?
            .insert(public_id.clone(), url.clone());

        Ok(PropertyImage { url, public_id })
    }

    fn delete(&self, public_id: &str) -> Result<(), MediaError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(MediaError::Delete("media host unavailable".into()));
        }
        self.images
            .lock()
            .map_err(|_| MediaError::Delete("media store lock poisoned".into()))?
            .remove(public_id);
        Ok(())
    }
}
