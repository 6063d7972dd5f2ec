// src/media/cloudinary.rs
use super::{validate_source, MediaError, MediaStore, ALLOWED_FORMATS};
use crate::config::CloudinaryConfig;
use crate::domain::PropertyImage;
use reqwest::blocking::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const API_BASE: &str = "https://api.cloudinary.com/v1_1";
const UPLOAD_FOLDER: &str = "real-estate";
const TRANSFORMATION: &str = "c_fill,h_800,w_1200/q_auto:good";

pub struct CloudinaryMediaStore {
    cfg: CloudinaryConfig,
    client: Client,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorMessage,
}

#[derive(Deserialize)]
struct ApiErrorMessage {
    message: String,
}

/// Hex SHA-256 over the alphabetically sorted `key=value` pairs joined by `&`,
/// immediately followed by the API secret.
pub(crate) fn sign(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<_> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    format!("{:x}", Sha256::digest(format!("{to_sign}{api_secret}").as_bytes()))
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

fn api_error(resp: reqwest::blocking::Response) -> String {
    let status = resp.status();
    let body = resp.text().unwrap_or_else(|_| "(no body)".to_string());
    match serde_json::from_str::<ApiErrorBody>(&body) {
        Ok(parsed) => format!("{status} - {}", parsed.error.message),
        Err(_) => format!("{status} - {body}"),
    }
}

impl CloudinaryMediaStore {
    pub fn new(cfg: CloudinaryConfig) -> Result<Self, MediaError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| MediaError::Upload(format!("http client init failed: {e}")))?;
        Ok(Self { cfg, client })
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{API_BASE}/{}/image/{action}", self.cfg.cloud_name)
    }

    /// Signed params plus the fields the signature excludes.
    fn signed_form(&self, mut signed: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        let signature = sign(&signed, &self.cfg.api_secret);
        signed.push(("api_key", self.cfg.api_key.clone()));
        signed.push(("signature", signature));
        signed.push(("signature_algorithm", "sha256".to_string()));
        signed
    }
}

impl MediaStore for CloudinaryMediaStore {
    fn upload(&self, source: &str) -> Result<PropertyImage, MediaError> {
        validate_source(source)?;

        let mut form = self.signed_form(vec![
            ("allowed_formats", ALLOWED_FORMATS.join(",")),
            ("folder", UPLOAD_FOLDER.to_string()),
            ("timestamp", unix_now().to_string()),
            ("transformation", TRANSFORMATION.to_string()),
        ]);
        form.push(("file", source.trim().to_string()));

        let resp = self
            .client
            .post(self.endpoint("upload"))
            .form(&form)
            .send()
            .map_err(|e| MediaError::Upload(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::BAD_REQUEST {
            // the host rejects unsupported or corrupt files with 400
            return Err(MediaError::InvalidFormat(api_error(resp)));
        }
        if !resp.status().is_success() {
            return Err(MediaError::Upload(api_error(resp)));
        }

        let body: UploadResponse = resp
            .json()
            .map_err(|e| MediaError::Upload(format!("unexpected upload response: {e}")))?;

        log::debug!("uploaded image {}", body.public_id);
        Ok(PropertyImage {
            url: body.secure_url,
            public_id: body.public_id,
        })
    }

    fn delete(&self, public_id: &str) -> Result<(), MediaError> {
        let form = self.signed_form(vec![
            ("public_id", public_id.to_string()),
            ("timestamp", unix_now().to_string()),
        ]);

        let resp = self
            .client
            .post(self.endpoint("destroy"))
            .form(&form)
            .send()
            .map_err(|e| MediaError::Delete(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(MediaError::Delete(api_error(resp)));
        }

        let body: DestroyResponse = resp
            .json()
            .map_err(|e| MediaError::Delete(format!("unexpected destroy response: {e}")))?;

        match body.result.as_str() {
            // already gone counts as released
            "ok" | "not found" => Ok(()),
            other => Err(MediaError::Delete(format!("destroy returned {other}"))),
        }
    }
}
