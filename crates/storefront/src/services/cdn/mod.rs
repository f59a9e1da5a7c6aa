//! Signed uploads to the image CDN.
//!
//! Browsers upload directly to the CDN with parameters signed here, so the
//! API secret never leaves the server. Generated images are pulled in
//! server-side with [`CdnClient::upload_remote`].

mod error;

pub use error::CdnError;

use std::collections::BTreeMap;
use std::fmt;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, error, instrument};

use crate::config::CdnConfig;

const DELIVERY_HOST: &str = "https://res.cloudinary.com";

/// Parameters the CDN leaves out of the signature.
const UNSIGNED_PARAMS: &[&str] = &[
    "file",
    "api_key",
    "resource_type",
    "cloud_name",
    "signature",
    "signature_algorithm",
];

/// Parameters for a direct browser upload.
#[derive(Debug, Clone, Serialize)]
pub struct SignedUpload {
    pub cloud_name: String,
    pub api_key: String,
    pub timestamp: i64,
    pub folder: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
    pub signature: String,
    pub signature_algorithm: &'static str,
    pub upload_url: String,
}

/// An asset stored on the CDN.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedAsset {
    pub public_id: String,
    pub secure_url: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub bytes: u64,
    /// Optimized delivery URL, filled in after upload.
    #[serde(default)]
    pub delivery_url: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Client for the image CDN upload API.
#[derive(Clone)]
pub struct CdnClient {
    client: Client,
    cloud_name: String,
    api_key: String,
    api_secret: SecretString,
    upload_folder: String,
    api_base_url: String,
}

impl fmt::Debug for CdnClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CdnClient")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("upload_folder", &self.upload_folder)
            .finish_non_exhaustive()
    }
}

impl CdnClient {
    #[must_use]
    pub fn new(config: &CdnConfig) -> Self {
        Self {
            client: Client::new(),
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            upload_folder: config.upload_folder.clone(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn upload_url(&self) -> String {
        format!("{}/v1_1/{}/image/upload", self.api_base_url, self.cloud_name)
    }

    /// Sign parameters for a direct browser upload.
    ///
    /// # Errors
    ///
    /// Returns [`CdnError::Validation`] for malformed folder or public IDs.
    pub fn sign_upload(
        &self,
        folder: Option<&str>,
        public_id: Option<&str>,
    ) -> Result<SignedUpload, CdnError> {
        self.sign_upload_at(folder, public_id, chrono::Utc::now().timestamp())
    }

    fn sign_upload_at(
        &self,
        folder: Option<&str>,
        public_id: Option<&str>,
        timestamp: i64,
    ) -> Result<SignedUpload, CdnError> {
        let folder = folder
            .filter(|f| !f.is_empty())
            .unwrap_or(&self.upload_folder);
        validate_path("folder", folder)?;
        if let Some(id) = public_id {
            validate_path("public_id", id)?;
        }

        let mut params = BTreeMap::new();
        params.insert("folder", folder.to_string());
        params.insert("timestamp", timestamp.to_string());
        if let Some(id) = public_id {
            params.insert("public_id", id.to_string());
        }

        Ok(SignedUpload {
            cloud_name: self.cloud_name.clone(),
            api_key: self.api_key.clone(),
            timestamp,
            folder: folder.to_string(),
            public_id: public_id.map(str::to_string),
            signature: signature(&params, self.api_secret.expose_secret()),
            signature_algorithm: "sha256",
            upload_url: self.upload_url(),
        })
    }

    /// Upload an image the CDN fetches from `file_url`.
    ///
    /// # Errors
    ///
    /// Returns [`CdnError::Validation`] for non-HTTP URLs or malformed public
    /// IDs, or an error if the upload fails.
    #[instrument(skip(self))]
    pub async fn upload_remote(
        &self,
        file_url: &str,
        public_id: Option<&str>,
    ) -> Result<UploadedAsset, CdnError> {
        let parsed = url::Url::parse(file_url)
            .map_err(|e| CdnError::Validation(format!("file_url: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CdnError::Validation(
                "file_url must be an http(s) URL".to_string(),
            ));
        }

        let signed = self.sign_upload(None, public_id)?;
        let mut form = vec![
            ("file", file_url.to_string()),
            ("api_key", signed.api_key),
            ("timestamp", signed.timestamp.to_string()),
            ("folder", signed.folder),
            ("signature", signed.signature),
            ("signature_algorithm", signed.signature_algorithm.to_string()),
        ];
        if let Some(id) = signed.public_id {
            form.push(("public_id", id));
        }

        let response = self
            .client
            .post(&signed.upload_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| CdnError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CdnError::Response(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| body.chars().take(200).collect());
            error!(status = %status, message = %message, "CDN upload rejected");
            return Err(CdnError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let mut asset: UploadedAsset =
            serde_json::from_str(&body).map_err(|e| CdnError::Response(e.to_string()))?;
        asset.delivery_url = self.delivery_url(&asset.public_id, None);
        debug!(public_id = %asset.public_id, bytes = asset.bytes, "Uploaded to CDN");
        Ok(asset)
    }

    /// Optimized delivery URL for an uploaded image.
    #[must_use]
    pub fn delivery_url(&self, public_id: &str, width: Option<u32>) -> String {
        let transform = match width {
            Some(w) => format!("f_auto,q_auto,w_{w}"),
            None => "f_auto,q_auto".to_string(),
        };
        format!(
            "{DELIVERY_HOST}/{}/image/upload/{transform}/{public_id}",
            self.cloud_name
        )
    }
}

/// Upload signature: signed parameters as sorted `k=v` pairs joined with
/// `&`, the secret appended, SHA-256 hex.
#[must_use]
pub fn signature(params: &BTreeMap<&str, String>, secret: &str) -> String {
    let to_sign = params
        .iter()
        .filter(|(key, value)| !value.is_empty() && !UNSIGNED_PARAMS.contains(*key))
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

fn validate_path(field: &str, value: &str) -> Result<(), CdnError> {
    let well_formed = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '/' | '.'));
    if value.is_empty()
        || value.len() > 255
        || !well_formed
        || value.starts_with('/')
        || value.contains("..")
    {
        return Err(CdnError::Validation(format!("invalid {field}")));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client() -> CdnClient {
        CdnClient::new(&CdnConfig {
            cloud_name: "tidepool".to_string(),
            api_key: "123456789012345".to_string(),
            api_secret: SecretString::from("s3cr3t"),
            upload_folder: "storefront".to_string(),
            api_base_url: "https://api.cloudinary.com/".to_string(),
        })
    }

    fn params(pairs: &[(&'static str, &str)]) -> BTreeMap<&'static str, String> {
        pairs.iter().map(|(k, v)| (*k, (*v).to_string())).collect()
    }

    #[test]
    fn test_signature_known_vector() {
        let p = params(&[
            ("timestamp", "1315060510"),
            ("public_id", "sample_image"),
            ("eager", "w_400,h_300,c_pad|w_260,h_200,c_crop"),
        ]);
        assert_eq!(
            signature(&p, "abcd"),
            "cc927e1290f9e3ae4c1a741eda21a4630b4ce80f9ce0bc0296337d25cf40f91e"
        );
    }

    #[test]
    fn test_signature_skips_unsigned_and_empty_params() {
        let signed = params(&[
            ("folder", "storefront"),
            ("public_id", "hero"),
            ("timestamp", "1700000000"),
        ]);
        let mut noisy = signed.clone();
        noisy.insert("api_key", "123".to_string());
        noisy.insert("file", "https://img.example/a.png".to_string());
        noisy.insert("resource_type", "image".to_string());
        noisy.insert("signature_algorithm", "sha256".to_string());
        noisy.insert("tags", String::new());

        let expected = "aab27bc58f8a29940bc45fad94e30a4aa0256ed40bdbbdaef168f6fa7fd25bb7";
        assert_eq!(signature(&signed, "s3cr3t"), expected);
        assert_eq!(signature(&noisy, "s3cr3t"), expected);
    }

    #[test]
    fn test_sign_upload_defaults_folder() {
        let signed = client().sign_upload_at(None, None, 1_700_000_000).unwrap();
        assert_eq!(signed.folder, "storefront");
        assert!(signed.public_id.is_none());
        assert_eq!(signed.signature_algorithm, "sha256");
        assert_eq!(
            signed.upload_url,
            "https://api.cloudinary.com/v1_1/tidepool/image/upload"
        );
        assert_eq!(
            signed.signature,
            "fccee7a90efe0f6a089f608b49d469770c3103de75c262e53a49d55559fea95d"
        );
    }

    #[test]
    fn test_sign_upload_with_public_id() {
        let signed = client()
            .sign_upload_at(Some("storefront"), Some("hero"), 1_700_000_000)
            .unwrap();
        assert_eq!(signed.public_id.as_deref(), Some("hero"));
        assert_eq!(
            signed.signature,
            "aab27bc58f8a29940bc45fad94e30a4aa0256ed40bdbbdaef168f6fa7fd25bb7"
        );
    }

    #[test]
    fn test_sign_upload_rejects_bad_paths() {
        let cdn = client();
        for bad in ["../etc", "/root", "has space", "a?b=c"] {
            let err = cdn.sign_upload(Some(bad), None).unwrap_err();
            assert!(err.is_client_error(), "{bad}");
        }
        assert!(cdn.sign_upload(None, Some("")).is_err());
    }

    #[test]
    fn test_delivery_url() {
        let cdn = client();
        assert_eq!(
            cdn.delivery_url("storefront/hero", None),
            "https://res.cloudinary.com/tidepool/image/upload/f_auto,q_auto/storefront/hero"
        );
        assert_eq!(
            cdn.delivery_url("hero", Some(800)),
            "https://res.cloudinary.com/tidepool/image/upload/f_auto,q_auto,w_800/hero"
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", client());
        assert!(!debug.contains("s3cr3t"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn test_upload_remote_rejects_non_http_url() {
        let err = client()
            .upload_remote("file:///etc/passwd", None)
            .await
            .unwrap_err();
        assert!(err.is_client_error());
    }
}
