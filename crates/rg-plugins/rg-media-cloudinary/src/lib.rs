//! # rg-media-cloudinary
//!
//! Cloudinary implementation of `MediaStore`.
//! Uploads go through the signed upload API; delivery URLs are built locally
//! from the public id, the asset version and a transformation chain.

use std::io::Cursor;

use async_trait::async_trait;
use chrono::Utc;
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;
use rg_core::traits::{MediaStore, StoredMedia, Transformation};
use serde::Deserialize;
use sha1::{Digest, Sha1};

const API_BASE: &str = "https://api.cloudinary.com/v1_1";
const DELIVERY_BASE: &str = "https://res.cloudinary.com";

/// Smallest edge of a rendered QR code, in pixels.
const QR_MIN_SIZE: u32 = 256;

pub struct CloudinaryStore {
    http: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    version: u64,
    secure_url: String,
}

impl CloudinaryStore {
    pub fn new(cloud_name: &str, api_key: &str, api_secret: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            cloud_name: cloud_name.to_string(),
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
        }
    }

    /// SHA-1 request signature: the signed parameters sorted by name,
    /// joined as a query string, with the API secret appended.
    fn sign(&self, params: &[(&str, String)]) -> String {
        let mut sorted: Vec<_> = params.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        let joined = sorted
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        let mut hasher = Sha1::new();
        hasher.update(joined.as_bytes());
        hasher.update(self.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Renders a transformation as a Cloudinary chain, e.g. `a_90,c_fill,h_250,w_250`.
/// Parameters appear in alphabetical order of their short names.
pub fn transformation_chain(t: &Transformation) -> String {
    let params: [(&str, Option<String>); 8] = [
        ("a", t.angle.map(|v| v.to_string())),
        ("c", t.crop.clone()),
        ("cs", t.color_space.clone()),
        ("e", t.effect.clone()),
        ("g", t.gravity.clone()),
        ("h", t.height.map(|v| v.to_string())),
        ("r", t.radius.clone()),
        ("w", t.width.map(|v| v.to_string())),
    ];
    params
        .into_iter()
        .filter_map(|(key, value)| value.filter(|v| !v.is_empty()).map(|v| format!("{key}_{v}")))
        .collect::<Vec<_>>()
        .join(",")
}

/// Encodes `payload` as a QR code and returns it as PNG bytes.
pub fn render_qr_png(payload: &str) -> anyhow::Result<Vec<u8>> {
    let code = QrCode::new(payload.as_bytes())?;
    let pixels = code
        .render::<Luma<u8>>()
        .min_dimensions(QR_MIN_SIZE, QR_MIN_SIZE)
        .build();
    let mut png = Vec::new();
    DynamicImage::ImageLuma8(pixels).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}

#[async_trait]
impl MediaStore for CloudinaryStore {
    async fn save_upload(&self, data: Vec<u8>, public_id: &str) -> anyhow::Result<StoredMedia> {
        let timestamp = Utc::now().timestamp().to_string();
        let signed = [
            ("overwrite", "true".to_string()),
            ("public_id", public_id.to_string()),
            ("timestamp", timestamp.clone()),
        ];
        let signature = self.sign(&signed);

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(data).file_name("upload"),
            )
            .text("api_key", self.api_key.clone())
            .text("overwrite", "true")
            .text("public_id", public_id.to_string())
            .text("timestamp", timestamp)
            .text("signature", signature);

        let url = format!("{API_BASE}/{}/image/upload", self.cloud_name);
        let response = self.http.post(&url).multipart(form).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("upload of {public_id} failed with {status}: {body}");
        }
        let uploaded: UploadResponse = response.json().await?;
        log::info!("uploaded {} (v{})", uploaded.public_id, uploaded.version);

        Ok(StoredMedia {
            public_id: uploaded.public_id,
            version: Some(uploaded.version.to_string()),
            secure_url: uploaded.secure_url,
        })
    }

    async fn save_qr_code(&self, payload: &str, public_id: &str) -> anyhow::Result<StoredMedia> {
        let png = render_qr_png(payload)?;
        self.save_upload(png, public_id).await
    }

    fn get_url(&self, public_id: &str, version: Option<String>, transformation: &Transformation) -> String {
        let mut url = format!("{DELIVERY_BASE}/{}/image/upload/", self.cloud_name);
        let chain = transformation_chain(transformation);
        if !chain.is_empty() {
            url.push_str(&chain);
            url.push('/');
        }
        if let Some(v) = version {
            url.push_str(&format!("v{v}/"));
        }
        url.push_str(public_id);
        url
    }
}
