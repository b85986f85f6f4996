//! Multipart form reading for image and avatar uploads.

use std::collections::HashMap;

use actix_multipart::Multipart;
use futures_util::TryStreamExt;
use rg_services::MAX_UPLOAD_BYTES;

use crate::error::ApiError;

/// A file part of a multipart form.
#[derive(Debug, Default)]
pub struct FilePart {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Every part of a multipart form, split into files and text fields.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub files: HashMap<String, FilePart>,
    pub fields: HashMap<String, Vec<String>>,
}

impl UploadForm {
    pub fn take_file(&mut self, name: &str) -> Result<FilePart, ApiError> {
        self.files
            .remove(name)
            .ok_or_else(|| ApiError::validation(format!("missing file field '{name}'")))
    }

    pub fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).and_then(|v| v.first()).cloned()
    }

    pub fn all(&mut self, name: &str) -> Vec<String> {
        self.fields.remove(name).unwrap_or_default()
    }
}

fn bad_form(e: actix_multipart::MultipartError) -> ApiError {
    ApiError::validation(format!("invalid multipart form: {e}"))
}

/// Drains the payload. Parts with a filename are files, the rest are UTF-8 text.
pub async fn read_form(mut payload: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();
    while let Some(mut field) = payload.try_next().await.map_err(bad_form)? {
        let name = field.name().to_string();
        let file_name = field
            .content_disposition()
            .get_filename()
            .map(str::to_string);

        let mut data = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(bad_form)? {
            if data.len() + chunk.len() > MAX_UPLOAD_BYTES {
                return Err(ApiError::validation(format!(
                    "field '{name}' exceeds {MAX_UPLOAD_BYTES} bytes"
                )));
            }
            data.extend_from_slice(&chunk);
        }

        match file_name {
            Some(file_name) => {
                form.files.insert(name, FilePart { file_name, data });
            }
            None => {
                let text = String::from_utf8(data)
                    .map_err(|_| ApiError::validation(format!("field '{name}' is not UTF-8")))?;
                form.fields.entry(name).or_default().push(text);
            }
        }
    }
    Ok(form)
}
