//! Multipart form handling shared by the photo routes.

use std::collections::HashMap;

use axum::extract::multipart::{Multipart, MultipartError};

use crate::api::error::ApiError;
use crate::upstream::plantnet::ImageUpload;

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        ApiError::bad_request(e.body_text())
    }
}

/// A parsed photo form: the `image` file plus any text fields.
#[derive(Debug, Default)]
pub struct PhotoForm {
    pub image: Option<ImageUpload>,
    pub fields: HashMap<String, String>,
}

impl PhotoForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    /// The uploaded image, or a 400 when the form had none.
    pub fn require_image(&mut self) -> Result<ImageUpload, ApiError> {
        self.image
            .take()
            .ok_or_else(|| ApiError::bad_request("Image file is required"))
    }
}

/// Drain `multipart`, keeping the first `image` file and every text field.
/// Images larger than `max_image_bytes` are rejected.
pub async fn read_photo_form(
    mut multipart: Multipart,
    max_image_bytes: usize,
) -> Result<PhotoForm, ApiError> {
    let mut form = PhotoForm::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        if name == "image" {
            let file_name = field.file_name().unwrap_or("plant.jpg").to_owned();
            let mime_type = field.content_type().unwrap_or("image/jpeg").to_owned();
            let bytes = field.bytes().await?;
            if bytes.is_empty() {
                continue;
            }
            if bytes.len() > max_image_bytes {
                return Err(ApiError::bad_request(format!(
                    "Image too large (max {} MB)",
                    max_image_bytes / (1024 * 1024)
                )));
            }
            if form.image.is_none() {
                form.image = Some(ImageUpload {
                    bytes: bytes.to_vec(),
                    file_name,
                    mime_type,
                });
            }
        } else {
            let text = field.text().await?;
            form.fields.entry(name).or_insert(text);
        }
    }

    Ok(form)
}
