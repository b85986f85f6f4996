//! Cosmetic transformations: a transformed delivery URL plus a QR code pointing at it.

use std::sync::Arc;

use chrono::Utc;

use rg_core::access::EVERYONE;
use rg_core::{
    AppError, ImageRepo, ImageTransform, MediaStore, NewImageTransform, Principal, Result,
    TransformRepo, TransformSettings, Transformation,
};

#[derive(Clone)]
pub struct TransformService {
    transforms: Arc<dyn TransformRepo>,
    images: Arc<dyn ImageRepo>,
    media: Arc<dyn MediaStore>,
    folder: String,
}

fn check_settings(settings: &TransformSettings) -> Result<()> {
    for (name, value) in [("width", settings.width), ("height", settings.height)] {
        if value == Some(0) {
            return Err(AppError::validation(format!("{name} must be positive")));
        }
    }
    if let Some(angle) = settings.angle {
        if !(-360..=360).contains(&angle) {
            return Err(AppError::validation("angle must be within -360..=360"));
        }
    }
    // These end up verbatim in the delivery URL path.
    let words = [
        ("radius", &settings.radius),
        ("effect", &settings.effect),
        ("crop", &settings.crop),
        ("gravity", &settings.gravity),
        ("color_space", &settings.color_space),
    ];
    for (name, value) in words {
        if let Some(value) = value.as_deref() {
            if value.is_empty() || !value.chars().all(is_setting_char) {
                return Err(AppError::validation(format!(
                    "{name} may only contain letters, digits, ':', '_' and '-'"
                )));
            }
        }
    }
    Ok(())
}

fn is_setting_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ':' | '_' | '-')
}

impl TransformService {
    pub fn new(
        transforms: Arc<dyn TransformRepo>,
        images: Arc<dyn ImageRepo>,
        media: Arc<dyn MediaStore>,
        folder: &str,
    ) -> Self {
        Self {
            transforms,
            images,
            media,
            folder: folder.to_string(),
        }
    }

    /// Uploads the QR code before inserting the row; a failed insert leaves the upload behind.
    pub async fn create(
        &self,
        principal: &Principal,
        image_id: i64,
        settings: TransformSettings,
    ) -> Result<ImageTransform> {
        EVERYONE.check(principal.role)?;
        check_settings(&settings)?;
        let image = self
            .images
            .get_image(image_id)
            .await?
            .ok_or_else(|| AppError::not_found("Image", image_id))?;
        if image.user_id != principal.id {
            return Err(AppError::forbidden("not the owner of this image"));
        }

        let secure_url = self
            .media
            .get_url(&image.public_id, None, &Transformation::default());
        let transformed_url =
            self.media
                .get_url(&image.public_id, None, &Transformation::from(&settings));

        let qr_id = format!(
            "{}/qrcodes/{}_{}",
            self.folder,
            image.public_name,
            Utc::now().timestamp_millis()
        );
        let qr = self.media.save_qr_code(&transformed_url, &qr_id).await?;

        let transform = self
            .transforms
            .create_transform(NewImageTransform {
                image_id,
                user_id: principal.id,
                settings,
                secure_url,
                transformed_url,
                qrcode_url: qr.secure_url,
            })
            .await?;
        log::info!(
            "transformation {} created for image {} by {}",
            transform.id,
            image_id,
            principal.username
        );
        Ok(transform)
    }

    pub async fn get(&self, principal: &Principal, transform_id: i64) -> Result<ImageTransform> {
        EVERYONE.check(principal.role)?;
        let transform = self
            .transforms
            .get_transform(transform_id)
            .await?
            .ok_or_else(|| AppError::not_found("Transformation", transform_id))?;
        if transform.user_id != principal.id {
            return Err(AppError::forbidden("not the owner of this transformation"));
        }
        Ok(transform)
    }

    pub async fn list_mine(&self, principal: &Principal) -> Result<Vec<ImageTransform>> {
        EVERYONE.check(principal.role)?;
        self.transforms.list_for_user(principal.id).await
    }
}
