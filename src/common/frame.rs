use chrono::{DateTime, Utc};
use image::{DynamicImage, RgbImage};
use std::borrow::Cow;
use std::sync::Arc;
use uuid::Uuid;

/// One screenshot of the device, cheap to clone.
#[derive(Clone)]
pub struct Frame {
    device_id: Uuid,
    image: Arc<DynamicImage>,
    captured_at: DateTime<Utc>,
    frame_id: Uuid,
}

impl Frame {
    pub fn new(
        device_id: Uuid,
        image: DynamicImage,
        captured_at: DateTime<Utc>,
        frame_id: Uuid,
    ) -> Self {
        Self {
            device_id,
            image: Arc::new(image),
            captured_at,
            frame_id,
        }
    }

    pub fn capture(device_id: Uuid, image: DynamicImage) -> Self {
        Self::new(device_id, image, Utc::now(), Uuid::new_v4())
    }

    pub fn device_id(&self) -> Uuid {
        self.device_id
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn frame_id(&self) -> Uuid {
        self.frame_id
    }

    /// RGB view of the image. Borrows when the device already captured RGB.
    pub fn rgb8(&self) -> Cow<'_, RgbImage> {
        match self.image.as_rgb8() {
            Some(rgb) => Cow::Borrowed(rgb),
            None => Cow::Owned(self.image.to_rgb8()),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("device_id", &self.device_id)
            .field("frame_id", &self.frame_id)
            .field("captured_at", &self.captured_at)
            .field("dimensions", &self.dimensions())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    #[test]
    fn cloning_frame_shares_image_buffer() {
        let img: DynamicImage = DynamicImage::ImageRgb8(
            ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(16, 16, Rgb([1, 2, 3])),
        );
        let f1 = Frame::new(Uuid::new_v4(), img, Utc::now(), Uuid::new_v4());
        let f2 = f1.clone();
        assert!(Arc::ptr_eq(&f1.image, &f2.image));
        assert_eq!(f1.frame_id(), f2.frame_id());
    }

    #[test]
    fn capture_assigns_fresh_frame_ids() {
        let device = Uuid::new_v4();
        let img = DynamicImage::new_rgb8(4, 4);
        let f1 = Frame::capture(device, img.clone());
        let f2 = Frame::capture(device, img);
        assert_eq!(f1.device_id(), f2.device_id());
        assert_ne!(f1.frame_id(), f2.frame_id());
        assert_eq!(f1.dimensions(), (4, 4));
    }

    #[test]
    fn rgb_view_borrows_rgb_captures() {
        let rgb = Frame::capture(Uuid::new_v4(), DynamicImage::new_rgb8(4, 4));
        assert!(matches!(rgb.rgb8(), Cow::Borrowed(_)));

        let rgba = Frame::capture(Uuid::new_v4(), DynamicImage::new_rgba8(4, 4));
        let converted = rgba.rgb8();
        assert!(matches!(converted, Cow::Owned(_)));
        assert_eq!(converted.dimensions(), (4, 4));
    }
}
