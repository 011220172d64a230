//! Uploaded post images: validation and storage under the media root.

use std::path::Path;

use anyhow::{Context, Result};
use image::ImageFormat;
use rand::{distributions::Alphanumeric, Rng};

const UPLOAD_DIR: &str = "posts";
const FILE_STEM_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Gif,
    Png,
    Jpeg,
    Webp,
}

impl ImageKind {
    fn from_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Gif => Some(ImageKind::Gif),
            ImageFormat::Png => Some(ImageKind::Png),
            ImageFormat::Jpeg => Some(ImageKind::Jpeg),
            ImageFormat::WebP => Some(ImageKind::Webp),
            _ => None,
        }
    }

    /// Identifies an accepted image format and decodes the whole file.
    /// Unsupported formats and truncated or corrupt data give `None`.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        let format = image::guess_format(bytes).ok()?;
        let kind = Self::from_format(format)?;
        match image::load_from_memory_with_format(bytes, format) {
            Ok(_) => Some(kind),
            Err(e) => {
                tracing::debug!("Rejected {:?} upload: {}", format, e);
                None
            }
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Gif => "gif",
            ImageKind::Png => "png",
            ImageKind::Jpeg => "jpg",
            ImageKind::Webp => "webp",
        }
    }
}

fn random_file_name(kind: ImageKind) -> String {
    let stem: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(FILE_STEM_LEN)
        .map(char::from)
        .collect();
    format!("{}.{}", stem, kind.extension())
}

/// Writes the image under `<media_root>/posts/` and returns its path
/// relative to the media root.
pub async fn save_post_image(media_root: &Path, kind: ImageKind, bytes: &[u8]) -> Result<String> {
    let directory = media_root.join(UPLOAD_DIR);
    tokio::fs::create_dir_all(&directory)
        .await
        .with_context(|| format!("Failed to create {}", directory.display()))?;
    let file_name = random_file_name(kind);
    let path = directory.join(&file_name);
    tokio::fs::write(&path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::debug!("Stored image {}", path.display());
    Ok(format!("{}/{}", UPLOAD_DIR, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
    use std::io::Cursor;

    const SMALL_GIF: &[u8] = &[
        0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
        0x00, 0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00,
        0x00, 0x00, 0x02, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x0C, 0x0A, 0x00, 0x3B,
    ];

    fn encoded(format: ImageOutputFormat) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 2, Rgb([200, 40, 40])));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, format).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn detects_accepted_formats() {
        assert_eq!(ImageKind::detect(SMALL_GIF), Some(ImageKind::Gif));
        assert_eq!(
            ImageKind::detect(&encoded(ImageOutputFormat::Png)),
            Some(ImageKind::Png)
        );
        assert_eq!(
            ImageKind::detect(&encoded(ImageOutputFormat::Jpeg(90))),
            Some(ImageKind::Jpeg)
        );
    }

    #[test]
    fn rejects_non_images() {
        assert_eq!(ImageKind::detect(b"hello, world"), None);
        assert_eq!(ImageKind::detect(b""), None);
    }

    #[test]
    fn rejects_corrupt_body_behind_valid_header() {
        let mut corrupt = b"GIF89a".to_vec();
        corrupt.extend_from_slice(b"this is definitely not an image body");
        assert_eq!(ImageKind::detect(&corrupt), None);
        assert_eq!(ImageKind::detect(&SMALL_GIF[..20]), None);
    }

    #[test]
    fn rejects_unsupported_format() {
        assert_eq!(ImageKind::detect(&encoded(ImageOutputFormat::Bmp)), None);
    }

    #[tokio::test]
    async fn saves_under_posts_directory() {
        let root = std::env::temp_dir().join(format!("yatube-media-test-{}", std::process::id()));
        let relative = save_post_image(&root, ImageKind::Gif, SMALL_GIF)
            .await
            .unwrap();
        assert!(relative.starts_with("posts/"));
        assert!(relative.ends_with(".gif"));
        let stored = tokio::fs::read(root.join(&relative)).await.unwrap();
        assert_eq!(stored, SMALL_GIF);
        let _ = tokio::fs::remove_dir_all(&root).await;
    }
}
