//! Uploaded post images.
//!
//! Files are content-addressed: the stored name is the SHA-256 of the bytes,
//! so re-uploading the same picture reuses one file.

use std::path::Path;

use imagesize::ImageType;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Directory under the media root that holds post images.
pub const POSTS_DIR: &str = "posts";

/// File extension for `bytes` if they are a well-formed image of a format
/// browsers can display, `None` otherwise.
pub fn image_extension(bytes: &[u8]) -> Option<&'static str> {
  let ext = match imagesize::image_type(bytes).ok()? {
    ImageType::Png => "png",
    ImageType::Jpeg => "jpg",
    ImageType::Gif => "gif",
    ImageType::Webp => "webp",
    ImageType::Bmp => "bmp",
    _ => return None,
  };
  let size = imagesize::blob_size(bytes).ok()?;
  (size.width > 0 && size.height > 0).then_some(ext)
}

/// Write an image below `media_dir` and return its path relative to it.
pub async fn save_image(
  media_dir: &Path,
  bytes: &[u8],
  ext: &str,
) -> std::io::Result<String> {
  let digest = hex::encode(Sha256::digest(bytes));
  let relative = format!("{POSTS_DIR}/{digest}.{ext}");
  tokio::fs::create_dir_all(media_dir.join(POSTS_DIR)).await?;
  tokio::fs::write(media_dir.join(&relative), bytes).await?;
  debug!(path = %relative, size = bytes.len(), "image stored");
  Ok(relative)
}

#[cfg(test)]
pub(crate) const SMALL_GIF: &[u8] = &[
  0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x01, 0x00, 0x80, 0x00,
  0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0x21, 0xf9, 0x04, 0x00, 0x00,
  0x00, 0x00, 0x00, 0x2c, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x01, 0x00,
  0x00, 0x02, 0x02, 0x0c, 0x0a, 0x00, 0x3b,
];

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn recognises_gif() {
    assert_eq!(image_extension(SMALL_GIF), Some("gif"));
  }

  #[test]
  fn rejects_text_and_truncated_images() {
    assert_eq!(image_extension(b"just some text, not an image"), None);
    assert_eq!(image_extension(&SMALL_GIF[..4]), None);
    assert_eq!(image_extension(b""), None);
  }

  #[tokio::test]
  async fn saved_name_is_content_hash() {
    let dir = std::env::temp_dir().join(format!("yatube-media-{}", std::process::id()));
    let relative = save_image(&dir, SMALL_GIF, "gif").await.unwrap();

    let digest = hex::encode(Sha256::digest(SMALL_GIF));
    assert_eq!(relative, format!("posts/{digest}.gif"));
    assert_eq!(std::fs::read(dir.join(&relative)).unwrap(), SMALL_GIF);

    std::fs::remove_dir_all(&dir).ok();
  }
}
