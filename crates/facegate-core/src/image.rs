//! Image format sniffing for uploaded captures and enrollment photos.
//!
//! Only the leading signature bytes are inspected. Pixel data is the
//! oracle's business.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
  Jpeg,
  Png,
  Gif,
  Bmp,
  WebP,
}

impl ImageFormat {
  /// Identify the format from the file signature, or `None` if the bytes are
  /// not a supported image.
  pub fn sniff(bytes: &[u8]) -> Option<Self> {
    match bytes {
      [0xFF, 0xD8, 0xFF, ..] => Some(Self::Jpeg),
      [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some(Self::Png),
      [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => Some(Self::Gif),
      [b'B', b'M', ..] if bytes.len() > 14 => Some(Self::Bmp),
      [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => {
        Some(Self::WebP)
      }
      _ => None,
    }
  }

  pub fn extension(self) -> &'static str {
    match self {
      Self::Jpeg => "jpg",
      Self::Png => "png",
      Self::Gif => "gif",
      Self::Bmp => "bmp",
      Self::WebP => "webp",
    }
  }

  pub fn media_type(self) -> &'static str {
    match self {
      Self::Jpeg => "image/jpeg",
      Self::Png => "image/png",
      Self::Gif => "image/gif",
      Self::Bmp => "image/bmp",
      Self::WebP => "image/webp",
    }
  }
}
