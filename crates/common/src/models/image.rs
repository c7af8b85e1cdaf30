use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt;
use thiserror::Error;

pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("Invalid image data")]
    Empty,

    #[error("Invalid image format. Only JPEG, PNG, GIF, and WebP are allowed.")]
    UnsupportedFormat,

    #[error("Image too large. Maximum size is 10MB.")]
    TooLarge { estimated_bytes: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    WebP,
}

impl ImageFormat {
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::WebP => "image/webp",
        }
    }

    /// Accepts the subtype part of an `image/*` mime type.
    pub fn from_subtype(subtype: &str) -> Option<Self> {
        match subtype.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::from_subtype(ext.trim_start_matches('.'))
    }

    /// Detects the format from the leading magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [0xFF, 0xD8, 0xFF, ..] => Some(Self::Jpeg),
            [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some(Self::Png),
            [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => Some(Self::Gif),
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some(Self::WebP),
            _ => None,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// A chart screenshot encoded as a base64 `data:` URL, the form the analysis
/// function expects.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    data_url: String,
    format: ImageFormat,
}

impl ImagePayload {
    pub fn from_bytes(bytes: &[u8], format: ImageFormat) -> Result<Self, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }

        let data_url = format!("data:{};base64,{}", format.mime(), STANDARD.encode(bytes));
        Ok(Self { data_url, format })
    }

    /// Parses `data:image/<type>;base64,<data>`.
    pub fn from_data_url(data_url: impl Into<String>) -> Result<Self, ImageError> {
        let data_url = data_url.into();

        let (subtype, data) = data_url
            .strip_prefix("data:image/")
            .and_then(|rest| rest.split_once(";base64,"))
            .ok_or(ImageError::UnsupportedFormat)?;

        let format = ImageFormat::from_subtype(subtype).ok_or(ImageError::UnsupportedFormat)?;

        if data.trim().is_empty() {
            return Err(ImageError::Empty);
        }

        Ok(Self { data_url, format })
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Decoded size estimated from the encoded length, the same way the
    /// analysis function estimates it.
    pub fn estimated_size(&self) -> usize {
        self.data_url.len() * 3 / 4
    }

    pub fn validate(&self) -> Result<(), ImageError> {
        let estimated_bytes = self.estimated_size();
        if estimated_bytes > MAX_IMAGE_BYTES {
            return Err(ImageError::TooLarge { estimated_bytes });
        }
        Ok(())
    }
}

impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePayload")
            .field("format", &self.format)
            .field("encoded_len", &self.data_url.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_sniff_known_formats() {
        assert_eq!(ImageFormat::sniff(&PNG_HEADER), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::sniff(b"GIF89a...."), Some(ImageFormat::Gif));
        assert_eq!(ImageFormat::sniff(b"RIFF\x24\x00\x00\x00WEBPVP8 "), Some(ImageFormat::WebP));
        assert_eq!(ImageFormat::sniff(b"BM\x00\x00"), None);
    }

    #[test]
    fn test_from_bytes_builds_data_url() {
        let payload = ImagePayload::from_bytes(&PNG_HEADER, ImageFormat::Png).unwrap();
        assert!(payload.data_url().starts_with("data:image/png;base64,"));
        assert_eq!(payload.format(), ImageFormat::Png);
    }

    #[test]
    fn test_from_bytes_rejects_empty() {
        assert_eq!(
            ImagePayload::from_bytes(&[], ImageFormat::Png),
            Err(ImageError::Empty)
        );
    }

    #[test]
    fn test_from_data_url_accepts_jpg_alias() {
        let payload = ImagePayload::from_data_url("data:image/jpg;base64,/9j/4AAQ").unwrap();
        assert_eq!(payload.format(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_from_data_url_rejects_bmp_and_plain_text() {
        assert_eq!(
            ImagePayload::from_data_url("data:image/bmp;base64,Qk0="),
            Err(ImageError::UnsupportedFormat)
        );
        assert_eq!(
            ImagePayload::from_data_url("not a data url"),
            Err(ImageError::UnsupportedFormat)
        );
        assert_eq!(
            ImagePayload::from_data_url("data:image/png;base64,"),
            Err(ImageError::Empty)
        );
    }

    #[test]
    fn test_validate_rejects_oversized_payload() {
        let body = "A".repeat(14 * 1024 * 1024);
        let payload = ImagePayload::from_data_url(format!("data:image/png;base64,{body}")).unwrap();

        let err = payload.validate().unwrap_err();
        assert!(matches!(err, ImageError::TooLarge { .. }));
        assert!(err.to_string().contains("10MB"));
    }

    #[test]
    fn test_validate_accepts_small_payload() {
        let payload = ImagePayload::from_bytes(&PNG_HEADER, ImageFormat::Png).unwrap();
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn test_extension_lookup() {
        assert_eq!(ImageFormat::from_extension(".JPEG"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("webp"), Some(ImageFormat::WebP));
        assert_eq!(ImageFormat::from_extension("bmp"), None);
    }
}
