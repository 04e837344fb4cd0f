//! Packaging files as relay attachments.
//!
//! Text files become `text` parts; images become `image_url` parts holding
//! either a remote URL or a `data:<mime>;base64,...` URI.

use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};

use omnix_core::{ContentPart, OmnixError, Result};
use omnix_media::{detect_mime_type, is_image, sniff_image_mime};

pub fn data_uri(mime_type: &str, data: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(data))
}

/// Split a base64 `data:` URI into its MIME type and decoded bytes.
pub fn parse_data_uri(uri: &str) -> Option<(String, Vec<u8>)> {
    let rest = uri.strip_prefix("data:")?;
    let (mime, payload) = rest.split_once(";base64,")?;
    let data = STANDARD.decode(payload).ok()?;
    Some((mime.to_string(), data))
}

/// A text file, prefixed with its name so the model can refer to it.
pub fn text_attachment(name: &str, contents: &str) -> ContentPart {
    ContentPart::text(format!("File: {name}\n\n{contents}"))
}

pub fn image_url_attachment(url: impl Into<String>) -> ContentPart {
    ContentPart::image_url(url)
}

/// Raw image bytes as a data URI part. The MIME type is sniffed when not given.
pub fn image_bytes_attachment(data: &[u8], mime_type: Option<&str>) -> Result<ContentPart> {
    let mime = mime_type
        .or_else(|| sniff_image_mime(data))
        .ok_or_else(|| OmnixError::validation("Unrecognized image format"))?;
    Ok(ContentPart::image_url(data_uri(mime, data)))
}

/// Read a file from disk and package it by type.
pub async fn load_attachment(path: &Path) -> Result<ContentPart> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| OmnixError::validation(format!("Cannot read {}: {e}", path.display())))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let mime = sniff_image_mime(&data).unwrap_or_else(|| detect_mime_type(path));
    if is_image(mime) {
        return image_bytes_attachment(&data, Some(mime));
    }

    let text = String::from_utf8(data)
        .map_err(|_| OmnixError::validation(format!("{name} is neither an image nor UTF-8 text")))?;
    Ok(text_attachment(&name, &text))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn image_bytes_become_data_uri() {
        let part = image_bytes_attachment(PNG, None).unwrap();
        let ContentPart::ImageUrl { image_url } = part else {
            panic!("expected image part");
        };
        assert!(image_url.url.starts_with("data:image/png;base64,"));
        let (mime, data) = parse_data_uri(&image_url.url).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(data, PNG);
    }

    #[test]
    fn unknown_bytes_need_explicit_mime() {
        assert!(image_bytes_attachment(b"plain", None).is_err());
        assert!(image_bytes_attachment(b"plain", Some("image/webp")).is_ok());
    }

    #[tokio::test]
    async fn text_file_is_named_text_part() {
        let path = std::env::temp_dir().join(format!("omnix-notes-{}.md", std::process::id()));
        tokio::fs::write(&path, "# Notes\nship it").await.unwrap();

        let part = load_attachment(&path).await.unwrap();
        let _ = tokio::fs::remove_file(&path).await;
        let ContentPart::Text { text } = part else {
            panic!("expected text part");
        };
        assert!(text.starts_with("File: omnix-notes-"));
        assert!(text.ends_with("# Notes\nship it"));
    }
}
