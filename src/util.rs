//! Byte-level helpers: image header probing and text decoding.

use std::borrow::Cow;
use std::path::Path;

use tracing::warn;

// ============================================================================
// Text Decoding
// ============================================================================

/// Decode a chapter file as UTF-8, dropping a leading BOM.
///
/// Malformed sequences are replaced with U+FFFD and reported once.
pub fn decode_utf8<'a>(bytes: &'a [u8], path: &Path) -> Cow<'a, str> {
    let (text, malformed) = encoding_rs::UTF_8.decode_with_bom_removal(bytes);
    if malformed {
        warn!(file = %path.display(), "malformed UTF-8 replaced");
    }
    text
}

// ============================================================================
// Image Probing
// ============================================================================

/// Dimensions and media type read from an image's own header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub media_type: &'static str,
}

/// Probe PNG, JPEG, GIF or WebP data by its magic bytes.
///
/// Returns `None` for unrecognized or truncated headers. The file extension
/// is never consulted.
pub fn probe_image(data: &[u8]) -> Option<ImageInfo> {
    let info = |(width, height), media_type| ImageInfo {
        width,
        height,
        media_type,
    };

    // PNG: width/height at bytes 16-23 in IHDR chunk
    if data.len() >= 24 && data.starts_with(&[0x89, b'P', b'N', b'G']) {
        let width = u32::from_be_bytes([data[16], data[17], data[18], data[19]]);
        let height = u32::from_be_bytes([data[20], data[21], data[22], data[23]]);
        return Some(info((width, height), "image/png"));
    }

    if data.starts_with(&[0xFF, 0xD8]) {
        return extract_jpeg_dimensions(data).map(|dims| info(dims, "image/jpeg"));
    }

    // GIF: logical screen size at bytes 6-9 (little-endian)
    if data.len() >= 10 && data.starts_with(b"GIF") {
        let width = u16::from_le_bytes([data[6], data[7]]) as u32;
        let height = u16::from_le_bytes([data[8], data[9]]) as u32;
        return Some(info((width, height), "image/gif"));
    }

    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return extract_webp_dimensions(data).map(|dims| info(dims, "image/webp"));
    }

    None
}

/// Extract dimensions from JPEG data by parsing SOF markers.
fn extract_jpeg_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    let mut i = 2;
    while i + 4 < data.len() {
        if data[i] != 0xFF {
            i += 1;
            continue;
        }

        let marker = data[i + 1];

        // SOF markers (Start of Frame) - various encoding types
        if matches!(
            marker,
            0xC0 | 0xC1
                | 0xC2
                | 0xC3
                | 0xC5
                | 0xC6
                | 0xC7
                | 0xC9
                | 0xCA
                | 0xCB
                | 0xCD
                | 0xCE
                | 0xCF
        ) && i + 9 < data.len()
        {
            let height = u16::from_be_bytes([data[i + 5], data[i + 6]]) as u32;
            let width = u16::from_be_bytes([data[i + 7], data[i + 8]]) as u32;
            return Some((width, height));
        }

        let length = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        i += 2 + length;
    }
    None
}

/// Extract dimensions from the first chunk of a WebP container.
fn extract_webp_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    let chunk = data.get(12..16)?;
    match chunk {
        // Lossy: 14-bit sizes after the key frame start code
        b"VP8 " => {
            let b = data.get(26..30)?;
            let width = u16::from_le_bytes([b[0], b[1]]) & 0x3FFF;
            let height = u16::from_le_bytes([b[2], b[3]]) & 0x3FFF;
            Some((width as u32, height as u32))
        }
        // Lossless: 14-bit (size - 1) fields packed after the 0x2F signature
        b"VP8L" => {
            let b = data.get(21..25)?;
            let width = 1 + (((b[1] as u32 & 0x3F) << 8) | b[0] as u32);
            let height =
                1 + (((b[3] as u32 & 0x0F) << 10) | ((b[2] as u32) << 2) | ((b[1] as u32) >> 6));
            Some((width, height))
        }
        // Extended: 24-bit (size - 1) canvas fields
        b"VP8X" => {
            let b = data.get(24..30)?;
            let width = 1 + u32::from_le_bytes([b[0], b[1], b[2], 0]);
            let height = 1 + u32::from_le_bytes([b[3], b[4], b[5], 0]);
            Some((width, height))
        }
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A PNG signature plus IHDR with the given size; enough for probing.
    pub(crate) fn png_header(width: u32, height: u32) -> Vec<u8> {
        let mut data = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        data.extend_from_slice(&13u32.to_be_bytes());
        data.extend_from_slice(b"IHDR");
        data.extend_from_slice(&width.to_be_bytes());
        data.extend_from_slice(&height.to_be_bytes());
        data.extend_from_slice(&[8, 6, 0, 0, 0]);
        data
    }

    #[test]
    fn test_probe_png() {
        let info = probe_image(&png_header(640, 480)).unwrap();
        assert_eq!((info.width, info.height), (640, 480));
        assert_eq!(info.media_type, "image/png");
    }

    #[test]
    fn test_probe_jpeg() {
        let mut data = vec![0xFF, 0xD8];
        // APP0 segment of length 16
        data.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x10]);
        data.extend_from_slice(&[0u8; 14]);
        // SOF0: length, precision, height=300, width=200
        data.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08, 0x01, 0x2C, 0x00, 0xC8, 0x03]);
        let info = probe_image(&data).unwrap();
        assert_eq!((info.width, info.height), (200, 300));
        assert_eq!(info.media_type, "image/jpeg");
    }

    #[test]
    fn test_probe_gif() {
        let mut data = b"GIF89a".to_vec();
        data.extend_from_slice(&[0x20, 0x00, 0x10, 0x00]);
        let info = probe_image(&data).unwrap();
        assert_eq!((info.width, info.height), (32, 16));
        assert_eq!(info.media_type, "image/gif");
    }

    #[test]
    fn test_probe_webp_extended() {
        let mut data = b"RIFF\0\0\0\0WEBPVP8X".to_vec();
        data.extend_from_slice(&[0u8; 8]);
        // canvas 100x50, stored minus one
        data.extend_from_slice(&[99, 0, 0, 49, 0, 0]);
        let info = probe_image(&data).unwrap();
        assert_eq!((info.width, info.height), (100, 50));
        assert_eq!(info.media_type, "image/webp");
    }

    #[test]
    fn test_probe_rejects_unknown() {
        assert_eq!(probe_image(b"not an image at all, really"), None);
        assert_eq!(probe_image(&[0x89, b'P', b'N', b'G']), None);
    }

    #[test]
    fn test_decode_strips_bom() {
        let bytes = b"\xEF\xBB\xBFhello";
        assert_eq!(decode_utf8(bytes, Path::new("x.txt")), "hello");
    }
}
