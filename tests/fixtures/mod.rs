//! Sample uploads for integration tests
#![allow(dead_code)]

/// PNG signature followed by the start of an IHDR chunk.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR\x00\x00\x00\x01\x00\x00\x00\x01\x08\x06\x00\x00\x00";

/// JPEG SOI + JFIF APP0 marker.
pub const JPEG_BYTES: &[u8] = b"\xff\xd8\xff\xe0\x00\x10JFIF\x00\x01\x01\x00\x00\x01\x00\x01\x00\x00";

pub const NOT_AN_IMAGE: &[u8] = b"definitely not an image";

/// Prompt the built-in catalog falls back to.
pub const DEFAULT_PROMPT: &str =
    "Do a GTAV Loading screen art style version of this image. Keep all original Features.\n";
