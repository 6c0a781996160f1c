//! Synthetic probe image used to check server reachability.

use std::io::Write;

use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use tempfile::NamedTempFile;

use crate::error::ClassificationError;

/// Name reported when the probe image cannot be produced.
const PROBE_NAME: &str = "knot-probe.jpg";

/// Encode a single opaque black pixel as a JPEG at full quality.
///
/// An encoder failure is reported as `FileUnavailable` for `knot-probe.jpg`
/// with the encoder's message as the reason. No user file is involved, so
/// callers should not take the variant's guidance literally here.
pub fn probe_jpeg() -> Result<Vec<u8>, ClassificationError> {
    let pixel = RgbImage::from_pixel(1, 1, Rgb([0, 0, 0]));
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, 100)
        .encode_image(&pixel)
        .map_err(encode_failure)?;
    Ok(bytes)
}

fn encode_failure(err: impl std::fmt::Display) -> ClassificationError {
    ClassificationError::FileUnavailable {
        path: PROBE_NAME.into(),
        reason: format!("could not encode the probe image: {err}"),
    }
}

/// Write the probe JPEG to a fresh temporary `.jpg` file.
///
/// The file is removed when the returned handle is dropped.
pub(crate) fn write_probe_file() -> Result<NamedTempFile, ClassificationError> {
    let temp_dir = std::env::temp_dir();
    let unavailable = |e: std::io::Error| ClassificationError::FileUnavailable {
        path: temp_dir.clone(),
        reason: e.to_string(),
    };

    let mut file = tempfile::Builder::new()
        .prefix("knot-probe-")
        .suffix(".jpg")
        .tempfile()
        .map_err(unavailable)?;
    file.write_all(&probe_jpeg()?).map_err(unavailable)?;
    file.flush().map_err(unavailable)?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_failure_names_the_probe() {
        let err = encode_failure("unsupported color type");
        assert_eq!(
            err,
            ClassificationError::FileUnavailable {
                path: PROBE_NAME.into(),
                reason: "could not encode the probe image: unsupported color type".to_string(),
            }
        );
        assert!(err.to_string().contains("knot-probe.jpg"));
    }

    #[test]
    fn probe_is_one_black_pixel() {
        let bytes = probe_jpeg().unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8], "JPEG SOI marker");

        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (1, 1));
        let [r, g, b] = decoded.get_pixel(0, 0).0;
        // JPEG is lossy; black stays within a couple of levels.
        assert!(r < 4 && g < 4 && b < 4, "{r} {g} {b}");
    }

    #[test]
    fn probe_file_is_removed_on_drop() {
        let file = write_probe_file().unwrap();
        let path = file.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(path.extension().unwrap(), "jpg");
        drop(file);
        assert!(!path.exists());
    }
}
