//! Decoded logo images.
//!
//! Decoding a user-selected file can be slow for large photos, so it may run in the background.
//! [`IconLoader::spawn`] hands back a [`PendingIcon`] that completes exactly once; there is no
//! retry and no way to cancel it.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use image::{DynamicImage, RgbaImage};
use log::debug;

use crate::error::{Error, Result};

/// A decoded icon, converted to RGBA once on load.
///
/// Only its pixel data and dimensions are used: the compositor stretches it to a square and clips
/// it to a circle.
#[derive(Debug, Clone, PartialEq)]
pub struct Icon {
    image: RgbaImage,
}

impl Icon {
    pub fn from_image(image: DynamicImage) -> Self {
        Icon {
            image: image.into_rgba8(),
        }
    }

    /// Decodes an icon from an in-memory file, guessing the format from its contents.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes)?;
        Ok(Icon::from_image(image))
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let icon = Icon::from_bytes(&bytes)?;
        debug!(
            "loaded icon {} ({}x{})",
            path.display(),
            icon.width(),
            icon.height()
        );
        Ok(icon)
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Starts background icon decoding.
pub struct IconLoader;

impl IconLoader {
    pub fn spawn<P: Into<PathBuf>>(path: P) -> PendingIcon {
        let path = path.into();
        let handle = thread::spawn(move || Icon::open(path).map(Arc::new));
        PendingIcon { handle }
    }
}

/// An icon that is still being decoded.
pub struct PendingIcon {
    handle: JoinHandle<Result<Arc<Icon>>>,
}

impl PendingIcon {
    /// Blocks until decoding finishes.
    pub fn wait(self) -> Result<Arc<Icon>> {
        self.handle.join().map_err(|_| Error::IconLoadInterrupted)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(image)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn decodes_png_bytes() {
        let icon = Icon::from_bytes(&png_bytes(12, 7)).unwrap();
        assert_eq!((icon.width(), icon.height()), (12, 7));
        assert_eq!(*icon.image().get_pixel(0, 0), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn garbage_is_an_image_error() {
        assert!(matches!(Icon::from_bytes(b"not an image"), Err(Error::Image(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Icon::open("does/not/exist.png").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn background_load_completes_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        std::fs::write(&path, png_bytes(5, 5)).unwrap();

        let icon = IconLoader::spawn(&path).wait().unwrap();
        assert_eq!(icon.width(), 5);
    }

    #[test]
    fn background_load_reports_failure() {
        let pending = IconLoader::spawn("does/not/exist.png");
        assert!(pending.wait().is_err());
    }
}
