use crate::capacity::{
    estimated_encoded_len, CapacityEstimator, CapacityTier, ErrorCorrectionLevel, Payload,
};
use crate::compose::{check_canvas_size, compose};
use crate::config::{Config, DEFAULT_PREVIEW_SIZE};
use crate::encoder::{QrEncoder, SymbolEncoder};
use crate::error::{Error, Result};
use crate::icon::Icon;
use crate::sanitize::sanitize;
use crate::session::SessionState;

use image::{ImageFormat, RgbaImage};
use log::{debug, info, warn};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/*---- Pipeline ----*/

/// Diagnostics for one run of the pipeline. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationReport {
    pub chars: usize,
    pub bytes: usize,
    pub estimated: usize,
    pub level: ErrorCorrectionLevel,
    /// Tier handed to the encoder.
    pub requested_tier: CapacityTier,
    /// Side of the symbol the encoder actually returned.
    pub modules: usize,
}

impl GenerationReport {
    /// Whether the encoder chose a bigger symbol than the requested tier.
    pub fn enlarged(&self) -> bool {
        self.modules > self.requested_tier.side()
    }
}

/// A rendered preview together with how it was sized.
#[derive(Debug, Clone)]
pub struct Generated {
    pub image: RgbaImage,
    pub report: GenerationReport,
}

/// An exported PNG, ready to be handed to whatever delivers it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub size: u32,
    pub filename: String,
    pub png: Vec<u8>,
}

/// Drives sanitize → size → encode → compose and owns the session.
///
/// Generation always renders at the preview size and records its input on success. Export
/// replays the recorded input at any size, with whatever icon is current at that moment.
///
/// # Example
///
/// ```
/// use qrstamp::capacity::ErrorCorrectionLevel;
/// use qrstamp::helper::Studio;
///
/// let mut studio = Studio::new();
/// let preview = studio.generate("Hello, World!", ErrorCorrectionLevel::Medium).unwrap();
/// assert_eq!(preview.image.dimensions(), (400, 400));
///
/// let export = studio.export(1000).unwrap();
/// assert_eq!(export.filename, "qrcode-1000x1000.png");
/// ```
pub struct Studio<E = QrEncoder> {
    encoder: E,
    estimator: CapacityEstimator,
    session: SessionState,
    preview_size: u32,
}

impl Studio<QrEncoder> {
    pub fn new() -> Self {
        Studio::with_encoder(QrEncoder::new())
    }

    pub fn from_config(config: &Config) -> Self {
        Studio::with_encoder(QrEncoder::new())
            .estimator(CapacityEstimator::new(config.overflow))
            .preview_size(config.preview_size)
    }
}

impl Default for Studio<QrEncoder> {
    fn default() -> Self {
        Studio::new()
    }
}

impl<E: SymbolEncoder> Studio<E> {
    pub fn with_encoder(encoder: E) -> Self {
        Studio {
            encoder,
            estimator: CapacityEstimator::default(),
            session: SessionState::new(),
            preview_size: DEFAULT_PREVIEW_SIZE,
        }
    }

    pub fn estimator(mut self, estimator: CapacityEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn preview_size(mut self, size: u32) -> Self {
        self.preview_size = size;
        self
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Replaces the icon used by later generations and exports; `None` removes it.
    pub fn set_icon(&mut self, icon: Option<Arc<Icon>>) {
        self.session.set_icon(icon);
    }

    /// Cleans `raw`, renders a preview and records the input for later exports.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyInput`] when nothing is left after trimming and cleaning, otherwise any
    /// sizing, encoding or compositing error. The session is untouched on failure.
    pub fn generate(&mut self, raw: &str, level: ErrorCorrectionLevel) -> Result<Generated> {
        let text = sanitize(raw.trim());
        if text.is_empty() {
            return Err(Error::EmptyInput);
        }

        let icon = self.session.icon();
        let generated = self.render(&text, level, self.preview_size, icon.as_deref())?;
        info!(
            "generated {}x{} preview, version {} at level {}",
            self.preview_size, self.preview_size, generated.report.requested_tier, level
        );
        self.session.record(text, level);
        Ok(generated)
    }

    /// Re-renders the last generated text at `size` × `size` and encodes it as PNG.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidSize`] for a zero size or one above the canvas limit,
    /// [`Error::NoActiveSession`] before the first successful generation.
    pub fn export(&self, size: u32) -> Result<Export> {
        check_canvas_size(size)?;
        let current = self.session.require_payload()?;
        let icon = self.session.icon();
        let generated = self.render(&current.text, current.level, size, icon.as_deref())?;
        let png = encode_png(&generated.image)?;
        info!("exported {}x{} PNG ({} bytes)", size, size, png.len());
        Ok(Export {
            size,
            filename: export_filename(size),
            png,
        })
    }

    fn render(
        &self,
        text: &str,
        level: ErrorCorrectionLevel,
        size: u32,
        icon: Option<&Icon>,
    ) -> Result<Generated> {
        let payload = Payload::from_text(text);
        let tier = self.estimator.select_tier(payload.as_bytes(), level)?;
        let matrix = self.encoder.encode(payload.as_bytes(), tier, level)?;
        let image = compose(&matrix, size, icon)?;

        let report = GenerationReport {
            chars: text.chars().count(),
            bytes: payload.len(),
            estimated: estimated_encoded_len(payload.len()),
            level,
            requested_tier: tier,
            modules: matrix.side(),
        };
        if report.enlarged() {
            warn!(
                "encoder returned {} modules per side, version {} has {}",
                report.modules,
                tier,
                tier.side()
            );
        }
        debug!("{:?}", report);
        Ok(Generated { image, report })
    }
}

/*---- Export sink ----*/

/// Suggested download name for an export of the given size.
pub fn export_filename(size: u32) -> String {
    format!("qrcode-{0}x{0}.png", size)
}

/// Encodes a composed bitmap as a PNG byte stream.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

impl Export {
    /// Writes the PNG into `directory` under its suggested name and returns the full path.
    /// The directory is created if it doesn't exist.
    pub fn save_to<P: AsRef<Path>>(&self, directory: P) -> Result<PathBuf> {
        let directory = directory.as_ref();
        if !directory.exists() {
            fs::create_dir_all(directory).map_err(|source| Error::Io {
                path: directory.to_path_buf(),
                source,
            })?;
        }

        let file_path = directory.join(&self.filename);
        fs::write(&file_path, &self.png).map_err(|source| Error::Io {
            path: file_path.clone(),
            source,
        })?;
        Ok(file_path)
    }
}

// Tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::capacity::OverflowPolicy;
    use image::Rgba;

    #[test]
    fn test_export_filename() {
        assert_eq!(export_filename(1000), "qrcode-1000x1000.png");
    }

    #[test]
    fn test_encode_png_signature() {
        let img = RgbaImage::from_pixel(3, 3, Rgba([255, 255, 255, 255]));
        let png = encode_png(&img).unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn test_generate_preview() {
        let mut studio = Studio::new();
        let generated = studio.generate("  HELLO \n", ErrorCorrectionLevel::Medium).unwrap();

        assert_eq!(generated.image.dimensions(), (400, 400));
        assert_eq!(generated.report.bytes, 5);
        assert_eq!(generated.report.estimated, 9);
        assert_eq!(generated.report.requested_tier.value(), 1);
        assert_eq!(generated.report.modules, 21);

        let current = studio.session().current_payload().unwrap();
        assert_eq!(current.text, "HELLO");
    }

    #[test]
    fn test_empty_input_leaves_session() {
        let mut studio = Studio::new();
        studio.generate("first", ErrorCorrectionLevel::Low).unwrap();

        let err = studio.generate(" \u{FEFF}\u{200B} ", ErrorCorrectionLevel::High).unwrap_err();
        assert!(matches!(err, Error::EmptyInput));
        assert_eq!(studio.session().current_payload().unwrap().text, "first");
    }

    #[test]
    fn test_export_before_generate() {
        let studio = Studio::new();
        assert!(matches!(studio.export(1000), Err(Error::NoActiveSession)));
    }

    #[test]
    fn test_export_huge_size_is_rejected() {
        let mut studio = Studio::new();
        studio.generate("HELLO", ErrorCorrectionLevel::Medium).unwrap();

        assert!(matches!(studio.export(u32::MAX), Err(Error::InvalidSize(u32::MAX))));
        assert!(matches!(studio.export(60_000), Err(Error::InvalidSize(60_000))));
        assert_eq!(studio.session().current_payload().unwrap().text, "HELLO");
        assert!(studio.export(64).is_ok());
    }

    #[test]
    fn test_report_flags_enlarged_symbol() {
        let mut studio = Studio::new();
        let generated = studio.generate("HELLO", ErrorCorrectionLevel::Medium).unwrap();
        assert!(!generated.report.enlarged());

        let report = GenerationReport {
            modules: 29,
            ..generated.report
        };
        assert!(report.enlarged());
    }

    #[test]
    fn test_export_zero_size() {
        let mut studio = Studio::new();
        studio.generate("x", ErrorCorrectionLevel::Low).unwrap();
        assert!(matches!(studio.export(0), Err(Error::InvalidSize(0))));
    }

    #[test]
    fn test_export_decodes_back_to_size() {
        let mut studio = Studio::new();
        studio.generate("https://example.com", ErrorCorrectionLevel::Quartile).unwrap();
        let export = studio.export(250).unwrap();
        let decoded = image::load_from_memory(&export.png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (250, 250));
    }

    #[test]
    fn test_reject_policy_leaves_session() {
        let mut studio = Studio::new().estimator(CapacityEstimator::new(OverflowPolicy::Reject));
        studio.generate("short", ErrorCorrectionLevel::Medium).unwrap();

        let long = "x".repeat(1000);
        let err = studio.generate(&long, ErrorCorrectionLevel::High).unwrap_err();
        assert!(matches!(err, Error::CapacityExceeded { .. }));
        assert_eq!(studio.session().current_payload().unwrap().text, "short");
    }

    #[test]
    fn test_clamp_policy_surfaces_encoder_refusal() {
        let mut studio = Studio::new();
        let long = "x".repeat(3000);
        let err = studio.generate(&long, ErrorCorrectionLevel::Low).unwrap_err();
        assert!(matches!(err, Error::EncodingUnavailable(_)));
        assert!(studio.session().current_payload().is_none());
    }

    #[test]
    fn test_save_to_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("out");
        let export = Export {
            size: 2,
            filename: export_filename(2),
            png: vec![1, 2, 3],
        };
        let path = export.save_to(&target).unwrap();
        assert_eq!(path, target.join("qrcode-2x2.png"));
        assert_eq!(fs::read(path).unwrap(), vec![1, 2, 3]);
    }
}
