//! The boundary to the symbol encoder.
//!
//! Turning bytes into a module grid (mode selection, Reed-Solomon coding, masking) is not done
//! here. Any library that can honour the [`SymbolEncoder`] contract can be plugged in;
//! [`QrEncoder`] wraps the `qrcode` crate.

use log::debug;
use qrcode::bits::Bits;
use qrcode::{Color, EcLevel, QrCode, Version};

use crate::capacity::{CapacityTier, ErrorCorrectionLevel};
use crate::error::{Error, Result};

/// A grid of modules, `true` meaning dark, stored row by row.
///
/// The grid is not validated on construction: encoders are external code and the compositor
/// checks the shape before drawing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolMatrix {
    rows: Vec<Vec<bool>>,
}

impl SymbolMatrix {
    pub fn from_rows(rows: Vec<Vec<bool>>) -> Self {
        SymbolMatrix { rows }
    }

    /// Builds a square matrix from `side * side` modules in row-major order.
    pub fn from_modules(side: usize, modules: &[bool]) -> Self {
        let rows = if side == 0 {
            Vec::new()
        } else {
            modules.chunks(side).map(<[bool]>::to_vec).collect()
        };
        SymbolMatrix { rows }
    }

    /// Number of modules per side, taken from the row count.
    pub fn side(&self) -> usize {
        self.rows.len()
    }

    pub fn is_dark(&self, row: usize, column: usize) -> bool {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .copied()
            .unwrap_or(false)
    }

    pub fn rows(&self) -> &[Vec<bool>] {
        &self.rows
    }

    /// Checks that the grid is square and not empty.
    pub fn validate(&self) -> Result<()> {
        let side = self.rows.len();
        if side == 0 {
            return Err(Error::EncodingUnavailable("symbol matrix is empty".to_owned()));
        }
        if let Some((index, row)) = self.rows.iter().enumerate().find(|(_, r)| r.len() != side) {
            return Err(Error::EncodingUnavailable(format!(
                "symbol matrix is not square: row {} has {} modules, expected {}",
                index,
                row.len(),
                side
            )));
        }
        Ok(())
    }
}

/// Turns a byte payload into a module matrix.
///
/// `tier` is a suggestion. An implementation may pick a larger symbol; callers always read the
/// size back from the returned matrix.
pub trait SymbolEncoder {
    fn encode(
        &self,
        payload: &[u8],
        tier: CapacityTier,
        level: ErrorCorrectionLevel,
    ) -> Result<SymbolMatrix>;
}

impl<E: SymbolEncoder + ?Sized> SymbolEncoder for &E {
    fn encode(
        &self,
        payload: &[u8],
        tier: CapacityTier,
        level: ErrorCorrectionLevel,
    ) -> Result<SymbolMatrix> {
        (**self).encode(payload, tier, level)
    }
}

impl<E: SymbolEncoder + ?Sized> SymbolEncoder for Box<E> {
    fn encode(
        &self,
        payload: &[u8],
        tier: CapacityTier,
        level: ErrorCorrectionLevel,
    ) -> Result<SymbolMatrix> {
        (**self).encode(payload, tier, level)
    }
}

/// Encoder backed by the `qrcode` crate.
///
/// The payload is written as a single byte-mode segment with no ECI header, at exactly the
/// requested version.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrEncoder;

impl QrEncoder {
    pub fn new() -> Self {
        QrEncoder
    }
}

fn ec_level(level: ErrorCorrectionLevel) -> EcLevel {
    match level {
        ErrorCorrectionLevel::Low => EcLevel::L,
        ErrorCorrectionLevel::Medium => EcLevel::M,
        ErrorCorrectionLevel::Quartile => EcLevel::Q,
        ErrorCorrectionLevel::High => EcLevel::H,
    }
}

impl SymbolEncoder for QrEncoder {
    fn encode(
        &self,
        payload: &[u8],
        tier: CapacityTier,
        level: ErrorCorrectionLevel,
    ) -> Result<SymbolMatrix> {
        let ec = ec_level(level);
        let unavailable = |e: qrcode::types::QrError| {
            Error::EncodingUnavailable(format!(
                "{} bytes at version {} level {}: {}",
                payload.len(),
                tier,
                level,
                e
            ))
        };

        let mut bits = Bits::new(Version::Normal(i16::from(tier.value())));
        bits.push_byte_data(payload).map_err(unavailable)?;
        bits.push_terminator(ec).map_err(unavailable)?;
        let code = QrCode::with_bits(bits, ec).map_err(unavailable)?;

        let side = code.width();
        debug!("encoded {} bytes into a {}x{} symbol", payload.len(), side, side);

        let modules: Vec<bool> = code
            .to_colors()
            .into_iter()
            .map(|c| c == Color::Dark)
            .collect();
        Ok(SymbolMatrix::from_modules(side, &modules))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_hello_at_version_one() {
        let matrix = QrEncoder::new()
            .encode(b"HELLO", CapacityTier::MIN, ErrorCorrectionLevel::Medium)
            .unwrap();
        assert_eq!(matrix.side(), 21);
        assert!(matrix.validate().is_ok());
        // top-left finder pattern corner is dark, the separator next to it is light
        assert!(matrix.is_dark(0, 0));
        assert!(!matrix.is_dark(7, 7));
    }

    #[test]
    fn honours_a_larger_requested_tier() {
        let tier = CapacityTier::new(5).unwrap();
        let matrix = QrEncoder::new()
            .encode(b"HELLO", tier, ErrorCorrectionLevel::Low)
            .unwrap();
        assert_eq!(matrix.side(), 37);
    }

    #[test]
    fn rejects_payload_larger_than_version() {
        let err = QrEncoder::new()
            .encode(&[b'x'; 100], CapacityTier::MIN, ErrorCorrectionLevel::High)
            .unwrap_err();
        assert!(matches!(err, Error::EncodingUnavailable(_)));
    }

    #[test]
    fn validate_rejects_empty_and_ragged() {
        assert!(SymbolMatrix::from_rows(Vec::new()).validate().is_err());
        let ragged = SymbolMatrix::from_rows(vec![vec![true, false], vec![true]]);
        assert!(matches!(ragged.validate(), Err(Error::EncodingUnavailable(_))));
        let wide = SymbolMatrix::from_rows(vec![vec![true, false, true], vec![true, true, true]]);
        assert!(wide.validate().is_err());
    }

    #[test]
    fn from_modules_is_row_major() {
        let matrix = SymbolMatrix::from_modules(2, &[true, false, false, true]);
        assert!(matrix.is_dark(0, 0));
        assert!(!matrix.is_dark(0, 1));
        assert!(matrix.is_dark(1, 1));
        assert!(!matrix.is_dark(5, 5));
    }
}
