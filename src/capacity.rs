//! Symbol sizing.
//!
//! The encoder's exact bit count depends on mode switching and padding that is only known once
//! encoding has happened. To pick a symbol version up front, the raw byte length is inflated by a
//! fixed overhead factor and looked up in a capacity table.

use std::fmt;
use std::str::FromStr;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Error correction level of a symbol, from least to most redundant.
///
/// Each step up lowers the data capacity of every version and raises the share of the symbol
/// that can be damaged while staying readable (about 7%, 15%, 25% and 30%).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum ErrorCorrectionLevel {
    Low,
    #[default]
    Medium,
    Quartile,
    High,
}

impl ErrorCorrectionLevel {
    pub const ALL: [ErrorCorrectionLevel; 4] = [
        ErrorCorrectionLevel::Low,
        ErrorCorrectionLevel::Medium,
        ErrorCorrectionLevel::Quartile,
        ErrorCorrectionLevel::High,
    ];

    /// Single-letter code, as printed on the symbol's format information.
    pub fn code(self) -> char {
        match self {
            ErrorCorrectionLevel::Low => 'L',
            ErrorCorrectionLevel::Medium => 'M',
            ErrorCorrectionLevel::Quartile => 'Q',
            ErrorCorrectionLevel::High => 'H',
        }
    }

    fn column(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ErrorCorrectionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown error correction level '{0}': expected one of L, M, Q, H")]
pub struct ParseLevelError(String);

impl FromStr for ErrorCorrectionLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "l" | "low" => Ok(ErrorCorrectionLevel::Low),
            "m" | "medium" => Ok(ErrorCorrectionLevel::Medium),
            "q" | "quartile" => Ok(ErrorCorrectionLevel::Quartile),
            "h" | "high" => Ok(ErrorCorrectionLevel::High),
            _ => Err(ParseLevelError(s.to_owned())),
        }
    }
}

impl TryFrom<String> for ErrorCorrectionLevel {
    type Error = ParseLevelError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ErrorCorrectionLevel> for String {
    fn from(level: ErrorCorrectionLevel) -> Self {
        level.code().to_string()
    }
}

/// A symbol size class (a QR version number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CapacityTier(u8);

impl CapacityTier {
    pub const MIN: CapacityTier = CapacityTier(1);
    pub const MAX: CapacityTier = CapacityTier(40);

    /// Returns the tier for `version` if it appears in the capacity table.
    pub fn new(version: u8) -> Option<Self> {
        CAPACITY_TABLE
            .iter()
            .any(|&(v, _)| v == version)
            .then_some(CapacityTier(version))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Side length in modules of a symbol of this tier, excluding the quiet zone.
    pub fn side(self) -> usize {
        self.0 as usize * 4 + 17
    }

    /// Byte capacity of this tier at `level`.
    pub fn capacity(self, level: ErrorCorrectionLevel) -> usize {
        CAPACITY_TABLE
            .iter()
            .find(|&&(v, _)| v == self.0)
            .map(|(_, caps)| caps[level.column()])
            .unwrap_or(0)
    }

    /// All tiers of the table, smallest first.
    pub fn all() -> impl Iterator<Item = CapacityTier> {
        CAPACITY_TABLE.iter().map(|&(v, _)| CapacityTier(v))
    }
}

impl fmt::Display for CapacityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// [L, M, Q, H] byte capacities. Only these versions are candidates; 21-24, 26-29, 31-34 and
// 36-39 are skipped.
const CAPACITY_TABLE: [(u8, [usize; 4]); 24] = [
    (1, [17, 14, 11, 7]),
    (2, [32, 26, 20, 14]),
    (3, [53, 42, 32, 24]),
    (4, [78, 62, 46, 34]),
    (5, [106, 84, 60, 44]),
    (6, [134, 106, 74, 58]),
    (7, [154, 122, 86, 64]),
    (8, [192, 152, 108, 84]),
    (9, [230, 180, 130, 98]),
    (10, [271, 213, 151, 119]),
    (11, [321, 251, 177, 137]),
    (12, [367, 287, 203, 155]),
    (13, [425, 331, 241, 177]),
    (14, [458, 362, 258, 194]),
    (15, [520, 412, 292, 220]),
    (16, [586, 450, 322, 250]),
    (17, [644, 504, 364, 280]),
    (18, [718, 560, 394, 310]),
    (19, [792, 624, 442, 338]),
    (20, [858, 666, 482, 382]),
    (25, [1273, 977, 689, 545]),
    (30, [1852, 1425, 1009, 751]),
    (35, [2409, 1903, 1373, 1051]),
    (40, [2953, 2331, 1663, 1276]),
];

/// The bytes handed to the encoder: the UTF-8 encoding of sanitized text, nothing added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload(Vec<u8>);

impl Payload {
    pub fn from_text(text: &str) -> Self {
        Payload(text.as_bytes().to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Conservative encoded length: `ceil(byte_len * 1.8)`.
///
/// The 80% covers mode indicators, character counts, the terminator, padding and byte alignment.
pub fn estimated_encoded_len(byte_len: usize) -> usize {
    (byte_len * 9).div_ceil(5)
}

/// What to do when even the largest tier is too small for the estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Use the largest tier and let the encoder decide.
    #[default]
    Clamp,
    /// Fail with [`Error::CapacityExceeded`].
    Reject,
}

/// Picks the smallest tier that fits a payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapacityEstimator {
    policy: OverflowPolicy,
}

impl CapacityEstimator {
    pub fn new(policy: OverflowPolicy) -> Self {
        CapacityEstimator { policy }
    }

    /// Returns the first tier whose capacity at `level` is at least the estimated encoded length
    /// of `payload`. An empty payload selects the smallest tier.
    pub fn select_tier(&self, payload: &[u8], level: ErrorCorrectionLevel) -> Result<CapacityTier> {
        let estimated = estimated_encoded_len(payload.len());
        debug!(
            "sizing payload: {} bytes, {} estimated, level {}",
            payload.len(),
            estimated,
            level
        );

        if let Some(tier) = CapacityTier::all().find(|tier| tier.capacity(level) >= estimated) {
            debug!("selected tier {} (capacity {})", tier, tier.capacity(level));
            return Ok(tier);
        }

        match self.policy {
            OverflowPolicy::Clamp => {
                warn!(
                    "{} estimated bytes exceed every tier at level {}, trying tier {}",
                    estimated,
                    level,
                    CapacityTier::MAX
                );
                Ok(CapacityTier::MAX)
            }
            OverflowPolicy::Reject => Err(Error::CapacityExceeded { estimated, level }),
        }
    }
}
