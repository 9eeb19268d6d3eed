//! Input data-type classification.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The class of input corpus a search run is tuned against.
///
/// The single-letter token appears in filenames and failure keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DataType {
    Sequence,
    Natural,
    Combined,
    Random,
    UserData,
}

impl DataType {
    /// The four types swept by Smart Munge, in sweep order.
    pub const SMART_MUNGE_ORDER: [Self; 4] =
        [Self::Sequence, Self::Natural, Self::Combined, Self::Random];

    /// Single-letter token used in filenames and failure keys.
    #[must_use]
    pub fn token(self) -> char {
        match self {
            Self::Sequence => 'S',
            Self::Natural => 'N',
            Self::Combined => 'C',
            Self::Random => 'R',
            Self::UserData => 'U',
        }
    }

    /// Preferred global-rounds value when a profile does not pin one.
    ///
    /// Low-entropy corpora need more whole-sequence applications before the
    /// statistics settle; random input needs fewer.
    #[must_use]
    pub fn preferred_global_rounds(self) -> u32 {
        match self {
            Self::Sequence | Self::Natural => 6,
            Self::Combined | Self::UserData => 4,
            Self::Random => 3,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "S" | "Sequence" => Ok(Self::Sequence),
            "N" | "Natural" => Ok(Self::Natural),
            "C" | "Combined" => Ok(Self::Combined),
            "R" | "Random" => Ok(Self::Random),
            "U" | "UserData" => Ok(Self::UserData),
            other => Err(format!("unknown data type token: {other}")),
        }
    }
}
