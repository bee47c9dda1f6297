//! ISDA SIMM methodology versions.

use std::fmt;
use std::str::FromStr;

use crate::error::SimmError;

/// Published ISDA SIMM methodology version.
///
/// Versions are ordered chronologically so that version-gated rules can be
/// expressed as comparisons (`version >= SimmVersion::V2_2`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[allow(non_camel_case_types, missing_docs)]
pub enum SimmVersion {
    V1_0,
    V1_3,
    V1_3_38,
    V2_0,
    V2_1,
    V2_2,
    V2_3,
    V2_3_8,
    V2_5,
    V2_5A,
    V2_6,
    V2_6_5,
    V2_7,
    V2_8,
}

impl SimmVersion {
    const ALL: [SimmVersion; 14] = [
        SimmVersion::V1_0,
        SimmVersion::V1_3,
        SimmVersion::V1_3_38,
        SimmVersion::V2_0,
        SimmVersion::V2_1,
        SimmVersion::V2_2,
        SimmVersion::V2_3,
        SimmVersion::V2_3_8,
        SimmVersion::V2_5,
        SimmVersion::V2_5A,
        SimmVersion::V2_6,
        SimmVersion::V2_6_5,
        SimmVersion::V2_7,
        SimmVersion::V2_8,
    ];

    /// Returns the version string, e.g. `"2.5A"`.
    pub fn name(&self) -> &'static str {
        match self {
            SimmVersion::V1_0 => "1.0",
            SimmVersion::V1_3 => "1.3",
            SimmVersion::V1_3_38 => "1.3.38",
            SimmVersion::V2_0 => "2.0",
            SimmVersion::V2_1 => "2.1",
            SimmVersion::V2_2 => "2.2",
            SimmVersion::V2_3 => "2.3",
            SimmVersion::V2_3_8 => "2.3.8",
            SimmVersion::V2_5 => "2.5",
            SimmVersion::V2_5A => "2.5A",
            SimmVersion::V2_6 => "2.6",
            SimmVersion::V2_6_5 => "2.6.5",
            SimmVersion::V2_7 => "2.7",
            SimmVersion::V2_8 => "2.8",
        }
    }
}

impl fmt::Display for SimmVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SimmVersion {
    type Err = SimmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix('v').or_else(|| s.strip_prefix('V')).unwrap_or(s);
        SimmVersion::ALL
            .iter()
            .find(|v| v.name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| SimmError::InvalidVersion(s.to_string()))
    }
}
