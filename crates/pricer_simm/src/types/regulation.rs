//! Regulatory regimes and regulation sets.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SimmError};

/// Regulatory regime under which initial margin is exchanged.
///
/// Declaration order is the tie-break priority used when several
/// regulations produce the same margin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[allow(missing_docs)]
pub enum Regulation {
    APRA,
    CFTC,
    ESA,
    FINMA,
    KFSC,
    HKMA,
    JFSA,
    MAS,
    OSFI,
    RBI,
    SEC,
    SECUnseg,
    USPR,
    NONREG,
    BACEN,
    SANT,
    SFC,
    UK,
    AMFQ,
    BANX,
    OJK,
    /// Explicitly included without a named regime.
    Included,
    /// No regulation was specified.
    Unspecified,
    /// Records carrying this regulation are excluded from SIMM.
    Excluded,
    /// Unrecognised regulation name.
    Invalid,
}

impl Regulation {
    const ALL: [Regulation; 25] = [
        Regulation::APRA,
        Regulation::CFTC,
        Regulation::ESA,
        Regulation::FINMA,
        Regulation::KFSC,
        Regulation::HKMA,
        Regulation::JFSA,
        Regulation::MAS,
        Regulation::OSFI,
        Regulation::RBI,
        Regulation::SEC,
        Regulation::SECUnseg,
        Regulation::USPR,
        Regulation::NONREG,
        Regulation::BACEN,
        Regulation::SANT,
        Regulation::SFC,
        Regulation::UK,
        Regulation::AMFQ,
        Regulation::BANX,
        Regulation::OJK,
        Regulation::Included,
        Regulation::Unspecified,
        Regulation::Excluded,
        Regulation::Invalid,
    ];

    /// Returns the canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            Regulation::APRA => "APRA",
            Regulation::CFTC => "CFTC",
            Regulation::ESA => "ESA",
            Regulation::FINMA => "FINMA",
            Regulation::KFSC => "KFSC",
            Regulation::HKMA => "HKMA",
            Regulation::JFSA => "JFSA",
            Regulation::MAS => "MAS",
            Regulation::OSFI => "OSFI",
            Regulation::RBI => "RBI",
            Regulation::SEC => "SEC",
            Regulation::SECUnseg => "SEC-unseg",
            Regulation::USPR => "USPR",
            Regulation::NONREG => "NONREG",
            Regulation::BACEN => "BACEN",
            Regulation::SANT => "SANT",
            Regulation::SFC => "SFC",
            Regulation::UK => "UK",
            Regulation::AMFQ => "AMFQ",
            Regulation::BANX => "BANX",
            Regulation::OJK => "OJK",
            Regulation::Included => "Included",
            Regulation::Unspecified => "Unspecified",
            Regulation::Excluded => "Excluded",
            Regulation::Invalid => "Invalid",
        }
    }

    /// Parses a regulation name. Unknown names map to [`Regulation::Invalid`].
    pub fn parse(s: &str) -> Regulation {
        let s = s.trim();
        Regulation::ALL
            .iter()
            .find(|r| r.name() == s)
            .copied()
            .unwrap_or(Regulation::Invalid)
    }
}

impl fmt::Display for Regulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Regulation {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Regulation::parse(s))
    }
}

/// An ordered set of regulations, used as the key of per-regulation
/// CRIF aggregates and results.
///
/// # Examples
///
/// ```
/// use pricer_simm::{Regulation, RegulationSet};
///
/// let regs: RegulationSet = [Regulation::SEC, Regulation::CFTC].into_iter().collect();
/// assert_eq!(regs.to_string(), "CFTC,SEC");
/// assert!(regs.contains(Regulation::SEC));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegulationSet(BTreeSet<Regulation>);

impl RegulationSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set holding a single regulation.
    pub fn single(regulation: Regulation) -> Self {
        let mut set = BTreeSet::new();
        set.insert(regulation);
        Self(set)
    }

    /// Whether the set holds `regulation`.
    #[inline]
    pub fn contains(&self, regulation: Regulation) -> bool {
        self.0.contains(&regulation)
    }

    /// Whether the set is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of regulations.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Inserts a regulation, returning whether it was new.
    pub fn insert(&mut self, regulation: Regulation) -> bool {
        self.0.insert(regulation)
    }

    /// Removes a regulation, returning whether it was present.
    pub fn remove(&mut self, regulation: Regulation) -> bool {
        self.0.remove(&regulation)
    }

    /// Iterates in enum order.
    pub fn iter(&self) -> impl Iterator<Item = Regulation> + '_ {
        self.0.iter().copied()
    }

    /// Regulations present in both sets.
    pub fn intersection(&self, other: &RegulationSet) -> RegulationSet {
        Self(self.0.intersection(&other.0).copied().collect())
    }

    /// Regulations of `self` not present in `other`.
    pub fn difference(&self, other: &RegulationSet) -> RegulationSet {
        Self(self.0.difference(&other.0).copied().collect())
    }

    /// Whether every regulation of `self` is in `other`.
    pub fn is_subset(&self, other: &RegulationSet) -> bool {
        self.0.is_subset(&other.0)
    }

    /// Splits the set into the regulations contained in `filter` and the rest.
    pub fn partition(&self, filter: &RegulationSet) -> (RegulationSet, RegulationSet) {
        let (inside, outside): (BTreeSet<_>, BTreeSet<_>) =
            self.0.iter().partition(|r| filter.0.contains(r));
        (Self(inside), Self(outside))
    }
}

impl fmt::Display for RegulationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: BTreeSet<&str> = self.0.iter().map(Regulation::name).collect();
        let joined: Vec<&str> = names.into_iter().collect();
        f.write_str(&joined.join(","))
    }
}

impl FromIterator<Regulation> for RegulationSet {
    fn from_iter<I: IntoIterator<Item = Regulation>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Regulation> for RegulationSet {
    fn from(regulation: Regulation) -> Self {
        Self::single(regulation)
    }
}

/// Parses a regulation list such as `"[SEC, CFTC]"`.
///
/// `,`, `[`, `]` and spaces are delimiters. When no regulation remains
/// the function returns `value_if_empty`.
pub fn parse_regulation_string(s: &str, value_if_empty: &RegulationSet) -> RegulationSet {
    let regs: RegulationSet = s
        .split([',', '[', ']', ' '])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(Regulation::parse)
        .collect();
    if regs.is_empty() {
        value_if_empty.clone()
    } else {
        regs
    }
}

/// Picks the winning regulation among regulations producing the same margin:
/// the first one in enum order.
pub fn winning_regulation(regulations: &RegulationSet) -> Result<Regulation> {
    regulations.iter().next().ok_or(SimmError::EmptyRegulationSet)
}
