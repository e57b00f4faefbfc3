//! Standards-compliance vocabulary and the filter applied to strategies.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A calculation standard a strategy can be certified against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceTag {
    /// GHG Protocol (corporate standard).
    GhgProtocol,
    /// GHG Protocol, Scope 3 accounting.
    GhgProtocolScope3,
    /// ISO 14064-1.
    Iso,
    /// The Climate Registry General Reporting Protocol.
    Tcr,
}

impl ComplianceTag {
    pub const ALL: [ComplianceTag; 4] = [
        ComplianceTag::GhgProtocol,
        ComplianceTag::GhgProtocolScope3,
        ComplianceTag::Iso,
        ComplianceTag::Tcr,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceTag::GhgProtocol => "ghg_protocol",
            ComplianceTag::GhgProtocolScope3 => "ghg_protocol_scope_3",
            ComplianceTag::Iso => "iso",
            ComplianceTag::Tcr => "tcr",
        }
    }
}

impl fmt::Display for ComplianceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown compliance tag '{0}'")]
pub struct UnknownTag(pub String);

impl FromStr for ComplianceTag {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComplianceTag::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownTag(s.to_string()))
    }
}

/// The set of tags a caller requires. Empty means "no restriction".
pub type ComplianceSet = BTreeSet<ComplianceTag>;

/// The compliance claimed by a strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compliance {
    /// Satisfies any filter. Used for client-input echoes.
    Universal,
    Tags(ComplianceSet),
}

impl Compliance {
    pub fn none() -> Self { Compliance::Tags(ComplianceSet::new()) }

    pub fn tags(tags: impl IntoIterator<Item = ComplianceTag>) -> Self {
        Compliance::Tags(tags.into_iter().collect())
    }

    /// A strategy passes iff it is universal, nothing is required, or it covers every required tag.
    #[inline]
    pub fn satisfies(&self, required: &ComplianceSet) -> bool {
        match self {
            Compliance::Universal => true,
            Compliance::Tags(tags) => required.is_empty() || tags.is_superset(required),
        }
    }

    /// Narrows an accumulated derivation compliance by this strategy's claim.
    pub fn restrict(&self, acc: &mut Option<ComplianceSet>) {
        if let Compliance::Tags(tags) = self {
            *acc = Some(match acc.take() {
                None => tags.clone(),
                Some(prev) => prev.intersection(tags).copied().collect(),
            });
        }
    }
}

impl fmt::Display for Compliance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compliance::Universal => f.write_str("{all}"),
            Compliance::Tags(tags) => {
                let names: Vec<&str> = tags.iter().map(|t| t.as_str()).collect();
                write!(f, "{{{}}}", names.join(", "))
            }
        }
    }
}

/// Parses a caller-supplied list such as `["iso", "tcr"]`.
pub fn parse_set<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<ComplianceSet, UnknownTag> {
    names.into_iter().map(ComplianceTag::from_str).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use ComplianceTag::*;

    fn set(tags: &[ComplianceTag]) -> ComplianceSet { tags.iter().copied().collect() }

    #[rstest]
    #[case(Compliance::Universal, set(&[Iso, Tcr]), true)]
    #[case(Compliance::tags([Iso]), set(&[]), true)]
    #[case(Compliance::tags([GhgProtocolScope3, Iso, Tcr]), set(&[Iso]), true)]
    #[case(Compliance::tags([GhgProtocolScope3, Iso, Tcr]), set(&[Iso, Tcr]), true)]
    #[case(Compliance::tags([GhgProtocolScope3]), set(&[Iso]), false)]
    // Intersecting is not enough: every requested tag must be covered.
    #[case(Compliance::tags([Iso]), set(&[Iso, Tcr]), false)]
    #[case(Compliance::none(), set(&[Iso]), false)]
    fn test_satisfies(#[case] claim: Compliance, #[case] required: ComplianceSet, #[case] expected: bool) {
        assert_eq!(claim.satisfies(&required), expected);
    }

    #[test]
    fn test_restrict_intersects_and_ignores_universal() {
        let mut acc = None;
        Compliance::Universal.restrict(&mut acc);
        assert_eq!(acc, None);
        Compliance::tags([GhgProtocolScope3, Iso, Tcr]).restrict(&mut acc);
        Compliance::tags([Iso, Tcr]).restrict(&mut acc);
        assert_eq!(acc, Some(set(&[Iso, Tcr])));
    }

    #[test]
    fn test_parse_set() {
        assert_eq!(parse_set(["iso", "tcr"]).unwrap(), set(&[Iso, Tcr]));
        assert_eq!(parse_set(["ghg_protocol_scope_3"]).unwrap(), set(&[GhgProtocolScope3]));
        assert!(parse_set(["iso", "kyoto"]).is_err());
    }
}
