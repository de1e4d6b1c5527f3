//! Hyperscale compute tier labels.
//!
//! A tier label has the shape `hs_gen<generation>_<cores>`. Parsing is
//! case-insensitive; formatting always produces the uppercase canonical form
//! (`HS_GEN5_8`), which is what the action executor receives.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{TierError, TierResult};

/// Family tag shared by every Hyperscale tier.
pub const FAMILY: &str = "hs";

const GENERATION_TAG: &str = "gen";

/// A compute tier: family, hardware generation, and vCore count.
///
/// Equality is structural. Because the family is fixed and the label is a
/// pure function of `(generation, cores)`, two tiers are equal exactly when
/// their canonical labels are equal, regardless of the case they were parsed
/// from. Tiers deliberately do not implement `Ord`: adjacency comes from the
/// [`TierCatalog`](crate::TierCatalog).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tier {
    generation: u32,
    cores: u32,
}

impl Tier {
    pub fn new(generation: u32, cores: u32) -> Self {
        Self { generation, cores }
    }

    /// Parse a label such as `hs_gen5_8` or `HS_GEN5_8`.
    pub fn parse(label: &str) -> TierResult<Self> {
        let lowered = label.to_lowercase();
        let parts: Vec<&str> = lowered.split('_').collect();

        if parts.len() != 3 {
            return Err(TierError::invalid(
                label,
                format!("expected 3 '_'-separated tokens, found {}", parts.len()),
            ));
        }

        if parts[0] != FAMILY {
            return Err(TierError::invalid(label, "not a Hyperscale tier"));
        }

        let generation = parts[1]
            .strip_prefix(GENERATION_TAG)
            .ok_or_else(|| TierError::invalid(label, "generation token must start with 'gen'"))?;
        let generation = parse_number(label, "generation", generation)?;
        let cores = parse_number(label, "cores", parts[2])?;

        Ok(Self { generation, cores })
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn cores(&self) -> u32 {
        self.cores
    }

    /// Canonical uppercase label.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

/// Plain ASCII digits only; `u32::from_str` alone would also take a sign.
fn parse_number(label: &str, what: &str, token: &str) -> TierResult<u32> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TierError::invalid(
            label,
            format!("{what}: expected digits, found '{token}'"),
        ));
    }
    token
        .parse::<u32>()
        .map_err(|e| TierError::invalid(label, format!("{what}: {e}")))
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}{}_{}",
            FAMILY.to_uppercase(),
            GENERATION_TAG.to_uppercase(),
            self.generation,
            self.cores
        )
    }
}

impl FromStr for Tier {
    type Err = TierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tier::parse(s)
    }
}

impl Serialize for Tier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Tier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Tier::parse(&label).map_err(serde::de::Error::custom)
    }
}
