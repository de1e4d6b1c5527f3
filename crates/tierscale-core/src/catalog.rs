//! TierCatalog — the ordered, per-generation list of tiers the autoscaler
//! may move between.
//!
//! The order is curated rather than derived from core counts: the valid
//! Hyperscale sizes are not contiguous (gen4 jumps 10 → 16 → 24, gen5 jumps
//! 40 → 80), so stepping is always "the next entry in the list".

use std::collections::{BTreeMap, HashMap};

use crate::error::{TierError, TierResult};
use crate::tier::Tier;

/// Gen4 Hyperscale vCore sizes, lowest capacity first.
pub const GEN4_CORES: &[u32] = &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 16, 24];

/// Gen5 Hyperscale vCore sizes, lowest capacity first.
pub const GEN5_CORES: &[u32] = &[2, 4, 6, 8, 10, 12, 14, 16, 18, 20, 24, 32, 40, 80];

/// Which way to step through a generation's list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// One generation's ordered tiers plus a tier → index lookup.
#[derive(Debug, Clone)]
struct Family {
    tiers: Vec<Tier>,
    index: HashMap<Tier, usize>,
}

impl Family {
    fn new(tiers: Vec<Tier>) -> Self {
        let index = tiers.iter().enumerate().map(|(i, t)| (*t, i)).collect();
        Self { tiers, index }
    }
}

/// Immutable tier catalog. Build once at startup and share by reference.
#[derive(Debug, Clone)]
pub struct TierCatalog {
    families: BTreeMap<u32, Family>,
}

impl TierCatalog {
    /// The built-in Hyperscale catalog (gen4 and gen5).
    pub fn hyperscale() -> Self {
        let mut families = BTreeMap::new();
        for (generation, cores) in [(4, GEN4_CORES), (5, GEN5_CORES)] {
            let tiers = cores.iter().map(|&c| Tier::new(generation, c)).collect();
            families.insert(generation, Family::new(tiers));
        }
        Self { families }
    }

    /// Build a catalog from `(generation, ordered labels)` pairs.
    ///
    /// Every label must parse, and must belong to the generation it is
    /// listed under.
    pub fn from_labels<I, L, S>(generations: I) -> TierResult<Self>
    where
        I: IntoIterator<Item = (u32, L)>,
        L: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut families = BTreeMap::new();
        for (generation, labels) in generations {
            let mut tiers = Vec::new();
            for label in labels {
                let tier = Tier::parse(label.as_ref())?;
                if tier.generation() != generation {
                    return Err(TierError::CatalogMismatch {
                        label: tier.label(),
                        expected: generation,
                    });
                }
                tiers.push(tier);
            }
            families.insert(generation, Family::new(tiers));
        }
        Ok(Self { families })
    }

    /// Resolve the neighbor of `tier` in `direction`.
    ///
    /// Returns `Ok(None)` at either end of the list. An unknown generation or
    /// a tier outside the curated list is an error: the autoscaler never
    /// guesses where an unrecognized tier sits.
    pub fn neighbor_of(&self, tier: &Tier, direction: Direction) -> TierResult<Option<Tier>> {
        let family = self
            .families
            .get(&tier.generation())
            .ok_or(TierError::UnknownGeneration(tier.generation()))?;

        let idx = *family
            .index
            .get(tier)
            .ok_or_else(|| TierError::TierNotInCatalog(tier.label()))?;

        let neighbor = match direction {
            Direction::Next => family.tiers.get(idx + 1),
            Direction::Previous => idx.checked_sub(1).and_then(|i| family.tiers.get(i)),
        };
        Ok(neighbor.copied())
    }

    /// Ordered tiers for a generation, if known.
    pub fn tiers(&self, generation: u32) -> Option<&[Tier]> {
        self.families.get(&generation).map(|f| f.tiers.as_slice())
    }

    /// Known generations in ascending order.
    pub fn generations(&self) -> impl Iterator<Item = u32> + '_ {
        self.families.keys().copied()
    }

    pub fn contains(&self, tier: &Tier) -> bool {
        self.families
            .get(&tier.generation())
            .is_some_and(|f| f.index.contains_key(tier))
    }
}

impl Default for TierCatalog {
    fn default() -> Self {
        Self::hyperscale()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_label_round_trips_in_any_case() {
        let catalog = TierCatalog::hyperscale();
        for generation in catalog.generations() {
            for tier in catalog.tiers(generation).unwrap() {
                let canonical = tier.label();
                let lower = canonical.to_lowercase();
                assert_eq!(Tier::parse(&lower).unwrap().label(), canonical);
                assert_eq!(Tier::parse(&canonical).unwrap().label(), canonical);
            }
        }
    }

    #[test]
    fn hyperscale_lists_match_curated_labels() {
        let catalog = TierCatalog::hyperscale();
        let gen4: Vec<String> = catalog.tiers(4).unwrap().iter().map(Tier::label).collect();
        assert_eq!(gen4.first().unwrap(), "HS_GEN4_1");
        assert_eq!(gen4.last().unwrap(), "HS_GEN4_24");
        assert_eq!(gen4.len(), 12);

        let gen5 = catalog.tiers(5).unwrap();
        assert_eq!(gen5.len(), 14);
        assert_eq!(gen5[3], Tier::parse("hs_gen5_8").unwrap());
        assert_eq!(gen5[4], Tier::parse("hs_gen5_10").unwrap());
        assert_eq!(gen5[13], Tier::parse("hs_gen5_80").unwrap());
    }

    #[test]
    fn from_labels_builds_equivalent_catalog() {
        let custom = TierCatalog::from_labels([(5, ["hs_gen5_2", "HS_GEN5_4", "hs_gen5_8"])]).unwrap();
        let next = custom.neighbor_of(&Tier::new(5, 4), Direction::Next).unwrap();
        assert_eq!(next, Some(Tier::new(5, 8)));
        assert_eq!(custom.tiers(4), None);
    }

    #[test]
    fn every_entry_matches_its_generation() {
        let catalog = TierCatalog::hyperscale();
        for generation in catalog.generations() {
            for tier in catalog.tiers(generation).unwrap() {
                assert_eq!(tier.generation(), generation);
                assert!(catalog.contains(tier));
            }
        }
        assert_eq!(catalog.generations().collect::<Vec<_>>(), vec![4, 5]);
    }

    #[test]
    fn next_neighbor_has_more_cores() {
        let catalog = TierCatalog::hyperscale();
        for generation in [4, 5] {
            let tiers = catalog.tiers(generation).unwrap();
            for pair in tiers.windows(2) {
                let next = catalog
                    .neighbor_of(&pair[0], Direction::Next)
                    .unwrap()
                    .expect("non-last tier has a next neighbor");
                assert_eq!(next, pair[1]);
                assert!(next.cores() > pair[0].cores());
            }
        }
    }

    #[test]
    fn previous_neighbor_exists_except_first() {
        let catalog = TierCatalog::hyperscale();
        for generation in [4, 5] {
            let tiers = catalog.tiers(generation).unwrap();
            for pair in tiers.windows(2) {
                let prev = catalog.neighbor_of(&pair[1], Direction::Previous).unwrap();
                assert_eq!(prev, Some(pair[0]));
            }
        }
    }

    #[test]
    fn boundaries_have_no_neighbor() {
        let catalog = TierCatalog::hyperscale();
        for generation in [4, 5] {
            let tiers = catalog.tiers(generation).unwrap();
            let first = tiers.first().unwrap();
            let last = tiers.last().unwrap();
            assert_eq!(catalog.neighbor_of(last, Direction::Next).unwrap(), None);
            assert_eq!(catalog.neighbor_of(first, Direction::Previous).unwrap(), None);
        }
    }

    #[test]
    fn non_contiguous_steps_follow_the_list() {
        let catalog = TierCatalog::hyperscale();
        let next = catalog.neighbor_of(&Tier::new(4, 10), Direction::Next).unwrap();
        assert_eq!(next, Some(Tier::new(4, 16)));
        let next = catalog.neighbor_of(&Tier::new(5, 40), Direction::Next).unwrap();
        assert_eq!(next, Some(Tier::new(5, 80)));
    }

    #[test]
    fn unknown_generation_is_an_error() {
        let catalog = TierCatalog::hyperscale();
        let tier = Tier::parse("hs_gen6_8").unwrap();
        assert_eq!(
            catalog.neighbor_of(&tier, Direction::Next),
            Err(TierError::UnknownGeneration(6))
        );
    }

    #[test]
    fn tier_outside_list_is_an_error() {
        let catalog = TierCatalog::hyperscale();
        let tier = Tier::new(5, 3);
        assert_eq!(
            catalog.neighbor_of(&tier, Direction::Previous),
            Err(TierError::TierNotInCatalog("HS_GEN5_3".to_string()))
        );
        assert!(!catalog.contains(&tier));
    }

    #[test]
    fn custom_catalog_rejects_mismatched_generation() {
        let err = TierCatalog::from_labels([(5, ["hs_gen5_2", "hs_gen4_4"])]).unwrap_err();
        assert_eq!(
            err,
            TierError::CatalogMismatch {
                label: "HS_GEN4_4".to_string(),
                expected: 5
            }
        );
    }

    #[test]
    fn custom_catalog_rejects_bad_labels() {
        let err = TierCatalog::from_labels([(5, ["hs_gen5_x"])]).unwrap_err();
        assert!(matches!(err, TierError::InvalidTierFormat { .. }));
    }
}
