// Standard Library Imports
use std::ops::RangeInclusive;

// External Crate Imports
use ahash::{HashSet, HashSetExt};
use lipochem::ChainSpec;

// Local Crate Imports
use crate::{ChainBounds, DIMENSIONS};

// Public API ==========================================================================================================

impl ChainBounds {
    #[must_use]
    pub fn new(
        carbon: RangeInclusive<u32>,
        double_bond: RangeInclusive<u32>,
        oxidation: RangeInclusive<u32>,
    ) -> Self {
        Self {
            carbon,
            double_bond,
            oxidation,
            excluded: HashSet::new(),
        }
    }

    /// Rules out a single `carbon:double_bond` combination at this position, whatever its oxidation
    #[must_use]
    pub fn exclude(mut self, carbon: u32, double_bond: u32) -> Self {
        self.excluded.insert((carbon, double_bond));
        self
    }

    #[must_use]
    pub const fn carbon(&self) -> &RangeInclusive<u32> {
        &self.carbon
    }

    #[must_use]
    pub const fn double_bond(&self) -> &RangeInclusive<u32> {
        &self.double_bond
    }

    #[must_use]
    pub const fn oxidation(&self) -> &RangeInclusive<u32> {
        &self.oxidation
    }

    #[must_use]
    pub fn is_excluded(&self, carbon: u32, double_bond: u32) -> bool {
        self.excluded.contains(&(carbon, double_bond))
    }

    #[must_use]
    pub fn admits(&self, chain: &ChainSpec) -> bool {
        self.carbon.contains(&chain.carbon)
            && self.double_bond.contains(&chain.double_bond)
            && self.oxidation.contains(&chain.oxidation)
            && !self.is_excluded(chain.carbon, chain.double_bond)
    }
}

// Private Helper Methods ==============================================================================================

impl ChainBounds {
    pub(crate) fn dimensions(&self) -> [&RangeInclusive<u32>; DIMENSIONS] {
        [&self.carbon, &self.double_bond, &self.oxidation]
    }
}

// Module Tests ========================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_chains() {
        let bounds = ChainBounds::new(10..=24, 0..=6, 0..=1).exclude(18, 4);

        assert!(bounds.admits(&ChainSpec::new(16, 0, 0)));
        assert!(bounds.admits(&ChainSpec::new(24, 6, 1)));
        assert!(bounds.admits(&ChainSpec::new(18, 3, 0)));
        // Out of range
        assert!(!bounds.admits(&ChainSpec::new(8, 0, 0)));
        assert!(!bounds.admits(&ChainSpec::new(26, 0, 0)));
        assert!(!bounds.admits(&ChainSpec::new(22, 7, 0)));
        assert!(!bounds.admits(&ChainSpec::new(16, 0, 2)));
        // Exclusions ignore oxidation
        assert!(!bounds.admits(&ChainSpec::new(18, 4, 0)));
        assert!(!bounds.admits(&ChainSpec::new(18, 4, 1)));
        assert!(bounds.is_excluded(18, 4));
        assert!(!bounds.is_excluded(18, 3));
    }
}
