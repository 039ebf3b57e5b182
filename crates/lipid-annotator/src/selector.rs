// Standard Library Imports
use std::cmp::Ordering;

// External Crate Imports
use itertools::Itertools;

// Local Crate Imports
use crate::{Candidate, Evidence};

// Public API ==========================================================================================================

/// The best-supported candidate: most fragments found, then highest mean intensity, then the lowest carbon and
/// double-bond counts (position by position)
#[must_use]
pub fn select<'c, 'r>(candidates: &'c [Candidate<'r>]) -> Option<&'c Candidate<'r>> {
    candidates.iter().min_by(|a, b| a.rank(b))
}

/// Every candidate from best to worst, keeping only the best-scoring copy of chemically identical candidates
#[must_use]
pub fn ranked<'c, 'r>(candidates: &'c [Candidate<'r>]) -> Vec<&'c Candidate<'r>> {
    candidates
        .iter()
        .sorted_by(|a, b| a.rank(b))
        .unique_by(|candidate| &candidate.chains)
        .collect()
}

impl<'r> Evidence<'r> {
    #[must_use]
    pub fn select(&self) -> Option<&Candidate<'r>> {
        select(&self.candidates)
    }

    #[must_use]
    pub fn ranked(&self) -> Vec<&Candidate<'r>> {
        ranked(&self.candidates)
    }
}

// Private Helper Methods ==============================================================================================

impl Candidate<'_> {
    // NOTE: `Ordering::Less` means `self` is the better candidate
    fn rank(&self, other: &Self) -> Ordering {
        let carbons = |c: &Self| c.chains.iter().map(|chain| chain.carbon).collect_vec();
        let double_bonds = |c: &Self| c.chains.iter().map(|chain| chain.double_bond).collect_vec();

        other
            .matched_fragment_count
            .cmp(&self.matched_fragment_count)
            .then_with(|| {
                other
                    .mean_matched_intensity
                    .total_cmp(&self.mean_matched_intensity)
            })
            .then_with(|| carbons(self).cmp(&carbons(other)))
            .then_with(|| double_bonds(self).cmp(&double_bonds(other)))
            .then_with(|| self.chains.cmp(&other.chains))
    }
}

// Module Tests ========================================================================================================
