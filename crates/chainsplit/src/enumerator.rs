// Standard Library Imports
use std::{iter::FusedIterator, ops::RangeInclusive};

// External Crate Imports
use lipochem::{ChainSpec, CompositionBudget};

// Local Crate Imports
use crate::{ChainBounds, ChainEnumerator, DIMENSIONS, Splits};

// Public API ==========================================================================================================

impl ChainEnumerator {
    #[must_use]
    pub fn new(budget: CompositionBudget, bounds: Vec<ChainBounds>) -> Self {
        let mut later = vec![[(0, 0); DIMENSIONS]; bounds.len()];
        for position in (0..bounds.len().saturating_sub(1)).rev() {
            let next = &bounds[position + 1];
            let mut sums = later[position + 1];
            for (sum, range) in sums.iter_mut().zip(next.dimensions()) {
                sum.0 += i64::from(*range.start());
                sum.1 += i64::from(*range.end());
            }
            later[position] = sums;
        }

        Self {
            budget,
            bounds,
            later,
        }
    }

    #[must_use]
    pub const fn budget(&self) -> CompositionBudget {
        self.budget
    }

    #[must_use]
    pub fn positions(&self) -> usize {
        self.bounds.len()
    }

    #[must_use]
    pub fn splits(&self) -> Splits<'_> {
        let free_variables = DIMENSIONS * self.bounds.len().saturating_sub(1);
        Splits {
            enumerator: self,
            values: vec![0; free_variables],
            started: false,
            exhausted: false,
        }
    }
}

impl<'e> IntoIterator for &'e ChainEnumerator {
    type Item = Vec<ChainSpec>;
    type IntoIter = Splits<'e>;

    fn into_iter(self) -> Self::IntoIter {
        self.splits()
    }
}

impl Iterator for Splits<'_> {
    type Item = Vec<ChainSpec>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.exhausted {
            let assigned = if self.started {
                let end = self.values.len();
                self.backtrack(end).is_some_and(|changed| self.descend(changed + 1))
            } else {
                self.started = true;
                self.descend(0)
            };

            // NOTE: With no free variables there is exactly one assignment, so one pass is all there is
            if !assigned || self.values.is_empty() {
                self.exhausted = true;
            }
            if assigned {
                if let Some(split) = self.enumerator.complete(&self.values) {
                    return Some(split);
                }
            }
        }
        None
    }
}

impl FusedIterator for Splits<'_> {}

// Private Methods =====================================================================================================

impl ChainEnumerator {
    /// The values free variable `v` can take, given the values already fixed before it
    ///
    /// The range is clamped so that the budget left over can still be absorbed by every later position's bounds,
    /// which means a non-empty range always has at least one completion.
    fn range(&self, v: usize, values: &[u32]) -> Option<RangeInclusive<u32>> {
        let (position, dimension) = (v / DIMENSIONS, v % DIMENSIONS);
        let bounds = self.bounds[position].dimensions()[dimension];
        let (later_min, later_max) = self.later[position][dimension];

        let used: i64 = values[..v]
            .iter()
            .skip(dimension)
            .step_by(DIMENSIONS)
            .map(|&value| i64::from(value))
            .sum();
        let remaining = self.total(dimension) - used;

        let lo = i64::from(*bounds.start()).max(remaining - later_max);
        let hi = i64::from(*bounds.end()).min(remaining - later_min);
        if lo > hi {
            return None;
        }
        Some(u32::try_from(lo).ok()?..=u32::try_from(hi).ok()?)
    }

    /// Derives the last chain from what the free variables leave of the budget, then applies every position's bounds
    fn complete(&self, values: &[u32]) -> Option<Vec<ChainSpec>> {
        let Some(last_bounds) = self.bounds.last() else {
            return (self.budget == CompositionBudget::default()).then(Vec::new);
        };

        let mut chains: Vec<_> = values
            .chunks_exact(DIMENSIONS)
            .map(|chain| ChainSpec::new(chain[0], chain[1], chain[2]))
            .collect();
        let used: CompositionBudget = chains.iter().collect();
        let last = ChainSpec::new(
            self.budget.total_carbon.checked_sub(used.total_carbon)?,
            self.budget.total_double_bond.checked_sub(used.total_double_bond)?,
            self.budget.total_oxidation.checked_sub(used.total_oxidation)?,
        );
        if !last_bounds.admits(&last) {
            return None;
        }
        chains.push(last);

        chains
            .iter()
            .zip(&self.bounds)
            .all(|(chain, bounds)| !bounds.is_excluded(chain.carbon, chain.double_bond))
            .then_some(chains)
    }

    fn total(&self, dimension: usize) -> i64 {
        let budget = self.budget;
        i64::from(
            [
                budget.total_carbon,
                budget.total_double_bond,
                budget.total_oxidation,
            ][dimension],
        )
    }
}

impl Splits<'_> {
    /// Gives every free variable from `v` onwards its lowest value, backtracking past any that have run out of room
    fn descend(&mut self, mut v: usize) -> bool {
        while v < self.values.len() {
            if let Some(range) = self.enumerator.range(v, &self.values) {
                self.values[v] = *range.start();
                v += 1;
            } else if let Some(changed) = self.backtrack(v) {
                v = changed + 1;
            } else {
                return false;
            }
        }
        true
    }

    /// Increments the closest free variable before `v` that still has room, returning its index
    fn backtrack(&mut self, v: usize) -> Option<usize> {
        let changed = (0..v).rev().find(|&u| {
            self.enumerator
                .range(u, &self.values)
                .is_some_and(|range| self.values[u] < *range.end())
        })?;
        self.values[changed] += 1;
        Some(changed)
    }
}

// Module Tests ========================================================================================================
