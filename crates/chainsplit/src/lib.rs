//! Lazy enumeration of every way a lipid's total composition can be split across its chains

mod bounds;
mod enumerator;

// Standard Library Imports
use std::ops::RangeInclusive;

// External Crate Imports
use ahash::HashSet;
use lipochem::CompositionBudget;

// Public API ==========================================================================================================

/// The carbon, double-bond, and oxidation counts a single chain position may take
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ChainBounds {
    carbon: RangeInclusive<u32>,
    double_bond: RangeInclusive<u32>,
    oxidation: RangeInclusive<u32>,
    excluded: HashSet<(u32, u32)>,
}

/// Every split of a [`CompositionBudget`] across a fixed number of chain positions, each with its own
/// [`ChainBounds`]
///
/// The enumerator itself holds no iteration state: each call to [`ChainEnumerator::splits()`] starts a fresh pass.
#[derive(Clone, Debug)]
pub struct ChainEnumerator {
    budget: CompositionBudget,
    bounds: Vec<ChainBounds>,
    // NOTE: `later[p][k]` holds the (minimum, maximum) sums of dimension `k` over every position after `p`
    later: Vec<[(i64, i64); DIMENSIONS]>,
}

#[derive(Clone, Debug)]
pub struct Splits<'e> {
    enumerator: &'e ChainEnumerator,
    // NOTE: Laid out position-major, so the value of dimension `k` at position `p` lives at `values[DIMENSIONS * p + k]`
    values: Vec<u32>,
    started: bool,
    exhausted: bool,
}

// Private Constants ===================================================================================================

// NOTE: Carbon, double bonds, and oxidation
const DIMENSIONS: usize = 3;
