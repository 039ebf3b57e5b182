// External Crate Imports
use itertools::Itertools;

// Local Crate Imports
use crate::{ChainSpec, CompositionBudget, LipidClass};

// Public API ==========================================================================================================

/// The shorthand name of `chains` as a molecule of `class`, like `PC 16:0_18:1` or `SM 18:1;O2/16:0`
///
/// Interchangeable chains are sorted first, so every ordering of the same chains is named identically.
#[must_use]
pub fn canonicalize(class: &LipidClass, chains: &[ChainSpec]) -> String {
    class.canonical_name(chains)
}

impl LipidClass {
    /// Sorts interchangeable chains by double bonds, then carbons (then oxidation); fixed positions are left alone
    #[must_use]
    pub fn canonical_order(&self, mut chains: Vec<ChainSpec>) -> Vec<ChainSpec> {
        if self.interchangeable {
            chains.sort_by_key(|chain| (chain.double_bond, chain.carbon, chain.oxidation));
        }
        chains
    }

    /// The species-level name, like `PC 34:1` or `PE P-34:1`
    #[must_use]
    pub fn total_name(&self, budget: CompositionBudget) -> String {
        format!("{} {}{budget}", self.label, self.ether_prefix())
    }

    #[must_use]
    pub fn canonical_name(&self, chains: &[ChainSpec]) -> String {
        let separator = if self.interchangeable { "_" } else { "/" };
        let chains = self
            .canonical_order(chains.to_vec())
            .into_iter()
            .enumerate()
            .map(|(position, chain)| {
                // NOTE: Positions beyond this class's slots are named as plain acyl chains
                let prefix = self
                    .chains
                    .get(position)
                    .map_or("", |slot| slot.kind.prefix());
                format!("{prefix}{chain}")
            })
            .join(separator);
        format!("{} {chains}", self.label)
    }
}

// Private Helper Methods ==============================================================================================

impl LipidClass {
    fn ether_prefix(&self) -> &'static str {
        self.chains
            .iter()
            .map(|slot| slot.kind.prefix())
            .find(|prefix| !prefix.is_empty())
            .unwrap_or("")
    }
}

// Module Tests ========================================================================================================
