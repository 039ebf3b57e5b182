// Standard Library Imports
use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

// Local Crate Imports
use crate::{ChainKind, ChainSpec, CompositionBudget, errors::ParseError, parser::parse_chain};

// Chain Specifications ================================================================================================

impl ChainSpec {
    #[must_use]
    pub const fn new(carbon: u32, double_bond: u32, oxidation: u32) -> Self {
        Self {
            carbon,
            double_bond,
            oxidation,
        }
    }
}

impl FromStr for ChainSpec {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_chain(s)
    }
}

impl Display for ChainSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_shorthand(f, self.carbon, self.double_bond, self.oxidation)
    }
}

// Composition Budgets =================================================================================================

impl CompositionBudget {
    #[must_use]
    pub const fn new(total_carbon: u32, total_double_bond: u32, total_oxidation: u32) -> Self {
        Self {
            total_carbon,
            total_double_bond,
            total_oxidation,
        }
    }
}

impl From<ChainSpec> for CompositionBudget {
    fn from(chain: ChainSpec) -> Self {
        Self::new(chain.carbon, chain.double_bond, chain.oxidation)
    }
}

impl<'c> FromIterator<&'c ChainSpec> for CompositionBudget {
    fn from_iter<T: IntoIterator<Item = &'c ChainSpec>>(iter: T) -> Self {
        iter.into_iter().fold(Self::default(), |budget, chain| {
            Self::new(
                budget.total_carbon + chain.carbon,
                budget.total_double_bond + chain.double_bond,
                budget.total_oxidation + chain.oxidation,
            )
        })
    }
}

impl FromStr for CompositionBudget {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_chain(s).map(Self::from)
    }
}

impl Display for CompositionBudget {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_shorthand(
            f,
            self.total_carbon,
            self.total_double_bond,
            self.total_oxidation,
        )
    }
}

// Chain Kinds =========================================================================================================

impl ChainKind {
    /// The shorthand prefix marking how a chain is linked to its backbone (`O-` for ethers, `P-` for plasmalogens)
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Alkyl => "O-",
            Self::Alkenyl => "P-",
            Self::Acyl | Self::Sphingoid => "",
        }
    }
}

// Private Helper Functions ============================================================================================

fn write_shorthand(
    f: &mut Formatter<'_>,
    carbon: u32,
    double_bond: u32,
    oxidation: u32,
) -> fmt::Result {
    write!(f, "{carbon}:{double_bond}")?;
    match oxidation {
        0 => Ok(()),
        1 => write!(f, ";O"),
        n => write!(f, ";O{n}"),
    }
}

// Module Tests ========================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_shorthand() {
        assert_eq!(ChainSpec::new(16, 0, 0).to_string(), "16:0");
        assert_eq!(ChainSpec::new(22, 6, 0).to_string(), "22:6");
        assert_eq!(ChainSpec::new(18, 1, 1).to_string(), "18:1;O");
        assert_eq!(ChainSpec::new(18, 1, 2).to_string(), "18:1;O2");

        for shorthand in ["16:0", "18:1;O", "18:1;O2", "24:0;O3"] {
            assert_eq!(shorthand.parse::<ChainSpec>().unwrap().to_string(), shorthand);
        }
        assert!("16".parse::<ChainSpec>().is_err());
        assert!("16:0;X".parse::<ChainSpec>().is_err());
        assert!("16:0 ".parse::<ChainSpec>().is_err());
    }

    #[test]
    fn budget_totals() {
        let chains = [ChainSpec::new(18, 1, 2), ChainSpec::new(16, 0, 0)];
        let budget: CompositionBudget = chains.iter().collect();
        assert_eq!(budget, CompositionBudget::new(34, 1, 2));
        assert_eq!(budget.to_string(), "34:1;O2");
        assert_eq!("34:1;O2".parse(), Ok(budget));

        let empty: CompositionBudget = std::iter::empty::<&ChainSpec>().collect();
        assert_eq!(empty, CompositionBudget::default());
    }

    #[test]
    fn chain_prefixes() {
        assert_eq!(ChainKind::Acyl.prefix(), "");
        assert_eq!(ChainKind::Alkyl.prefix(), "O-");
        assert_eq!(ChainKind::Alkenyl.prefix(), "P-");
        assert_eq!(ChainKind::Sphingoid.prefix(), "");
    }
}
