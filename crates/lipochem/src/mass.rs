//! Monoisotopic masses of elements, particles, and the lipid substructures built from them
//!
//! Every chain formula here is a closed-form function of the chain's carbon and double-bond counts. The functions are
//! total over non-negative inputs: a chain like `0:1` gives a chemically meaningless (but finite) mass, and it's up
//! to the caller's bounds never to ask for one.

// Standard Library Imports
use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

// Local Crate Imports
use crate::{ChainMass, ChainSpec, Element, Massive, Particle, errors::ParseErrorKind};

// Atomic Constants ====================================================================================================

pub const CARBON: f64 = 12.0;
pub const HYDROGEN: f64 = 1.007_825_032_23;
pub const NITROGEN: f64 = 14.003_074_004_43;
pub const OXYGEN: f64 = 15.994_914_619_57;
pub const PHOSPHORUS: f64 = 30.973_761_998_42;
pub const SULFUR: f64 = 31.972_071_174_4;
pub const SODIUM: f64 = 22.989_769_282;
pub const POTASSIUM: f64 = 38.963_706_486_4;
pub const CHLORINE: f64 = 34.968_852_682;

pub const ELECTRON: f64 = 0.000_548_579_909_065;
pub const PROTON: f64 = 1.007_276_466_621;

// Chain Masses ========================================================================================================

/// The acyl group `R-C(=O)-` of a fatty acid: C(c) H(2c-2d-1) O
#[must_use]
pub fn acyl_chain_mass(carbon: u32, double_bond: u32) -> f64 {
    formula_mass(carbon, hydrogens(carbon, double_bond) - 1, 0, 1)
}

/// The deprotonated fatty acid `[FA-H]-`: C(c) H(2c-2d-1) O2, plus the electron carrying its charge
#[must_use]
pub fn fatty_acyl_product_ion_mass(carbon: u32, double_bond: u32) -> f64 {
    formula_mass(carbon, hydrogens(carbon, double_bond) - 1, 0, 2) + ELECTRON
}

/// The neutral dihydroxy sphingoid base: C(c) H(2c-2d+3) N O2
#[must_use]
pub fn sphingoid_chain_mass(carbon: u32, double_bond: u32) -> f64 {
    formula_mass(carbon, hydrogens(carbon, double_bond) + 3, 1, 2)
}

/// The ether-linked alkyl group `R-`: C(c) H(2c-2d+1)
#[must_use]
pub fn alkyl_chain_mass(carbon: u32, double_bond: u32) -> f64 {
    formula_mass(carbon, hydrogens(carbon, double_bond) + 1, 0, 0)
}

impl ChainSpec {
    /// The mass of this chain's `kind` substructure, with one extra oxygen per oxidation
    ///
    /// Sphingoid bases are the exception: their oxidation counts *all* hydroxyls, including the two already present
    /// in the dihydroxy base formula.
    #[must_use]
    pub fn mass(&self, kind: ChainMass) -> f64 {
        let &Self {
            carbon,
            double_bond,
            oxidation,
        } = self;
        let extra_oxygens = f64::from(oxidation) * OXYGEN;

        match kind {
            ChainMass::Acyl => acyl_chain_mass(carbon, double_bond) + extra_oxygens,
            ChainMass::FattyAcid => fatty_acyl_product_ion_mass(carbon, double_bond) + extra_oxygens,
            ChainMass::Alkyl => alkyl_chain_mass(carbon, double_bond) + extra_oxygens,
            // NOTE: The vinyl-ether double bond of a plasmalogen isn't counted in its shorthand name
            ChainMass::Alkenyl => alkyl_chain_mass(carbon, double_bond + 1) + extra_oxygens,
            ChainMass::Sphingoid => sphingoid_chain_mass(carbon, double_bond) + extra_oxygens - 2.0 * OXYGEN,
        }
    }
}

// Elements and Particles ==============================================================================================

impl Element {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::C => "C",
            Self::H => "H",
            Self::N => "N",
            Self::O => "O",
            Self::P => "P",
            Self::S => "S",
            Self::Na => "Na",
            Self::K => "K",
            Self::Cl => "Cl",
        }
    }
}

impl Massive for Element {
    fn monoisotopic_mass(&self) -> f64 {
        match self {
            Self::C => CARBON,
            Self::H => HYDROGEN,
            Self::N => NITROGEN,
            Self::O => OXYGEN,
            Self::P => PHOSPHORUS,
            Self::S => SULFUR,
            Self::Na => SODIUM,
            Self::K => POTASSIUM,
            Self::Cl => CHLORINE,
        }
    }
}

impl FromStr for Element {
    type Err = ParseErrorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "C" => Self::C,
            "H" => Self::H,
            "N" => Self::N,
            "O" => Self::O,
            "P" => Self::P,
            "S" => Self::S,
            "Na" => Self::Na,
            "K" => Self::K,
            "Cl" => Self::Cl,
            _ => return Err(ParseErrorKind::UnknownElement(s.to_owned())),
        })
    }
}

impl Display for Element {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl Particle {
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Electron => 'e',
            Self::Proton => 'p',
        }
    }

    pub(crate) fn from_symbol(symbol: char) -> Result<Self, ParseErrorKind> {
        match symbol {
            'e' => Ok(Self::Electron),
            'p' => Ok(Self::Proton),
            _ => Err(ParseErrorKind::UnknownParticle(symbol)),
        }
    }
}

impl Massive for Particle {
    fn monoisotopic_mass(&self) -> f64 {
        match self {
            Self::Electron => ELECTRON,
            Self::Proton => PROTON,
        }
    }
}

impl Display for Particle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

// Private Helper Functions ============================================================================================

fn hydrogens(carbon: u32, double_bond: u32) -> i64 {
    2 * i64::from(carbon) - 2 * i64::from(double_bond)
}

// NOTE: Hydrogen counts can go negative for nonsensical chains, so everything here is signed
fn formula_mass(carbon: u32, hydrogen: i64, nitrogen: i64, oxygen: i64) -> f64 {
    f64::from(carbon) * CARBON
        + hydrogen as f64 * HYDROGEN
        + nitrogen as f64 * NITROGEN
        + oxygen as f64 * OXYGEN
}

// Module Tests ========================================================================================================
