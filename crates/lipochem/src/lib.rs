//! Exact masses for lipid chains and adducts, plus the chemical offsets that rule files are written in

pub mod adduct;
pub mod chain;
pub mod errors;
pub mod mass;
pub mod offset;
mod parser;

// External Crate Imports
use serde::Serialize;

pub use errors::ParseError;

// NOTE: Types are defined here and their `impl` blocks live in the module named after them, so the shape of the
// whole crate can be read from this one file

// Chains and Compositions =============================================================================================

/// A single acyl, alkyl, alkenyl, or sphingoid chain, written `carbon:double_bond` (plus `;O<n>` when oxidised)
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, Serialize)]
pub struct ChainSpec {
    pub carbon: u32,
    pub double_bond: u32,
    pub oxidation: u32,
}

/// The totals that the chains of one candidate molecule must add up to exactly
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default, Serialize)]
pub struct CompositionBudget {
    pub total_carbon: u32,
    pub total_double_bond: u32,
    pub total_oxidation: u32,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize)]
pub enum ChainKind {
    Acyl,
    Alkyl,
    Alkenyl,
    Sphingoid,
}

/// Which substructure of a chain a fragment's mass is computed from
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize)]
pub enum ChainMass {
    Acyl,
    FattyAcid,
    Alkyl,
    Alkenyl,
    Sphingoid,
}

// Adducts =============================================================================================================

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize)]
pub enum IonMode {
    Positive,
    Negative,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct AdductIon {
    name: String,
    ion_mode: IonMode,
    mass_shift: f64,
}

// Chemical Offsets ====================================================================================================

/// A signed chemical formula like `-H2O+H` or `NH3+p`
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ChemicalOffset {
    groups: Vec<OffsetGroup>,
}

#[derive(Clone, Eq, PartialEq, Debug)]
struct OffsetGroup {
    kind: OffsetKind,
    atoms: Vec<(Atom, Count)>,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum OffsetKind {
    Add,
    Remove,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Atom {
    Element(Element),
    Particle(Particle),
}

type Count = u32;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Element {
    C,
    H,
    N,
    O,
    P,
    S,
    Na,
    K,
    Cl,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Particle {
    Electron,
    Proton,
}

// Traits ==============================================================================================================

pub trait Massive {
    fn monoisotopic_mass(&self) -> f64;
}

impl<T: Massive> Massive for &T {
    fn monoisotopic_mass(&self) -> f64 {
        (**self).monoisotopic_mass()
    }
}
