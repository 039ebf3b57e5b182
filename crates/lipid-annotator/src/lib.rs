//! Rule-driven structural annotation of lipid MS/MS spectra
//!
//! A [`RuleDatabase`] describes, for every lipid class and adduct, which fragment ions prove the class and which
//! fragment ions pin down its individual chains. An [`Annotator`] interprets those rules against an observed
//! [`Spectrum`] for one precursor at a time, returning an [`AnnotationResult`] or nothing at all.

mod dispatcher;
mod evaluator;
mod naming;
mod rule_database;
mod selector;

#[cfg(test)]
mod testing_tools;

// Standard Library Imports
use std::collections::BTreeMap;

// External Crate Imports
use ahash::HashMap;
use derive_more::Constructor;
use serde::Serialize;

pub use lipochem::{
    AdductIon, ChainKind, ChainMass, ChainSpec, ChemicalOffset, CompositionBudget, IonMode,
};
pub use sifter::{DiagnosticQuery, MatchSummary, Peak, Spectrum};

pub use naming::canonicalize;
pub use selector::{ranked, select};

// Rule Database =======================================================================================================

/// Every adduct and lipid class known to the annotator, validated from a KDL rule file
#[derive(Clone, PartialEq, Debug)]
pub struct RuleDatabase {
    adducts: HashMap<String, AdductIon>,
    classes: BTreeMap<String, LipidClass>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct LipidClass {
    name: String,
    label: String,
    description: Option<String>,
    interchangeable: bool,
    chains: Vec<ChainSlot>,
    rules: HashMap<String, FragmentationRule>,
}

/// The kind and allowed composition of one chain position of a lipid class
///
/// Maximums left unset are only limited by the composition being annotated.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ChainSlot {
    kind: ChainKind,
    min_carbon: u32,
    max_carbon: Option<u32>,
    min_double_bond: u32,
    max_double_bond: Option<u32>,
    min_oxidation: u32,
    max_oxidation: u32,
    excluded: Vec<ChainSpec>,
}

/// The fragments expected from one lipid class under one adduct
#[derive(Clone, PartialEq, Debug)]
pub struct FragmentationRule {
    min_chain_matches: Option<usize>,
    class_ions: Vec<ClassIon>,
    chain_ions: Vec<ChainIon>,
}

/// A fragment whose presence (or absence) decides whether a spectrum belongs to a lipid class at all
#[derive(Clone, PartialEq, Debug)]
pub struct ClassIon {
    name: String,
    role: IonRole,
    anchor: MzAnchor,
    offset: f64,
    min_intensity: f64,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum IonRole {
    Required,
    /// At least one ion of each named group must be found
    Group(String),
    /// Finding this ion rules the class out
    Veto,
}

/// What a fragment's m/z is measured from
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum MzAnchor {
    Absolute(f64),
    Precursor,
    Neutral,
}

/// A fragment whose m/z depends on the composition of a single chain
#[derive(Clone, PartialEq, Debug)]
pub struct ChainIon {
    name: String,
    anchor: MzAnchor,
    direction: ChainDirection,
    mass: ChainMass,
    offset: f64,
    position: Option<usize>,
    min_intensity: f64,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ChainDirection {
    Gain,
    Lose,
}

// Annotation ==========================================================================================================

/// Interprets a [`RuleDatabase`] against spectra, one precursor and lipid class at a time
#[derive(Copy, Clone, Debug)]
pub struct Annotator<'r> {
    database: &'r RuleDatabase,
}

/// Everything known about a precursor before its MS/MS spectrum is consulted
#[derive(Copy, Clone, PartialEq, Debug, Constructor)]
pub struct PrecursorQuery<'a> {
    precursor_mz: f64,
    budget: CompositionBudget,
    adduct: &'a AdductIon,
    ms2_tolerance: f64,
}

/// One independent unit of work for [`Annotator::par_annotate()`]
#[derive(Copy, Clone, Debug, Constructor)]
pub struct AnnotationJob<'a> {
    lipid_class: &'a str,
    query: PrecursorQuery<'a>,
    spectrum: &'a Spectrum,
}

/// A chain split that the spectrum supports, with chains already in canonical order
#[derive(Clone, PartialEq, Debug)]
pub struct Candidate<'r> {
    lipid_class: &'r str,
    chains: Vec<ChainSpec>,
    matched_fragment_count: usize,
    mean_matched_intensity: f64,
}

/// The outcome of evaluating one rule: the class ions that were found, plus every chain split that was accepted
#[derive(Clone, PartialEq, Debug)]
pub struct Evidence<'r> {
    lipid_class: &'r LipidClass,
    class_matches: MatchSummary,
    candidates: Vec<Candidate<'r>>,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize)]
pub enum ConfidenceLevel {
    ClassOnly = 1,
    ChainResolved = 2,
    MultiChainResolved = 3,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct AnnotationResult {
    lipid_class: String,
    total_composition: CompositionBudget,
    chains: Option<Vec<ChainSpec>>,
    confidence: ConfidenceLevel,
    total_name: String,
    canonical_name: String,
    score: f64,
    matched_fragments: usize,
    adduct: String,
    precursor_mz: f64,
}
