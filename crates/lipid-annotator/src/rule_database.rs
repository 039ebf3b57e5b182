// Standard Library Imports
use std::collections::{BTreeMap, btree_map, hash_map::Entry};

// External Crate Imports
use ahash::{HashMap, HashMapExt};
use chainsplit::ChainBounds;
use knuffel::{
    Decode, DecodeScalar,
    span::{Span, Spanned},
};
use lipochem::{Massive, ParseError};
use miette::{Diagnostic, LabeledSpan, NamedSource, Result};
use thiserror::Error;

// Local Crate Imports
use crate::{
    AdductIon, ChainDirection, ChainIon, ChainKind, ChainMass, ChainSlot, ChainSpec, ChemicalOffset,
    ClassIon, CompositionBudget, FragmentationRule, IonMode, IonRole, LipidClass, MzAnchor,
    RuleDatabase,
};

// Public API ==========================================================================================================

impl RuleDatabase {
    pub fn from_kdl(file_name: impl AsRef<str>, kdl_text: impl AsRef<str>) -> Result<Self> {
        let parsed_db: RuleDatabaseKdl = knuffel::parse(file_name.as_ref(), kdl_text.as_ref())?;
        parsed_db
            .validate(())
            .map_err(|e| e.finalize(file_name, kdl_text).into())
    }

    /// The rules shipped with this crate, covering the common glycerophospholipid, glycerolipid, sphingolipid, and
    /// sterol ester classes
    pub fn bundled() -> Result<Self> {
        Self::from_kdl("lipid_rules.kdl", BUNDLED_RULES)
    }

    #[must_use]
    pub fn adduct(&self, name: &str) -> Option<&AdductIon> {
        self.adducts.get(name)
    }

    #[must_use]
    pub fn class(&self, name: &str) -> Option<&LipidClass> {
        self.classes.get(name)
    }

    /// Every lipid class, in name order
    pub fn classes(&self) -> impl Iterator<Item = &LipidClass> {
        self.classes.values()
    }
}

impl LipidClass {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The header this class is displayed under, which several classes may share
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Whether chain positions can be swapped without changing the molecule's name
    #[must_use]
    pub const fn interchangeable(&self) -> bool {
        self.interchangeable
    }

    #[must_use]
    pub fn chains(&self) -> &[ChainSlot] {
        &self.chains
    }

    #[must_use]
    pub fn rule(&self, adduct: &str) -> Option<&FragmentationRule> {
        self.rules.get(adduct)
    }
}

impl ChainSlot {
    #[must_use]
    pub const fn kind(&self) -> ChainKind {
        self.kind
    }

    /// The bounds this position takes on when the whole molecule must add up to `budget`
    #[must_use]
    pub fn bounds(&self, budget: CompositionBudget) -> ChainBounds {
        let carbon = self.min_carbon..=self.max_carbon.unwrap_or(budget.total_carbon);
        let double_bond =
            self.min_double_bond..=self.max_double_bond.unwrap_or(budget.total_double_bond);
        let oxidation = self.min_oxidation..=self.max_oxidation;

        self.excluded.iter().fold(
            ChainBounds::new(carbon, double_bond, oxidation),
            |bounds, chain| bounds.exclude(chain.carbon, chain.double_bond),
        )
    }
}

impl FragmentationRule {
    #[must_use]
    pub fn class_ions(&self) -> &[ClassIon] {
        &self.class_ions
    }

    #[must_use]
    pub fn chain_ions(&self) -> &[ChainIon] {
        &self.chain_ions
    }

    /// How many chain queries a split must satisfy, given how many it was tested against
    #[must_use]
    pub fn required_chain_matches(&self, queries: usize) -> usize {
        self.min_chain_matches.unwrap_or(queries)
    }
}

impl ClassIon {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn role(&self) -> &IonRole {
        &self.role
    }

    #[must_use]
    pub fn mz(&self, precursor_mz: f64, neutral_mass: f64) -> f64 {
        self.anchor.resolve(precursor_mz, neutral_mass) + self.offset
    }

    #[must_use]
    pub const fn min_intensity(&self) -> f64 {
        self.min_intensity
    }
}

impl ChainIon {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The 0-based chain position this ion is restricted to, if any
    #[must_use]
    pub const fn position(&self) -> Option<usize> {
        self.position
    }

    #[must_use]
    pub fn mz(&self, chain: &ChainSpec, precursor_mz: f64, neutral_mass: f64) -> f64 {
        let chain_mass = chain.mass(self.mass);
        let base = self.anchor.resolve(precursor_mz, neutral_mass);
        let shifted = match self.direction {
            ChainDirection::Gain => base + chain_mass,
            ChainDirection::Lose => base - chain_mass,
        };
        shifted + self.offset
    }

    #[must_use]
    pub const fn min_intensity(&self) -> f64 {
        self.min_intensity
    }
}

impl MzAnchor {
    #[must_use]
    pub const fn resolve(self, precursor_mz: f64, neutral_mass: f64) -> f64 {
        match self {
            Self::Absolute(mz) => mz,
            Self::Precursor => precursor_mz,
            Self::Neutral => neutral_mass,
        }
    }
}

// Private Constants ===================================================================================================

const BUNDLED_RULES: &str = include_str!("../data/lipid_rules.kdl");

// KDL File Schema =====================================================================================================

#[derive(Debug, Decode)]
#[knuffel(span_type=Span)]
struct RuleDatabaseKdl {
    #[knuffel(child, unwrap(children))]
    adducts: Vec<AdductKdl>,
    #[knuffel(children(name = "class"))]
    classes: Vec<ClassKdl>,
}

// ---------------------------------------------------------------------------------------------------------------------

#[derive(Debug, Decode)]
#[knuffel(span_type=Span)]
struct AdductKdl {
    #[knuffel(span)]
    span: Span,
    #[knuffel(node_name)]
    name: String,
    #[knuffel(property)]
    mode: IonModeKdl,
    #[knuffel(property)]
    shift: OffsetKdl,
}

#[derive(Debug, Decode)]
#[knuffel(span_type=Span)]
struct ClassKdl {
    #[knuffel(span)]
    span: Span,
    #[knuffel(argument)]
    name: String,
    #[knuffel(property(name = "name"))]
    description: Option<String>,
    #[knuffel(property)]
    label: Option<String>,
    #[knuffel(property)]
    interchangeable: Option<bool>,
    #[knuffel(children(name = "chain"))]
    chains: Vec<ChainKdl>,
    #[knuffel(children(name = "rule"))]
    rules: Vec<RuleKdl>,
}

// ---------------------------------------------------------------------------------------------------------------------

#[derive(Debug, Decode)]
#[knuffel(span_type=Span)]
struct ChainKdl {
    #[knuffel(span)]
    span: Span,
    #[knuffel(argument)]
    kind: ChainKindKdl,
    #[knuffel(property(name = "min-carbon"))]
    min_carbon: Option<u32>,
    #[knuffel(property(name = "max-carbon"))]
    max_carbon: Option<u32>,
    #[knuffel(property(name = "min-double-bond"))]
    min_double_bond: Option<u32>,
    #[knuffel(property(name = "max-double-bond"))]
    max_double_bond: Option<u32>,
    #[knuffel(property(name = "min-oxidation"))]
    min_oxidation: Option<u32>,
    #[knuffel(property(name = "max-oxidation"))]
    max_oxidation: Option<u32>,
    #[knuffel(children(name = "exclude"))]
    excluded: Vec<ExcludeKdl>,
}

#[derive(Debug, Decode)]
#[knuffel(span_type=Span)]
struct ExcludeKdl {
    #[knuffel(arguments)]
    chains: Vec<Spanned<String, Span>>,
}

// ---------------------------------------------------------------------------------------------------------------------

#[derive(Debug, Decode)]
#[knuffel(span_type=Span)]
struct RuleKdl {
    #[knuffel(span)]
    span: Span,
    #[knuffel(argument)]
    adduct: String,
    #[knuffel(property(name = "min-chain-matches"))]
    min_chain_matches: Option<u32>,
    #[knuffel(children(name = "diagnostic"))]
    diagnostics: Vec<ClassIonKdl>,
    #[knuffel(children(name = "veto"))]
    vetoes: Vec<ClassIonKdl>,
    #[knuffel(children(name = "chain-ion"))]
    chain_ions: Vec<ChainIonKdl>,
}

#[derive(Debug, Decode)]
#[knuffel(span_type=Span)]
struct ClassIonKdl {
    #[knuffel(span)]
    span: Span,
    #[knuffel(argument)]
    name: String,
    #[knuffel(property)]
    mz: Option<f64>,
    #[knuffel(property)]
    from: Option<ReferenceKdl>,
    #[knuffel(property)]
    offset: Option<OffsetKdl>,
    #[knuffel(property(name = "min-intensity"))]
    min_intensity: Option<f64>,
    #[knuffel(property)]
    group: Option<String>,
}

#[derive(Debug, Decode)]
#[knuffel(span_type=Span)]
struct ChainIonKdl {
    #[knuffel(span)]
    span: Span,
    #[knuffel(argument)]
    name: String,
    #[knuffel(property)]
    from: Option<ReferenceKdl>,
    #[knuffel(property)]
    gain: Option<ChainMassKdl>,
    #[knuffel(property)]
    lose: Option<ChainMassKdl>,
    #[knuffel(property)]
    offset: Option<OffsetKdl>,
    // NOTE: Counted from 1 in rule files, so that it reads like sn-1 / sn-2
    #[knuffel(property)]
    position: Option<u32>,
    #[knuffel(property(name = "min-intensity"))]
    min_intensity: Option<f64>,
}

// ---------------------------------------------------------------------------------------------------------------------

type OffsetKdl = Spanned<String, Span>;

#[derive(Copy, Clone, Debug, DecodeScalar)]
enum IonModeKdl {
    Positive,
    Negative,
}

#[derive(Copy, Clone, Debug, DecodeScalar)]
enum ChainKindKdl {
    Acyl,
    Alkyl,
    Alkenyl,
    Sphingoid,
}

#[derive(Copy, Clone, Debug, DecodeScalar)]
enum ChainMassKdl {
    Acyl,
    FattyAcid,
    Alkyl,
    Alkenyl,
    Sphingoid,
}

#[derive(Copy, Clone, Debug, DecodeScalar)]
enum ReferenceKdl {
    Precursor,
    Neutral,
}

// Contextual Validation Trait =========================================================================================

type RuleResult<T> = Result<T, RuleErrorKind>;

trait ValidateInto<'c, T> {
    type Context: 'c;

    fn validate(self, ctx: Self::Context) -> RuleResult<T>;
}

// Rule Database Validation ============================================================================================

impl ValidateInto<'_, RuleDatabase> for RuleDatabaseKdl {
    type Context = ();

    fn validate(self, _ctx: Self::Context) -> RuleResult<RuleDatabase> {
        let adducts: Adducts = self.adducts.validate(())?;

        let mut classes = BTreeMap::new();
        for class_kdl in self.classes {
            let span = class_kdl.span;
            let class: LipidClass = class_kdl.validate(&adducts)?;

            match classes.entry(class.name.clone()) {
                btree_map::Entry::Occupied(e) => {
                    let (name, (first_defined_at, _)) = e.remove_entry();
                    return Err(RuleErrorKind::DuplicateClass(first_defined_at, span, name));
                }
                btree_map::Entry::Vacant(e) => e.insert((span, class)),
            };
        }

        Ok(RuleDatabase {
            adducts: adducts.into_iter().map(|(k, (_, v))| (k, v)).collect(),
            classes: classes.into_iter().map(|(k, (_, v))| (k, v)).collect(),
        })
    }
}

// Validate Adducts ====================================================================================================

type Adducts = HashMap<String, (Span, AdductIon)>;

impl ValidateInto<'_, Adducts> for Vec<AdductKdl> {
    type Context = ();

    fn validate(self, _ctx: Self::Context) -> RuleResult<Adducts> {
        let mut seen_adducts = HashMap::new();

        for adduct in self {
            let ion_mode = match adduct.mode {
                IonModeKdl::Positive => IonMode::Positive,
                IonModeKdl::Negative => IonMode::Negative,
            };
            let shift: ChemicalOffset = adduct.shift.validate(())?;

            match seen_adducts.entry(adduct.name) {
                Entry::Occupied(e) => {
                    let (name, (first_defined_at, _)) = e.remove_entry();
                    return Err(RuleErrorKind::DuplicateAdduct(
                        first_defined_at,
                        adduct.span,
                        name,
                    ));
                }
                Entry::Vacant(e) => {
                    let ion = AdductIon::from_offset(e.key().clone(), ion_mode, &shift);
                    e.insert((adduct.span, ion))
                }
            };
        }

        Ok(seen_adducts)
    }
}

// Validate Lipid Classes ==============================================================================================

impl<'a> ValidateInto<'a, LipidClass> for ClassKdl {
    type Context = &'a Adducts;

    fn validate(self, ctx: Self::Context) -> RuleResult<LipidClass> {
        let chains: Vec<ChainSlot> = self
            .chains
            .into_iter()
            .map(|c| c.validate(()))
            .collect::<Result<_, _>>()?;

        let interchangeable = self.interchangeable.unwrap_or(false);
        if interchangeable && chains.iter().any(|c| c.kind != chains[0].kind) {
            return Err(RuleErrorKind::MixedInterchangeableChains(
                self.span, self.name,
            ));
        }

        let mut rules = HashMap::new();
        for rule_kdl in self.rules {
            let span = rule_kdl.span;
            let (adduct, rule): RuleEntry = rule_kdl.validate((ctx, chains.len()))?;

            match rules.entry(adduct) {
                Entry::Occupied(e) => {
                    let (adduct, (first_defined_at, _)) = e.remove_entry();
                    return Err(RuleErrorKind::DuplicateRule(first_defined_at, span, adduct));
                }
                Entry::Vacant(e) => e.insert((span, rule)),
            };
        }

        Ok(LipidClass {
            label: self.label.unwrap_or_else(|| self.name.clone()),
            name: self.name,
            description: self.description,
            interchangeable,
            chains,
            rules: rules.into_iter().map(|(k, (_, v))| (k, v)).collect(),
        })
    }
}

// ---------------------------------------------------------------------------------------------------------------------

impl ValidateInto<'_, ChainSlot> for ChainKdl {
    type Context = ();

    fn validate(self, _ctx: Self::Context) -> RuleResult<ChainSlot> {
        let kind = match self.kind {
            ChainKindKdl::Acyl => ChainKind::Acyl,
            ChainKindKdl::Alkyl => ChainKind::Alkyl,
            ChainKindKdl::Alkenyl => ChainKind::Alkenyl,
            ChainKindKdl::Sphingoid => ChainKind::Sphingoid,
        };

        let min_carbon = self.min_carbon.unwrap_or(0);
        let min_double_bond = self.min_double_bond.unwrap_or(0);
        let min_oxidation = self.min_oxidation.unwrap_or(0);
        let max_oxidation = self.max_oxidation.unwrap_or(0);

        let ranges = [
            ("carbon", min_carbon, self.max_carbon),
            ("double-bond", min_double_bond, self.max_double_bond),
            ("oxidation", min_oxidation, Some(max_oxidation)),
        ];
        for (dimension, min, max) in ranges {
            if let Some(max) = max.filter(|&max| min > max) {
                return Err(RuleErrorKind::InvalidBounds(self.span, dimension, min, max));
            }
        }

        let excluded: Vec<ChainSpec> = self
            .excluded
            .into_iter()
            .flat_map(|e| e.chains)
            .map(|chain| {
                chain
                    .parse()
                    .map_err(|e| RuleErrorKind::InvalidChainSpec(*chain.span(), e))
            })
            .collect::<Result<_, _>>()?;

        Ok(ChainSlot {
            kind,
            min_carbon,
            max_carbon: self.max_carbon,
            min_double_bond,
            max_double_bond: self.max_double_bond,
            min_oxidation,
            max_oxidation,
            excluded,
        })
    }
}

// Validate Fragmentation Rules ========================================================================================

type RuleEntry = (String, FragmentationRule);

impl<'a> ValidateInto<'a, RuleEntry> for RuleKdl {
    type Context = (&'a Adducts, usize);

    fn validate(self, (adducts, positions): Self::Context) -> RuleResult<RuleEntry> {
        if !adducts.contains_key(&self.adduct) {
            return Err(RuleErrorKind::UndefinedAdduct(self.span, self.adduct));
        }

        let diagnostics = self.diagnostics.into_iter().map(|d| d.validate(false));
        let vetoes = self.vetoes.into_iter().map(|v| v.validate(true));
        let class_ions: Vec<ClassIon> = diagnostics.chain(vetoes).collect::<Result<_, _>>()?;

        let chain_ions: Vec<ChainIon> = self
            .chain_ions
            .into_iter()
            .map(|c| c.validate(positions))
            .collect::<Result<_, _>>()?;

        // NOTE: Pinned chain ions are tested once per split, the rest once per chain position
        let queries_per_split: usize = chain_ions
            .iter()
            .map(|ion| if ion.position.is_some() { 1 } else { positions })
            .sum();
        let min_chain_matches = self.min_chain_matches.map(|min| min as usize);
        if min_chain_matches == Some(0) && queries_per_split > 0 {
            return Err(RuleErrorKind::ZeroMatchCount(self.span));
        }
        if let Some(min) = min_chain_matches.filter(|&min| min > queries_per_split) {
            return Err(RuleErrorKind::UnreachableMatchCount(
                self.span,
                min,
                queries_per_split,
            ));
        }

        Ok((
            self.adduct,
            FragmentationRule {
                min_chain_matches,
                class_ions,
                chain_ions,
            },
        ))
    }
}

// ---------------------------------------------------------------------------------------------------------------------

impl ValidateInto<'_, ClassIon> for ClassIonKdl {
    // NOTE: Whether or not this ion is a veto
    type Context = bool;

    fn validate(self, is_veto: Self::Context) -> RuleResult<ClassIon> {
        let anchor = match (self.mz, self.from) {
            (Some(mz), None) => MzAnchor::Absolute(mz),
            (None, Some(reference)) => reference.into(),
            (Some(_), Some(_)) => return Err(RuleErrorKind::ConflictingAnchor(self.span, self.name)),
            (None, None) => return Err(RuleErrorKind::MissingAnchor(self.span, self.name)),
        };

        let role = match (is_veto, self.group) {
            (true, Some(_)) => return Err(RuleErrorKind::GroupedVeto(self.span, self.name)),
            (true, None) => IonRole::Veto,
            (false, Some(group)) => IonRole::Group(group),
            (false, None) => IonRole::Required,
        };

        Ok(ClassIon {
            name: self.name,
            role,
            anchor,
            offset: self.offset.validate(())?,
            min_intensity: self.min_intensity.unwrap_or_default(),
        })
    }
}

impl ValidateInto<'_, ChainIon> for ChainIonKdl {
    // NOTE: The number of chain positions in the class
    type Context = usize;

    fn validate(self, positions: Self::Context) -> RuleResult<ChainIon> {
        let (direction, mass) = match (self.gain, self.lose) {
            (Some(mass), None) => (ChainDirection::Gain, mass),
            (None, Some(mass)) => (ChainDirection::Lose, mass),
            (Some(_), Some(_)) => {
                return Err(RuleErrorKind::ConflictingChainMass(self.span, self.name));
            }
            (None, None) => return Err(RuleErrorKind::MissingChainMass(self.span, self.name)),
        };

        let position = match self.position.map(|p| p as usize) {
            Some(position) if (1..=positions).contains(&position) => Some(position - 1),
            Some(position) => {
                return Err(RuleErrorKind::PositionOutOfRange(
                    self.span, position, positions,
                ));
            }
            None => None,
        };

        Ok(ChainIon {
            name: self.name,
            anchor: self.from.map_or(MzAnchor::Absolute(0.0), MzAnchor::from),
            direction,
            mass: mass.into(),
            offset: self.offset.validate(())?,
            position,
            min_intensity: self.min_intensity.unwrap_or_default(),
        })
    }
}

// ---------------------------------------------------------------------------------------------------------------------

impl ValidateInto<'_, ChemicalOffset> for OffsetKdl {
    type Context = ();

    fn validate(self, _ctx: Self::Context) -> RuleResult<ChemicalOffset> {
        ChemicalOffset::new(&*self).map_err(|e| RuleErrorKind::Offset(*self.span(), e))
    }
}

impl ValidateInto<'_, f64> for Option<OffsetKdl> {
    type Context = ();

    fn validate(self, ctx: Self::Context) -> RuleResult<f64> {
        self.map_or(Ok(0.0), |offset| {
            offset
                .validate(ctx)
                .map(|o: ChemicalOffset| o.monoisotopic_mass())
        })
    }
}

// Infallible Conversions ==============================================================================================

impl From<ReferenceKdl> for MzAnchor {
    fn from(value: ReferenceKdl) -> Self {
        match value {
            ReferenceKdl::Precursor => Self::Precursor,
            ReferenceKdl::Neutral => Self::Neutral,
        }
    }
}

impl From<ChainMassKdl> for ChainMass {
    fn from(value: ChainMassKdl) -> Self {
        match value {
            ChainMassKdl::Acyl => Self::Acyl,
            ChainMassKdl::FattyAcid => Self::FattyAcid,
            ChainMassKdl::Alkyl => Self::Alkyl,
            ChainMassKdl::Alkenyl => Self::Alkenyl,
            ChainMassKdl::Sphingoid => Self::Sphingoid,
        }
    }
}

// Validation Error Types and Trait Implementations ====================================================================

#[derive(Debug, Error)]
#[error("failed to validate lipid rule database")]
struct RuleError {
    kdl: NamedSource<String>,
    #[source]
    kind: RuleErrorKind,
}

// NOTE: This is manually implemented because the list of labels is dynamic and needs to be extracted from `self.kind`
impl Diagnostic for RuleError {
    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.kdl)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(self.kind.labels().into_iter().map(|(s, l)| {
            LabeledSpan::new_with_span(Some(l.to_owned()), *s)
        })))
    }

    fn diagnostic_source(&self) -> Option<&dyn Diagnostic> {
        Some(&self.kind)
    }
}

#[derive(Clone, Debug, Diagnostic, Error)]
enum RuleErrorKind {
    #[error("the adduct {2:?} has already been defined")]
    #[diagnostic(help("remove the duplicate adduct, or give it a new name"))]
    DuplicateAdduct(Span, Span, String),

    #[error("the lipid class {2:?} has already been defined")]
    #[diagnostic(help("merge the rules of both definitions into a single class"))]
    DuplicateClass(Span, Span, String),

    #[error("a rule for the adduct {2:?} has already been defined for this class")]
    #[diagnostic(help("merge the ions of both rules into a single rule"))]
    DuplicateRule(Span, Span, String),

    #[error("the adduct {1:?} is undefined")]
    #[diagnostic(help("double-check for typos, or add {1:?} to the adducts section"))]
    UndefinedAdduct(Span, String),

    #[error("the ion {1:?} has no m/z")]
    #[diagnostic(help("give the ion either an absolute mz=..., or measure it from=\"precursor\" / from=\"neutral\""))]
    MissingAnchor(Span, String),

    #[error("the ion {1:?} has both an absolute m/z and a reference mass")]
    #[diagnostic(help("remove either the mz=... or the from=... property"))]
    ConflictingAnchor(Span, String),

    #[error("the chain ion {1:?} neither gains nor loses a chain")]
    #[diagnostic(help("add either a gain=... or a lose=... property"))]
    MissingChainMass(Span, String),

    #[error("the chain ion {1:?} both gains and loses a chain")]
    #[diagnostic(help("remove either the gain=... or the lose=... property"))]
    ConflictingChainMass(Span, String),

    #[error("chain position {1} does not exist in a class with {2} chain{}", if *.2 == 1 { "" } else { "s" })]
    #[diagnostic(help("chain positions are counted from 1"))]
    PositionOutOfRange(Span, usize, usize),

    #[error("the minimum {1} {2} is greater than the maximum {3}")]
    #[diagnostic(help("swap the minimum and maximum, or widen the range"))]
    InvalidBounds(Span, &'static str, u32, u32),

    #[error("the chains of the interchangeable class {1:?} are not all of the same kind")]
    #[diagnostic(help("only chains of the same kind can be swapped, so mark this class interchangeable=false"))]
    MixedInterchangeableChains(Span, String),

    #[error("at least {1} chain matches are required, but each split is only tested against {2} chain quer{}", if *.2 == 1 { "y" } else { "ies" })]
    #[diagnostic(help("lower min-chain-matches, or add more chain ions"))]
    UnreachableMatchCount(Span, usize, usize),

    #[error("a rule with chain ions must require at least one chain match")]
    #[diagnostic(help("raise min-chain-matches to 1 or more, or leave it unset to require every chain query"))]
    ZeroMatchCount(Span),

    #[error("the veto {1:?} cannot belong to a group")]
    #[diagnostic(help("vetoes reject a class on their own, so remove the group=... property"))]
    GroupedVeto(Span, String),

    #[error("lipid rule database contained an invalid chain")]
    InvalidChainSpec(
        Span,
        #[source]
        #[diagnostic_source]
        ParseError,
    ),

    #[error("lipid rule database contained an invalid chemical offset")]
    Offset(
        Span,
        #[source]
        #[diagnostic_source]
        ParseError,
    ),
}

impl RuleErrorKind {
    fn labels(&self) -> Vec<(&Span, &'static str)> {
        match self {
            Self::DuplicateAdduct(s1, s2, _)
            | Self::DuplicateClass(s1, s2, _)
            | Self::DuplicateRule(s1, s2, _) => {
                vec![(s1, "first defined here"), (s2, "then again here")]
            }
            Self::UndefinedAdduct(s, _) => vec![(s, "undefined adduct")],
            Self::MissingAnchor(s, _) => vec![(s, "no m/z")],
            Self::ConflictingAnchor(s, _) => vec![(s, "conflicting m/z")],
            Self::MissingChainMass(s, _) => vec![(s, "no chain mass")],
            Self::ConflictingChainMass(s, _) => vec![(s, "conflicting chain masses")],
            Self::PositionOutOfRange(s, _, _) => vec![(s, "position out of range")],
            Self::InvalidBounds(s, _, _, _) => vec![(s, "empty range")],
            Self::MixedInterchangeableChains(s, _) => vec![(s, "mixed chain kinds")],
            Self::UnreachableMatchCount(s, _, _) => vec![(s, "can never match")],
            Self::ZeroMatchCount(s) => vec![(s, "accepts every split")],
            Self::GroupedVeto(s, _) => vec![(s, "grouped veto")],
            Self::InvalidChainSpec(s, _) => vec![(s, "invalid chain")],
            Self::Offset(s, _) => vec![(s, "invalid chemical offset")],
        }
    }

    fn finalize(self, file_name: impl AsRef<str>, kdl: impl AsRef<str>) -> RuleError {
        let kdl = NamedSource::new(file_name, kdl.as_ref().to_owned());
        RuleError { kdl, kind: self }
    }
}

// Module Tests ========================================================================================================

#[cfg(test)]
mod tests {
    use assert_float_eq::assert_float_absolute_eq;
    use indoc::indoc;
    use insta::assert_snapshot;
    use once_cell::sync::Lazy;

    use crate::testing_tools::render_diagnostic;

    use super::*;

    static BUNDLED: Lazy<RuleDatabase> = Lazy::new(|| RuleDatabase::bundled().unwrap());

    const ADDUCTS: &str = indoc! {r#"
        adducts {
            "[M+H]+" mode="positive" shift="+p"
            "[M-H]-" mode="negative" shift="-p"
        }
    "#};

    fn load(classes: &str) -> miette::Result<RuleDatabase> {
        let kdl = format!("{ADDUCTS}{classes}");
        RuleDatabase::from_kdl("test", kdl)
    }

    fn load_error(classes: &str) -> String {
        let kdl = format!("{ADDUCTS}{classes}");
        let error = RuleDatabase::from_kdl("test", &kdl).unwrap_err();
        render_diagnostic(&kdl, error.as_ref())
    }

    #[test]
    fn bundled_rules_load() {
        let db = &*BUNDLED;
        for class in [
            "CE", "CL", "Cer", "DG", "EtherPC", "EtherPE", "LPC", "PC", "PE", "PG", "PI", "PS", "SM", "TG",
        ] {
            assert!(db.class(class).is_some(), "missing class {class}");
        }
        let names: Vec<_> = db.classes().map(LipidClass::name).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);

        let pc = db.class("PC").unwrap();
        assert_eq!(pc.label(), "PC");
        assert_eq!(pc.description(), Some("Phosphatidylcholine"));
        assert!(pc.interchangeable());
        assert_eq!(pc.chains().len(), 2);
        assert!(pc.rule("[M+H]+").is_some());
        assert!(pc.rule("[M-H]-").is_none());

        let ether_pe = db.class("EtherPE").unwrap();
        assert_eq!(ether_pe.label(), "PE");
        assert!(!ether_pe.interchangeable());
        assert_eq!(ether_pe.chains()[0].kind(), ChainKind::Alkenyl);
    }

    #[test]
    fn bundled_adducts() {
        let db = &*BUNDLED;
        let expected = [
            ("[M+H]+", IonMode::Positive, 1.007_276),
            ("[M+NH4]+", IonMode::Positive, 18.033_826),
            ("[M+Na]+", IonMode::Positive, 22.989_221),
            ("[M-H]-", IonMode::Negative, -1.007_276),
            ("[M+HCOO]-", IonMode::Negative, 44.998_201),
            ("[M+CH3COO]-", IonMode::Negative, 59.013_851),
        ];
        for (name, mode, shift) in expected {
            let adduct = db.adduct(name).unwrap();
            assert_eq!(adduct.name(), name);
            assert_eq!(adduct.ion_mode(), mode);
            assert_float_absolute_eq!(adduct.mass_shift(), shift, 1e-5);
        }
        assert!(db.adduct("[M+K]+").is_none());
    }

    #[test]
    fn chain_ion_masses() {
        let db = &*BUNDLED;
        let rule = db.class("PC").unwrap().rule("[M+H]+").unwrap();
        let ketene_loss = &rule.chain_ions()[0];
        let palmitoyl = ChainSpec::new(16, 0, 0);
        let oleoyl = ChainSpec::new(18, 1, 0);
        assert_float_absolute_eq!(ketene_loss.mz(&palmitoyl, 760.5851, 759.5778), 522.3554, 1e-3);
        assert_float_absolute_eq!(ketene_loss.mz(&oleoyl, 760.5851, 759.5778), 496.3398, 1e-3);

        let class_ion = &rule.class_ions()[0];
        assert_eq!(class_ion.role(), &IonRole::Required);
        assert_float_absolute_eq!(class_ion.mz(760.5851, 759.5778), 184.07332, 1e-6);
    }

    #[test]
    fn chain_slot_bounds() {
        let db = load(indoc! {r#"
            class "SM" {
                chain "sphingoid" min-carbon=16 max-carbon=20 max-double-bond=2 min-oxidation=2 max-oxidation=3
                chain "acyl" min-carbon=12 {
                    exclude "18:4" "20:5"
                }
            }
        "#})
        .unwrap();
        let chains = db.class("SM").unwrap().chains();
        let budget = CompositionBudget::new(34, 1, 2);

        let sphingoid = chains[0].bounds(budget);
        assert_eq!(sphingoid.carbon(), &(16..=20));
        assert_eq!(sphingoid.double_bond(), &(0..=2));
        assert_eq!(sphingoid.oxidation(), &(2..=3));

        let acyl = chains[1].bounds(budget);
        assert_eq!(acyl.carbon(), &(12..=34));
        assert_eq!(acyl.double_bond(), &(0..=1));
        assert_eq!(acyl.oxidation(), &(0..=0));
        assert!(acyl.is_excluded(18, 4));
        assert!(acyl.is_excluded(20, 5));
        assert!(!acyl.is_excluded(18, 1));
    }

    #[test]
    fn class_ion_roles() {
        let db = load(indoc! {r#"
            class "PE" {
                rule "[M-H]-" {
                    diagnostic "headgroup" mz=140.0118 min-intensity=5.0 group="head"
                    diagnostic "glycerophosphate" mz=196.038 group="head"
                    diagnostic "precursor" from="precursor"
                    veto "choline" from="neutral" offset="CH3" min-intensity=10.0
                }
            }
        "#})
        .unwrap();
        let rule = db.class("PE").unwrap().rule("[M-H]-").unwrap();
        let roles: Vec<_> = rule.class_ions().iter().map(ClassIon::role).collect();
        assert_eq!(
            roles,
            [
                &IonRole::Group("head".to_owned()),
                &IonRole::Group("head".to_owned()),
                &IonRole::Required,
                &IonRole::Veto,
            ]
        );

        let veto = &rule.class_ions()[3];
        assert_eq!(veto.name(), "choline");
        assert_float_absolute_eq!(veto.min_intensity(), 10.0);
        assert_float_absolute_eq!(veto.mz(700.0, 701.0), 716.023_475, 1e-5);
        assert_float_absolute_eq!(rule.class_ions()[1].min_intensity(), 0.0);
        assert_eq!(rule.required_chain_matches(4), 4);
    }

    #[test]
    fn duplicate_definitions() {
        assert_snapshot!(load_error(indoc! {r#"
            class "PC"
            class "PE"
            class "PC"
        "#}), @r#"
        failed to validate lipid rule database
        the lipid class "PC" has already been defined
        help: merge the rules of both definitions into a single class
        [first defined here] class "PC"
        [then again here] class "PC"
        "#);

        assert_snapshot!(load_error(indoc! {r#"
            class "PC" {
                rule "[M+H]+"
                rule "[M+H]+"
            }
        "#}), @r#"
        failed to validate lipid rule database
        a rule for the adduct "[M+H]+" has already been defined for this class
        help: merge the ions of both rules into a single rule
        [first defined here] rule "[M+H]+"
        [then again here] rule "[M+H]+"
        "#);

        let kdl = indoc! {r#"
            adducts {
                "[M+H]+" mode="positive" shift="+p"
                "[M+H]+" mode="positive" shift="H"
            }
        "#};
        let error = RuleDatabase::from_kdl("test", kdl).unwrap_err();
        assert_snapshot!(render_diagnostic(kdl, error.as_ref()), @r#"
        failed to validate lipid rule database
        the adduct "[M+H]+" has already been defined
        help: remove the duplicate adduct, or give it a new name
        [first defined here] "[M+H]+" mode="positive" shift="+p"
        [then again here] "[M+H]+" mode="positive" shift="H"
        "#);
    }

    #[test]
    fn undefined_adduct() {
        assert_snapshot!(load_error(indoc! {r#"
            class "PC" {
                rule "[M+K]+"
            }
        "#}), @r#"
        failed to validate lipid rule database
        the adduct "[M+K]+" is undefined
        help: double-check for typos, or add "[M+K]+" to the adducts section
        [undefined adduct] rule "[M+K]+"
        "#);
    }

    #[test]
    fn invalid_anchors() {
        assert_snapshot!(load_error(indoc! {r#"
            class "PC" {
                rule "[M+H]+" {
                    diagnostic "headgroup" min-intensity=3.0
                }
            }
        "#}), @r#"
        failed to validate lipid rule database
        the ion "headgroup" has no m/z
        help: give the ion either an absolute mz=..., or measure it from="precursor" / from="neutral"
        [no m/z] diagnostic "headgroup" min-intensity=3.0
        "#);

        assert_snapshot!(load_error(indoc! {r#"
            class "PC" {
                rule "[M+H]+" {
                    veto "headgroup" mz=184.07332 from="precursor"
                }
            }
        "#}), @r#"
        failed to validate lipid rule database
        the ion "headgroup" has both an absolute m/z and a reference mass
        help: remove either the mz=... or the from=... property
        [conflicting m/z] veto "headgroup" mz=184.07332 from="precursor"
        "#);

        assert_snapshot!(load_error(indoc! {r#"
            class "PC" {
                rule "[M+H]+" {
                    veto "headgroup" mz=184.07332 group="head"
                }
            }
        "#}), @r#"
        failed to validate lipid rule database
        the veto "headgroup" cannot belong to a group
        help: vetoes reject a class on their own, so remove the group=... property
        [grouped veto] veto "headgroup" mz=184.07332 group="head"
        "#);
    }

    #[test]
    fn invalid_chain_ions() {
        assert_snapshot!(load_error(indoc! {r#"
            class "PC" {
                chain "acyl"
                chain "acyl"
                rule "[M+H]+" {
                    chain-ion "ketene loss" from="precursor" offset="H"
                }
            }
        "#}), @r#"
        failed to validate lipid rule database
        the chain ion "ketene loss" neither gains nor loses a chain
        help: add either a gain=... or a lose=... property
        [no chain mass] chain-ion "ketene loss" from="precursor" offset="H"
        "#);

        assert_snapshot!(load_error(indoc! {r#"
            class "PC" {
                chain "acyl"
                chain "acyl"
                rule "[M+H]+" {
                    chain-ion "ketene loss" gain="acyl" lose="acyl"
                }
            }
        "#}), @r#"
        failed to validate lipid rule database
        the chain ion "ketene loss" both gains and loses a chain
        help: remove either the gain=... or the lose=... property
        [conflicting chain masses] chain-ion "ketene loss" gain="acyl" lose="acyl"
        "#);

        assert_snapshot!(load_error(indoc! {r#"
            class "LPC" {
                chain "acyl"
                rule "[M+H]+" {
                    chain-ion "acylium" gain="acyl" position=2
                }
            }
        "#}), @r#"
        failed to validate lipid rule database
        chain position 2 does not exist in a class with 1 chain
        help: chain positions are counted from 1
        [position out of range] chain-ion "acylium" gain="acyl" position=2
        "#);

        assert_snapshot!(load_error(indoc! {r#"
            class "PC" {
                chain "acyl"
                chain "acyl"
                rule "[M+H]+" min-chain-matches=4 {
                    chain-ion "acylium" gain="acyl" position=1
                    chain-ion "ketene loss" from="precursor" lose="acyl" offset="+H"
                }
            }
        "#}), @r#"
        failed to validate lipid rule database
        at least 4 chain matches are required, but each split is only tested against 3 chain queries
        help: lower min-chain-matches, or add more chain ions
        [can never match] rule "[M+H]+" min-chain-matches=4 {
        "#);

        assert_snapshot!(load_error(indoc! {r#"
            class "PC" {
                chain "acyl"
                chain "acyl"
                rule "[M+H]+" min-chain-matches=0 {
                    chain-ion "acylium" gain="acyl"
                }
            }
        "#}), @r#"
        failed to validate lipid rule database
        a rule with chain ions must require at least one chain match
        help: raise min-chain-matches to 1 or more, or leave it unset to require every chain query
        [accepts every split] rule "[M+H]+" min-chain-matches=0 {
        "#);
    }

    #[test]
    fn invalid_chains() {
        assert_snapshot!(load_error(indoc! {r#"
            class "PC" {
                chain "acyl" min-carbon=24 max-carbon=10
            }
        "#}), @r#"
        failed to validate lipid rule database
        the minimum carbon 24 is greater than the maximum 10
        help: swap the minimum and maximum, or widen the range
        [empty range] chain "acyl" min-carbon=24 max-carbon=10
        "#);

        assert_snapshot!(load_error(indoc! {r#"
            class "SM" {
                chain "sphingoid" min-oxidation=2
            }
        "#}), @r#"
        failed to validate lipid rule database
        the minimum oxidation 2 is greater than the maximum 0
        help: swap the minimum and maximum, or widen the range
        [empty range] chain "sphingoid" min-oxidation=2
        "#);

        assert_snapshot!(load_error(indoc! {r#"
            class "PE" interchangeable=true {
                chain "alkenyl"
                chain "acyl"
            }
        "#}), @r#"
        failed to validate lipid rule database
        the chains of the interchangeable class "PE" are not all of the same kind
        help: only chains of the same kind can be swapped, so mark this class interchangeable=false
        [mixed chain kinds] class "PE" interchangeable=true {
        "#);

        assert_snapshot!(load_error(indoc! {r#"
            class "PC" {
                chain "acyl" {
                    exclude "18:4" "20-5"
                }
            }
        "#}), @r#"
        failed to validate lipid rule database
        lipid rule database contained an invalid chain
        failed to parse chain "20-5": expected a ':' between the carbon and double-bond counts
        [invalid chain] "20-5"
        "#);
    }

    #[test]
    fn invalid_offsets() {
        assert_snapshot!(load_error(indoc! {r#"
            class "PC" {
                rule "[M+H]+" {
                    diagnostic "headgroup loss" from="precursor" offset="-C5H14NO4Xe"
                }
            }
        "#}), @r#"
        failed to validate lipid rule database
        lipid rule database contained an invalid chemical offset
        failed to parse chemical offset "-C5H14NO4Xe": the element "Xe" is not known
        help: the known elements are C, H, N, O, P, S, Na, K, and Cl
        [invalid chemical offset] "-C5H14NO4Xe"
        "#);
    }

    #[test]
    fn knuffel_errors_surface() {
        let kdl = indoc! {r#"
            adducts {
                "[M+H]+" mode="sideways" shift="+p"
            }
        "#};
        assert!(RuleDatabase::from_kdl("test", kdl).is_err());

        let kdl = indoc! {r#"
            adducts {
            }
            class "PC" {
                chain "acyl" min-carbon=-2
            }
        "#};
        assert!(RuleDatabase::from_kdl("test", kdl).is_err());
    }
}
