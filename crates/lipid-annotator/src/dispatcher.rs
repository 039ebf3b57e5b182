// External Crate Imports
use rayon::prelude::*;
use tracing::debug;

// Local Crate Imports
use crate::{
    AdductIon, AnnotationJob, AnnotationResult, Annotator, ChainSpec, CompositionBudget,
    ConfidenceLevel, Evidence, PrecursorQuery, RuleDatabase, Spectrum,
};

// Public API ==========================================================================================================

impl<'r> Annotator<'r> {
    #[must_use]
    pub const fn new(database: &'r RuleDatabase) -> Self {
        Self { database }
    }

    /// Annotates a precursor as a member of `lipid_class`, if its spectrum supports that at all
    ///
    /// Returns `None` when the spectrum is empty, when the class is unknown or has no rule for the query's adduct,
    /// when the query's adduct has the opposite polarity to the adduct of the same name in the rule database, or
    /// when the class ions of the rule aren't satisfied.
    #[cfg_attr(
        feature = "instrumentation",
        tracing::instrument(level = "trace", skip_all, fields(lipid_class = %lipid_class, adduct = %query.adduct))
    )]
    #[must_use]
    pub fn annotate(
        &self,
        lipid_class: &str,
        query: &PrecursorQuery<'_>,
        spectrum: &Spectrum,
    ) -> Option<AnnotationResult> {
        if spectrum.is_empty() {
            debug!(lipid_class, "empty spectrum");
            return None;
        }

        let Some(class) = self.database.class(lipid_class) else {
            debug!(lipid_class, "unknown lipid class");
            return None;
        };

        let adduct = query.adduct;
        let Some(rule) = class.rule(adduct.name()) else {
            debug!(lipid_class, %adduct, "no rule for adduct");
            return None;
        };

        if let Some(known) = self.database.adduct(adduct.name()) {
            if known.ion_mode() != adduct.ion_mode() {
                debug!(
                    lipid_class,
                    %adduct,
                    expected = %known.ion_mode(),
                    "adduct polarity mismatch"
                );
                return None;
            }
        }

        let evidence = rule.evaluate(class, query, spectrum)?;
        Some(AnnotationResult::from_evidence(&evidence, query))
    }

    /// Annotates a precursor as every class with a rule for its adduct, in class-name order
    #[must_use]
    pub fn annotate_all(
        &self,
        query: &PrecursorQuery<'_>,
        spectrum: &Spectrum,
    ) -> Vec<AnnotationResult> {
        self.database
            .classes()
            .filter(|class| class.rule(query.adduct.name()).is_some())
            .filter_map(|class| self.annotate(class.name(), query, spectrum))
            .collect()
    }

    /// Runs independent annotations in parallel, returning their results in the order of `jobs`
    #[must_use]
    pub fn par_annotate(&self, jobs: &[AnnotationJob<'_>]) -> Vec<Option<AnnotationResult>> {
        jobs.par_iter()
            .map(|job| self.annotate(job.lipid_class, &job.query, job.spectrum))
            .collect()
    }

    #[must_use]
    pub const fn database(&self) -> &'r RuleDatabase {
        self.database
    }
}

impl<'a> PrecursorQuery<'a> {
    #[must_use]
    pub const fn precursor_mz(&self) -> f64 {
        self.precursor_mz
    }

    #[must_use]
    pub const fn budget(&self) -> CompositionBudget {
        self.budget
    }

    #[must_use]
    pub const fn adduct(&self) -> &'a AdductIon {
        self.adduct
    }

    #[must_use]
    pub const fn ms2_tolerance(&self) -> f64 {
        self.ms2_tolerance
    }
}

impl AnnotationResult {
    #[must_use]
    pub fn lipid_class(&self) -> &str {
        &self.lipid_class
    }

    #[must_use]
    pub const fn total_composition(&self) -> CompositionBudget {
        self.total_composition
    }

    /// The chains in canonical order, or `None` if only the class could be identified
    #[must_use]
    pub fn chains(&self) -> Option<&[ChainSpec]> {
        self.chains.as_deref()
    }

    #[must_use]
    pub const fn confidence(&self) -> ConfidenceLevel {
        self.confidence
    }

    #[must_use]
    pub fn total_name(&self) -> &str {
        &self.total_name
    }

    #[must_use]
    pub fn canonical_name(&self) -> &str {
        &self.canonical_name
    }

    /// The mean intensity of the chain fragments behind the chosen chains, or of the class fragments when no chains
    /// were resolved
    ///
    /// A lone chain that was resolved without testing any chain fragments is scored by its class fragments too.
    #[must_use]
    pub const fn score(&self) -> f64 {
        self.score
    }

    #[must_use]
    pub const fn matched_fragments(&self) -> usize {
        self.matched_fragments
    }

    #[must_use]
    pub fn adduct(&self) -> &str {
        &self.adduct
    }

    #[must_use]
    pub const fn precursor_mz(&self) -> f64 {
        self.precursor_mz
    }
}

impl ConfidenceLevel {
    #[must_use]
    pub const fn level(self) -> u8 {
        self as u8
    }
}

// Private Helper Methods ==============================================================================================

impl AnnotationResult {
    fn from_evidence(evidence: &Evidence<'_>, query: &PrecursorQuery<'_>) -> Self {
        let class = evidence.lipid_class();
        let class_matches = evidence.class_matches();
        let total_name = class.total_name(query.budget);

        let (chains, confidence, canonical_name, score, matched_fragments) =
            if let Some(candidate) = evidence.select() {
                let chains = candidate.chains().to_vec();
                let confidence = if chains.len() >= 3 {
                    ConfidenceLevel::MultiChainResolved
                } else {
                    ConfidenceLevel::ChainResolved
                };
                (
                    Some(chains),
                    confidence,
                    class.canonical_name(candidate.chains()),
                    if candidate.matched_fragment_count() == 0 {
                        class_matches.mean_intensity()
                    } else {
                        candidate.mean_matched_intensity()
                    },
                    class_matches.found() + candidate.matched_fragment_count(),
                )
            } else {
                (
                    None,
                    ConfidenceLevel::ClassOnly,
                    total_name.clone(),
                    class_matches.mean_intensity(),
                    class_matches.found(),
                )
            };

        Self {
            lipid_class: class.name().to_owned(),
            total_composition: query.budget,
            chains,
            confidence,
            total_name,
            canonical_name,
            score,
            matched_fragments,
            adduct: query.adduct.name().to_owned(),
            precursor_mz: query.precursor_mz,
        }
    }
}

// Module Tests ========================================================================================================
