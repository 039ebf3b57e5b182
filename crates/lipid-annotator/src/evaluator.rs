// Standard Library Imports
use std::collections::BTreeMap;

// External Crate Imports
use chainsplit::ChainEnumerator;
use tracing::{debug, trace};

// Local Crate Imports
use crate::{
    Candidate, ChainSpec, DiagnosticQuery, Evidence, FragmentationRule, IonRole, LipidClass,
    MatchSummary, PrecursorQuery, Spectrum,
};

// Public API ==========================================================================================================

impl FragmentationRule {
    /// Tests this rule's class ions against `spectrum`, then every chain split of the query's budget against its
    /// chain ions
    ///
    /// Returns `None` when the class ions rule the class out, or when a rule without class ions finds no chain
    /// fragments either. Otherwise the [`Evidence`] holds every split the spectrum supports, which may be none at all.
    #[cfg_attr(
        feature = "instrumentation",
        tracing::instrument(level = "trace", skip_all, fields(class = %class.name()))
    )]
    pub fn evaluate<'r>(
        &self,
        class: &'r LipidClass,
        query: &PrecursorQuery<'_>,
        spectrum: &Spectrum,
    ) -> Option<Evidence<'r>> {
        let anchors = Anchors::new(query);
        let class_matches = self.match_class_ions(class, &anchors, query, spectrum)?;

        // NOTE: Several interchangeable chains can't be told apart without chain ions, but a lone chain can only
        // ever be the whole budget
        let positions = class.chains.len();
        if positions == 0 || (positions > 1 && self.chain_ions.is_empty()) {
            return Self::class_evidence(class, class_matches, Vec::new());
        }

        let bounds = class
            .chains
            .iter()
            .map(|slot| slot.bounds(query.budget))
            .collect();
        let enumerator = ChainEnumerator::new(query.budget, bounds);

        let candidates = enumerator
            .splits()
            .filter_map(|chains| {
                let queries = self.chain_queries(&chains, &anchors);
                let summary = spectrum.count_matches(&queries, query.ms2_tolerance);
                if summary.found() < self.required_chain_matches(queries.len()) {
                    return None;
                }

                trace!(
                    class = class.name(),
                    ?chains,
                    found = summary.found(),
                    mean_intensity = summary.mean_intensity(),
                    "accepted chain split"
                );
                Some(Candidate {
                    lipid_class: class.name(),
                    chains: class.canonical_order(chains),
                    matched_fragment_count: summary.found(),
                    mean_matched_intensity: summary.mean_intensity(),
                })
            })
            .collect();

        Self::class_evidence(class, class_matches, candidates)
    }
}

impl<'r> Evidence<'r> {
    #[must_use]
    pub const fn lipid_class(&self) -> &'r LipidClass {
        self.lipid_class
    }

    /// How many of the (non-veto) class ions were found, and how intense they were
    #[must_use]
    pub const fn class_matches(&self) -> MatchSummary {
        self.class_matches
    }

    #[must_use]
    pub fn candidates(&self) -> &[Candidate<'r>] {
        &self.candidates
    }
}

impl Candidate<'_> {
    #[must_use]
    pub fn lipid_class(&self) -> &str {
        self.lipid_class
    }

    #[must_use]
    pub fn chains(&self) -> &[ChainSpec] {
        &self.chains
    }

    #[must_use]
    pub const fn matched_fragment_count(&self) -> usize {
        self.matched_fragment_count
    }

    #[must_use]
    pub const fn mean_matched_intensity(&self) -> f64 {
        self.mean_matched_intensity
    }
}

// Private Types =======================================================================================================

/// The two masses that fragment m/z values are measured from
struct Anchors {
    precursor_mz: f64,
    neutral_mass: f64,
}

impl Anchors {
    fn new(query: &PrecursorQuery<'_>) -> Self {
        Self {
            precursor_mz: query.precursor_mz,
            neutral_mass: query.adduct.neutral_mass(query.precursor_mz),
        }
    }
}

// Private Helper Methods ==============================================================================================

impl<'r> Evidence<'r> {
    const fn new(
        lipid_class: &'r LipidClass,
        class_matches: MatchSummary,
        candidates: Vec<Candidate<'r>>,
    ) -> Self {
        Self {
            lipid_class,
            class_matches,
            candidates,
        }
    }
}

impl FragmentationRule {
    // NOTE: Without any class ions, the only evidence for a class is a chain fragment that was actually found
    fn class_evidence<'r>(
        class: &'r LipidClass,
        class_matches: MatchSummary,
        candidates: Vec<Candidate<'r>>,
    ) -> Option<Evidence<'r>> {
        let chain_found = candidates.iter().any(|c| c.matched_fragment_count > 0);
        if class_matches.queries() == 0 && !chain_found {
            debug!(class = class.name(), "no class ions to test and no chain fragments found");
            return None;
        }

        Some(Evidence::new(class, class_matches, candidates))
    }

    fn match_class_ions(
        &self,
        class: &LipidClass,
        anchors: &Anchors,
        query: &PrecursorQuery<'_>,
        spectrum: &Spectrum,
    ) -> Option<MatchSummary> {
        let tolerance = query.ms2_tolerance;
        let mut groups: BTreeMap<&str, bool> = BTreeMap::new();
        let mut queries = Vec::new();

        for ion in &self.class_ions {
            let mz = ion.mz(anchors.precursor_mz, anchors.neutral_mass);
            let found = spectrum.fragment_exists(mz, tolerance, ion.min_intensity);

            match &ion.role {
                IonRole::Required if !found => {
                    debug!(class = class.name(), ion = ion.name(), mz, "required class ion not found");
                    return None;
                }
                IonRole::Veto if found => {
                    debug!(class = class.name(), ion = ion.name(), mz, "class vetoed");
                    return None;
                }
                IonRole::Veto => continue,
                IonRole::Group(group) => *groups.entry(group).or_default() |= found,
                IonRole::Required => (),
            }
            queries.push(DiagnosticQuery::new(mz, ion.min_intensity));
        }

        if let Some((group, _)) = groups.iter().find(|&(_, &found)| !found) {
            debug!(class = class.name(), group, "no class ion of group found");
            return None;
        }

        Some(spectrum.count_matches(&queries, tolerance))
    }

    fn chain_queries(&self, chains: &[ChainSpec], anchors: &Anchors) -> Vec<DiagnosticQuery> {
        self.chain_ions
            .iter()
            .flat_map(|ion| {
                chains
                    .iter()
                    .enumerate()
                    .filter(move |&(position, _)| ion.position.is_none_or(|pinned| pinned == position))
                    .map(move |(_, chain)| {
                        let mz = ion.mz(chain, anchors.precursor_mz, anchors.neutral_mass);
                        DiagnosticQuery::new(mz, ion.min_intensity)
                    })
            })
            .collect()
    }
}

// Module Tests ========================================================================================================
