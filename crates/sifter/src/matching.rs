// Local Crate Imports
use crate::{DiagnosticQuery, MatchSummary, Peak, Spectrum};

// Public API ==========================================================================================================

impl Spectrum {
    /// The first peak (in acquisition order) strictly inside `mz ± tolerance` and strictly above `min_intensity`
    #[must_use]
    pub fn find_peak(&self, mz: f64, tolerance: f64, min_intensity: f64) -> Option<&Peak> {
        let query = DiagnosticQuery::new(mz, min_intensity);
        self.iter().find(|peak| query.is_matched_by(peak, tolerance))
    }

    #[must_use]
    pub fn fragment_exists(&self, mz: f64, tolerance: f64, min_intensity: f64) -> bool {
        self.find_peak(mz, tolerance, min_intensity).is_some()
    }

    /// Runs every query against this spectrum, counting each query at most once
    ///
    /// Queries don't claim peaks, so two queries landing on the same peak both count. The mean intensity is divided
    /// by the number of queries issued, not the number found, so a candidate that explains more of its expected
    /// fragments scores higher.
    pub fn count_matches<'q>(
        &self,
        queries: impl IntoIterator<Item = &'q DiagnosticQuery>,
        tolerance: f64,
    ) -> MatchSummary {
        let (queries, found, total_intensity) =
            queries
                .into_iter()
                .fold((0, 0, 0.0), |(queries, found, total), query| {
                    match self.find_peak(query.mz, tolerance, query.min_intensity) {
                        Some(peak) => (queries + 1, found + 1, total + peak.intensity()),
                        None => (queries + 1, found, total),
                    }
                });
        MatchSummary::from_totals(found, total_intensity, queries)
    }
}

impl DiagnosticQuery {
    #[must_use]
    pub fn mz(&self) -> f64 {
        self.mz
    }

    #[must_use]
    pub fn min_intensity(&self) -> f64 {
        self.min_intensity
    }

    #[must_use]
    pub fn is_matched_by(&self, peak: &Peak, tolerance: f64) -> bool {
        // NOTE: Both window edges are exclusive, as is the intensity floor
        self.mz - tolerance < peak.mz()
            && peak.mz() < self.mz + tolerance
            && peak.intensity() > self.min_intensity
    }
}

impl MatchSummary {
    #[must_use]
    pub fn found(&self) -> usize {
        self.found
    }

    #[must_use]
    pub fn mean_intensity(&self) -> f64 {
        self.mean_intensity
    }

    #[must_use]
    pub fn queries(&self) -> usize {
        self.queries
    }

    #[must_use]
    pub fn all_found(&self) -> bool {
        self.found == self.queries
    }

    fn from_totals(found: usize, total_intensity: f64, queries: usize) -> Self {
        let mean_intensity = if queries == 0 {
            0.0
        } else {
            total_intensity / queries as f64
        };
        Self {
            found,
            mean_intensity,
            queries,
        }
    }
}

// Module Tests ========================================================================================================
