//! Tolerance-window matching of theoretical fragment m/z values against a centroided MS/MS spectrum

mod matching;
mod spectrum;

// External Crate Imports
use derive_more::Constructor;
use serde::{Deserialize, Serialize};

// Public API ==========================================================================================================

#[derive(Copy, Clone, PartialEq, Debug, Constructor, Serialize, Deserialize)]
pub struct Peak {
    mz: f64,
    intensity: f64,
}

/// The centroided peaks of one MS/MS scan, kept in the order they were acquired
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Spectrum(Vec<Peak>);

/// A fragment m/z expected in a spectrum, along with the intensity a peak must exceed to count as evidence
#[derive(Copy, Clone, PartialEq, Debug, Constructor)]
pub struct DiagnosticQuery {
    mz: f64,
    min_intensity: f64,
}

#[derive(Copy, Clone, PartialEq, Debug, Default, Serialize)]
pub struct MatchSummary {
    found: usize,
    mean_intensity: f64,
    queries: usize,
}
