// Standard Library Imports
use std::slice;

// Local Crate Imports
use crate::{Peak, Spectrum};

// Public API ==========================================================================================================

impl Peak {
    #[must_use]
    pub fn mz(&self) -> f64 {
        self.mz
    }

    #[must_use]
    pub fn intensity(&self) -> f64 {
        self.intensity
    }
}

impl Spectrum {
    #[must_use]
    pub const fn new(peaks: Vec<Peak>) -> Self {
        Self(peaks)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> slice::Iter<'_, Peak> {
        self.0.iter()
    }
}

impl FromIterator<Peak> for Spectrum {
    fn from_iter<T: IntoIterator<Item = Peak>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromIterator<(f64, f64)> for Spectrum {
    fn from_iter<T: IntoIterator<Item = (f64, f64)>>(iter: T) -> Self {
        iter.into_iter()
            .map(|(mz, intensity)| Peak::new(mz, intensity))
            .collect()
    }
}

impl<'s> IntoIterator for &'s Spectrum {
    type Item = &'s Peak;
    type IntoIter = slice::Iter<'s, Peak>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// Module Tests ========================================================================================================

#[cfg(test)]
mod tests {
    use assert_float_eq::assert_float_absolute_eq;

    use super::*;

    #[test]
    fn peak_getters() {
        let peak = Peak::new(184.073_3, 1e4);
        assert_float_absolute_eq!(peak.mz(), 184.073_3);
        assert_float_absolute_eq!(peak.intensity(), 1e4);
    }

    #[test]
    fn spectrum_from_pairs() {
        let spectrum: Spectrum = [(184.073_3, 100.0), (104.107, 12.5)].into_iter().collect();
        assert_eq!(spectrum.len(), 2);
        assert!(!spectrum.is_empty());
        // Acquisition order is preserved
        let mzs: Vec<_> = spectrum.iter().map(Peak::mz).collect();
        assert_eq!(mzs, vec![184.073_3, 104.107]);

        assert!(Spectrum::default().is_empty());
        assert_eq!(Spectrum::new(Vec::new()), Spectrum::default());
    }
}
