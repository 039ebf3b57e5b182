// Standard Library Imports
use std::fmt::{self, Display, Formatter};

// Local Crate Imports
use crate::{AdductIon, ChemicalOffset, IonMode, Massive};

impl AdductIon {
    #[must_use]
    pub fn new(name: impl Into<String>, ion_mode: IonMode, mass_shift: f64) -> Self {
        Self {
            name: name.into(),
            ion_mode,
            mass_shift,
        }
    }

    /// An adduct whose mass shift is the exact mass of a chemical offset, e.g. `NH3+p` for `[M+NH4]+`
    #[must_use]
    pub fn from_offset(name: impl Into<String>, ion_mode: IonMode, offset: &ChemicalOffset) -> Self {
        Self::new(name, ion_mode, offset.monoisotopic_mass())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn ion_mode(&self) -> IonMode {
        self.ion_mode
    }

    #[must_use]
    pub const fn mass_shift(&self) -> f64 {
        self.mass_shift
    }

    /// The mass of the intact molecule that produced a singly-charged precursor with this adduct
    #[must_use]
    pub fn neutral_mass(&self, precursor_mz: f64) -> f64 {
        precursor_mz - self.mass_shift
    }

    #[must_use]
    pub fn precursor_mz(&self, neutral_mass: f64) -> f64 {
        neutral_mass + self.mass_shift
    }
}

impl Display for AdductIon {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Display for IonMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
        })
    }
}

// Module Tests ========================================================================================================

#[cfg(test)]
mod tests {
    use assert_float_eq::assert_float_absolute_eq;

    use crate::mass::PROTON;

    use super::*;

    #[test]
    fn protonated_precursors() {
        let protonated = AdductIon::from_offset("[M+H]+", IonMode::Positive, &"+p".parse().unwrap());
        assert_eq!(protonated.name(), "[M+H]+");
        assert_eq!(protonated.ion_mode(), IonMode::Positive);
        assert_float_absolute_eq!(protonated.mass_shift(), PROTON, 1e-12);

        // PC 16:0/18:1 is C42H82NO8P
        let neutral = "C42H82NO8P".parse::<ChemicalOffset>().unwrap().monoisotopic_mass();
        assert_float_absolute_eq!(neutral, 759.577_8, 1e-4);
        assert_float_absolute_eq!(protonated.precursor_mz(neutral), 760.585_1, 1e-4);
        assert_float_absolute_eq!(protonated.neutral_mass(760.585_1), neutral, 1e-4);
    }

    #[test]
    fn negative_adducts() {
        let deprotonated = AdductIon::from_offset("[M-H]-", IonMode::Negative, &"-p".parse().unwrap());
        assert_float_absolute_eq!(deprotonated.mass_shift(), -PROTON, 1e-12);
        assert_float_absolute_eq!(deprotonated.neutral_mass(700.0), 700.0 + PROTON, 1e-9);
        assert_eq!(deprotonated.to_string(), "[M-H]-");
        assert_eq!(deprotonated.ion_mode().to_string(), "negative");
    }
}
