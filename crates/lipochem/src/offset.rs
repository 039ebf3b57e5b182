// Standard Library Imports
use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

// Local Crate Imports
use crate::{
    Atom, ChemicalOffset, Massive, OffsetGroup, OffsetKind, errors::ParseError,
    parser::parse_offset,
};

// Public API ==========================================================================================================

impl ChemicalOffset {
    /// Parses an offset like `-H2O+H`, where each signed group is either a chemical formula or a counted particle
    /// (`p` for a proton, `e` for an electron). A missing leading sign means the first group is added.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] labelling the first unparsable character of `offset`.
    pub fn new(offset: impl AsRef<str>) -> Result<Self, ParseError> {
        parse_offset(offset.as_ref()).map(|groups| Self { groups })
    }
}

impl FromStr for ChemicalOffset {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Massive for ChemicalOffset {
    fn monoisotopic_mass(&self) -> f64 {
        self.groups.iter().map(Massive::monoisotopic_mass).sum()
    }
}

impl Display for ChemicalOffset {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (index, group) in self.groups.iter().enumerate() {
            match group.kind {
                OffsetKind::Remove => write!(f, "-")?,
                OffsetKind::Add if index > 0 => write!(f, "+")?,
                OffsetKind::Add => (),
            }
            for &(atom, count) in &group.atoms {
                match (atom, count) {
                    (Atom::Element(element), 1) => write!(f, "{element}")?,
                    (Atom::Element(element), n) => write!(f, "{element}{n}")?,
                    (Atom::Particle(particle), 1) => write!(f, "{particle}")?,
                    (Atom::Particle(particle), n) => write!(f, "{n}{particle}")?,
                }
            }
        }
        Ok(())
    }
}

// Private Implementations =============================================================================================

impl Massive for OffsetGroup {
    fn monoisotopic_mass(&self) -> f64 {
        let mass: f64 = self
            .atoms
            .iter()
            .map(|&(atom, count)| atom.monoisotopic_mass() * f64::from(count))
            .sum();
        match self.kind {
            OffsetKind::Add => mass,
            OffsetKind::Remove => -mass,
        }
    }
}

impl Massive for Atom {
    fn monoisotopic_mass(&self) -> f64 {
        match self {
            Self::Element(element) => element.monoisotopic_mass(),
            Self::Particle(particle) => particle.monoisotopic_mass(),
        }
    }
}

// Module Tests ========================================================================================================

#[cfg(test)]
mod tests {
    use assert_float_eq::assert_float_absolute_eq;
    use insta::assert_snapshot;

    use crate::mass::{ELECTRON, HYDROGEN, OXYGEN, PROTON};

    use super::*;

    fn mass(offset: &str) -> f64 {
        ChemicalOffset::new(offset).unwrap().monoisotopic_mass()
    }

    #[test]
    fn offset_masses() {
        assert_float_absolute_eq!(mass("p"), PROTON, 1e-12);
        assert_float_absolute_eq!(mass("+p"), PROTON, 1e-12);
        assert_float_absolute_eq!(mass("-p"), -PROTON, 1e-12);
        assert_float_absolute_eq!(mass("-H2O"), -(2.0 * HYDROGEN + OXYGEN), 1e-9);
        assert_float_absolute_eq!(mass("-H2O+H"), -OXYGEN - HYDROGEN, 1e-9);
        assert_float_absolute_eq!(mass("2e"), 2.0 * ELECTRON, 1e-12);
        // Ammonium, sodium, and formate adduct shifts
        assert_float_absolute_eq!(mass("NH3+p"), 18.033_83, 1e-5);
        assert_float_absolute_eq!(mass("Na-e"), 22.989_22, 1e-5);
        assert_float_absolute_eq!(mass("CHO2+e"), 44.998_20, 1e-5);
        // Phosphocholine headgroup ion
        assert_float_absolute_eq!(mass("C5H14NO4P+p"), 184.073_3, 1e-4);
    }

    #[test]
    fn display_offsets() {
        let display = |offset: &str| ChemicalOffset::new(offset).unwrap().to_string();
        assert_eq!(display("-H2O+H"), "-H2O+H");
        assert_eq!(display("+p"), "p");
        assert_eq!(display("2e"), "2e");
        assert_eq!(display("NH3+p"), "NH3+p");
        assert_eq!(display("-C5H14NO4P"), "-C5H14NO4P");
        assert_eq!(display("+1H"), "H");
    }

    #[test]
    fn invalid_offsets() {
        let error = |offset: &str| ChemicalOffset::new(offset).unwrap_err().to_string();
        assert_snapshot!(error("-H2Xe"), @r#"failed to parse chemical offset "-H2Xe": the element "Xe" is not known"#);
        assert_snapshot!(error("NH03"), @r#"failed to parse chemical offset "NH03": counts cannot start with 0"#);
        assert_snapshot!(error("H2O)"), @r#"failed to parse chemical offset "H2O)": could not interpret the full input"#);
        assert_snapshot!(error("+q"), @r#"failed to parse chemical offset "+q": the particle 'q' is not known"#);
        assert!("".parse::<ChemicalOffset>().is_err());
    }
}
