//! Algerian wilayas (provinces), used as the checkout address field.

use core::fmt;

/// Names in official code order: index 0 is wilaya 01 (Adrar).
const NAMES: [&str; 48] = [
    "Adrar",
    "Chlef",
    "Laghouat",
    "Oum El Bouaghi",
    "Batna",
    "Béjaïa",
    "Biskra",
    "Béchar",
    "Blida",
    "Bouira",
    "Tamanrasset",
    "Tébessa",
    "Tlemcen",
    "Tiaret",
    "Tizi Ouzou",
    "Algiers",
    "Djelfa",
    "Jijel",
    "Sétif",
    "Saïda",
    "Skikda",
    "Sidi Bel Abbès",
    "Annaba",
    "Guelma",
    "Constantine",
    "Médéa",
    "Mostaganem",
    "MSila",
    "Mascara",
    "Ouargla",
    "Oran",
    "El Bayadh",
    "Illizi",
    "Bordj Bou Arréridj",
    "Boumerdès",
    "El Tarf",
    "Tindouf",
    "Tissemsilt",
    "El Oued",
    "Khenchela",
    "Souk Ahras",
    "Tipaza",
    "Mila",
    "Aïn Defla",
    "Naâma",
    "Aïn Témouchent",
    "Ghardaïa",
    "Relizane",
];

/// Error returned when a submitted state is not one of the 48 wilayas.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown wilaya: {0:?}")]
pub struct WilayaError(pub String);

/// One of the 48 wilayas.
///
/// ```
/// use robo_shop_core::Wilaya;
///
/// let oran = Wilaya::parse("Oran").unwrap();
/// assert_eq!(oran.code(), 31);
/// assert_eq!(Wilaya::all().count(), 48);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Wilaya {
    index: usize,
}

impl Wilaya {
    /// Iterate over all wilayas in code order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..NAMES.len()).map(|index| Self { index })
    }

    /// Look up a wilaya by its exact name (surrounding whitespace ignored).
    ///
    /// # Errors
    ///
    /// Returns `WilayaError` if the name is not in the list.
    pub fn parse(name: &str) -> Result<Self, WilayaError> {
        let name = name.trim();
        NAMES
            .iter()
            .position(|candidate| *candidate == name)
            .map(|index| Self { index })
            .ok_or_else(|| WilayaError(name.to_owned()))
    }

    /// The wilaya's name as stored on a payment.
    #[must_use]
    pub fn name(&self) -> &'static str {
        NAMES.get(self.index).copied().unwrap_or_default()
    }

    /// Official numeric code (1-48).
    #[must_use]
    pub const fn code(&self) -> usize {
        self.index + 1
    }
}

impl fmt::Display for Wilaya {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_first_and_last() {
        assert_eq!(Wilaya::parse("Adrar").unwrap().code(), 1);
        assert_eq!(Wilaya::parse("Relizane").unwrap().code(), 48);
    }

    #[test]
    fn test_accented_names() {
        assert_eq!(Wilaya::parse(" Béjaïa ").unwrap().name(), "Béjaïa");
    }

    #[test]
    fn test_unknown() {
        assert!(Wilaya::parse("Paris").is_err());
        assert!(Wilaya::parse("").is_err());
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = Wilaya::all().map(|w| w.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 48);
    }
}
