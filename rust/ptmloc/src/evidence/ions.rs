use serde::{
    Deserialize,
    Serialize,
};
use std::fmt::Display;
use std::str::FromStr;

pub const NUM_ION_TYPES: usize = 6;

/// Refers to what terminus of the peptide a fragment ion retains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IonSeriesTerminality {
    NTerm,
    CTerm,
}

/// Backbone fragment ion series used as localization evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IonType {
    A,
    B,
    C,
    X,
    Y,
    Z,
}

impl IonType {
    pub const ALL: [IonType; NUM_ION_TYPES] = [
        IonType::A,
        IonType::B,
        IonType::C,
        IonType::X,
        IonType::Y,
        IonType::Z,
    ];

    /// Slot of the ion type in arrays indexed by ion type.
    pub const fn index(&self) -> usize {
        match self {
            IonType::A => 0,
            IonType::B => 1,
            IonType::C => 2,
            IonType::X => 3,
            IonType::Y => 4,
            IonType::Z => 5,
        }
    }

    pub const fn terminality(&self) -> IonSeriesTerminality {
        match self {
            IonType::A | IonType::B | IonType::C => IonSeriesTerminality::NTerm,
            IonType::X | IonType::Y | IonType::Z => IonSeriesTerminality::CTerm,
        }
    }

    pub const fn as_char(&self) -> char {
        match self {
            IonType::A => 'a',
            IonType::B => 'b',
            IonType::C => 'c',
            IonType::X => 'x',
            IonType::Y => 'y',
            IonType::Z => 'z',
        }
    }

    /// Sequence position of the bond an ion of this series breaks.
    ///
    /// N-terminal ions are indexed by their ordinal, C-terminal ones by
    /// `sequence_length - ordinal`. So `b3` and `y5` of an 8-mer both land on
    /// position 3. Only ordinals within `1..sequence_length` are valid.
    pub fn position(&self, ordinal: usize, sequence_length: usize) -> Option<usize> {
        if ordinal == 0 || ordinal >= sequence_length {
            return None;
        }
        match self.terminality() {
            IonSeriesTerminality::NTerm => Some(ordinal),
            IonSeriesTerminality::CTerm => Some(sequence_length - ordinal),
        }
    }
}

impl Display for IonType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for IonType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "a" | "A" => Ok(IonType::A),
            "b" | "B" => Ok(IonType::B),
            "c" | "C" => Ok(IonType::C),
            "x" | "X" => Ok(IonType::X),
            "y" | "Y" => Ok(IonType::Y),
            "z" | "Z" => Ok(IonType::Z),
            other => Err(format!("Unsupported ion type: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_are_dense() {
        for (i, ion) in IonType::ALL.iter().enumerate() {
            assert_eq!(ion.index(), i);
        }
    }

    #[test]
    fn test_position_mapping() {
        assert_eq!(IonType::B.position(3, 8), Some(3));
        assert_eq!(IonType::Y.position(5, 8), Some(3));
        assert_eq!(IonType::Z.position(1, 8), Some(7));
        assert_eq!(IonType::A.position(0, 8), None);
        assert_eq!(IonType::Y.position(8, 8), None);
    }

    #[test]
    fn test_parse() {
        assert_eq!("y".parse::<IonType>(), Ok(IonType::Y));
        assert!("w".parse::<IonType>().is_err());
    }
}
