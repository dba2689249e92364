/// An organizing tag partitioning attributed edges by purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lane {
    Default,
    Architecture,
    Testing,
    Refactor,
    Analysis,
    Custom,
}

const CODE_DEFAULT: u16 = 0;
const CODE_ARCHITECTURE: u16 = 1;
const CODE_TESTING: u16 = 2;
const CODE_REFACTOR: u16 = 3;
const CODE_ANALYSIS: u16 = 4;
const CODE_CUSTOM: u16 = 5;

impl Lane {
    pub fn from_code(code: u16) -> Self {
        match code {
            CODE_DEFAULT => Self::Default,
            CODE_ARCHITECTURE => Self::Architecture,
            CODE_TESTING => Self::Testing,
            CODE_REFACTOR => Self::Refactor,
            CODE_ANALYSIS => Self::Analysis,
            _ => Self::Custom,
        }
    }

    pub fn code(self) -> u16 {
        match self {
            Self::Default => CODE_DEFAULT,
            Self::Architecture => CODE_ARCHITECTURE,
            Self::Testing => CODE_TESTING,
            Self::Refactor => CODE_REFACTOR,
            Self::Analysis => CODE_ANALYSIS,
            Self::Custom => CODE_CUSTOM,
        }
    }
}

impl Default for Lane {
    fn default() -> Self {
        Self::Default
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_lanes_round_trip_by_code() {
        for lane in [
            Lane::Default,
            Lane::Architecture,
            Lane::Testing,
            Lane::Refactor,
            Lane::Analysis,
            Lane::Custom,
        ] {
            assert_eq!(Lane::from_code(lane.code()), lane);
        }
    }

    #[test]
    fn unrecognized_code_collapses_to_custom() {
        assert_eq!(Lane::from_code(77), Lane::Custom);
    }

    #[test]
    fn default_lane_is_default_variant() {
        assert_eq!(Lane::default(), Lane::Default);
    }
}
