/// A 16-bit relationship tag.
///
/// The first five codes are the kinds the system names explicitly; any
/// other code round-trips losslessly as [`RelType::Opaque`] rather than
/// being rejected, so a journal written by a newer build with additional
/// kinds still decodes on an older one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelType {
    Implements,
    References,
    DependsOn,
    Augments,
    Custom,
    Opaque(u16),
}

const CODE_IMPLEMENTS: u16 = 1;
const CODE_REFERENCES: u16 = 2;
const CODE_DEPENDS_ON: u16 = 3;
const CODE_AUGMENTS: u16 = 4;
const CODE_CUSTOM: u16 = 5;

impl RelType {
    pub fn from_code(code: u16) -> Self {
        match code {
            CODE_IMPLEMENTS => Self::Implements,
            CODE_REFERENCES => Self::References,
            CODE_DEPENDS_ON => Self::DependsOn,
            CODE_AUGMENTS => Self::Augments,
            CODE_CUSTOM => Self::Custom,
            other => Self::Opaque(other),
        }
    }

    pub fn code(self) -> u16 {
        match self {
            Self::Implements => CODE_IMPLEMENTS,
            Self::References => CODE_REFERENCES,
            Self::DependsOn => CODE_DEPENDS_ON,
            Self::Augments => CODE_AUGMENTS,
            Self::Custom => CODE_CUSTOM,
            Self::Opaque(code) => code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_kinds_round_trip_by_code() {
        for kind in [
            RelType::Implements,
            RelType::References,
            RelType::DependsOn,
            RelType::Augments,
            RelType::Custom,
        ] {
            assert_eq!(RelType::from_code(kind.code()), kind);
        }
    }

    #[test]
    fn unrecognized_code_round_trips_as_opaque() {
        let kind = RelType::from_code(9999);
        assert_eq!(kind, RelType::Opaque(9999));
        assert_eq!(kind.code(), 9999);
    }
}
