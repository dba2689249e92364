use crate::confidence::Confidence;

/// Provenance of an attributed edge's authorship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceType {
    Human,
    AiClaude,
    AiGpt,
    AiOther,
    System,
    Import,
    Unknown,
}

const CODE_HUMAN: u16 = 0;
const CODE_AI_CLAUDE: u16 = 1;
const CODE_AI_GPT: u16 = 2;
const CODE_AI_OTHER: u16 = 3;
const CODE_SYSTEM: u16 = 4;
const CODE_IMPORT: u16 = 5;
const CODE_UNKNOWN: u16 = 6;

impl SourceType {
    pub fn from_code(code: u16) -> Self {
        match code {
            CODE_HUMAN => Self::Human,
            CODE_AI_CLAUDE => Self::AiClaude,
            CODE_AI_GPT => Self::AiGpt,
            CODE_AI_OTHER => Self::AiOther,
            CODE_SYSTEM => Self::System,
            CODE_IMPORT => Self::Import,
            _ => Self::Unknown,
        }
    }

    pub fn code(self) -> u16 {
        match self {
            Self::Human => CODE_HUMAN,
            Self::AiClaude => CODE_AI_CLAUDE,
            Self::AiGpt => CODE_AI_GPT,
            Self::AiOther => CODE_AI_OTHER,
            Self::System => CODE_SYSTEM,
            Self::Import => CODE_IMPORT,
            Self::Unknown => CODE_UNKNOWN,
        }
    }

    /// Default confidence for an edge authored by this source: 1.0 for a
    /// human, 0.85 for anything AI-authored.
    pub fn default_confidence(self) -> Confidence {
        match self {
            Self::AiClaude | Self::AiGpt | Self::AiOther => Confidence::AI_DEFAULT,
            _ => Confidence::MAX,
        }
    }
}
