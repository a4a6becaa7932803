//! Effect commands and their classification per sound source

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ChipgridError, Result};

/// Sound source a track is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SoundSource {
    #[default]
    Fm,
    Ssg,
    Drum,
    Adpcm,
}

/// Two-character effect code as typed into the effect column (e.g. `0B`, `T1`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EffectId([u8; 2]);

impl EffectId {
    pub const POSITION_JUMP: EffectId = EffectId(*b"0B");
    pub const SONG_END: EffectId = EffectId(*b"0C");
    pub const PATTERN_BREAK: EffectId = EffectId(*b"0D");

    pub fn as_bytes(&self) -> &[u8; 2] {
        &self.0
    }

    fn chars(&self) -> [char; 2] {
        [char::from(self.0[0]), char::from(self.0[1])]
    }
}

impl FromStr for EffectId {
    type Err = ChipgridError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 || !bytes.iter().all(u8::is_ascii_alphanumeric) {
            return Err(ChipgridError::InvalidEffectId(s.to_string()));
        }
        Ok(Self([
            bytes[0].to_ascii_uppercase(),
            bytes[1].to_ascii_uppercase(),
        ]))
    }
}

impl TryFrom<String> for EffectId {
    type Error = ChipgridError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<EffectId> for String {
    fn from(id: EffectId) -> Self {
        id.chars().iter().collect()
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b] = self.chars();
        write!(f, "{a}{b}")
    }
}

/// An effect command placed in one effect slot of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    pub id: EffectId,
    pub value: u8,
}

impl Effect {
    pub fn new(id: EffectId, value: u8) -> Self {
        Self { id, value }
    }

    /// Effect type when played on the given sound source
    pub fn kind(&self, source: SoundSource) -> EffectType {
        EffectType::classify(source, self.id)
    }
}

/// Everything an effect column can mean
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectType {
    Arpeggio,
    PortamentoUp,
    PortamentoDown,
    TonePortamento,
    Vibrato,
    Tremolo,
    Pan,
    VolumeSlide,
    PositionJump,
    SongEnd,
    PatternBreak,
    SpeedTempoChange,
    NoteDelay,
    Groove,
    Detune,
    NoteSlideUp,
    NoteSlideDown,
    NoteCut,
    TransposeDelay,
    AutoEnvelope,
    HardEnvHighPeriod,
    HardEnvLowPeriod,
    ToneNoiseMix,
    NoisePitch,
    FbControl,
    TlControl,
    MlControl,
    ArControl,
    DrControl,
    RrControl,
    MasterVolume,
    NoEffect,
}

impl EffectType {
    /// Classify an effect id for a sound source.
    ///
    /// Total: ids that mean nothing on `source` map to [`EffectType::NoEffect`].
    /// Flow-control ids classify identically on every source, so callers that
    /// only care about sequencing may pass any source.
    pub fn classify(source: SoundSource, id: EffectId) -> EffectType {
        use SoundSource::*;

        let pitched = source != Drum;
        match (id.as_bytes(), source) {
            (b"0B", _) => EffectType::PositionJump,
            (b"0C", _) => EffectType::SongEnd,
            (b"0D", _) => EffectType::PatternBreak,
            (b"0F", _) => EffectType::SpeedTempoChange,
            (b"0G", _) => EffectType::NoteDelay,
            (b"0O", _) => EffectType::Groove,
            (b"0S", _) => EffectType::NoteCut,
            (b"08", _) => EffectType::Pan,
            (b"0A", _) => EffectType::VolumeSlide,

            (b"00", _) if pitched => EffectType::Arpeggio,
            (b"01", _) if pitched => EffectType::PortamentoUp,
            (b"02", _) if pitched => EffectType::PortamentoDown,
            (b"03", _) if pitched => EffectType::TonePortamento,
            (b"04", _) if pitched => EffectType::Vibrato,
            (b"07", _) if pitched => EffectType::Tremolo,
            (b"0P", _) if pitched => EffectType::Detune,
            (b"0Q", _) if pitched => EffectType::NoteSlideUp,
            (b"0R", _) if pitched => EffectType::NoteSlideDown,
            (b"0T", _) if pitched => EffectType::TransposeDelay,

            (b"0H", Ssg) => EffectType::AutoEnvelope,
            (b"0I", Ssg) => EffectType::HardEnvHighPeriod,
            (b"0J", Ssg) => EffectType::HardEnvLowPeriod,
            (b"0V", Ssg) => EffectType::ToneNoiseMix,
            (b"0W", Ssg) => EffectType::NoisePitch,

            (b"0V", Drum) => EffectType::MasterVolume,

            (b"FB", Fm) => EffectType::FbControl,
            ([b'T', op], Fm) if is_operator(*op) => EffectType::TlControl,
            ([b'M', op], Fm) if is_operator(*op) => EffectType::MlControl,
            ([b'A', op], Fm) if is_operator(*op) => EffectType::ArControl,
            ([b'D', op], Fm) if is_operator(*op) => EffectType::DrControl,
            ([b'R', op], Fm) if is_operator(*op) => EffectType::RrControl,

            _ => EffectType::NoEffect,
        }
    }

    /// Position jump, song end and pattern break alter sequencing rather than sound
    pub fn is_flow_control(self) -> bool {
        matches!(
            self,
            EffectType::PositionJump | EffectType::SongEnd | EffectType::PatternBreak
        )
    }
}

fn is_operator(op: u8) -> bool {
    (b'1'..=b'4').contains(&op)
}

/// A flow-control marker found while scanning a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowControl {
    pub row: usize,
    pub slot: usize,
    pub kind: EffectType,
    pub value: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> EffectId {
        s.parse().unwrap()
    }

    #[test]
    fn test_effect_id_parsing() {
        assert_eq!(id("0b"), EffectId::POSITION_JUMP);
        assert_eq!(id("t1").to_string(), "T1");
        assert!("0".parse::<EffectId>().is_err());
        assert!("0BC".parse::<EffectId>().is_err());
        assert!("-0".parse::<EffectId>().is_err());
        assert_eq!(String::from(id("fb")), "FB");
    }

    #[test]
    fn test_flow_control_is_source_agnostic() {
        for source in [SoundSource::Fm, SoundSource::Ssg, SoundSource::Drum, SoundSource::Adpcm] {
            assert_eq!(EffectType::classify(source, id("0B")), EffectType::PositionJump);
            assert_eq!(EffectType::classify(source, id("0C")), EffectType::SongEnd);
            assert_eq!(EffectType::classify(source, id("0D")), EffectType::PatternBreak);
            assert!(EffectType::classify(source, id("0D")).is_flow_control());
            assert!(!EffectType::classify(source, id("0F")).is_flow_control());
        }
    }

    #[test]
    fn test_source_specific_effects() {
        assert_eq!(EffectType::classify(SoundSource::Ssg, id("0H")), EffectType::AutoEnvelope);
        assert_eq!(EffectType::classify(SoundSource::Fm, id("0H")), EffectType::NoEffect);
        assert_eq!(EffectType::classify(SoundSource::Fm, id("T3")), EffectType::TlControl);
        assert_eq!(EffectType::classify(SoundSource::Fm, id("T5")), EffectType::NoEffect);
        assert_eq!(EffectType::classify(SoundSource::Drum, id("00")), EffectType::NoEffect);
        assert_eq!(EffectType::classify(SoundSource::Drum, id("0V")), EffectType::MasterVolume);
        assert_eq!(EffectType::classify(SoundSource::Adpcm, id("ZZ")), EffectType::NoEffect);
    }
}
