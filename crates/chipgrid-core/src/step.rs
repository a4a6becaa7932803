//! A single row of musical data

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::effect::{Effect, EffectId};

/// Number of effect columns per step
pub const N_EFFECT: usize = 4;

/// Highest playable pitch (B-7); pitches span 8 octaves of 12 semitones
pub const NOTE_MAX: u8 = 95;

/// Deepest slot of the echo buffer addressed by [`NoteEvent::Echo`]
pub const ECHO_MAX: u8 = 3;

const NOTE_NAMES: [&str; 12] = ["C-", "C#", "D-", "D#", "E-", "F-", "F#", "G-", "G#", "A-", "A#", "B-"];

/// Content of a step's note column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "NoteEventData")]
pub enum NoteEvent {
    #[default]
    None,
    /// Key off (release)
    Off,
    /// Key cut (silence immediately)
    Cut,
    /// Concrete pitch, 0 = C-0 .. 95 = B-7
    Pitch(u8),
    /// Replay the n-th previously played note (0 = last)
    Echo(u8),
}

/// Serialized form of [`NoteEvent`]; values are clamped into range on load
#[derive(Deserialize)]
enum NoteEventData {
    None,
    Off,
    Cut,
    Pitch(u8),
    Echo(u8),
}

impl From<NoteEventData> for NoteEvent {
    fn from(data: NoteEventData) -> Self {
        match data {
            NoteEventData::None => NoteEvent::None,
            NoteEventData::Off => NoteEvent::Off,
            NoteEventData::Cut => NoteEvent::Cut,
            NoteEventData::Pitch(p) => NoteEvent::Pitch(p.min(NOTE_MAX)),
            NoteEventData::Echo(n) => NoteEvent::Echo(n.min(ECHO_MAX)),
        }
    }
}

impl NoteEvent {
    pub fn pitch(octave: u8, semitone: u8) -> Self {
        Self::Pitch(octave.saturating_mul(12).saturating_add(semitone % 12).min(NOTE_MAX))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, NoteEvent::None)
    }
}

impl fmt::Display for NoteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoteEvent::None => f.write_str("---"),
            NoteEvent::Off => f.write_str("OFF"),
            NoteEvent::Cut => f.write_str("CUT"),
            NoteEvent::Pitch(p) => write!(f, "{}{}", NOTE_NAMES[(p % 12) as usize], p / 12),
            NoteEvent::Echo(n) => write!(f, "^{}", n),
        }
    }
}

/// One row of a pattern. Every column is optional and independent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Step {
    pub note: NoteEvent,
    /// Instrument number, a key into the song's instrument bank
    pub instrument: Option<u8>,
    pub volume: Option<u8>,
    pub effects: [Option<Effect>; N_EFFECT],
}

impl Step {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_note(note: NoteEvent, instrument: Option<u8>) -> Self {
        Self {
            note,
            instrument,
            ..Default::default()
        }
    }

    /// True when the note column holds a concrete pitch
    pub fn has_general_note(&self) -> bool {
        matches!(self.note, NoteEvent::Pitch(_))
    }

    pub fn note_number(&self) -> Option<u8> {
        match self.note {
            NoteEvent::Pitch(p) => Some(p),
            _ => None,
        }
    }

    /// Set a concrete pitch, clamped to the playable range
    pub fn set_note_number(&mut self, pitch: u8) {
        self.note = NoteEvent::Pitch(pitch.min(NOTE_MAX));
    }

    pub fn has_instrument(&self) -> bool {
        self.instrument.is_some()
    }

    pub fn instrument_number(&self) -> Option<u8> {
        self.instrument
    }

    pub fn has_volume(&self) -> bool {
        self.volume.is_some()
    }

    pub fn has_effect_value(&self, slot: usize) -> bool {
        self.effect(slot).is_some()
    }

    pub fn effect(&self, slot: usize) -> Option<&Effect> {
        self.effects.get(slot)?.as_ref()
    }

    pub fn effect_id(&self, slot: usize) -> Option<EffectId> {
        self.effect(slot).map(|e| e.id)
    }

    pub fn effect_value(&self, slot: usize) -> Option<u8> {
        self.effect(slot).map(|e| e.value)
    }

    /// Place an effect in a slot; out-of-range slots are ignored
    pub fn set_effect(&mut self, slot: usize, effect: Effect) {
        if let Some(s) = self.effects.get_mut(slot) {
            *s = Some(effect);
        }
    }

    pub fn clear_effect(&mut self, slot: usize) {
        if let Some(s) = self.effects.get_mut(slot) {
            *s = None;
        }
    }

    /// Iterate over occupied effect slots as `(slot, effect)`
    pub fn effects(&self) -> impl Iterator<Item = (usize, &Effect)> {
        self.effects
            .iter()
            .enumerate()
            .filter_map(|(slot, e)| e.as_ref().map(|e| (slot, e)))
    }

    /// True if any column has been edited
    pub fn has_command(&self) -> bool {
        !self.note.is_none()
            || self.instrument.is_some()
            || self.volume.is_some()
            || self.effects.iter().any(Option::is_some)
    }

    pub fn is_empty(&self) -> bool {
        !self.has_command()
    }
}
