//! Track: the patterns played by one channel

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::effect::SoundSource;
use crate::error::{ChipgridError, Result};
use crate::pattern::Pattern;

/// A channel of the song with its own pool of numbered patterns
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "TrackData")]
pub struct Track {
    pub number: usize,
    pub source: SoundSource,
    patterns: BTreeMap<u32, Pattern>,
}

/// Serialized form of [`Track`]; patterns are renumbered to match their keys on load
#[derive(Deserialize)]
struct TrackData {
    number: usize,
    source: SoundSource,
    #[serde(default)]
    patterns: BTreeMap<u32, Pattern>,
}

impl From<TrackData> for Track {
    fn from(data: TrackData) -> Self {
        let patterns = data
            .patterns
            .into_iter()
            .map(|(key, pattern)| {
                if pattern.number() == key {
                    (key, pattern)
                } else {
                    (key, pattern.clone_as(key))
                }
            })
            .collect();
        Self {
            number: data.number,
            source: data.source,
            patterns,
        }
    }
}

impl Track {
    /// New track holding an empty pattern 0
    pub fn new(number: usize, source: SoundSource, size: usize) -> Self {
        let mut patterns = BTreeMap::new();
        patterns.insert(0, Pattern::new(0, size));
        Self {
            number,
            source,
            patterns,
        }
    }

    pub fn pattern(&self, number: u32) -> Result<&Pattern> {
        self.patterns.get(&number).ok_or(ChipgridError::PatternNotFound {
            track: self.number,
            number,
        })
    }

    pub fn pattern_mut(&mut self, number: u32) -> Result<&mut Pattern> {
        self.patterns
            .get_mut(&number)
            .ok_or(ChipgridError::PatternNotFound {
                track: self.number,
                number,
            })
    }

    /// Get a pattern, creating it with `size` empty rows if it does not exist yet
    pub fn pattern_or_insert(&mut self, number: u32, size: usize) -> &mut Pattern {
        self.patterns
            .entry(number)
            .or_insert_with(|| Pattern::new(number, size))
    }

    pub fn remove_pattern(&mut self, number: u32) -> Option<Pattern> {
        self.patterns.remove(&number)
    }

    pub fn pattern_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.patterns.keys().copied()
    }

    pub fn patterns(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.values()
    }

    /// Copy pattern `from` into slot `to`, replacing whatever was there
    pub fn clone_pattern(&mut self, from: u32, to: u32) -> Result<()> {
        let copy = self.pattern(from)?.clone_as(to);
        self.patterns.insert(to, copy);
        Ok(())
    }

    /// Lowest pattern number that is neither in `placed` nor holding an edited pattern
    pub fn first_unused_pattern_number(&self, placed: &BTreeSet<u32>) -> u32 {
        (0..)
            .find(|n| {
                !placed.contains(n) && self.patterns.get(n).is_none_or(|p| !p.has_command())
            })
            .unwrap_or(0)
    }

    pub fn registered_instruments(&self) -> BTreeSet<u8> {
        self.patterns
            .values()
            .flat_map(|p| p.registered_instruments())
            .collect()
    }

    pub fn replace_instrument(&mut self, from: u8, to: u8) {
        for pattern in self.patterns.values_mut() {
            pattern.replace_instrument(from, to);
        }
    }

    pub fn transpose(&mut self, semitones: i32, excluded: &[u8]) {
        for pattern in self.patterns.values_mut() {
            pattern.transpose(semitones, excluded);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::{NoteEvent, Step};

    fn track_with_note(pattern: u32, inst: u8) -> Track {
        let mut track = Track::new(0, SoundSource::Fm, 16);
        *track.pattern_or_insert(pattern, 16).step_mut(0).unwrap() =
            Step::with_note(NoteEvent::Pitch(48), Some(inst));
        track
    }

    #[test]
    fn test_pattern_lookup() {
        let track = Track::new(3, SoundSource::Ssg, 32);
        assert_eq!(track.pattern(0).unwrap().size(), 32);
        assert_eq!(
            track.pattern(1).unwrap_err(),
            ChipgridError::PatternNotFound { track: 3, number: 1 }
        );
    }

    #[test]
    fn test_clone_pattern() {
        let mut track = track_with_note(0, 1);
        track.clone_pattern(0, 4).unwrap();
        assert_eq!(track.pattern(4).unwrap().number(), 4);
        assert_eq!(track.pattern(4).unwrap().rows(), track.pattern(0).unwrap().rows());
        assert!(track.clone_pattern(9, 1).is_err());
    }

    #[test]
    fn test_first_unused_pattern_number() {
        let mut track = track_with_note(0, 1);
        let none = BTreeSet::new();
        assert_eq!(track.first_unused_pattern_number(&none), 1);
        track.pattern_or_insert(1, 16);
        assert_eq!(track.first_unused_pattern_number(&none), 1);
        assert_eq!(track.first_unused_pattern_number(&BTreeSet::from([1, 2])), 3);
        *track.pattern_mut(1).unwrap().step_mut(3).unwrap() = Step::with_note(NoteEvent::Off, None);
        assert_eq!(track.first_unused_pattern_number(&none), 2);
    }

    #[test]
    fn test_deserialize_renumbers_patterns_to_keys() {
        let track: Track = serde_json::from_str(
            r#"{"number":0,"source":"Ssg","patterns":{"3":{"number":7,"size":8}}}"#,
        )
        .unwrap();
        assert_eq!(track.pattern(3).unwrap().number(), 3);
        assert_eq!(track.pattern(3).unwrap().capacity(), 8);
    }

    #[test]
    fn test_instrument_renumbering() {
        let mut track = track_with_note(0, 1);
        *track.pattern_or_insert(2, 16).step_mut(5).unwrap() =
            Step::with_note(NoteEvent::Pitch(10), Some(6));
        assert_eq!(track.registered_instruments(), BTreeSet::from([1, 6]));

        track.replace_instrument(6, 2);
        assert_eq!(track.registered_instruments(), BTreeSet::from([1, 2]));
    }
}
