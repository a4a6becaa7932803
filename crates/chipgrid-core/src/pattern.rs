//! Pattern: one page of steps for one track

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::effect::{EffectType, FlowControl, SoundSource};
use crate::error::{ChipgridError, Result};
use crate::step::{Step, NOTE_MAX};

/// Maximum logical size of a pattern
pub const MAX_STEPS: usize = 256;

/// Logical size given to new patterns when nothing else is configured
pub const DEFAULT_STEPS: usize = 64;

/// A page of steps with a user-configured logical size.
///
/// Storage may hold more rows than `size`. Rows past the logical size are kept
/// so that shrinking and growing the pattern again does not lose data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PatternData")]
pub struct Pattern {
    number: u32,
    size: usize,
    steps: Vec<Step>,
}

/// Serialized form of [`Pattern`], rebuilt through [`Pattern::with_steps`] on load
#[derive(Deserialize)]
struct PatternData {
    number: u32,
    size: usize,
    #[serde(default)]
    steps: Vec<Step>,
}

impl From<PatternData> for Pattern {
    fn from(data: PatternData) -> Self {
        Pattern::with_steps(data.number, data.size, data.steps)
    }
}

impl Pattern {
    /// Create a pattern of `size` empty rows (clamped to 1..=MAX_STEPS)
    pub fn new(number: u32, size: usize) -> Self {
        let size = size.clamp(1, MAX_STEPS);
        Self {
            number,
            size,
            steps: vec![Step::default(); size],
        }
    }

    /// Create a pattern from explicit storage, padded up to `size` if short
    pub fn with_steps(number: u32, size: usize, mut steps: Vec<Step>) -> Self {
        let size = size.clamp(1, MAX_STEPS);
        if steps.len() < size {
            steps.resize_with(size, Step::default);
        }
        Self { number, size, steps }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    /// Logical size as configured by the user
    pub fn size(&self) -> usize {
        self.size
    }

    /// Rows held in storage, always `>= size()`
    pub fn capacity(&self) -> usize {
        self.steps.len()
    }

    /// Step at `index`. Bounded by storage capacity, not by logical size.
    pub fn step(&self, index: usize) -> Result<&Step> {
        let capacity = self.steps.len();
        self.steps
            .get(index)
            .ok_or(ChipgridError::StepOutOfRange { index, capacity })
    }

    /// Mutable step at `index`. Bounded by storage capacity, not by logical size.
    pub fn step_mut(&mut self, index: usize) -> Result<&mut Step> {
        let capacity = self.steps.len();
        self.steps
            .get_mut(index)
            .ok_or(ChipgridError::StepOutOfRange { index, capacity })
    }

    /// Logically visible rows `[0, size)`
    pub fn rows(&self) -> &[Step] {
        let end = self.size.min(self.steps.len());
        &self.steps[..end]
    }

    fn rows_mut(&mut self) -> &mut [Step] {
        let end = self.size.min(self.steps.len());
        &mut self.steps[..end]
    }

    /// Playable length: one past the first row carrying a position jump, song
    /// end or pattern break, or the logical size when there is none
    pub fn effective_size(&self) -> usize {
        self.first_flow_control()
            .map_or(self.size, |marker| marker.row + 1)
    }

    /// First flow-control marker, scanning rows top to bottom and slots left to right
    pub fn first_flow_control(&self) -> Option<FlowControl> {
        self.flow_controls().next()
    }

    /// All flow-control markers within the logical size, in scan order
    pub fn flow_controls(&self) -> impl Iterator<Item = FlowControl> + '_ {
        self.rows().iter().enumerate().flat_map(|(row, step)| {
            step.effects().filter_map(move |(slot, effect)| {
                // Flow control does not depend on the sound source
                let kind = EffectType::classify(SoundSource::Fm, effect.id);
                kind.is_flow_control().then_some(FlowControl {
                    row,
                    slot,
                    kind,
                    value: effect.value,
                })
            })
        })
    }

    /// Set the logical size. Zero or sizes above [`MAX_STEPS`] are ignored.
    pub fn change_size(&mut self, size: usize) {
        if size == 0 || size > MAX_STEPS {
            return;
        }
        self.size = size;
        if self.steps.len() < size {
            self.steps.resize_with(size, Step::default);
        }
    }

    /// Insert an empty row at `index`, shifting later rows down.
    ///
    /// Ignored unless `index < size`. Storage grows by one and is not trimmed,
    /// so the last logical row moves past the logical size.
    pub fn insert_step(&mut self, index: usize) {
        if index < self.size {
            self.steps.insert(index, Step::default());
        }
    }

    /// Remove the row before `index`, shifting later rows up, and re-pad storage
    /// to the logical size. Ignored for `index == 0`.
    pub fn delete_previous_step(&mut self, index: usize) {
        if index == 0 || index > self.steps.len() {
            return;
        }
        self.steps.remove(index - 1);
        if self.steps.len() < self.size {
            self.steps.resize_with(self.size, Step::default);
        }
    }

    /// True if any logical row has been edited
    pub fn has_command(&self) -> bool {
        self.rows().iter().any(Step::has_command)
    }

    pub fn edited_step_indices(&self) -> Vec<usize> {
        self.rows()
            .iter()
            .enumerate()
            .filter(|(_, step)| step.has_command())
            .map(|(i, _)| i)
            .collect()
    }

    /// Instrument numbers referenced within the logical size
    pub fn registered_instruments(&self) -> BTreeSet<u8> {
        self.rows()
            .iter()
            .filter_map(Step::instrument_number)
            .collect()
    }

    /// Deep copy under a new number, including rows past the logical size
    pub fn clone_as(&self, number: u32) -> Pattern {
        Pattern {
            number,
            size: self.size,
            steps: self.steps.clone(),
        }
    }

    /// Shift every pitched note by `semitones`, clamped to the playable range.
    /// Rows whose instrument is in `excluded` are left alone.
    pub fn transpose(&mut self, semitones: i32, excluded: &[u8]) {
        for step in self.rows_mut() {
            let Some(pitch) = step.note_number() else {
                continue;
            };
            if step.instrument.is_some_and(|inst| excluded.contains(&inst)) {
                continue;
            }
            let shifted = (pitch as i32 + semitones).clamp(0, NOTE_MAX as i32);
            step.set_note_number(shifted as u8);
        }
    }

    /// Renumber instrument references within the logical size
    pub fn replace_instrument(&mut self, from: u8, to: u8) {
        for step in self.rows_mut() {
            if step.instrument == Some(from) {
                step.instrument = Some(to);
            }
        }
    }

    /// Reset to `size` empty rows, dropping any rows kept past the logical size
    pub fn clear(&mut self) {
        self.steps = vec![Step::default(); self.size];
    }

    /// Drop rows kept past the logical size
    pub fn compact(&mut self) {
        self.steps.truncate(self.size);
    }
}
