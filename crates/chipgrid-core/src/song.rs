//! Song: tracks of patterns sequenced by an order list

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::effect::{FlowControl, SoundSource};
use crate::error::{ChipgridError, Result};
use crate::instrument::InstrumentBank;
use crate::pattern::{Pattern, DEFAULT_STEPS, MAX_STEPS};
use crate::track::Track;

/// A flow-control marker located within an order row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SongMarker {
    pub track: usize,
    pub marker: FlowControl,
}

/// Song holding one track per channel and the order list that sequences them
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "SongData")]
pub struct Song {
    pub title: String,
    /// Size given to patterns created by the song
    pub default_size: usize,
    tracks: Vec<Track>,
    /// One row per song position, one pattern number per track
    orders: Vec<Vec<u32>>,
}

/// Serialized form of [`Song`], checked for a consistent order list on load
#[derive(Deserialize)]
struct SongData {
    #[serde(default)]
    title: String,
    default_size: usize,
    tracks: Vec<Track>,
    orders: Vec<Vec<u32>>,
}

impl TryFrom<SongData> for Song {
    type Error = ChipgridError;

    fn try_from(data: SongData) -> Result<Self> {
        let SongData {
            title,
            default_size,
            mut tracks,
            orders,
        } = data;

        if orders.is_empty() {
            return Err(ChipgridError::MalformedSong("empty order list".into()));
        }
        for (index, track) in tracks.iter_mut().enumerate() {
            track.number = index;
        }
        for (order, row) in orders.iter().enumerate() {
            if row.len() != tracks.len() {
                return Err(ChipgridError::MalformedSong(format!(
                    "order {order} has {} entries for {} tracks",
                    row.len(),
                    tracks.len()
                )));
            }
            for (track, &number) in tracks.iter().zip(row) {
                track.pattern(number)?;
            }
        }
        Ok(Self {
            title,
            default_size: default_size.clamp(1, MAX_STEPS),
            tracks,
            orders,
        })
    }
}

impl Default for Song {
    fn default() -> Self {
        Self::new("", &[SoundSource::Fm], DEFAULT_STEPS)
    }
}

impl Song {
    /// New song with a single order row playing pattern 0 on every track
    pub fn new(title: impl Into<String>, sources: &[SoundSource], default_size: usize) -> Self {
        let default_size = default_size.clamp(1, MAX_STEPS);
        let tracks: Vec<Track> = sources
            .iter()
            .enumerate()
            .map(|(i, &source)| Track::new(i, source, default_size))
            .collect();
        let orders = vec![vec![0; tracks.len()]];
        Self {
            title: title.into(),
            default_size,
            tracks,
            orders,
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, index: usize) -> Result<&Track> {
        self.tracks.get(index).ok_or(ChipgridError::TrackNotFound(index))
    }

    pub fn track_mut(&mut self, index: usize) -> Result<&mut Track> {
        self.tracks
            .get_mut(index)
            .ok_or(ChipgridError::TrackNotFound(index))
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Pattern numbers assigned to each track at `order`
    pub fn order_row(&self, order: usize) -> Result<&[u32]> {
        self.orders
            .get(order)
            .map(Vec::as_slice)
            .ok_or(ChipgridError::OrderNotFound(order))
    }

    /// Assign a pattern to one track at `order`, creating the pattern if needed
    pub fn set_order_pattern(&mut self, order: usize, track: usize, number: u32) -> Result<()> {
        let size = self.default_size;
        let row = self
            .orders
            .get_mut(order)
            .ok_or(ChipgridError::OrderNotFound(order))?;
        let slot = row.get_mut(track).ok_or(ChipgridError::TrackNotFound(track))?;
        *slot = number;
        self.tracks[track].pattern_or_insert(number, size);
        Ok(())
    }

    /// The patterns played at `order`, in track order
    pub fn patterns_at(&self, order: usize) -> Result<Vec<&Pattern>> {
        let row = self.order_row(order)?;
        self.tracks
            .iter()
            .zip(row)
            .map(|(track, &number)| track.pattern(number))
            .collect()
    }

    pub fn pattern_at_mut(&mut self, order: usize, track: usize) -> Result<&mut Pattern> {
        let number = *self
            .order_row(order)?
            .get(track)
            .ok_or(ChipgridError::TrackNotFound(track))?;
        self.track_mut(track)?.pattern_mut(number)
    }

    /// Pattern numbers placed anywhere in the order list for `track`
    pub fn placed_patterns(&self, track: usize) -> BTreeSet<u32> {
        self.orders
            .iter()
            .filter_map(|row| row.get(track).copied())
            .collect()
    }

    /// Number of order rows playing pattern `number` on `track`
    pub fn pattern_used_count(&self, track: usize, number: u32) -> usize {
        self.orders
            .iter()
            .filter(|row| row.get(track) == Some(&number))
            .count()
    }

    /// Insert a row after `order` using each track's first pattern that is
    /// neither edited nor already placed in the order list
    pub fn insert_order_below(&mut self, order: usize) -> Result<()> {
        if order >= self.orders.len() {
            return Err(ChipgridError::OrderNotFound(order));
        }
        let size = self.default_size;
        let placed: Vec<BTreeSet<u32>> = (0..self.tracks.len())
            .map(|track| self.placed_patterns(track))
            .collect();
        let row: Vec<u32> = self
            .tracks
            .iter_mut()
            .zip(&placed)
            .map(|(track, placed)| {
                let number = track.first_unused_pattern_number(placed);
                track.pattern_or_insert(number, size);
                number
            })
            .collect();
        self.orders.insert(order + 1, row);
        Ok(())
    }

    /// Remove the row at `order`. The last remaining row is never removed.
    pub fn delete_order(&mut self, order: usize) -> Result<()> {
        if order >= self.orders.len() {
            return Err(ChipgridError::OrderNotFound(order));
        }
        if self.orders.len() > 1 {
            self.orders.remove(order);
        }
        Ok(())
    }

    /// Rows actually played at `order`: the shortest effective size across tracks
    pub fn pattern_size_at(&self, order: usize) -> Result<usize> {
        let patterns = self.patterns_at(order)?;
        Ok(patterns
            .iter()
            .map(|p| p.effective_size())
            .min()
            .unwrap_or(self.default_size))
    }

    /// Resize every track's pattern at `order` together
    pub fn change_pattern_size(&mut self, order: usize, size: usize) -> Result<()> {
        let row = self.order_row(order)?.to_vec();
        for (track, number) in self.tracks.iter_mut().zip(row) {
            track.pattern_mut(number)?.change_size(size);
        }
        Ok(())
    }

    /// Earliest flow-control marker at `order`, by row first and then by track
    pub fn flow_control_at(&self, order: usize) -> Result<Option<SongMarker>> {
        let patterns = self.patterns_at(order)?;
        Ok(patterns
            .iter()
            .enumerate()
            .filter_map(|(track, p)| {
                p.first_flow_control()
                    .map(|marker| SongMarker { track, marker })
            })
            .min_by_key(|m| (m.marker.row, m.track)))
    }

    /// Instrument numbers referenced anywhere in the song
    pub fn registered_instruments(&self) -> BTreeSet<u8> {
        self.tracks
            .iter()
            .flat_map(|t| t.registered_instruments())
            .collect()
    }

    /// Instruments in `bank` that no pattern references
    pub fn unused_instruments(&self, bank: &InstrumentBank) -> Vec<u8> {
        let used = self.registered_instruments();
        bank.numbers().filter(|n| !used.contains(n)).collect()
    }

    pub fn replace_instrument(&mut self, from: u8, to: u8) {
        for track in &mut self.tracks {
            track.replace_instrument(from, to);
        }
    }

    pub fn transpose(&mut self, semitones: i32, excluded: &[u8]) {
        for track in &mut self.tracks {
            track.transpose(semitones, excluded);
        }
    }
}
