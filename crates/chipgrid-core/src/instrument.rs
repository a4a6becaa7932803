//! Instrument definitions referenced by number from pattern steps

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::effect::SoundSource;
use crate::error::{ChipgridError, Result};

/// Number of instrument slots in a bank
pub const MAX_INSTRUMENTS: u8 = 128;

/// An instrument definition. Synthesis parameters live with the sound engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub number: u8,
    pub name: String,
    pub source: SoundSource,
}

impl Instrument {
    pub fn new(number: u8, name: impl Into<String>, source: SoundSource) -> Self {
        Self {
            number,
            name: name.into(),
            source,
        }
    }
}

/// Instruments of a module keyed by number
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstrumentBank {
    instruments: BTreeMap<u8, Instrument>,
}

impl InstrumentBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, instrument: Instrument) -> Result<()> {
        let number = instrument.number;
        if number >= MAX_INSTRUMENTS {
            return Err(ChipgridError::InstrumentOutOfRange(number));
        }
        if self.instruments.contains_key(&number) {
            return Err(ChipgridError::DuplicateInstrument(number));
        }
        self.instruments.insert(number, instrument);
        Ok(())
    }

    pub fn remove(&mut self, number: u8) -> Option<Instrument> {
        self.instruments.remove(&number)
    }

    pub fn get(&self, number: u8) -> Option<&Instrument> {
        self.instruments.get(&number)
    }

    pub fn get_mut(&mut self, number: u8) -> Option<&mut Instrument> {
        self.instruments.get_mut(&number)
    }

    pub fn contains(&self, number: u8) -> bool {
        self.instruments.contains_key(&number)
    }

    /// Registered numbers in ascending order
    pub fn numbers(&self) -> impl Iterator<Item = u8> + '_ {
        self.instruments.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// Lowest free slot, `None` when the bank is full
    pub fn first_unused_number(&self) -> Option<u8> {
        (0..MAX_INSTRUMENTS).find(|n| !self.instruments.contains_key(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_lookup() {
        let mut bank = InstrumentBank::new();
        bank.add(Instrument::new(0, "Bass", SoundSource::Fm)).unwrap();
        bank.add(Instrument::new(2, "Lead", SoundSource::Ssg)).unwrap();

        assert_eq!(bank.len(), 2);
        assert_eq!(bank.get(2).map(|i| i.name.as_str()), Some("Lead"));
        assert_eq!(bank.numbers().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(bank.first_unused_number(), Some(1));
    }

    #[test]
    fn test_add_rejects_bad_numbers() {
        let mut bank = InstrumentBank::new();
        bank.add(Instrument::new(5, "Kick", SoundSource::Drum)).unwrap();
        assert_eq!(
            bank.add(Instrument::new(5, "Snare", SoundSource::Drum)),
            Err(ChipgridError::DuplicateInstrument(5))
        );
        assert_eq!(
            bank.add(Instrument::new(MAX_INSTRUMENTS, "Hat", SoundSource::Drum)),
            Err(ChipgridError::InstrumentOutOfRange(MAX_INSTRUMENTS))
        );
    }

    #[test]
    fn test_full_bank_has_no_free_number() {
        let mut bank = InstrumentBank::new();
        for n in 0..MAX_INSTRUMENTS {
            bank.add(Instrument::new(n, format!("Inst {n}"), SoundSource::Fm)).unwrap();
        }
        assert_eq!(bank.first_unused_number(), None);
        bank.remove(64);
        assert_eq!(bank.first_unused_number(), Some(64));
    }
}
