//! chipgrid-core: Pattern and song data model for the chipgrid tracker

pub mod effect;
mod error;
pub mod instrument;
pub mod pattern;
pub mod song;
pub mod step;
mod track;

pub use effect::{Effect, EffectId, EffectType, FlowControl, SoundSource};
pub use error::{ChipgridError, Result};
pub use instrument::{Instrument, InstrumentBank, MAX_INSTRUMENTS};
pub use pattern::{Pattern, DEFAULT_STEPS, MAX_STEPS};
pub use song::{Song, SongMarker};
pub use step::{ECHO_MAX, NoteEvent, Step, NOTE_MAX, N_EFFECT};
pub use track::Track;
