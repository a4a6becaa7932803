//! chipgrid-services: Instrument format registry, binary containers and configuration

pub mod binary_container;
pub mod config;
pub mod instrument_io;

pub use binary_container::{BinaryContainer, ContainerError};
pub use config::{load_config, new_song, parse_config, save_config, ConfigError, TrackerConfig};
pub use instrument_io::{convert_dt_in_tfi_vgi_dmp, InstrumentFormat, InstrumentIo, InstrumentIoError};
