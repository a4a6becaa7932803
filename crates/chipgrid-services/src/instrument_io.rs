//! Instrument file format registry
//!
//! Format handlers are registered on an [`InstrumentIo`] owned by the
//! application and dispatched by file extension.

use std::path::Path;

use chipgrid_core::{ChipgridError, Instrument, InstrumentBank};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::binary_container::{BinaryContainer, ContainerError};

#[derive(Debug, Error)]
pub enum InstrumentIoError {
    #[error("No instrument format registered for extension {0:?}")]
    UnknownExtension(String),
    #[error("Format {extension:?} does not support {operation}")]
    Unsupported {
        extension: String,
        operation: &'static str,
    },
    #[error("Instrument {0} not found")]
    InstrumentNotFound(u8),
    #[error("Out of range {what}: {value}")]
    OutOfRange { what: &'static str, value: i32 },
    #[error("Malformed instrument data: {0}")]
    Malformed(String),
    #[error("Container error: {0}")]
    Container(#[from] ContainerError),
    #[error(transparent)]
    Core(#[from] ChipgridError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A loader and/or saver for one instrument file extension
pub trait InstrumentFormat: Send + Sync {
    /// Lowercase extension without the dot
    fn extension(&self) -> &str;
    fn description(&self) -> &str;
    fn is_loadable(&self) -> bool;
    fn is_savable(&self) -> bool;

    /// File dialog filter, e.g. `"Instrument(*.bti)"`
    fn filter_text(&self) -> String {
        format!("{}(*.{})", self.description(), self.extension())
    }

    fn load(
        &self,
        _ctr: &BinaryContainer,
        _file_name: &str,
        _bank: &InstrumentBank,
        _number: u8,
    ) -> Result<Instrument, InstrumentIoError> {
        Err(InstrumentIoError::Unsupported {
            extension: self.extension().to_string(),
            operation: "load",
        })
    }

    fn save(
        &self,
        _ctr: &mut BinaryContainer,
        _bank: &InstrumentBank,
        _number: u8,
    ) -> Result<(), InstrumentIoError> {
        Err(InstrumentIoError::Unsupported {
            extension: self.extension().to_string(),
            operation: "save",
        })
    }
}

/// Registry of instrument formats keyed by extension
#[derive(Default)]
pub struct InstrumentIo {
    formats: Vec<Box<dyn InstrumentFormat>>,
}

impl InstrumentIo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a format, replacing any handler for the same extension
    pub fn register(&mut self, format: Box<dyn InstrumentFormat>) {
        let ext = format.extension().to_ascii_lowercase();
        if let Some(pos) = self.formats.iter().position(|f| f.extension() == ext) {
            warn!(extension = %ext, "Replacing instrument format handler");
            self.formats[pos] = format;
            return;
        }
        debug!(extension = %ext, "Registered instrument format");
        self.formats.push(format);
    }

    pub fn format(&self, ext: &str) -> Option<&dyn InstrumentFormat> {
        let ext = ext.to_ascii_lowercase();
        self.formats
            .iter()
            .find(|f| f.extension() == ext)
            .map(|f| f.as_ref())
    }

    pub fn test_loadable_format(&self, ext: &str) -> bool {
        self.format(ext).is_some_and(|f| f.is_loadable())
    }

    pub fn test_savable_format(&self, ext: &str) -> bool {
        self.format(ext).is_some_and(|f| f.is_savable())
    }

    pub fn load_filters(&self) -> Vec<String> {
        self.formats
            .iter()
            .filter(|f| f.is_loadable())
            .map(|f| f.filter_text())
            .collect()
    }

    pub fn save_filters(&self) -> Vec<String> {
        self.formats
            .iter()
            .filter(|f| f.is_savable())
            .map(|f| f.filter_text())
            .collect()
    }

    /// Decode an instrument read from `path`, dispatching on its extension
    pub fn load_instrument(
        &self,
        ctr: &BinaryContainer,
        path: &Path,
        bank: &InstrumentBank,
        number: u8,
    ) -> Result<Instrument, InstrumentIoError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let format = self
            .format(ext)
            .filter(|f| f.is_loadable())
            .ok_or_else(|| InstrumentIoError::UnknownExtension(ext.to_string()))?;
        let file_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();

        let instrument = format.load(ctr, file_name, bank, number)?;
        info!(path = %path.display(), number, name = %instrument.name, "Instrument loaded");
        Ok(instrument)
    }

    /// Encode instrument `number` from `bank` in the format for `ext`
    pub fn save_instrument(
        &self,
        ctr: &mut BinaryContainer,
        ext: &str,
        bank: &InstrumentBank,
        number: u8,
    ) -> Result<(), InstrumentIoError> {
        let format = self
            .format(ext)
            .filter(|f| f.is_savable())
            .ok_or_else(|| InstrumentIoError::UnknownExtension(ext.to_string()))?;
        if !bank.contains(number) {
            return Err(InstrumentIoError::InstrumentNotFound(number));
        }

        format.save(ctr, bank, number)?;
        info!(extension = %ext, number, bytes = ctr.len(), "Instrument saved");
        Ok(())
    }
}

/// Map a detune code stored by TFI, VGI and DMP files to the FM chip's DT value
pub fn convert_dt_in_tfi_vgi_dmp(dt: i32) -> Result<u8, InstrumentIoError> {
    match dt {
        0 => Ok(7),
        1 => Ok(6),
        2 => Ok(5),
        3 => Ok(0),
        4 => Ok(1),
        5 => Ok(2),
        6 | 7 => Ok(3),
        _ => Err(InstrumentIoError::OutOfRange { what: "dt", value: dt }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chipgrid_core::SoundSource;

    /// Name length, name bytes, source tag
    struct NameOnlyFormat;

    impl InstrumentFormat for NameOnlyFormat {
        fn extension(&self) -> &str {
            "nmi"
        }
        fn description(&self) -> &str {
            "Named instrument"
        }
        fn is_loadable(&self) -> bool {
            true
        }
        fn is_savable(&self) -> bool {
            true
        }

        fn load(
            &self,
            ctr: &BinaryContainer,
            file_name: &str,
            _bank: &InstrumentBank,
            number: u8,
        ) -> Result<Instrument, InstrumentIoError> {
            let len = ctr.read_u8(0)? as usize;
            let mut name = ctr.read_string(1, len)?;
            if name.is_empty() {
                name = file_name.to_string();
            }
            let source = match ctr.read_u8(1 + len)? {
                0 => SoundSource::Fm,
                1 => SoundSource::Ssg,
                tag => return Err(InstrumentIoError::Malformed(format!("source tag {tag}"))),
            };
            Ok(Instrument::new(number, name, source))
        }

        fn save(
            &self,
            ctr: &mut BinaryContainer,
            bank: &InstrumentBank,
            number: u8,
        ) -> Result<(), InstrumentIoError> {
            let inst = bank
                .get(number)
                .ok_or(InstrumentIoError::InstrumentNotFound(number))?;
            ctr.append_u8(inst.name.len() as u8);
            ctr.append_string(&inst.name);
            ctr.append_u8(if inst.source == SoundSource::Ssg { 1 } else { 0 });
            Ok(())
        }
    }

    struct ImportOnlyFormat;

    impl InstrumentFormat for ImportOnlyFormat {
        fn extension(&self) -> &str {
            "dmp"
        }
        fn description(&self) -> &str {
            "DefleMask preset"
        }
        fn is_loadable(&self) -> bool {
            true
        }
        fn is_savable(&self) -> bool {
            false
        }
    }

    fn registry() -> InstrumentIo {
        let mut io = InstrumentIo::new();
        io.register(Box::new(NameOnlyFormat));
        io.register(Box::new(ImportOnlyFormat));
        io
    }

    #[test]
    fn test_capabilities_and_filters() {
        let io = registry();
        assert!(io.test_loadable_format("NMI"));
        assert!(io.test_savable_format("nmi"));
        assert!(io.test_loadable_format("dmp"));
        assert!(!io.test_savable_format("dmp"));
        assert!(!io.test_loadable_format("wav"));
        assert_eq!(
            io.load_filters(),
            vec!["Named instrument(*.nmi)", "DefleMask preset(*.dmp)"]
        );
        assert_eq!(io.save_filters(), vec!["Named instrument(*.nmi)"]);
    }

    #[test]
    fn test_save_then_load() {
        let io = registry();
        let mut bank = InstrumentBank::new();
        bank.add(Instrument::new(3, "Pluck", SoundSource::Ssg)).unwrap();

        let mut ctr = BinaryContainer::new();
        io.save_instrument(&mut ctr, "nmi", &bank, 3).unwrap();
        let loaded = io
            .load_instrument(&ctr, Path::new("presets/pluck.NMI"), &bank, 9)
            .unwrap();
        assert_eq!(loaded, Instrument::new(9, "Pluck", SoundSource::Ssg));
    }

    #[test]
    fn test_dispatch_errors() {
        let io = registry();
        let bank = InstrumentBank::new();
        let ctr = BinaryContainer::from_bytes(vec![0, 7]);

        assert!(matches!(
            io.load_instrument(&ctr, Path::new("a.wav"), &bank, 0),
            Err(InstrumentIoError::UnknownExtension(ext)) if ext == "wav"
        ));
        assert!(matches!(
            io.load_instrument(&ctr, Path::new("a.nmi"), &bank, 0),
            Err(InstrumentIoError::Malformed(_))
        ));
        assert!(matches!(
            io.load_instrument(&ctr, Path::new("a.dmp"), &bank, 0),
            Err(InstrumentIoError::Unsupported { operation: "load", .. })
        ));
        assert!(matches!(
            io.save_instrument(&mut BinaryContainer::new(), "dmp", &bank, 0),
            Err(InstrumentIoError::UnknownExtension(_))
        ));
        assert!(matches!(
            io.save_instrument(&mut BinaryContainer::new(), "nmi", &bank, 0),
            Err(InstrumentIoError::InstrumentNotFound(0))
        ));
    }

    #[test]
    fn test_empty_name_falls_back_to_file_stem() {
        let io = registry();
        let ctr = BinaryContainer::from_bytes(vec![0, 0]);
        let loaded = io
            .load_instrument(&ctr, Path::new("kit/snare.nmi"), &InstrumentBank::new(), 1)
            .unwrap();
        assert_eq!(loaded.name, "snare");
    }

    #[test]
    fn test_register_replaces_same_extension() {
        let mut io = registry();
        io.register(Box::new(NameOnlyFormat));
        assert_eq!(io.load_filters().len(), 2);
    }

    #[test]
    fn test_convert_dt() {
        let converted: Vec<u8> = (0..8).map(|dt| convert_dt_in_tfi_vgi_dmp(dt).unwrap()).collect();
        assert_eq!(converted, vec![7, 6, 5, 0, 1, 2, 3, 3]);
        assert!(matches!(
            convert_dt_in_tfi_vgi_dmp(8),
            Err(InstrumentIoError::OutOfRange { what: "dt", value: 8 })
        ));
        assert!(convert_dt_in_tfi_vgi_dmp(-1).is_err());
    }
}
