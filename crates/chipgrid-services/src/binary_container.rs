//! Little-endian byte buffer used by instrument format handlers

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContainerError {
    #[error("Read of {len} bytes at offset {offset} exceeds container size {available}")]
    Truncated {
        offset: usize,
        len: usize,
        available: usize,
    },
    #[error("Invalid UTF-8 string at offset {0}")]
    InvalidString(usize),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinaryContainer {
    buf: Vec<u8>,
}

impl BinaryContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(buf: Vec<u8>) -> Self {
        Self { buf }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn append_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn append_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn append_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Raw UTF-8 bytes, no length prefix
    pub fn append_string(&mut self, value: &str) {
        self.buf.extend_from_slice(value.as_bytes());
    }

    pub fn append_container(&mut self, other: &BinaryContainer) {
        self.buf.extend_from_slice(&other.buf);
    }

    fn slice(&self, offset: usize, len: usize) -> Result<&[u8], ContainerError> {
        offset
            .checked_add(len)
            .and_then(|end| self.buf.get(offset..end))
            .ok_or(ContainerError::Truncated {
                offset,
                len,
                available: self.buf.len(),
            })
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8, ContainerError> {
        Ok(self.slice(offset, 1)?[0])
    }

    pub fn read_u16(&self, offset: usize) -> Result<u16, ContainerError> {
        let bytes = self.slice(offset, 2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&self, offset: usize) -> Result<u32, ContainerError> {
        let bytes = self.slice(offset, 4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_string(&self, offset: usize, len: usize) -> Result<String, ContainerError> {
        let bytes = self.slice(offset, len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| ContainerError::InvalidString(offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian_layout() {
        let mut ctr = BinaryContainer::new();
        ctr.append_u16(0x0102);
        ctr.append_u32(0xA0B0C0D0);
        ctr.append_string("FM");
        assert_eq!(ctr.as_bytes(), &[0x02, 0x01, 0xD0, 0xC0, 0xB0, 0xA0, b'F', b'M']);
        assert_eq!(ctr.read_u32(2).unwrap(), 0xA0B0C0D0);
        assert_eq!(ctr.read_string(6, 2).unwrap(), "FM");
    }

    #[test]
    fn test_truncated_reads() {
        let ctr = BinaryContainer::from_bytes(vec![1, 2, 3]);
        assert_eq!(ctr.read_u8(2).unwrap(), 3);
        assert_eq!(
            ctr.read_u16(2),
            Err(ContainerError::Truncated { offset: 2, len: 2, available: 3 })
        );
        assert!(ctr.read_u32(usize::MAX).is_err());
    }
}
