//! Variable-length integers and byte cursors
//!
//! Bitcoin-style VarInt encoding:
//! - `< 0xfd`: one byte
//! - `0xfd` + u16 little-endian
//! - `0xfe` + u32 little-endian
//! - `0xff` + u64 little-endian

use thiserror::Error;

/// Errors raised while reading binary data
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VarIntError {
    #[error("Unexpected end of data: needed {needed} bytes at offset {offset}, {available} available")]
    UnexpectedEof {
        needed: usize,
        offset: usize,
        available: usize,
    },
    #[error("Length {0} does not fit in memory")]
    LengthOverflow(u64),
}

/// Cursor over a byte slice
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current offset into the data
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Read the next `len` bytes
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], VarIntError> {
        if len > self.remaining() {
            return Err(VarIntError::UnexpectedEof {
                needed: len,
                offset: self.pos,
                available: self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], VarIntError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, VarIntError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16_le(&mut self) -> Result<u16, VarIntError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32_le(&mut self) -> Result<u32, VarIntError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64_le(&mut self) -> Result<u64, VarIntError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Read a VarInt
    pub fn read_var_int(&mut self) -> Result<u64, VarIntError> {
        match self.read_u8()? {
            0xfd => Ok(self.read_u16_le()? as u64),
            0xfe => Ok(self.read_u32_le()? as u64),
            0xff => self.read_u64_le(),
            n => Ok(n as u64),
        }
    }

    /// Read a VarInt used as a length or count
    pub fn read_var_len(&mut self) -> Result<usize, VarIntError> {
        let n = self.read_var_int()?;
        usize::try_from(n).map_err(|_| VarIntError::LengthOverflow(n))
    }

    /// Read a VarInt length prefix followed by that many bytes
    pub fn read_var_bytes(&mut self) -> Result<&'a [u8], VarIntError> {
        let len = self.read_var_len()?;
        self.read_bytes(len)
    }
}

/// Growable byte buffer with little-endian and VarInt writers
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_u8(&mut self, n: u8) -> &mut Self {
        self.buf.push(n);
        self
    }

    pub fn write_u32_le(&mut self, n: u32) -> &mut Self {
        self.buf.extend_from_slice(&n.to_le_bytes());
        self
    }

    pub fn write_u64_le(&mut self, n: u64) -> &mut Self {
        self.buf.extend_from_slice(&n.to_le_bytes());
        self
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn write_var_int(&mut self, n: u64) -> &mut Self {
        if n < 0xfd {
            self.buf.push(n as u8);
        } else if n <= u16::MAX as u64 {
            self.buf.push(0xfd);
            self.buf.extend_from_slice(&(n as u16).to_le_bytes());
        } else if n <= u32::MAX as u64 {
            self.buf.push(0xfe);
            self.buf.extend_from_slice(&(n as u32).to_le_bytes());
        } else {
            self.buf.push(0xff);
            self.buf.extend_from_slice(&n.to_le_bytes());
        }
        self
    }

    /// Write a VarInt length prefix followed by the bytes
    pub fn write_var_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.write_var_int(bytes.len() as u64);
        self.write_bytes(bytes)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Encode a single VarInt
pub fn encode_var_int(n: u64) -> Vec<u8> {
    let mut writer = Writer::new();
    writer.write_var_int(n);
    writer.into_bytes()
}

/// Decode a VarInt from the start of `bytes`; trailing bytes are ignored
pub fn decode_var_int(bytes: &[u8]) -> Result<u64, VarIntError> {
    Reader::new(bytes).read_var_int()
}
