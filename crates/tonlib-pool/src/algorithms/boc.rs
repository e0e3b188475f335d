//! # Bag-of-Cells Reader
//!
//! Just enough of the BOC format to locate the root cell and read bits
//! from it. Used to validate payloads before they are dispatched and to
//! read wallet data fields.
//!
//! ## Layout (generic form)
//!
//! ```text
//! magic:4 flags:1 off_bytes:1 cells:s roots:s absent:s tot_size:o
//! root_list:roots*s  [index:cells*o]  cell_data:tot_size  [crc32c:4]
//! ```
//!
//! Legacy forms carry no flags beyond the reference size, a single root
//! at index 0 and an index table.

use crc::{Crc, CRC_32_ISCSI};

use crate::domain::QueryError;

const MAGIC_GENERIC: [u8; 4] = [0xb5, 0xee, 0x9c, 0x72];
const MAGIC_INDEXED: [u8; 4] = [0x68, 0xff, 0x65, 0xf3];
const MAGIC_INDEXED_CRC: [u8; 4] = [0xac, 0xc3, 0xa7, 0x28];

const MAX_CELL_BITS: usize = 1023;
const MAX_REFS: usize = 4;

/// One parsed cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    /// Data bytes; the last byte may be partially used.
    pub data: Vec<u8>,
    /// Number of meaningful bits in `data`.
    pub bit_len: usize,
    /// Indexes of referenced cells within the bag.
    pub refs: Vec<usize>,
    /// Exotic (special) cell flag.
    pub exotic: bool,
}

impl Cell {
    /// Reader positioned at the first data bit.
    pub fn reader(&self) -> BitReader<'_> {
        BitReader {
            data: &self.data,
            bit_len: self.bit_len,
            pos: 0,
        }
    }
}

/// Sequential big-endian bit reader over a cell's data.
#[derive(Debug)]
pub struct BitReader<'a> {
    data: &'a [u8],
    bit_len: usize,
    pos: usize,
}

impl BitReader<'_> {
    /// Read an unsigned integer of up to 64 bits.
    pub fn load_uint(&mut self, bits: usize) -> Result<u64, QueryError> {
        if bits > 64 {
            return Err(QueryError::MalformedCell(format!(
                "cannot read {} bits into u64",
                bits
            )));
        }
        if self.pos + bits > self.bit_len {
            return Err(QueryError::MalformedCell(format!(
                "read of {} bits at offset {} overruns {}-bit cell",
                bits, self.pos, self.bit_len
            )));
        }
        let mut value = 0u64;
        for _ in 0..bits {
            let byte = self.data[self.pos / 8];
            let bit = (byte >> (7 - self.pos % 8)) & 1;
            value = (value << 1) | bit as u64;
            self.pos += 1;
        }
        Ok(value)
    }

    /// Read a 32-bit unsigned field.
    pub fn load_u32(&mut self) -> Result<u32, QueryError> {
        self.load_uint(32).map(|v| v as u32)
    }

    /// Bits left to read.
    pub fn remaining(&self) -> usize {
        self.bit_len - self.pos
    }
}

/// Parse a serialized bag of cells and return its root cell.
pub fn parse_root(bytes: &[u8]) -> Result<Cell, QueryError> {
    let mut input = Input::new(bytes);

    let magic = input.take(4)?;
    let (has_index, has_crc, ref_size, root_count_implied) = match magic {
        m if m == MAGIC_GENERIC => {
            let flags = input.byte()?;
            let has_index = flags & 0x80 != 0;
            let has_crc = flags & 0x40 != 0;
            (has_index, has_crc, (flags & 0x07) as usize, false)
        }
        m if m == MAGIC_INDEXED => (true, false, (input.byte()? & 0x07) as usize, true),
        m if m == MAGIC_INDEXED_CRC => (true, true, (input.byte()? & 0x07) as usize, true),
        other => {
            return Err(malformed(format!("unknown magic {}", hex::encode(other))));
        }
    };

    if ref_size == 0 || ref_size > 4 {
        return Err(malformed(format!("reference size {} out of range", ref_size)));
    }
    let off_size = input.byte()? as usize;
    if off_size == 0 || off_size > 8 {
        return Err(malformed(format!("offset size {} out of range", off_size)));
    }

    let cell_count = input.uint(ref_size)? as usize;
    let root_count = input.uint(ref_size)? as usize;
    let _absent = input.uint(ref_size)?;
    let data_size = input.uint(off_size)? as usize;

    if cell_count == 0 || root_count == 0 {
        return Err(malformed("bag has no cells or no roots".to_string()));
    }

    let root = if root_count_implied {
        0
    } else {
        let first = input.uint(ref_size)? as usize;
        input.take((root_count - 1) * ref_size)?;
        first
    };
    if root >= cell_count {
        return Err(malformed(format!(
            "root index {} outside {} cells",
            root, cell_count
        )));
    }

    if has_index {
        input.take(cell_count * off_size)?;
    }

    let cells_start = input.pos;
    let mut found = None;
    for index in 0..cell_count {
        let cell = read_cell(&mut input, ref_size, cell_count)?;
        if index == root {
            found = Some(cell);
        }
    }
    if input.pos - cells_start != data_size {
        return Err(malformed(format!(
            "cell data is {} bytes, header says {}",
            input.pos - cells_start,
            data_size
        )));
    }

    if has_crc {
        let body_len = input.pos;
        let stored = input.take(4)?;
        let stored = u32::from_le_bytes([stored[0], stored[1], stored[2], stored[3]]);
        let computed = crc32c(&bytes[..body_len]);
        if stored != computed {
            return Err(malformed(format!(
                "crc32c mismatch: {:08x} != {:08x}",
                stored, computed
            )));
        }
    }

    if input.pos != bytes.len() {
        return Err(malformed(format!(
            "{} trailing bytes after bag",
            bytes.len() - input.pos
        )));
    }

    found.ok_or_else(|| malformed("root cell not found".to_string()))
}

fn read_cell(input: &mut Input<'_>, ref_size: usize, cell_count: usize) -> Result<Cell, QueryError> {
    let d1 = input.byte()?;
    let d2 = input.byte()?;

    let ref_count = (d1 & 0x07) as usize;
    let exotic = d1 & 0x08 != 0;
    let has_hashes = d1 & 0x10 != 0;
    let level = (d1 >> 5) as usize;
    if ref_count > MAX_REFS {
        return Err(malformed(format!("cell has {} references", ref_count)));
    }

    if has_hashes {
        let hash_count = level + 1;
        input.take(hash_count * (32 + 2))?;
    }

    let byte_len = (d2 as usize + 1) / 2;
    let data = input.take(byte_len)?.to_vec();

    let bit_len = if d2 % 2 == 0 {
        byte_len * 8
    } else {
        let last = data[byte_len - 1];
        if last == 0 {
            return Err(malformed("missing completion tag".to_string()));
        }
        byte_len * 8 - 1 - last.trailing_zeros() as usize
    };
    if bit_len > MAX_CELL_BITS {
        return Err(malformed(format!("cell holds {} bits", bit_len)));
    }

    let mut refs = Vec::with_capacity(ref_count);
    for _ in 0..ref_count {
        let target = input.uint(ref_size)? as usize;
        if target >= cell_count {
            return Err(malformed(format!("reference {} outside bag", target)));
        }
        refs.push(target);
    }

    Ok(Cell {
        data,
        bit_len,
        refs,
        exotic,
    })
}

struct Input<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Input<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], QueryError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| malformed(format!("truncated at byte {}", self.pos)))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn byte(&mut self) -> Result<u8, QueryError> {
        self.take(1).map(|b| b[0])
    }

    fn uint(&mut self, size: usize) -> Result<u64, QueryError> {
        Ok(self
            .take(size)?
            .iter()
            .fold(0u64, |acc, b| (acc << 8) | *b as u64))
    }
}

fn malformed(message: String) -> QueryError {
    QueryError::MalformedCell(message)
}

/// CRC32-C (Castagnoli), stored little-endian after the bag.
const CRC32C: Crc<u32> = Crc::<u32>::new(&CRC_32_ISCSI);

fn crc32c(data: &[u8]) -> u32 {
    CRC32C.checksum(data)
}
