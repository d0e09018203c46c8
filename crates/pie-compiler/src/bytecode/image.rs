//! The serialized image and a reader for it.
//!
//! ```text
//! "pie!"                      4 bytes magic
//! version                     4 bytes, zero
//! main takes a String         1 byte
//! export count                u32
//! for each export:
//!     name                    u32 offset into the string table
//!     code                    u32 offset of the function
//! for each function:
//!     locals count            u32
//!     code                    n bytes
//! for each distinct string, sorted:
//!     UTF-8 bytes, NUL
//! ```
//!
//! All words are little-endian. Function offsets point at the locals count.

use std::ops::Range;

use thiserror::Error;

use super::OpCode;

pub const MAGIC: &[u8; 4] = b"pie!";
pub const VERSION: u32 = 0;

/// Offset of the first export entry.
pub const EXPORTS_OFFSET: u32 = 13;

/// A finished image, with the layout facts the emitter knows.
#[derive(Debug, Clone)]
pub struct CompiledImage {
    bytes: Vec<u8>,
    functions: Vec<(String, u32)>,
    strings_offset: u32,
}

impl CompiledImage {
    pub(crate) fn new(bytes: Vec<u8>, functions: Vec<(String, u32)>, strings_offset: u32) -> Self {
        Self {
            bytes,
            functions,
            strings_offset,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Emitted functions by unique name, in image order.
    pub fn functions(&self) -> impl Iterator<Item = (&str, u32)> {
        self.functions.iter().map(|(name, offset)| (name.as_str(), *offset))
    }

    pub fn function_offset(&self, unique_name: &str) -> Option<u32> {
        self.functions
            .iter()
            .find(|(name, _)| name == unique_name)
            .map(|(_, offset)| *offset)
    }

    /// The code of a function, after its locals count.
    pub fn code_range(&self, unique_name: &str) -> Option<Range<u32>> {
        let index = self.functions.iter().position(|(name, _)| name == unique_name)?;
        let start = self.functions[index].1 + 4;
        let end = self
            .functions
            .get(index + 1)
            .map(|(_, offset)| *offset)
            .unwrap_or(self.strings_offset);
        Some(start..end)
    }

    pub fn strings_offset(&self) -> u32 {
        self.strings_offset
    }

    pub fn reader(&self) -> Result<ImageReader<'_>, ImageError> {
        ImageReader::new(&self.bytes)
    }
}

/// Errors reading an image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("not a pie image")]
    BadMagic,

    #[error("unsupported image version {0}")]
    UnsupportedVersion(u32),

    #[error("image ends before offset {offset}")]
    Truncated { offset: usize },

    #[error("unknown opcode {byte:#04x} at offset {offset}")]
    UnknownOpcode { byte: u8, offset: u32 },

    #[error("no valid string at offset {offset}")]
    InvalidString { offset: u32 },
}

/// An entry of the export table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Export {
    pub name_offset: u32,
    pub code_offset: u32,
}

/// A decoded instruction operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    None,
    Byte(u8),
    Int(i32),
    /// An absolute offset in the image.
    Offset(u32),
    Count(u32),
}

/// A decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub offset: u32,
    pub op: OpCode,
    pub operand: Operand,
}

impl Instruction {
    /// Offset of the instruction after this one.
    pub fn next_offset(&self) -> u32 {
        self.offset + 1 + self.op.operand_size() as u32
    }
}

/// Reads and disassembles an image.
#[derive(Debug)]
pub struct ImageReader<'a> {
    bytes: &'a [u8],
    main_takes_string: bool,
    exports: Vec<Export>,
}

impl<'a> ImageReader<'a> {
    /// Parses the header and export table.
    pub fn new(bytes: &'a [u8]) -> Result<Self, ImageError> {
        let mut reader = Self {
            bytes,
            main_takes_string: false,
            exports: Vec::new(),
        };

        if reader.slice(0, 4)? != MAGIC {
            return Err(ImageError::BadMagic);
        }
        let version = reader.read_u32(4)?;
        if version != VERSION {
            return Err(ImageError::UnsupportedVersion(version));
        }
        reader.main_takes_string = reader.read_u8(8)? != 0;

        let count = reader.read_u32(9)?;
        for index in 0..count {
            let at = EXPORTS_OFFSET + index * 8;
            reader.exports.push(Export {
                name_offset: reader.read_u32(at)?,
                code_offset: reader.read_u32(at + 4)?,
            });
        }
        Ok(reader)
    }

    pub fn main_takes_string(&self) -> bool {
        self.main_takes_string
    }

    pub fn exports(&self) -> &[Export] {
        &self.exports
    }

    /// The NUL-terminated string at `offset`.
    pub fn read_string(&self, offset: u32) -> Result<&'a str, ImageError> {
        let start = offset as usize;
        let rest = self.bytes.get(start..).ok_or(ImageError::Truncated { offset: start })?;
        let len = rest
            .iter()
            .position(|&byte| byte == 0)
            .ok_or(ImageError::InvalidString { offset })?;
        std::str::from_utf8(&rest[..len]).map_err(|_| ImageError::InvalidString { offset })
    }

    /// The locals count of the function at `offset`.
    pub fn locals_count(&self, offset: u32) -> Result<u32, ImageError> {
        self.read_u32(offset)
    }

    /// Decodes the instruction at `offset`.
    pub fn decode(&self, offset: u32) -> Result<Instruction, ImageError> {
        let byte = self.read_u8(offset)?;
        let op = OpCode::from_u8(byte).ok_or(ImageError::UnknownOpcode { byte, offset })?;
        let at = offset + 1;

        let operand = match op {
            OpCode::PushBool | OpCode::Load | OpCode::Store => Operand::Byte(self.read_u8(at)?),
            OpCode::PushInt | OpCode::ForeignCall0 | OpCode::ForeignCall1 | OpCode::ForeignCallN => {
                Operand::Int(self.read_u32(at)? as i32)
            }
            OpCode::PushString | OpCode::Jump | OpCode::JumpIfFalse => Operand::Offset(self.read_u32(at)?),
            OpCode::Alloc => Operand::Count(self.read_u32(at)?),
            _ => Operand::None,
        };

        Ok(Instruction { offset, op, operand })
    }

    /// Decodes every instruction in `range`.
    pub fn disassemble(&self, range: Range<u32>) -> Result<Vec<Instruction>, ImageError> {
        let mut instructions = Vec::new();
        let mut offset = range.start;
        while offset < range.end {
            let instruction = self.decode(offset)?;
            offset = instruction.next_offset();
            instructions.push(instruction);
        }
        Ok(instructions)
    }

    fn slice(&self, offset: u32, len: usize) -> Result<&'a [u8], ImageError> {
        let start = offset as usize;
        self.bytes
            .get(start..start + len)
            .ok_or(ImageError::Truncated { offset: start + len })
    }

    fn read_u8(&self, offset: u32) -> Result<u8, ImageError> {
        Ok(self.slice(offset, 1)?[0])
    }

    fn read_u32(&self, offset: u32) -> Result<u32, ImageError> {
        let bytes = self.slice(offset, 4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}
