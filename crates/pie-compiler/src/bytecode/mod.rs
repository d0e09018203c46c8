//! Bytecode types for the Pie image.
//!
//! - [`OpCode`]: the interpreter's instruction set
//! - [`ImageWriter`], [`OffsetTable`], [`StringTable`]: the byte stream and
//!   its forward-reference patching
//! - [`CompiledImage`], [`ImageReader`]: the finished image and a
//!   disassembler for it

mod image;
mod opcode;
mod writer;

pub use image::{CompiledImage, EXPORTS_OFFSET, Export, ImageError, ImageReader, Instruction, MAGIC, Operand, VERSION};
pub use opcode::OpCode;
pub use writer::{ImageWriter, OffsetTable, StringTable};
