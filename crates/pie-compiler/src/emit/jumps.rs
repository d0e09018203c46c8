//! Jump handles for structured control flow.
//!
//! A forward jump is emitted before its target is known and returns a
//! [`PendingJump`], which is consumed when the target is reached. A
//! backward jump starts from a [`LoopHead`] recorded before the loop body.
//! Operands are absolute image offsets.

use crate::bytecode::{ImageWriter, OpCode};

/// A forward jump whose target has not been emitted yet.
#[derive(Debug)]
#[must_use = "a pending jump must be patched"]
pub struct PendingJump {
    operand: u32,
}

impl PendingJump {
    /// Emits `op` with a placeholder target.
    pub fn emit(writer: &mut ImageWriter, op: OpCode) -> Self {
        debug_assert!(matches!(op, OpCode::Jump | OpCode::JumpIfFalse));
        writer.write_op(op);
        Self {
            operand: writer.reserve_u32(),
        }
    }

    /// Points the jump at the current position.
    pub fn patch_here(self, writer: &mut ImageWriter) {
        let target = writer.position();
        writer.patch_u32(self.operand, target);
    }
}

/// The start of a loop, for jumping back to.
#[derive(Debug, Clone, Copy)]
pub struct LoopHead {
    offset: u32,
}

impl LoopHead {
    pub fn here(writer: &ImageWriter) -> Self {
        Self {
            offset: writer.position(),
        }
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Emits an unconditional jump back to the loop head.
    pub fn jump_back(self, writer: &mut ImageWriter) {
        writer.write_op(OpCode::Jump);
        writer.write_u32(self.offset);
    }
}
