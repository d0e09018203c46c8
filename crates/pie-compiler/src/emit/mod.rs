//! Bytecode emission.
//!
//! The [`BytecodeEmitter`] walks bound function bodies and writes their
//! code straight into the image. Calls, function references, and string
//! literals are written as placeholders and patched once the whole image
//! is laid out (see [`image`]).
//!
//! Children are always emitted left to right, so side effects happen in
//! source order. Unit values are never pushed.

mod image;
mod jumps;

pub use image::emit_image;
pub use jumps::{LoopHead, PendingJump};

use pie_core::BoundExpr;
use pie_registry::BoundFunction;

use crate::bytecode::{ImageWriter, OffsetTable, OpCode, StringTable};

/// Emits function bodies into an image.
pub struct BytecodeEmitter<'a> {
    writer: &'a mut ImageWriter,
    /// References to function code, by unique name.
    functions: &'a mut OffsetTable<String>,
    strings: &'a mut StringTable,
}

impl<'a> BytecodeEmitter<'a> {
    pub fn new(
        writer: &'a mut ImageWriter,
        functions: &'a mut OffsetTable<String>,
        strings: &'a mut StringTable,
    ) -> Self {
        Self {
            writer,
            functions,
            strings,
        }
    }

    /// Writes one function: its locals count, its body, and a return.
    /// Returns the function's offset.
    ///
    /// # Panics
    ///
    /// If the function's body was never bound.
    pub fn emit_function(&mut self, function: &BoundFunction) -> u32 {
        let Some((body, locals)) = function.bound_body() else {
            panic!("function {} was never bound", function.unique_name);
        };

        let offset = self.writer.position();
        self.functions.define(function.unique_name.clone(), offset);

        let locals = u32::try_from(locals).unwrap_or_else(|_| panic!("too many locals in {}", function.unique_name));
        self.writer.write_u32(locals);
        self.emit_expr(body);
        self.emit(OpCode::Return);
        offset
    }

    // ==========================================================================
    // Basic Emission
    // ==========================================================================

    pub fn emit(&mut self, op: OpCode) {
        self.writer.write_op(op);
    }

    fn emit_byte(&mut self, op: OpCode, byte: u8) {
        self.writer.write_op(op);
        self.writer.write_u8(byte);
    }

    fn emit_i32(&mut self, op: OpCode, value: i32) {
        self.writer.write_op(op);
        self.writer.write_i32(value);
    }

    fn emit_alloc(&mut self, slots: usize) {
        self.writer.write_op(OpCode::Alloc);
        self.writer.write_u32(slots as u32);
    }

    // ==========================================================================
    // Expressions
    // ==========================================================================

    pub fn emit_expr(&mut self, expr: &BoundExpr) {
        match expr {
            BoundExpr::Unit => {}
            BoundExpr::Bool(value) => self.emit_byte(OpCode::PushBool, u8::from(*value)),
            BoundExpr::Int(value) => self.emit_i32(OpCode::PushInt, *value),
            BoundExpr::String(value) => {
                self.emit(OpCode::PushString);
                self.strings.insert(self.writer, value);
            }
            BoundExpr::Locals => self.emit(OpCode::PushLocals),

            BoundExpr::Load { source, index, .. } => {
                self.emit_expr(source);
                self.emit_byte(OpCode::Load, *index);
            }
            BoundExpr::Store { target, index, value } => {
                self.emit_expr(value);
                self.emit_expr(target);
                self.emit_byte(OpCode::Store, *index);
            }

            BoundExpr::Construct { fields, .. } => {
                for field in fields {
                    self.emit_expr(field);
                }
                self.emit_alloc(fields.len());
            }
            BoundExpr::ConstructUnion { tag, payload, .. } => {
                self.emit_i32(OpCode::PushInt, *tag);
                if let Some(payload) = payload {
                    self.emit_expr(payload);
                }
                self.emit_alloc(1 + usize::from(payload.is_some()));
            }

            BoundExpr::Intrinsic { ops, arg, .. } => {
                self.emit_expr(arg);
                for op in ops {
                    self.emit(OpCode::from(*op));
                }
            }
            BoundExpr::Call { target, arg, .. } => {
                self.emit_expr(arg);
                self.emit_expr(target);
                let op = match arg.ty().expand().len() {
                    0 => OpCode::Call0,
                    1 => OpCode::Call1,
                    _ => OpCode::CallN,
                };
                self.emit(op);
            }
            BoundExpr::ForeignCall { id, arity, arg, .. } => {
                self.emit_expr(arg);
                let op = match arity {
                    0 => OpCode::ForeignCall0,
                    1 => OpCode::ForeignCall1,
                    _ => OpCode::ForeignCallN,
                };
                self.emit_i32(op, *id);
            }
            BoundExpr::FuncRef { unique_name, .. } => {
                self.emit(OpCode::PushInt);
                self.functions.insert(self.writer, unique_name.clone());
            }

            BoundExpr::Block(exprs) => {
                for expr in exprs {
                    self.emit_expr(expr);
                }
            }
            BoundExpr::If {
                condition,
                then_body,
                else_body,
                ..
            } => self.emit_if(condition, then_body, else_body.as_deref()),
            BoundExpr::While { condition, body } => self.emit_while(condition, body),
            BoundExpr::Return(value) => {
                self.emit_expr(value);
                self.emit(OpCode::Return);
            }
        }
    }

    fn emit_if(&mut self, condition: &BoundExpr, then_body: &BoundExpr, else_body: Option<&BoundExpr>) {
        self.emit_expr(condition);
        let skip_then = PendingJump::emit(self.writer, OpCode::JumpIfFalse);
        self.emit_expr(then_body);

        match else_body {
            None => skip_then.patch_here(self.writer),
            Some(else_body) => {
                let skip_else = PendingJump::emit(self.writer, OpCode::Jump);
                skip_then.patch_here(self.writer);
                self.emit_expr(else_body);
                skip_else.patch_here(self.writer);
            }
        }
    }

    fn emit_while(&mut self, condition: &BoundExpr, body: &BoundExpr) {
        let head = LoopHead::here(self.writer);
        self.emit_expr(condition);
        let exit = PendingJump::emit(self.writer, OpCode::JumpIfFalse);
        self.emit_expr(body);
        head.jump_back(self.writer);
        exit.patch_here(self.writer);
    }
}
