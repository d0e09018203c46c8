//! Bytecode operation codes.
//!
//! The interpreter is a stack machine. Each opcode is a single byte, with
//! any operand following inline in little-endian order. Unit values are
//! never pushed.

use pie_core::Primitive;

/// Bytecode operation codes. The discriminants are the wire encoding and
/// must stay in sync with the interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    // =========================================================================
    // Constants
    // =========================================================================
    PushNull = 0,
    /// Operand: u8, 0 or 1
    PushBool,
    /// Operand: i32
    PushInt,
    /// Operand: u32 offset of the string in the string table
    PushString,
    /// Pushes the current call frame's locals cell.
    PushLocals,

    // =========================================================================
    // Heap cells
    // =========================================================================
    /// Pops `n` values into a new cell and pushes a reference to it.
    /// Operand: u32 slot count
    Alloc,
    /// Pops a cell, pushes the value in the slot.
    /// Operand: u8 slot index
    Load,
    /// Pops a cell then a value, and stores the value in the slot.
    /// Operand: u8 slot index
    Store,
    /// Pops an array and an index, pushes the element.
    LoadArray,
    /// Pops an array, an index, and a value, and stores the element.
    StoreArray,
    /// Pops an array, pushes its length.
    SizeArray,

    // =========================================================================
    // Calls
    // =========================================================================
    /// Pops a function offset and calls it with no argument.
    Call0,
    /// Pops a function offset and calls it with the value beneath it.
    Call1,
    /// Pops a function offset and calls it with the argument tuple beneath it.
    CallN,
    /// Operand: i32 foreign function id
    ForeignCall0,
    /// Operand: i32 foreign function id
    ForeignCall1,
    /// Operand: i32 foreign function id
    ForeignCallN,
    Return,

    // =========================================================================
    // Control flow
    // =========================================================================
    /// Operand: u32 absolute offset
    Jump,
    /// Pops a Bool. Operand: u32 absolute offset
    JumpIfFalse,

    // =========================================================================
    // Primitives
    // =========================================================================
    BoolToString,
    IntToString,
    EqualBool,
    EqualInt,
    EqualString,
    LessInt,
    GreaterInt,
    NegateBool,
    NegateInt,
    AndBool,
    OrBool,
    AddInt,
    SubInt,
    MultInt,
    DivInt,
    AddString,
    Print,
    StringSize,
    Substring,
}

impl OpCode {
    const ALL: [OpCode; 39] = [
        OpCode::PushNull,
        OpCode::PushBool,
        OpCode::PushInt,
        OpCode::PushString,
        OpCode::PushLocals,
        OpCode::Alloc,
        OpCode::Load,
        OpCode::Store,
        OpCode::LoadArray,
        OpCode::StoreArray,
        OpCode::SizeArray,
        OpCode::Call0,
        OpCode::Call1,
        OpCode::CallN,
        OpCode::ForeignCall0,
        OpCode::ForeignCall1,
        OpCode::ForeignCallN,
        OpCode::Return,
        OpCode::Jump,
        OpCode::JumpIfFalse,
        OpCode::BoolToString,
        OpCode::IntToString,
        OpCode::EqualBool,
        OpCode::EqualInt,
        OpCode::EqualString,
        OpCode::LessInt,
        OpCode::GreaterInt,
        OpCode::NegateBool,
        OpCode::NegateInt,
        OpCode::AndBool,
        OpCode::OrBool,
        OpCode::AddInt,
        OpCode::SubInt,
        OpCode::MultInt,
        OpCode::DivInt,
        OpCode::AddString,
        OpCode::Print,
        OpCode::StringSize,
        OpCode::Substring,
    ];

    /// Decodes an opcode byte.
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    /// Size of the inline operand in bytes.
    pub fn operand_size(&self) -> usize {
        match self {
            OpCode::PushBool | OpCode::Load | OpCode::Store => 1,

            OpCode::PushInt
            | OpCode::PushString
            | OpCode::Alloc
            | OpCode::ForeignCall0
            | OpCode::ForeignCall1
            | OpCode::ForeignCallN
            | OpCode::Jump
            | OpCode::JumpIfFalse => 4,

            _ => 0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OpCode::PushNull => "PUSH_NULL",
            OpCode::PushBool => "PUSH_BOOL",
            OpCode::PushInt => "PUSH_INT",
            OpCode::PushString => "PUSH_STRING",
            OpCode::PushLocals => "PUSH_LOCALS",
            OpCode::Alloc => "ALLOC",
            OpCode::Load => "LOAD",
            OpCode::Store => "STORE",
            OpCode::LoadArray => "LOAD_ARRAY",
            OpCode::StoreArray => "STORE_ARRAY",
            OpCode::SizeArray => "SIZE_ARRAY",
            OpCode::Call0 => "CALL_0",
            OpCode::Call1 => "CALL_1",
            OpCode::CallN => "CALL_N",
            OpCode::ForeignCall0 => "FOREIGN_CALL_0",
            OpCode::ForeignCall1 => "FOREIGN_CALL_1",
            OpCode::ForeignCallN => "FOREIGN_CALL_N",
            OpCode::Return => "RETURN",
            OpCode::Jump => "JUMP",
            OpCode::JumpIfFalse => "JUMP_IF_FALSE",
            OpCode::BoolToString => "BOOL_TO_STRING",
            OpCode::IntToString => "INT_TO_STRING",
            OpCode::EqualBool => "EQUAL_BOOL",
            OpCode::EqualInt => "EQUAL_INT",
            OpCode::EqualString => "EQUAL_STRING",
            OpCode::LessInt => "LESS_INT",
            OpCode::GreaterInt => "GREATER_INT",
            OpCode::NegateBool => "NEGATE_BOOL",
            OpCode::NegateInt => "NEGATE_INT",
            OpCode::AndBool => "AND_BOOL",
            OpCode::OrBool => "OR_BOOL",
            OpCode::AddInt => "ADD_INT",
            OpCode::SubInt => "SUB_INT",
            OpCode::MultInt => "MULT_INT",
            OpCode::DivInt => "DIV_INT",
            OpCode::AddString => "ADD_STRING",
            OpCode::Print => "PRINT",
            OpCode::StringSize => "STRING_SIZE",
            OpCode::Substring => "SUBSTRING",
        }
    }
}

impl From<Primitive> for OpCode {
    fn from(primitive: Primitive) -> Self {
        match primitive {
            Primitive::BoolToString => OpCode::BoolToString,
            Primitive::IntToString => OpCode::IntToString,
            Primitive::EqualBool => OpCode::EqualBool,
            Primitive::EqualInt => OpCode::EqualInt,
            Primitive::EqualString => OpCode::EqualString,
            Primitive::LessInt => OpCode::LessInt,
            Primitive::GreaterInt => OpCode::GreaterInt,
            Primitive::NegateBool => OpCode::NegateBool,
            Primitive::NegateInt => OpCode::NegateInt,
            Primitive::AndBool => OpCode::AndBool,
            Primitive::OrBool => OpCode::OrBool,
            Primitive::AddInt => OpCode::AddInt,
            Primitive::SubInt => OpCode::SubInt,
            Primitive::MultInt => OpCode::MultInt,
            Primitive::DivInt => OpCode::DivInt,
            Primitive::AddString => OpCode::AddString,
            Primitive::Print => OpCode::Print,
            Primitive::StringSize => OpCode::StringSize,
            Primitive::Substring => OpCode::Substring,
            Primitive::LoadArray => OpCode::LoadArray,
            Primitive::StoreArray => OpCode::StoreArray,
            Primitive::SizeArray => OpCode::SizeArray,
        }
    }
}
