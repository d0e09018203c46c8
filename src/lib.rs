//! Pie
//!
//! Binds parsed Pie programs and compiles them to bytecode images.
//!
//! The parser and the interpreter live outside this crate: a host hands
//! [`Compiler`](prelude::Compiler) unbound source trees and receives either a
//! [`CompiledImage`](prelude::CompiledImage) or the faults that prevented one.

pub use pie_compiler;
pub use pie_core;
pub use pie_registry;

// Re-export main types
pub mod prelude {
    pub use pie_compiler::{CompiledImage, Compiler, CompilerOptions, ForeignInterface, ImageReader};
    pub use pie_core::{
        CaseDecl, CompilationError, CompileError, CompileStage, FieldDecl, Function, MatchCase, Namespace, Param,
        Pattern, SourceFile, Span, Struct, UnboundDecl, UnboundExpr, Union,
    };
    pub use pie_registry::ForeignFunction;
}
