//! Pie Compiler
//!
//! Binds parsed Pie source files and emits a bytecode image.
//!
//! ## Architecture
//!
//! - **Registration**: declare every type and function signature
//! - **Binding**: bind function bodies, instantiating generics on demand
//!   and compiling `match` expressions to conditionals
//! - **Emission**: lay out the image and patch every forward reference
//!
//! ## Modules
//!
//! - [`bytecode`]: Opcodes, the image writer with its patch tables, and the
//!   image reader
//! - [`context`]: The per-compile symbol tables and binding context
//! - [`registration`]: Type and signature registration
//! - [`binder`]: Function body binding
//! - [`resolver`]: Name resolution over functions, intrinsics, and templates
//! - [`template`]: Generic instantiation and type-argument inference
//! - [`pattern`]: Match shape checking, coverage, and desugaring
//! - [`emit`]: Bytecode emission
//! - [`scope`]: Local variable scopes

pub mod binder;
pub mod bytecode;
mod companions;
pub mod context;
pub mod emit;
pub mod foreign;
pub mod intrinsics;
mod options;
pub mod pattern;
pub mod registration;
pub mod resolver;
pub mod scope;
pub mod template;
mod type_binder;

pub use bytecode::{CompiledImage, ImageError, ImageReader, OpCode};
pub use context::{BindingContext, CompilationContext};
pub use foreign::ForeignInterface;
pub use options::CompilerOptions;
pub use registration::{RegistrationOutput, RegistrationPass};

// Re-export the error types from core for convenience
pub use pie_core::{CompilationError, CompileError};

use log::debug;
use pie_core::{Function, SourceFile};
use pie_registry::Callable;

/// Result type for binding and emission.
pub type Result<T> = std::result::Result<T, CompilationError>;

/// One compile unit: its source files, its symbol tables, and its options.
///
/// Sources are added, bound together by [`bind_all`](Compiler::bind_all),
/// and emitted by [`compile`](Compiler::compile). A compiler is used for
/// one compile only.
pub struct Compiler {
    ctx: CompilationContext,
    options: CompilerOptions,
    sources: Vec<SourceFile>,
    parse_errors: Vec<CompileError>,
    foreign: Vec<Box<dyn ForeignInterface>>,
    bound: bool,
    /// The fault that stopped binding, reported again by `compile`.
    fault: Option<CompilationError>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self::with_options(CompilerOptions::default())
    }

    pub fn with_options(options: CompilerOptions) -> Self {
        Self {
            ctx: CompilationContext::new(),
            options,
            sources: Vec::new(),
            parse_errors: Vec::new(),
            foreign: Vec::new(),
            bound: false,
            fault: None,
        }
    }

    /// Makes a host's functions callable from the compiled code.
    pub fn add_foreign(&mut self, interface: impl ForeignInterface + 'static) {
        self.foreign.push(Box::new(interface));
    }

    pub fn add_source_file(&mut self, file: SourceFile) {
        debug!("added source file {}", file.path);
        self.sources.push(file);
    }

    /// Adds a single function to the global namespace.
    pub fn add_function(&mut self, function: Function) {
        self.sources.push(SourceFile::default().function(function));
    }

    /// Records a fault reported by the parser. Any parse fault stops the
    /// compile before binding.
    pub fn add_parse_error(&mut self, error: CompileError) {
        self.parse_errors.push(error);
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// The symbol tables, as far as they have been filled.
    pub fn context(&self) -> &CompilationContext {
        &self.ctx
    }

    /// Registers and binds everything added so far.
    ///
    /// Stops at the first fault. The fault is kept, so a later
    /// [`compile`](Compiler::compile) fails with it instead of emitting the
    /// partially bound tables.
    ///
    /// # Panics
    ///
    /// If called a second time.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn bind_all(&mut self) -> Result<()> {
        assert!(!self.bound, "a compiler binds its sources only once");
        self.bound = true;

        let result = self.bind_sources();
        if let Err(err) = &result {
            self.fault = Some(err.clone());
        }
        result
    }

    fn bind_sources(&mut self) -> Result<()> {
        self.register_builtins()?;
        RegistrationPass::new(&mut self.ctx).run(&self.sources)?;

        let mut bodies = 0;
        while let Some((unique_name, _)) = self.ctx.functions.next_pending() {
            self.ctx.bind_function_body(&unique_name)?;
            bodies += 1;
        }

        debug!(
            "bound {bodies} function bodies, {} type instance(s), {} function instance(s)",
            self.ctx.instances.type_instance_count(),
            self.ctx.instances.function_instance_count()
        );
        Ok(())
    }

    /// Binds all sources and emits the image.
    ///
    /// Returns the parse faults if there are any, otherwise the first
    /// compile fault. No image is produced unless there are no faults.
    pub fn compile(mut self) -> std::result::Result<CompiledImage, Vec<CompileError>> {
        if !self.parse_errors.is_empty() {
            return Err(self.parse_errors);
        }

        if !self.bound {
            self.bind_all().map_err(|err| vec![err.into()])?;
        }
        if let Some(fault) = self.fault.take() {
            return Err(vec![fault.into()]);
        }
        emit::emit_image(&self.ctx.functions, &self.options).map_err(|err| vec![err.into()])
    }

    fn register_builtins(&mut self) -> Result<()> {
        for intrinsic in intrinsics::all() {
            self.ctx
                .functions
                .add(Callable::Intrinsic(intrinsic), pie_core::Span::NONE)?;
        }
        for interface in &self.foreign {
            for function in interface.functions() {
                self.ctx
                    .functions
                    .add(Callable::Foreign(function), pie_core::Span::NONE)?;
            }
        }
        Ok(())
    }
}
