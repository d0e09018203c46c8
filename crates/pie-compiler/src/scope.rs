//! Local scope management for function binding.
//!
//! Locals live in one heap cell per call (the "locals" frame) and are
//! addressed by slot. When the function takes an argument, slot 0 holds it;
//! every `def` takes the next slot. Slots of a closed block are reused by
//! later siblings, so the frame size is the high-water mark of live locals.

use pie_core::{BoundDecl, BoundExpr, CompilationError, Span};

/// Name of the reserved argument slot. Contains a space so it never
/// collides with a user local.
const ARG_SLOT_NAME: &str = " arg";

/// A local variable.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalVar {
    pub name: String,
    pub ty: BoundDecl,
    pub mutable: bool,
    pub slot: u8,
}

impl LocalVar {
    pub fn load(&self) -> BoundExpr {
        BoundExpr::local(self.slot, self.ty.clone())
    }
}

/// Local scope for a function being bound.
#[derive(Debug)]
pub struct LocalScope {
    /// Visible locals, innermost last.
    variables: Vec<LocalVar>,
    /// Start index into `variables` of each open block.
    frames: Vec<usize>,
    max_slots: usize,
}

impl LocalScope {
    /// Create the scope for a function body. `has_arg` reserves slot 0.
    pub fn new(has_arg: bool) -> Self {
        let mut scope = Self {
            variables: Vec::new(),
            frames: vec![0],
            max_slots: 0,
        };

        if has_arg {
            scope.variables.push(LocalVar {
                name: ARG_SLOT_NAME.to_string(),
                ty: BoundDecl::UNIT,
                mutable: false,
                slot: 0,
            });
            scope.max_slots = 1;
        }

        scope
    }

    // ==========================================================================
    // Scope Management
    // ==========================================================================

    /// Enter a new block.
    pub fn push_scope(&mut self) {
        self.frames.push(self.variables.len());
    }

    /// Exit the current block, forgetting the locals declared in it.
    pub fn pop_scope(&mut self) {
        let start = self.frames.pop().expect("popped the function scope");
        self.variables.truncate(start);
    }

    // ==========================================================================
    // Variable Declaration
    // ==========================================================================

    /// Declare a local in the current block.
    ///
    /// Locals of enclosing blocks may be shadowed; redeclaring one in the
    /// same block is an error.
    pub fn declare(&mut self, name: &str, ty: BoundDecl, mutable: bool, span: Span) -> Result<LocalVar, CompilationError> {
        let start = self.frames.last().copied().unwrap_or(0);
        if self.variables[start..].iter().any(|var| var.name == name) {
            return Err(CompilationError::DuplicateLocal {
                name: name.to_string(),
                span,
            });
        }

        let slot = u8::try_from(self.variables.len())
            .map_err(|_| CompilationError::other(span, "too many local variables in one function"))?;

        let var = LocalVar {
            name: name.to_string(),
            ty,
            mutable,
            slot,
        };
        self.variables.push(var.clone());
        self.max_slots = self.max_slots.max(self.variables.len());

        Ok(var)
    }

    // ==========================================================================
    // Variable Lookup
    // ==========================================================================

    /// The innermost visible local named `name`.
    pub fn get(&self, name: &str) -> Option<&LocalVar> {
        self.variables.iter().rev().find(|var| var.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of slots the locals frame needs.
    pub fn frame_size(&self) -> usize {
        self.max_slots
    }
}

/// Loads parameter `index` of a function whose parameters are `params`.
///
/// A lone parameter is the argument itself in slot 0. With several, slot 0
/// holds the argument tuple and each parameter is one of its fields.
pub fn load_param(params: &[BoundDecl], index: usize) -> BoundExpr {
    if params.len() == 1 {
        return BoundExpr::local(0, params[0].clone());
    }

    let arg = BoundExpr::local(0, BoundDecl::Tuple(params.to_vec()));
    BoundExpr::load(arg, index as u8, params[index].clone())
}
