//! Compile faults.
//!
//! ## Error Hierarchy
//!
//! ```text
//! CompileError (flattened record returned to the host)
//! ├── stage = Parse    - supplied by the external parser
//! └── stage = Compile  - built from a CompilationError
//! ```
//!
//! [`CompilationError`] is what the binder and the pattern-match compiler
//! raise. The first one aborts the compile unit. Internal invariant
//! violations are panics, never errors.

use std::fmt;

use thiserror::Error;

use crate::Span;

/// The phase that produced a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompileStage {
    Parse,
    Compile,
}

impl fmt::Display for CompileStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileStage::Parse => f.write_str("parse"),
            CompileStage::Compile => f.write_str("compile"),
        }
    }
}

// ============================================================================
// Compilation Errors
// ============================================================================

/// Semantic faults raised while binding a compile unit.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompilationError {
    /// No local, function, or template matched the name and argument types.
    #[error("at {span}: could not resolve name {name}")]
    UnresolvedName { name: String, span: Span },

    #[error("at {span}: could not find a type named {name}")]
    UnknownType { name: String, span: Span },

    /// A generic matched by name but its type arguments could not be inferred.
    #[error("at {span}: could not infer type arguments for {name} from ({args})")]
    InferenceFailed { name: String, args: String, span: Span },

    #[error("at {span}: {name} expects {expected} type argument(s) but was given {found}")]
    TypeArgCountMismatch {
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("at {span}: {name} is declared to return {declared} but is returning {actual}")]
    ReturnTypeMismatch {
        name: String,
        declared: String,
        actual: String,
        span: Span,
    },

    #[error("at {span}: cannot assign to {target}")]
    InvalidAssignmentTarget { target: String, span: Span },

    #[error("at {span}: cannot assign to immutable local {name}")]
    ImmutableAssignment { name: String, span: Span },

    #[error("at {span}: match over {ty} is not exhaustive")]
    NonExhaustiveMatch { ty: String, span: Span },

    #[error("at {span}: case {pattern} will never be matched")]
    UnreachablePattern { pattern: String, span: Span },

    #[error("at {span}: case {pattern} is not the right shape to match a value of type {ty}")]
    PatternShape { pattern: String, ty: String, span: Span },

    #[error("at {span}: variable {name} is bound more than once in the same pattern")]
    NonLinearPattern { name: String, span: Span },

    /// Two definitions produced the same mangled name.
    #[error("at {span}: {name} is already defined")]
    DuplicateDefinition { name: String, span: Span },

    #[error("at {span}: a local variable named {name} is already defined in this scope")]
    DuplicateLocal { name: String, span: Span },

    #[error("at {span}: {message}")]
    TypeMismatch { message: String, span: Span },

    #[error("at {span}: {message}")]
    Other { message: String, span: Span },
}

impl CompilationError {
    pub fn span(&self) -> Span {
        match self {
            CompilationError::UnresolvedName { span, .. }
            | CompilationError::UnknownType { span, .. }
            | CompilationError::InferenceFailed { span, .. }
            | CompilationError::TypeArgCountMismatch { span, .. }
            | CompilationError::ReturnTypeMismatch { span, .. }
            | CompilationError::InvalidAssignmentTarget { span, .. }
            | CompilationError::ImmutableAssignment { span, .. }
            | CompilationError::NonExhaustiveMatch { span, .. }
            | CompilationError::UnreachablePattern { span, .. }
            | CompilationError::PatternShape { span, .. }
            | CompilationError::NonLinearPattern { span, .. }
            | CompilationError::DuplicateDefinition { span, .. }
            | CompilationError::DuplicateLocal { span, .. }
            | CompilationError::TypeMismatch { span, .. }
            | CompilationError::Other { span, .. } => *span,
        }
    }

    /// Semantic faults always belong to the compile stage.
    pub fn stage(&self) -> CompileStage {
        CompileStage::Compile
    }

    /// The message without the position prefix.
    pub fn message(&self) -> String {
        let full = self.to_string();
        let prefix = format!("at {}: ", self.span());
        full.strip_prefix(&prefix).map(str::to_string).unwrap_or(full)
    }

    pub fn type_mismatch(span: Span, message: impl Into<String>) -> Self {
        CompilationError::TypeMismatch {
            message: message.into(),
            span,
        }
    }

    pub fn other(span: Span, message: impl Into<String>) -> Self {
        CompilationError::Other {
            message: message.into(),
            span,
        }
    }
}

// ============================================================================
// Compile Errors
// ============================================================================

/// A fault as reported to the host: stage, position, and message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{stage} error at {span}: {message}")]
pub struct CompileError {
    pub stage: CompileStage,
    pub span: Span,
    pub message: String,
}

impl CompileError {
    /// A fault reported by the external parser.
    pub fn parse(span: Span, message: impl Into<String>) -> Self {
        Self {
            stage: CompileStage::Parse,
            span,
            message: message.into(),
        }
    }

    pub fn line(&self) -> u32 {
        self.span.line
    }
}

impl From<CompilationError> for CompileError {
    fn from(err: CompilationError) -> Self {
        Self {
            stage: err.stage(),
            span: err.span(),
            message: err.message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compilation_error_display() {
        let err = CompilationError::UnresolvedName {
            name: "Foo__(Int)".to_string(),
            span: Span::new(3, 5),
        };
        assert_eq!(err.to_string(), "at 3:5: could not resolve name Foo__(Int)");
        assert_eq!(err.message(), "could not resolve name Foo__(Int)");
    }

    #[test]
    fn compilation_error_span() {
        let span = Span::new(5, 10);
        let err = CompilationError::NonExhaustiveMatch {
            ty: "Bool".to_string(),
            span,
        };
        assert_eq!(err.span(), span);
        assert_eq!(err.stage(), CompileStage::Compile);
    }

    #[test]
    fn compile_error_from_compilation_error() {
        let err: CompileError = CompilationError::UnreachablePattern {
            pattern: "Foo".to_string(),
            span: Span::line(9),
        }
        .into();

        assert_eq!(err.stage, CompileStage::Compile);
        assert_eq!(err.line(), 9);
        assert_eq!(err.message, "case Foo will never be matched");
        assert_eq!(err.to_string(), "compile error at 9: case Foo will never be matched");
    }

    #[test]
    fn parse_error_record() {
        let err = CompileError::parse(Span::new(1, 2), "expected 'end'");
        assert_eq!(err.stage, CompileStage::Parse);
        assert_eq!(err.to_string(), "parse error at 1:2: expected 'end'");
    }
}
