//! Compiler configuration.

/// Options for one compile.
///
/// # Example
///
/// ```
/// use pie_compiler::CompilerOptions;
///
/// let options = CompilerOptions::default().entry_point("Start").emit_all(false);
/// assert_eq!(options.entry_point, "Start");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Base name of the exported entry function. It must take `()` or a
    /// single `String`.
    pub entry_point: String,
    /// Emit every bound function, or only those reachable from the entry
    /// point.
    pub emit_all: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            entry_point: "Main".to_string(),
            emit_all: true,
        }
    }
}

impl CompilerOptions {
    pub fn entry_point(mut self, name: impl Into<String>) -> Self {
        self.entry_point = name.into();
        self
    }

    pub fn emit_all(mut self, emit_all: bool) -> Self {
        self.emit_all = emit_all;
        self
    }
}
