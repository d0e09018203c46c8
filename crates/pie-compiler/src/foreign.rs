//! The seam for host-provided functions.

use pie_registry::ForeignFunction;

/// Supplies the functions a host makes callable from Pie code.
///
/// Each function is registered under its mangled name and compiled to a
/// `ForeignCall` carrying its id; the host dispatches on that id at runtime.
pub trait ForeignInterface {
    fn functions(&self) -> Vec<ForeignFunction>;
}

impl ForeignInterface for Vec<ForeignFunction> {
    fn functions(&self) -> Vec<ForeignFunction> {
        self.clone()
    }
}
