//! Qualified names, namespace search spaces, and mangled symbol names.

use std::fmt;

use crate::BoundDecl;

/// Separator between namespace segments.
pub const NAMESPACE_SEPARATOR: &str = "::";

/// Qualifies `name` with `namespace`, leaving it unchanged for the global
/// namespace.
pub fn qualify(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}{NAMESPACE_SEPARATOR}{name}")
    }
}

/// Builds the symbol-table key for a callable: base name, type arguments,
/// and the expanded parameter types.
///
/// ```
/// use pie_core::{BoundDecl, unique_name};
///
/// let name = unique_name("Add", &[], &[BoundDecl::INT, BoundDecl::INT]);
/// assert_eq!(name, "Add__(Int, Int)");
///
/// let name = unique_name("Id", &[BoundDecl::BOOL], &[BoundDecl::BOOL]);
/// assert_eq!(name, "Id__[Bool](Bool)");
/// ```
pub fn unique_name(name: &str, type_args: &[BoundDecl], param_types: &[BoundDecl]) -> String {
    let mut unique = format!("{name}__");
    if !type_args.is_empty() {
        unique.push('[');
        unique.push_str(&join(type_args));
        unique.push(']');
    }
    unique.push('(');
    unique.push_str(&join(param_types));
    unique.push(')');
    unique
}

/// Full name of a concrete type instance, e.g. `Option[Int]`.
pub fn type_instance_name(name: &str, type_args: &[BoundDecl]) -> String {
    if type_args.is_empty() {
        name.to_string()
    } else {
        format!("{name}[{}]", join(type_args))
    }
}

fn join(decls: &[BoundDecl]) -> String {
    decls.iter().map(|decl| decl.to_string()).collect::<Vec<_>>().join(", ")
}

/// The ordered set of namespaces consulted to fully qualify a short name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NameSearchSpace {
    /// The namespace the code is declared in. Searched right after the bare name.
    pub namespace: String,
    /// Namespaces opened with `using`, in declaration order. Searched in
    /// reverse so the most recently opened wins.
    pub usings: Vec<String>,
    /// Namespaces borrowed from a call site, in search order. Consulted only
    /// after `namespace` and `usings` have failed.
    pub fallback: Vec<String>,
}

impl NameSearchSpace {
    pub fn new(namespace: impl Into<String>, usings: Vec<String>) -> Self {
        Self {
            namespace: namespace.into(),
            usings,
            fallback: Vec::new(),
        }
    }

    /// The global namespace with nothing opened.
    pub fn global() -> Self {
        Self::default()
    }

    /// Combines this space with a second one, so code instantiated on behalf
    /// of a call site can also see what the call site sees.
    ///
    /// This space keeps precedence: the call site's namespace and usings
    /// (newest first) are searched only after every namespace visible here.
    pub fn combined(&self, additional: &NameSearchSpace) -> NameSearchSpace {
        let mut fallback = self.fallback.clone();
        let borrowed = std::iter::once(&additional.namespace)
            .chain(additional.usings.iter().rev())
            .chain(additional.fallback.iter());
        for name in borrowed {
            if *name != self.namespace && !self.usings.contains(name) && !fallback.contains(name) {
                fallback.push(name.clone());
            }
        }

        NameSearchSpace {
            namespace: self.namespace.clone(),
            usings: self.usings.clone(),
            fallback,
        }
    }

    /// Yields every candidate fully-qualified name for `name`, in search order:
    /// as written, in the current namespace, then each `using` newest first,
    /// then the borrowed call-site namespaces.
    pub fn search_for<'a>(&'a self, name: &'a str) -> impl Iterator<Item = String> + 'a {
        std::iter::once(name.to_string())
            .chain(std::iter::once(qualify(&self.namespace, name)))
            .chain(self.usings.iter().rev().map(move |using| qualify(using, name)))
            .chain(self.fallback.iter().map(move |namespace| qualify(namespace, name)))
    }
}

impl fmt::Display for NameSearchSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for using in &self.usings {
            writeln!(f, "using {using}")?;
        }
        if !self.namespace.is_empty() {
            writeln!(f, "namespace {}", self.namespace)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualify_global_and_nested() {
        assert_eq!(qualify("", "Foo"), "Foo");
        assert_eq!(qualify("Core::Text", "Foo"), "Core::Text::Foo");
    }

    #[test]
    fn search_order_is_name_namespace_then_usings_newest_first() {
        let space = NameSearchSpace::new("App", vec!["Core".into(), "Text".into()]);
        let candidates: Vec<_> = space.search_for("Trim").collect();
        assert_eq!(candidates, vec!["Trim", "App::Trim", "Text::Trim", "Core::Trim"]);
    }

    #[test]
    fn combined_space_searches_call_site_last() {
        let template = NameSearchSpace::new("Collections", vec!["Core".into()]);
        let call_site = NameSearchSpace::new("App", vec!["Core".into(), "Io".into()]);

        let combined = template.combined(&call_site);
        assert_eq!(combined.namespace, "Collections");
        assert_eq!(combined.usings, vec!["Core"]);
        assert_eq!(combined.fallback, vec!["App", "Io"]);

        let candidates: Vec<_> = combined.search_for("Sort").collect();
        assert_eq!(
            candidates,
            vec!["Sort", "Collections::Sort", "Core::Sort", "App::Sort", "Io::Sort"]
        );
    }

    #[test]
    fn combined_space_keeps_earlier_call_sites_ahead() {
        let outer = NameSearchSpace::new("App", vec![]);
        let middle = NameSearchSpace::new("Lib", vec![]).combined(&outer);
        let inner = NameSearchSpace::new("Util", vec![]).combined(&middle);
        assert_eq!(inner.fallback, vec!["Lib", "App"]);
    }

    #[test]
    fn unique_name_without_params() {
        assert_eq!(unique_name("Main", &[], &[]), "Main__()");
    }

    #[test]
    fn type_instance_names() {
        assert_eq!(type_instance_name("Point", &[]), "Point");
        assert_eq!(type_instance_name("Option", &[BoundDecl::INT]), "Option[Int]");
    }
}
