//! Generic instance cache.
//!
//! Records which (template, type arguments) pairs have already been
//! instantiated, so each one is instantiated at most once.

use pie_core::{BoundDecl, TypeHash, TypeRef};
use rustc_hash::FxHashMap;

type InstanceKey = (TypeHash, Vec<TypeHash>);

fn instance_key(template: &str, type_args: &[BoundDecl]) -> InstanceKey {
    (
        TypeHash::from_name(template),
        type_args.iter().map(|arg| TypeHash::from_name(&arg.to_string())).collect(),
    )
}

/// Maps (template, type_args) to the instance produced for them.
#[derive(Debug, Default, Clone)]
pub struct InstanceCache {
    /// Type template instances: (template, args) → type
    type_instances: FxHashMap<InstanceKey, TypeRef>,
    /// Function template instances: (template, args) → unique names
    function_instances: FxHashMap<InstanceKey, Vec<String>>,
}

impl InstanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache_type_instance(&mut self, template: &str, type_args: &[BoundDecl], instance: TypeRef) {
        self.type_instances.insert(instance_key(template, type_args), instance);
    }

    pub fn get_type_instance(&self, template: &str, type_args: &[BoundDecl]) -> Option<&TypeRef> {
        self.type_instances.get(&instance_key(template, type_args))
    }

    /// Records a function instance. One template with one set of type
    /// arguments can still yield several instances when its parameters
    /// mention types that are not type parameters.
    pub fn cache_function_instance(&mut self, template: &str, type_args: &[BoundDecl], unique_name: String) {
        let instances = self
            .function_instances
            .entry(instance_key(template, type_args))
            .or_default();
        if !instances.contains(&unique_name) {
            instances.push(unique_name);
        }
    }

    pub fn function_instances(&self, template: &str, type_args: &[BoundDecl]) -> &[String] {
        self.function_instances
            .get(&instance_key(template, type_args))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn type_instance_count(&self) -> usize {
        self.type_instances.len()
    }

    pub fn function_instance_count(&self) -> usize {
        self.function_instances.values().map(Vec::len).sum()
    }
}
