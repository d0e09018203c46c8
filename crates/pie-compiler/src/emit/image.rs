//! Image layout: header, export table, function code, string table.

use log::debug;
use pie_core::{BoundDecl, BoundExpr, CompilationError, Span};
use pie_registry::{BoundFunction, FunctionTable};
use rustc_hash::FxHashSet;

use super::BytecodeEmitter;
use crate::CompilerOptions;
use crate::Result;
use crate::bytecode::{CompiledImage, ImageWriter, MAGIC, OffsetTable, StringTable, VERSION};

/// Lays out every function in `functions` (or those reachable from the
/// entry point) into an image and patches all references.
///
/// # Panics
///
/// If a function to emit has no bound body.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn emit_image(functions: &FunctionTable, options: &CompilerOptions) -> Result<CompiledImage> {
    let entry = find_entry_point(functions, &options.entry_point)?;
    let main_takes_string = entry.ty.param == BoundDecl::STRING;

    let emitted: Vec<&BoundFunction> = if options.emit_all {
        functions.functions().collect()
    } else {
        let reachable = reachable_from(functions, &entry.unique_name);
        functions
            .functions()
            .filter(|function| reachable.contains(function.unique_name.as_str()))
            .collect()
    };

    let mut writer = ImageWriter::new();
    let mut function_offsets = OffsetTable::new();
    let mut strings = StringTable::new();

    writer.write_bytes(MAGIC);
    writer.write_u32(VERSION);
    writer.write_u8(u8::from(main_takes_string));

    writer.write_u32(1);
    strings.insert(&mut writer, &entry.unique_name);
    function_offsets.insert(&mut writer, entry.unique_name.clone());

    let mut layout = Vec::with_capacity(emitted.len());
    {
        let mut emitter = BytecodeEmitter::new(&mut writer, &mut function_offsets, &mut strings);
        for function in &emitted {
            let offset = emitter.emit_function(function);
            layout.push((function.unique_name.clone(), offset));
        }
    }

    function_offsets.patch(&mut writer);
    let strings_offset = strings.write(&mut writer);

    debug!(
        "emitted {} of {} function(s) into {} bytes, entry {}",
        layout.len(),
        functions.functions().count(),
        writer.position(),
        entry.unique_name
    );
    Ok(CompiledImage::new(writer.into_bytes(), layout, strings_offset))
}

/// The entry function: `name ()`, or failing that `name (String)`.
fn find_entry_point<'f>(functions: &'f FunctionTable, name: &str) -> Result<&'f BoundFunction> {
    let candidates = || functions.functions().filter(|function| function.name == name);
    candidates()
        .find(|function| function.ty.param.is_unit())
        .or_else(|| candidates().find(|function| function.ty.param == BoundDecl::STRING))
        .ok_or_else(|| {
            CompilationError::other(
                Span::NONE,
                format!("no entry point {name}() or {name}(String) is defined"),
            )
        })
}

/// Unique names of every function referenced, transitively, from `entry`.
fn reachable_from<'f>(functions: &'f FunctionTable, entry: &'f str) -> FxHashSet<&'f str> {
    let mut reachable = FxHashSet::default();
    let mut work = vec![entry];

    while let Some(name) = work.pop() {
        if !reachable.insert(name) {
            continue;
        }
        if let Some((body, _)) = functions.function(name).and_then(BoundFunction::bound_body) {
            collect_refs(body, &mut work);
        }
    }
    reachable
}

fn collect_refs<'e>(expr: &'e BoundExpr, refs: &mut Vec<&'e str>) {
    match expr {
        BoundExpr::FuncRef { unique_name, .. } => refs.push(unique_name),
        BoundExpr::Unit | BoundExpr::Bool(_) | BoundExpr::Int(_) | BoundExpr::String(_) | BoundExpr::Locals => {}
        BoundExpr::Load { source, .. } => collect_refs(source, refs),
        BoundExpr::Store { target, value, .. } => {
            collect_refs(value, refs);
            collect_refs(target, refs);
        }
        BoundExpr::Construct { fields, .. } | BoundExpr::Block(fields) => {
            for field in fields {
                collect_refs(field, refs);
            }
        }
        BoundExpr::ConstructUnion { payload, .. } => {
            if let Some(payload) = payload {
                collect_refs(payload, refs);
            }
        }
        BoundExpr::Intrinsic { arg, .. } | BoundExpr::ForeignCall { arg, .. } | BoundExpr::Return(arg) => {
            collect_refs(arg, refs)
        }
        BoundExpr::Call { target, arg, .. } => {
            collect_refs(arg, refs);
            collect_refs(target, refs);
        }
        BoundExpr::If {
            condition,
            then_body,
            else_body,
            ..
        } => {
            collect_refs(condition, refs);
            collect_refs(then_body, refs);
            if let Some(else_body) = else_body {
                collect_refs(else_body, refs);
            }
        }
        BoundExpr::While { condition, body } => {
            collect_refs(condition, refs);
            collect_refs(body, refs);
        }
    }
}
