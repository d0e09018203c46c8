//! Compiled images: layout, patching, and the string table.

use pie_compiler::bytecode::{Instruction, Operand};
use pie_compiler::{CompiledImage, Compiler, CompilerOptions, ImageReader, OpCode};
use pie_core::{BoundDecl, Function, Param, SourceFile, UnboundDecl, UnboundExpr};
use pie_registry::ForeignFunction;

fn print(text: &str) -> UnboundExpr {
    UnboundExpr::apply("Print", UnboundExpr::string(text))
}

fn call(name: &str) -> UnboundExpr {
    UnboundExpr::apply(name, UnboundExpr::unit())
}

fn unit_function(name: &str, body: Vec<UnboundExpr>) -> Function {
    Function::new(name, vec![], UnboundDecl::UNIT, UnboundExpr::block(body))
}

fn compile(file: SourceFile) -> CompiledImage {
    let mut compiler = Compiler::new();
    compiler.add_source_file(file);
    compiler.compile().unwrap_or_else(|errors| panic!("compile failed: {errors:?}"))
}

fn code(image: &CompiledImage, unique_name: &str) -> Vec<Instruction> {
    let range = image.code_range(unique_name).unwrap();
    image.reader().unwrap().disassemble(range).unwrap()
}

fn string_operands(code: &[Instruction]) -> Vec<u32> {
    code.iter()
        .filter(|instruction| instruction.op == OpCode::PushString)
        .map(|instruction| match instruction.operand {
            Operand::Offset(offset) => offset,
            other => panic!("PushString with operand {other:?}"),
        })
        .collect()
}

/// Every string in the table, in order.
fn strings(image: &CompiledImage) -> Vec<String> {
    image.bytes()[image.strings_offset() as usize..]
        .split(|&byte| byte == 0)
        .filter(|bytes| !bytes.is_empty())
        .map(|bytes| String::from_utf8(bytes.to_vec()).unwrap())
        .collect()
}

// =============================================================================
// Header
// =============================================================================

#[test]
fn test_header_and_export() {
    let image = compile(SourceFile::new("main.pie").function(unit_function("Main", vec![print("hi")])));
    let reader = image.reader().unwrap();

    assert_eq!(&image.bytes()[..4], b"pie!");
    assert!(!reader.main_takes_string());
    assert_eq!(reader.exports().len(), 1);

    let export = reader.exports()[0];
    assert_eq!(reader.read_string(export.name_offset).unwrap(), "Main__()");
    assert_eq!(Some(export.code_offset), image.function_offset("Main__()"));
}

#[test]
fn test_main_may_take_a_string() {
    let main = Function::new(
        "Main",
        vec![Param::new("input", UnboundDecl::STRING)],
        UnboundDecl::UNIT,
        UnboundExpr::apply("Print", UnboundExpr::name("input")),
    );
    let image = compile(SourceFile::new("main.pie").function(main));
    let reader = image.reader().unwrap();

    assert!(reader.main_takes_string());
    let export = reader.exports()[0];
    assert_eq!(reader.read_string(export.name_offset).unwrap(), "Main__(String)");
    assert_eq!(reader.locals_count(export.code_offset).unwrap(), 1);
}

#[test]
fn test_missing_entry_point_is_a_fault() {
    let mut compiler = Compiler::new();
    compiler.add_function(unit_function("Start", vec![]));
    let errors = compiler.compile().unwrap_err();
    assert!(errors[0].message.contains("Main"));

    let mut compiler = Compiler::with_options(CompilerOptions::default().entry_point("Start"));
    compiler.add_function(unit_function("Start", vec![]));
    compiler.compile().unwrap();
}

// =============================================================================
// Patching
// =============================================================================

#[test]
fn test_call_targets_are_function_offsets() {
    let file = SourceFile::new("main.pie")
        .function(unit_function("Main", vec![call("A"), call("B")]))
        .function(unit_function("A", vec![call("B")]))
        .function(unit_function("B", vec![print("b")]));
    let image = compile(file);

    let starts: Vec<u32> = image.functions().map(|(_, offset)| offset).collect();
    let mut calls = 0;
    for (name, _) in image.functions() {
        let code = code(&image, name);
        for pair in code.windows(2) {
            if matches!(pair[1].op, OpCode::Call0 | OpCode::Call1 | OpCode::CallN) {
                assert_eq!(pair[0].op, OpCode::PushInt);
                let Operand::Int(target) = pair[0].operand else {
                    panic!("call target is not an int");
                };
                assert!(starts.contains(&(target as u32)), "{name} calls {target}, which is no function");
                calls += 1;
            }
        }
    }
    assert_eq!(calls, 3);

    let main = code(&image, "Main__()");
    assert_eq!(main[0].operand, Operand::Int(image.function_offset("A__()").unwrap() as i32));
    assert_eq!(main[2].operand, Operand::Int(image.function_offset("B__()").unwrap() as i32));
}

#[test]
fn test_jumps_land_on_instructions() {
    // def mutable i <- 0
    // while i < 3 do
    //     if i = 1 then Print "one" else Print "other"
    //     i <- i + 1
    let i = || UnboundExpr::name("i");
    let main = unit_function(
        "Main",
        vec![
            UnboundExpr::define_mutable("i", UnboundExpr::int(0)),
            UnboundExpr::while_do(
                UnboundExpr::op(i(), "<", UnboundExpr::int(3)),
                UnboundExpr::block(vec![
                    UnboundExpr::if_else(
                        UnboundExpr::op(i(), "=", UnboundExpr::int(1)),
                        print("one"),
                        print("other"),
                    ),
                    UnboundExpr::assign(i(), UnboundExpr::op(i(), "+", UnboundExpr::int(1))),
                ]),
            ),
        ],
    );
    let image = compile(SourceFile::new("main.pie").function(main));
    let range = image.code_range("Main__()").unwrap();
    let code = code(&image, "Main__()");

    let boundaries: Vec<u32> = code
        .iter()
        .map(|instruction| instruction.offset)
        .chain(std::iter::once(range.end))
        .collect();

    let jumps: Vec<_> = code
        .iter()
        .filter(|instruction| matches!(instruction.op, OpCode::Jump | OpCode::JumpIfFalse))
        .collect();
    assert_eq!(jumps.len(), 4);
    for jump in &jumps {
        let Operand::Offset(target) = jump.operand else {
            panic!("jump without an offset");
        };
        assert!(boundaries.contains(&target), "jump at {} to {target}", jump.offset);
    }

    // the loop's back edge returns to its condition
    let back_edge = jumps.iter().rev().find(|jump| jump.op == OpCode::Jump).unwrap();
    let Operand::Offset(head) = back_edge.operand else {
        unreachable!()
    };
    assert!(head < back_edge.offset);
    let condition = code.iter().find(|instruction| instruction.offset == head).unwrap();
    assert_eq!(condition.op, OpCode::PushLocals);
}

#[test]
fn test_early_return_leaves_the_function() {
    // Clamp (n Int) Int =
    //     if n < 0 then return 0
    //     n
    let n = || UnboundExpr::name("n");
    let clamp = Function::new(
        "Clamp",
        vec![Param::new("n", UnboundDecl::INT)],
        UnboundDecl::INT,
        UnboundExpr::block(vec![
            UnboundExpr::if_then(
                UnboundExpr::op(n(), "<", UnboundExpr::int(0)),
                UnboundExpr::ret(UnboundExpr::int(0)),
            ),
            n(),
        ]),
    );
    let main = unit_function(
        "Main",
        vec![UnboundExpr::apply(
            "Print",
            UnboundExpr::apply("String", UnboundExpr::apply("Clamp", UnboundExpr::int(5))),
        )],
    );
    let image = compile(SourceFile::new("main.pie").function(clamp).function(main));
    let code = code(&image, "Clamp__(Int)");

    let returns: Vec<_> = code
        .iter()
        .enumerate()
        .filter(|(_, instruction)| instruction.op == OpCode::Return)
        .map(|(index, _)| index)
        .collect();
    assert_eq!(returns.len(), 2);
    assert_eq!(returns[1], code.len() - 1);

    let early = &code[returns[0] - 1];
    assert_eq!(early.op, OpCode::PushInt);
    assert_eq!(early.operand, Operand::Int(0));

    // the if's skip lands just past the early return
    let skip = code.iter().find(|instruction| instruction.op == OpCode::JumpIfFalse).unwrap();
    assert_eq!(skip.operand, Operand::Offset(code[returns[0]].next_offset()));
}

// =============================================================================
// Strings
// =============================================================================

#[test]
fn test_identical_strings_share_an_entry() {
    let file = SourceFile::new("main.pie")
        .function(unit_function("Main", vec![print("hello"), call("Greet")]))
        .function(unit_function("Greet", vec![print("hello"), print("again")]));
    let image = compile(file);
    let reader = image.reader().unwrap();

    assert_eq!(strings(&image), vec!["Main__()", "again", "hello"]);

    let main = string_operands(&code(&image, "Main__()"));
    let greet = string_operands(&code(&image, "Greet__()"));
    assert_eq!(main[0], greet[0]);
    assert_eq!(reader.read_string(main[0]).unwrap(), "hello");
    assert_eq!(reader.read_string(greet[1]).unwrap(), "again");
    assert!(main[0] >= image.strings_offset());
}

// =============================================================================
// Emission Scope
// =============================================================================

#[test]
fn test_unreachable_functions_are_skipped_on_request() {
    let file = || {
        SourceFile::new("main.pie")
            .function(unit_function("Main", vec![call("Used")]))
            .function(unit_function("Used", vec![]))
            .function(unit_function("Unused", vec![print("never")]))
    };

    let all = compile(file());
    assert!(all.function_offset("Unused__()").is_some());

    let mut compiler = Compiler::with_options(CompilerOptions::default().emit_all(false));
    compiler.add_source_file(file());
    let reachable = compiler.compile().unwrap();
    let names: Vec<_> = reachable.functions().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["Main__()", "Used__()"]);
    assert!(!strings(&reachable).contains(&"never".to_string()));
}

#[test]
fn test_foreign_calls_carry_their_id() {
    let mut compiler = Compiler::new();
    compiler.add_foreign(vec![ForeignFunction::new(
        "Console::Write",
        7,
        vec![BoundDecl::STRING],
        BoundDecl::UNIT,
    )]);
    compiler.add_function(unit_function(
        "Main",
        vec![UnboundExpr::apply("Console::Write", UnboundExpr::string("x"))],
    ));
    let image = compiler.compile().unwrap();

    let main = code(&image, "Main__()");
    assert_eq!(main[1].op, OpCode::ForeignCall1);
    assert_eq!(main[1].operand, Operand::Int(7));
}

#[test]
fn test_generated_functions_are_emitted() {
    // def f <- fn (x Int) Int => x + 1
    // Print (String (f 2))
    let lambda = UnboundExpr::LocalFunction {
        params: vec![Param::new("x", UnboundDecl::INT)],
        ret: UnboundDecl::INT,
        body: Box::new(UnboundExpr::op(UnboundExpr::name("x"), "+", UnboundExpr::int(1))),
        span: pie_core::Span::NONE,
    };
    let main = unit_function(
        "Main",
        vec![
            UnboundExpr::define("f", lambda),
            UnboundExpr::apply(
                "Print",
                UnboundExpr::apply("String", UnboundExpr::call(UnboundExpr::name("f"), UnboundExpr::int(2))),
            ),
        ],
    );
    let image = compile(SourceFile::new("main.pie").function(main));

    assert_eq!(image.functions().count(), 2);
    let reader = ImageReader::new(image.bytes()).unwrap();
    let main_offset = image.function_offset("Main__()").unwrap();
    assert_eq!(reader.locals_count(main_offset).unwrap(), 1);
}
