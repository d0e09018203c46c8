//! Binding of declarations and function bodies.

use pie_compiler::{CompilationError, CompileError, Compiler, CompilerOptions};
use pie_core::{
    BoundDecl, CompileStage, FieldDecl, Function, Namespace, Param, SourceFile, Span, Struct, TypeRef, UnboundDecl,
    UnboundExpr,
};

fn unit_main(body: Vec<UnboundExpr>) -> Function {
    Function::new("Main", vec![], UnboundDecl::UNIT, UnboundExpr::block(body))
}

fn bind(file: SourceFile) -> (Compiler, Result<(), CompilationError>) {
    let mut compiler = Compiler::new();
    compiler.add_source_file(file);
    let result = compiler.bind_all();
    (compiler, result)
}

fn bind_main(body: Vec<UnboundExpr>) -> Result<(), CompilationError> {
    bind(SourceFile::new("main.pie").function(unit_main(body))).1
}

fn point() -> Struct {
    Struct::new(
        "Point",
        vec![FieldDecl::new("x", UnboundDecl::INT), FieldDecl::mutable("y", UnboundDecl::INT)],
    )
}

// =============================================================================
// Companions
// =============================================================================

#[test]
fn test_struct_companions() {
    let (compiler, result) = bind(SourceFile::new("point.pie").structure(point()));
    result.unwrap();

    let functions = &compiler.context().functions;
    let this = BoundDecl::Struct(TypeRef::new("Point", vec![]));

    let constructor = functions.find("Point", &[], &[BoundDecl::INT, BoundDecl::INT]).unwrap();
    assert_eq!(constructor.ty().ret, this);
    assert!(functions.find("x", &[], &[this.clone()]).is_some());
    assert!(functions.find("y", &[], &[this.clone()]).is_some());
    assert!(functions.find("y<-", &[], &[this.clone(), BoundDecl::INT]).is_some());
    assert!(functions.find("x<-", &[], &[this, BoundDecl::INT]).is_none());
}

#[test]
fn test_setter_through_call_syntax() {
    // def p <- Point (1, 2)
    // y p <- 3
    let file = SourceFile::new("point.pie").structure(point()).function(unit_main(vec![
        UnboundExpr::define(
            "p",
            UnboundExpr::apply("Point", UnboundExpr::tuple(vec![UnboundExpr::int(1), UnboundExpr::int(2)])),
        ),
        UnboundExpr::assign(UnboundExpr::apply("y", UnboundExpr::name("p")), UnboundExpr::int(3)),
    ]));
    bind(file).1.unwrap();
}

#[test]
fn test_immutable_field_has_no_setter() {
    let file = SourceFile::new("point.pie").structure(point()).function(unit_main(vec![
        UnboundExpr::define(
            "p",
            UnboundExpr::apply("Point", UnboundExpr::tuple(vec![UnboundExpr::int(1), UnboundExpr::int(2)])),
        ),
        UnboundExpr::assign(UnboundExpr::apply("x", UnboundExpr::name("p")), UnboundExpr::int(3)),
    ]));
    assert!(matches!(
        bind(file).1,
        Err(CompilationError::UnresolvedName { ref name, .. }) if name == "x<-__(Point, Int)"
    ));
}

// =============================================================================
// Namespaces
// =============================================================================

#[test]
fn test_using_opens_a_namespace() {
    let text = Namespace {
        name: "Text".into(),
        functions: vec![Function::new(
            "Shout",
            vec![Param::new("s", UnboundDecl::STRING)],
            UnboundDecl::STRING,
            UnboundExpr::op(UnboundExpr::name("s"), "+", UnboundExpr::string("!")),
        )],
        ..Namespace::default()
    };
    let call = || UnboundExpr::apply("Print", UnboundExpr::apply("Shout", UnboundExpr::string("hi")));

    let closed = SourceFile::new("main.pie").namespace(text.clone()).function(unit_main(vec![call()]));
    assert!(matches!(bind(closed).1, Err(CompilationError::UnresolvedName { .. })));

    let opened = SourceFile::new("main.pie")
        .using("Text")
        .namespace(text)
        .function(unit_main(vec![call()]));
    let (compiler, result) = bind(opened);
    result.unwrap();
    assert!(compiler.context().functions.contains("Text::Shout__(String)"));
}

#[test]
fn test_duplicate_signature_is_rejected() {
    let file = SourceFile::new("main.pie")
        .function(unit_main(vec![]))
        .function(unit_main(vec![]).at(Span::line(9)));
    assert_eq!(
        bind(file).1,
        Err(CompilationError::DuplicateDefinition {
            name: "Main__()".into(),
            span: Span::line(9),
        })
    );
}

// =============================================================================
// Locals and Assignment
// =============================================================================

#[test]
fn test_immutable_local_cannot_be_assigned() {
    let result = bind_main(vec![
        UnboundExpr::define("a", UnboundExpr::int(1)),
        UnboundExpr::assign(UnboundExpr::name("a"), UnboundExpr::int(2)),
    ]);
    assert!(matches!(result, Err(CompilationError::ImmutableAssignment { ref name, .. }) if name == "a"));
}

#[test]
fn test_literal_is_not_assignable() {
    let result = bind_main(vec![UnboundExpr::assign(UnboundExpr::int(1), UnboundExpr::int(2))]);
    assert!(matches!(result, Err(CompilationError::InvalidAssignmentTarget { .. })));
}

#[test]
fn test_duplicate_local_in_one_block() {
    let result = bind_main(vec![
        UnboundExpr::define("a", UnboundExpr::int(1)),
        UnboundExpr::define("a", UnboundExpr::int(2)),
    ]);
    assert!(matches!(result, Err(CompilationError::DuplicateLocal { .. })));
}

#[test]
fn test_tuple_destructuring() {
    let result = bind_main(vec![
        UnboundExpr::Define {
            names: vec!["a".into(), "b".into()],
            value: Box::new(UnboundExpr::tuple(vec![UnboundExpr::int(1), UnboundExpr::string("s")])),
            mutable: false,
            span: Span::NONE,
        },
        UnboundExpr::apply("Print", UnboundExpr::name("b")),
        UnboundExpr::apply("Print", UnboundExpr::apply("String", UnboundExpr::name("a"))),
    ]);
    result.unwrap();
}

// =============================================================================
// Types
// =============================================================================

#[test]
fn test_return_type_must_match_body() {
    let file = SourceFile::new("main.pie").function(
        Function::new("Five", vec![], UnboundDecl::STRING, UnboundExpr::int(5)).at(Span::line(3)),
    );
    assert_eq!(
        bind(file).1,
        Err(CompilationError::ReturnTypeMismatch {
            name: "Five".into(),
            declared: "String".into(),
            actual: "Int".into(),
            span: Span::line(3),
        })
    );
}

#[test]
fn test_block_values_must_be_unit_before_the_last() {
    let result = bind_main(vec![UnboundExpr::int(1), UnboundExpr::unit()]);
    assert!(matches!(result, Err(CompilationError::TypeMismatch { .. })));
}

#[test]
fn test_if_without_else_must_be_unit() {
    let result = bind_main(vec![UnboundExpr::if_then(UnboundExpr::bool(true), UnboundExpr::int(1))]);
    assert!(matches!(result, Err(CompilationError::TypeMismatch { .. })));
}

fn abs(body: Vec<UnboundExpr>, ret: UnboundDecl) -> Function {
    Function::new("Abs", vec![Param::new("n", UnboundDecl::INT)], ret, UnboundExpr::block(body)).at(Span::line(4))
}

fn negative() -> UnboundExpr {
    UnboundExpr::op(UnboundExpr::name("n"), "<", UnboundExpr::int(0))
}

#[test]
fn test_early_return_from_if_without_else() {
    // Abs (n Int) Int =
    //     if n < 0 then return 0 - n
    //     n
    let file = SourceFile::new("main.pie").function(abs(
        vec![
            UnboundExpr::if_then(
                negative(),
                UnboundExpr::ret(UnboundExpr::op(UnboundExpr::int(0), "-", UnboundExpr::name("n"))),
            ),
            UnboundExpr::name("n"),
        ],
        UnboundDecl::INT,
    ));
    let (compiler, result) = bind(file);
    result.unwrap();

    let (body, _) = compiler.context().functions.function("Abs__(Int)").unwrap().bound_body().unwrap();
    assert_eq!(body.ty(), BoundDecl::INT);
}

#[test]
fn test_returned_value_must_match_declared_type() {
    let file = SourceFile::new("main.pie").function(abs(
        vec![
            UnboundExpr::if_then(negative(), UnboundExpr::ret(UnboundExpr::string("negative")).at(Span::line(5))),
            UnboundExpr::name("n"),
        ],
        UnboundDecl::INT,
    ));
    assert_eq!(
        bind(file).1,
        Err(CompilationError::ReturnTypeMismatch {
            name: "Abs".into(),
            declared: "Int".into(),
            actual: "String".into(),
            span: Span::line(5),
        })
    );
}

#[test]
fn test_trailing_return_is_unneeded() {
    let file = SourceFile::new("main.pie").function(abs(vec![UnboundExpr::ret(UnboundExpr::name("n"))], UnboundDecl::INT));
    assert!(matches!(
        bind(file).1,
        Err(CompilationError::Other { ref message, span }) if message.contains("unneeded explicit return") && span == Span::line(4)
    ));
}

#[test]
fn test_array_indexing_and_size() {
    // def xs <- [1, 2, 3]
    // Print (String (xs 1 + Size xs))
    let xs = || UnboundExpr::name("xs");
    let result = bind_main(vec![
        UnboundExpr::define(
            "xs",
            UnboundExpr::array(vec![UnboundExpr::int(1), UnboundExpr::int(2), UnboundExpr::int(3)]),
        ),
        UnboundExpr::apply(
            "Print",
            UnboundExpr::apply(
                "String",
                UnboundExpr::op(
                    UnboundExpr::call(xs(), UnboundExpr::int(1)),
                    "+",
                    UnboundExpr::apply("Size", xs()),
                ),
            ),
        ),
    ]);
    result.unwrap();
}

#[test]
fn test_mixed_array_is_rejected() {
    let result = bind_main(vec![UnboundExpr::define(
        "xs",
        UnboundExpr::array(vec![UnboundExpr::int(1), UnboundExpr::bool(true)]),
    )]);
    assert!(matches!(result, Err(CompilationError::TypeMismatch { .. })));
}

#[test]
fn test_immutable_array_cannot_be_stored_into() {
    let result = bind_main(vec![
        UnboundExpr::define("xs", UnboundExpr::array(vec![UnboundExpr::int(1)])),
        UnboundExpr::assign(UnboundExpr::call(UnboundExpr::name("xs"), UnboundExpr::int(0)), UnboundExpr::int(2)),
    ]);
    assert!(matches!(result, Err(CompilationError::UnresolvedName { .. })));
}

#[test]
fn test_record_fields_read_by_name() {
    let record = UnboundExpr::Record(
        vec![("name".into(), UnboundExpr::string("pie")), ("size".into(), UnboundExpr::int(3))],
        Span::NONE,
    );
    let result = bind_main(vec![
        UnboundExpr::define("r", record),
        UnboundExpr::apply("Print", UnboundExpr::apply("name", UnboundExpr::name("r"))),
    ]);
    result.unwrap();
}

#[test]
fn test_function_reference_to_user_function() {
    let double = Function::new(
        "Double",
        vec![Param::new("n", UnboundDecl::INT)],
        UnboundDecl::INT,
        UnboundExpr::op(UnboundExpr::name("n"), "*", UnboundExpr::int(2)),
    );
    let file = SourceFile::new("main.pie").function(double).function(unit_main(vec![
        UnboundExpr::define("f", UnboundExpr::func_ref("Double", vec![UnboundDecl::INT])),
        UnboundExpr::apply(
            "Print",
            UnboundExpr::apply("String", UnboundExpr::call(UnboundExpr::name("f"), UnboundExpr::int(4))),
        ),
    ]));
    bind(file).1.unwrap();

    let intrinsic = bind_main(vec![UnboundExpr::define(
        "f",
        UnboundExpr::func_ref("Not", vec![UnboundDecl::BOOL]),
    )]);
    assert!(matches!(intrinsic, Err(CompilationError::Other { .. })));
}

// =============================================================================
// Faults
// =============================================================================

#[test]
fn test_parse_errors_stop_the_compile() {
    let mut compiler = Compiler::new();
    compiler.add_function(unit_main(vec![]));
    compiler.add_parse_error(CompileError::parse(Span::new(2, 4), "expected 'end'"));

    let errors = compiler.compile().unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].stage, CompileStage::Parse);
    assert_eq!(errors[0].message, "expected 'end'");
}

#[test]
fn test_first_compile_fault_is_reported() {
    let mut compiler = Compiler::new();
    compiler.add_function(unit_main(vec![UnboundExpr::apply("Missing", UnboundExpr::int(1))]));

    let errors = compiler.compile().unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].stage, CompileStage::Compile);
    assert_eq!(errors[0].message, "could not resolve name Missing__(Int)");
}

#[test]
fn test_compile_after_failed_bind_reports_the_fault() {
    for options in [CompilerOptions::default(), CompilerOptions::default().emit_all(false)] {
        let broken = Function::new(
            "Broken",
            vec![],
            UnboundDecl::UNIT,
            UnboundExpr::apply("Missing", UnboundExpr::int(1)),
        );
        let mut compiler = Compiler::with_options(options);
        compiler.add_source_file(SourceFile::new("main.pie").function(unit_main(vec![])).function(broken));

        assert!(matches!(compiler.bind_all(), Err(CompilationError::UnresolvedName { .. })));

        let errors = compiler.compile().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].stage, CompileStage::Compile);
        assert_eq!(errors[0].message, "could not resolve name Missing__(Int)");
    }
}
