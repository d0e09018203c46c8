//! `match` expressions: shape checking, coverage, and lowering.

use pie_compiler::{CompilationError, Compiler};
use pie_core::{
    CaseDecl, CompileStage, Function, MatchCase, Param, Pattern, SourceFile, Span, UnboundDecl, UnboundExpr, Union,
};

fn case(pattern: Pattern, body: UnboundExpr) -> MatchCase {
    MatchCase::new(pattern, body)
}

fn case_at(line: u32, pattern: Pattern, body: UnboundExpr) -> MatchCase {
    MatchCase {
        span: Span::line(line),
        ..MatchCase::new(pattern, body)
    }
}

/// `F (x ty) ret = match x ...`
fn matcher(ty: UnboundDecl, ret: UnboundDecl, cases: Vec<MatchCase>) -> Function {
    Function::new(
        "F",
        vec![Param::new("x", ty)],
        ret,
        UnboundExpr::match_on(UnboundExpr::name("x"), cases).at(Span::line(2)),
    )
}

fn shape() -> Union {
    Union::new(
        "Shape",
        vec![CaseDecl::with_value("Circle", UnboundDecl::INT), CaseDecl::new("Square")],
    )
}

fn bind(file: SourceFile) -> Result<(), CompilationError> {
    let mut compiler = Compiler::new();
    compiler.add_source_file(file);
    compiler.bind_all()
}

fn bind_function(function: Function) -> Result<(), CompilationError> {
    bind(SourceFile::new("match.pie").union(shape()).function(function))
}

// =============================================================================
// Wildcards and Variables
// =============================================================================

#[test]
fn test_wildcard_matches_any_type() {
    for ty in [
        UnboundDecl::INT,
        UnboundDecl::STRING,
        UnboundDecl::BOOL,
        UnboundDecl::named("Shape"),
        UnboundDecl::Tuple(vec![UnboundDecl::INT, UnboundDecl::BOOL]),
    ] {
        let function = matcher(
            ty.clone(),
            UnboundDecl::STRING,
            vec![case(Pattern::wildcard(), UnboundExpr::string("a"))],
        );
        assert_eq!(bind_function(function), Ok(()), "wildcard over {ty:?}");
    }
}

#[test]
fn test_variable_binds_scrutinee() {
    let function = matcher(
        UnboundDecl::INT,
        UnboundDecl::INT,
        vec![case(
            Pattern::variable("n"),
            UnboundExpr::op(UnboundExpr::name("n"), "+", UnboundExpr::int(1)),
        )],
    );
    bind_function(function).unwrap();
}

#[test]
fn test_variable_bound_twice_is_rejected() {
    let function = matcher(
        UnboundDecl::Tuple(vec![UnboundDecl::INT, UnboundDecl::INT]),
        UnboundDecl::INT,
        vec![case(
            Pattern::Tuple(vec![Pattern::variable("a"), Pattern::variable("a")], Span::NONE),
            UnboundExpr::name("a"),
        )],
    );
    assert!(matches!(
        bind_function(function),
        Err(CompilationError::NonLinearPattern { ref name, .. }) if name == "a"
    ));
}

// =============================================================================
// Exhaustiveness
// =============================================================================

#[test]
fn test_bool_match_needs_both_cases() {
    let only_true = vec![case(Pattern::Bool(true, Span::NONE), UnboundExpr::string("a"))];
    let function = matcher(UnboundDecl::BOOL, UnboundDecl::STRING, only_true.clone());
    assert_eq!(
        bind_function(function),
        Err(CompilationError::NonExhaustiveMatch {
            ty: "Bool".into(),
            span: Span::line(2),
        })
    );

    let mut both = only_true.clone();
    both.push(case(Pattern::Bool(false, Span::NONE), UnboundExpr::string("b")));
    bind_function(matcher(UnboundDecl::BOOL, UnboundDecl::STRING, both)).unwrap();

    let mut with_wildcard = only_true;
    with_wildcard.push(case(Pattern::wildcard(), UnboundExpr::string("b")));
    bind_function(matcher(UnboundDecl::BOOL, UnboundDecl::STRING, with_wildcard)).unwrap();
}

#[test]
fn test_int_literals_never_cover_int() {
    let function = matcher(
        UnboundDecl::INT,
        UnboundDecl::STRING,
        vec![
            case(Pattern::Int(0, Span::NONE), UnboundExpr::string("zero")),
            case(Pattern::Int(1, Span::NONE), UnboundExpr::string("one")),
        ],
    );
    assert!(matches!(bind_function(function), Err(CompilationError::NonExhaustiveMatch { .. })));
}

#[test]
fn test_union_cases_cover_union() {
    let function = matcher(
        UnboundDecl::named("Shape"),
        UnboundDecl::INT,
        vec![
            case(
                Pattern::case_with("Circle", Pattern::variable("r")),
                UnboundExpr::op(UnboundExpr::name("r"), "*", UnboundExpr::name("r")),
            ),
            case(Pattern::case("Square"), UnboundExpr::int(1)),
        ],
    );
    bind_function(function).unwrap();
}

#[test]
fn test_literal_payload_does_not_cover_case() {
    let function = matcher(
        UnboundDecl::named("Shape"),
        UnboundDecl::INT,
        vec![
            case(Pattern::case_with("Circle", Pattern::Int(0, Span::NONE)), UnboundExpr::int(0)),
            case(Pattern::case("Square"), UnboundExpr::int(1)),
        ],
    );
    assert!(matches!(
        bind_function(function),
        Err(CompilationError::NonExhaustiveMatch { ref ty, .. }) if ty == "Shape"
    ));
}

#[test]
fn test_tuple_of_bools_needs_every_combination() {
    let pair = || UnboundDecl::Tuple(vec![UnboundDecl::BOOL, UnboundDecl::BOOL]);
    let row = |a: Pattern, b: Pattern| Pattern::Tuple(vec![a, b], Span::NONE);
    let t = || Pattern::Bool(true, Span::NONE);
    let f = || Pattern::Bool(false, Span::NONE);

    let partial = vec![
        case(row(t(), Pattern::wildcard()), UnboundExpr::int(1)),
        case(row(f(), t()), UnboundExpr::int(2)),
    ];
    assert!(matches!(
        bind_function(matcher(pair(), UnboundDecl::INT, partial.clone())),
        Err(CompilationError::NonExhaustiveMatch { .. })
    ));

    let mut complete = partial;
    complete.push(case(row(f(), f()), UnboundExpr::int(3)));
    bind_function(matcher(pair(), UnboundDecl::INT, complete)).unwrap();
}

// =============================================================================
// Redundancy
// =============================================================================

#[test]
fn test_repeated_union_case_is_unreachable() {
    let function = matcher(
        UnboundDecl::named("Foo"),
        UnboundDecl::INT,
        vec![
            case_at(3, Pattern::case("Foo"), UnboundExpr::int(1)),
            case_at(4, Pattern::case("Foo"), UnboundExpr::int(2)),
        ],
    );
    let file = SourceFile::new("foo.pie")
        .union(Union::new("Foo", vec![CaseDecl::new("Foo")]))
        .function(function);

    assert_eq!(
        bind(file),
        Err(CompilationError::UnreachablePattern {
            pattern: "Foo".into(),
            span: Span::line(4),
        })
    );
}

#[test]
fn test_case_covered_by_earlier_rows_is_unreachable() {
    let pair = UnboundDecl::Tuple(vec![UnboundDecl::BOOL, UnboundDecl::BOOL]);
    let row = |a: Pattern, b: Pattern| Pattern::Tuple(vec![a, b], Span::NONE);
    let function = matcher(
        pair,
        UnboundDecl::INT,
        vec![
            case(row(Pattern::Bool(true, Span::NONE), Pattern::wildcard()), UnboundExpr::int(1)),
            case(row(Pattern::wildcard(), Pattern::Bool(false, Span::NONE)), UnboundExpr::int(2)),
            case(row(Pattern::Bool(true, Span::NONE), Pattern::Bool(false, Span::NONE)), UnboundExpr::int(3)),
            case(Pattern::wildcard(), UnboundExpr::int(4)),
        ],
    );
    assert!(matches!(
        bind_function(function),
        Err(CompilationError::UnreachablePattern { ref pattern, .. }) if pattern == "(true, false)"
    ));
}

// =============================================================================
// Shape
// =============================================================================

#[test]
fn test_pattern_of_wrong_type_is_rejected() {
    let function = matcher(
        UnboundDecl::INT,
        UnboundDecl::INT,
        vec![
            case(Pattern::String("a".into(), Span::NONE), UnboundExpr::int(1)),
            case(Pattern::wildcard(), UnboundExpr::int(2)),
        ],
    );
    assert!(matches!(
        bind_function(function),
        Err(CompilationError::PatternShape { ref ty, .. }) if ty == "Int"
    ));
}

#[test]
fn test_case_without_its_payload_is_rejected() {
    let function = matcher(
        UnboundDecl::named("Shape"),
        UnboundDecl::INT,
        vec![
            case(Pattern::case("Circle"), UnboundExpr::int(1)),
            case(Pattern::wildcard(), UnboundExpr::int(2)),
        ],
    );
    assert!(matches!(bind_function(function), Err(CompilationError::PatternShape { .. })));
}

#[test]
fn test_match_faults_reach_the_host_as_compile_errors() {
    let main = Function::new(
        "Main",
        vec![],
        UnboundDecl::STRING,
        UnboundExpr::match_on(
            UnboundExpr::bool(true),
            vec![case(Pattern::Bool(true, Span::NONE), UnboundExpr::string("a"))],
        )
        .at(Span::new(7, 3)),
    );
    let mut compiler = Compiler::new();
    compiler.add_function(main);

    let errors = compiler.compile().unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].stage, CompileStage::Compile);
    assert_eq!(errors[0].line(), 7);
    assert_eq!(errors[0].message, "match over Bool is not exhaustive");
}
