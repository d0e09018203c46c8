//! Expressions, before and after binding.
//!
//! [`UnboundExpr`] is what the parser hands over: names are strings, types
//! are [`UnboundDecl`]s, and sugar (`for` loops, `let`, `match`, quoted
//! syntax, local functions) is still present. [`BoundExpr`] is the fully
//! resolved tree the emitter consumes; every node knows its [`BoundDecl`].

use crate::{BoundDecl, FuncType, Span, UnboundDecl};

/// A parameter of a function or local function.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: UnboundDecl,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: UnboundDecl) -> Self {
        Self { name: name.into(), ty }
    }
}

// ============================================================================
// Patterns
// ============================================================================

/// A `case` pattern in a `match` expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    /// `_`
    Wildcard(Span),
    Bool(bool, Span),
    Int(i32, Span),
    String(String, Span),
    /// A union case, with a nested pattern for its value if the case has one.
    Case {
        name: String,
        payload: Option<Box<Pattern>>,
        span: Span,
    },
    Tuple(Vec<Pattern>, Span),
    /// Matches anything and binds it to a new local.
    Variable(String, Span),
}

impl Pattern {
    pub fn wildcard() -> Self {
        Pattern::Wildcard(Span::NONE)
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Pattern::Variable(name.into(), Span::NONE)
    }

    pub fn case(name: impl Into<String>) -> Self {
        Pattern::Case {
            name: name.into(),
            payload: None,
            span: Span::NONE,
        }
    }

    pub fn case_with(name: impl Into<String>, payload: Pattern) -> Self {
        Pattern::Case {
            name: name.into(),
            payload: Some(Box::new(payload)),
            span: Span::NONE,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Pattern::Wildcard(span)
            | Pattern::Bool(_, span)
            | Pattern::Int(_, span)
            | Pattern::String(_, span)
            | Pattern::Case { span, .. }
            | Pattern::Tuple(_, span)
            | Pattern::Variable(_, span) => *span,
        }
    }

    /// Whether this pattern matches every value without testing it.
    pub fn is_irrefutable_leaf(&self) -> bool {
        matches!(self, Pattern::Wildcard(_) | Pattern::Variable(..))
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pattern::Wildcard(_) => f.write_str("_"),
            Pattern::Bool(value, _) => write!(f, "{value}"),
            Pattern::Int(value, _) => write!(f, "{value}"),
            Pattern::String(value, _) => write!(f, "\"{value}\""),
            Pattern::Case { name, payload: None, .. } => f.write_str(name),
            Pattern::Case {
                name,
                payload: Some(payload),
                ..
            } => write!(f, "{name} {payload}"),
            Pattern::Tuple(fields, _) => {
                let fields: Vec<_> = fields.iter().map(|field| field.to_string()).collect();
                write!(f, "({})", fields.join(", "))
            }
            Pattern::Variable(name, _) => f.write_str(name),
        }
    }
}

/// One `case pattern then body` arm.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCase {
    pub pattern: Pattern,
    pub body: UnboundExpr,
    pub span: Span,
}

impl MatchCase {
    pub fn new(pattern: Pattern, body: UnboundExpr) -> Self {
        let span = pattern.span();
        Self { pattern, body, span }
    }
}

/// A clause of a `loop` expression.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopClause {
    /// `while condition`
    While { condition: UnboundExpr, span: Span },
    /// `for name <- sequence`
    For {
        name: String,
        sequence: UnboundExpr,
        span: Span,
    },
}

// ============================================================================
// Unbound expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum UnboundExpr {
    Unit(Span),
    Bool(bool, Span),
    Int(i32, Span),
    String(String, Span),
    /// A name, with explicit type arguments if given: `Foo[Int]`.
    Name {
        name: String,
        type_args: Vec<UnboundDecl>,
        span: Span,
    },
    /// `target arg`
    Call {
        target: Box<UnboundExpr>,
        arg: Box<UnboundExpr>,
        span: Span,
    },
    /// `left op right`, sugar for calling `op` with `(left, right)`.
    Operator {
        left: Box<UnboundExpr>,
        op: String,
        right: Box<UnboundExpr>,
        span: Span,
    },
    /// `target <- value`
    Assign {
        target: Box<UnboundExpr>,
        value: Box<UnboundExpr>,
        span: Span,
    },
    /// `def name <- value`, or `def a b <- tuple` to destructure.
    Define {
        names: Vec<String>,
        value: Box<UnboundExpr>,
        mutable: bool,
        span: Span,
    },
    Block(Vec<UnboundExpr>, Span),
    If {
        condition: Box<UnboundExpr>,
        then_body: Box<UnboundExpr>,
        else_body: Option<Box<UnboundExpr>>,
        span: Span,
    },
    While {
        condition: Box<UnboundExpr>,
        body: Box<UnboundExpr>,
        span: Span,
    },
    Loop {
        clauses: Vec<LoopClause>,
        body: Box<UnboundExpr>,
        span: Span,
    },
    /// `let names <- value then ... else ...` over an option-like union.
    Let {
        names: Vec<String>,
        value: Box<UnboundExpr>,
        then_body: Box<UnboundExpr>,
        else_body: Box<UnboundExpr>,
        span: Span,
    },
    Match {
        value: Box<UnboundExpr>,
        cases: Vec<MatchCase>,
        span: Span,
    },
    /// A quoted expression `{ expr }`, evaluating to its syntax tree.
    Syntax(Box<UnboundExpr>, Span),
    /// An anonymous function. Cannot capture locals.
    LocalFunction {
        params: Vec<Param>,
        ret: UnboundDecl,
        body: Box<UnboundExpr>,
        span: Span,
    },
    /// `fn Name[TypeArgs](ParamTypes)`
    FuncRef {
        name: String,
        type_args: Vec<UnboundDecl>,
        param_types: Vec<UnboundDecl>,
        span: Span,
    },
    Tuple(Vec<UnboundExpr>, Span),
    Array {
        elements: Vec<UnboundExpr>,
        element_type: Option<UnboundDecl>,
        mutable: bool,
        span: Span,
    },
    Record(Vec<(String, UnboundExpr)>, Span),
    /// `return value`. Leaves the current function early.
    Return {
        value: Box<UnboundExpr>,
        span: Span,
    },
    /// Positional access into a tuple. Only produced by the compiler.
    TupleField {
        tuple: Box<UnboundExpr>,
        index: usize,
        span: Span,
    },
    /// An expression that is already bound. Binding returns it as-is.
    Bound(BoundExpr),
}

impl UnboundExpr {
    pub fn unit() -> Self {
        UnboundExpr::Unit(Span::NONE)
    }

    pub fn bool(value: bool) -> Self {
        UnboundExpr::Bool(value, Span::NONE)
    }

    pub fn int(value: i32) -> Self {
        UnboundExpr::Int(value, Span::NONE)
    }

    pub fn string(value: impl Into<String>) -> Self {
        UnboundExpr::String(value.into(), Span::NONE)
    }

    pub fn name(name: impl Into<String>) -> Self {
        UnboundExpr::Name {
            name: name.into(),
            type_args: Vec::new(),
            span: Span::NONE,
        }
    }

    pub fn generic_name(name: impl Into<String>, type_args: Vec<UnboundDecl>) -> Self {
        UnboundExpr::Name {
            name: name.into(),
            type_args,
            span: Span::NONE,
        }
    }

    pub fn call(target: UnboundExpr, arg: UnboundExpr) -> Self {
        let span = target.span();
        UnboundExpr::Call {
            target: Box::new(target),
            arg: Box::new(arg),
            span,
        }
    }

    /// Calls the function `name` with `arg`.
    pub fn apply(name: impl Into<String>, arg: UnboundExpr) -> Self {
        Self::call(Self::name(name), arg)
    }

    pub fn op(left: UnboundExpr, op: impl Into<String>, right: UnboundExpr) -> Self {
        let span = left.span();
        UnboundExpr::Operator {
            left: Box::new(left),
            op: op.into(),
            right: Box::new(right),
            span,
        }
    }

    pub fn assign(target: UnboundExpr, value: UnboundExpr) -> Self {
        let span = target.span();
        UnboundExpr::Assign {
            target: Box::new(target),
            value: Box::new(value),
            span,
        }
    }

    pub fn define(name: impl Into<String>, value: UnboundExpr) -> Self {
        UnboundExpr::Define {
            names: vec![name.into()],
            value: Box::new(value),
            mutable: false,
            span: Span::NONE,
        }
    }

    pub fn define_mutable(name: impl Into<String>, value: UnboundExpr) -> Self {
        UnboundExpr::Define {
            names: vec![name.into()],
            value: Box::new(value),
            mutable: true,
            span: Span::NONE,
        }
    }

    pub fn block(exprs: Vec<UnboundExpr>) -> Self {
        UnboundExpr::Block(exprs, Span::NONE)
    }

    pub fn tuple(fields: Vec<UnboundExpr>) -> Self {
        UnboundExpr::Tuple(fields, Span::NONE)
    }

    pub fn array(elements: Vec<UnboundExpr>) -> Self {
        UnboundExpr::Array {
            elements,
            element_type: None,
            mutable: false,
            span: Span::NONE,
        }
    }

    pub fn if_then(condition: UnboundExpr, then_body: UnboundExpr) -> Self {
        UnboundExpr::If {
            condition: Box::new(condition),
            then_body: Box::new(then_body),
            else_body: None,
            span: Span::NONE,
        }
    }

    pub fn if_else(condition: UnboundExpr, then_body: UnboundExpr, else_body: UnboundExpr) -> Self {
        UnboundExpr::If {
            condition: Box::new(condition),
            then_body: Box::new(then_body),
            else_body: Some(Box::new(else_body)),
            span: Span::NONE,
        }
    }

    pub fn while_do(condition: UnboundExpr, body: UnboundExpr) -> Self {
        UnboundExpr::While {
            condition: Box::new(condition),
            body: Box::new(body),
            span: Span::NONE,
        }
    }

    pub fn ret(value: UnboundExpr) -> Self {
        UnboundExpr::Return {
            value: Box::new(value),
            span: Span::NONE,
        }
    }

    pub fn match_on(value: UnboundExpr, cases: Vec<MatchCase>) -> Self {
        UnboundExpr::Match {
            value: Box::new(value),
            cases,
            span: Span::NONE,
        }
    }

    pub fn func_ref(name: impl Into<String>, param_types: Vec<UnboundDecl>) -> Self {
        UnboundExpr::FuncRef {
            name: name.into(),
            type_args: Vec::new(),
            param_types,
            span: Span::NONE,
        }
    }

    /// Replaces the position of this node (not its children).
    pub fn at(mut self, position: Span) -> Self {
        match &mut self {
            UnboundExpr::Unit(span)
            | UnboundExpr::Bool(_, span)
            | UnboundExpr::Int(_, span)
            | UnboundExpr::String(_, span)
            | UnboundExpr::Name { span, .. }
            | UnboundExpr::Call { span, .. }
            | UnboundExpr::Operator { span, .. }
            | UnboundExpr::Assign { span, .. }
            | UnboundExpr::Define { span, .. }
            | UnboundExpr::Block(_, span)
            | UnboundExpr::If { span, .. }
            | UnboundExpr::While { span, .. }
            | UnboundExpr::Loop { span, .. }
            | UnboundExpr::Let { span, .. }
            | UnboundExpr::Match { span, .. }
            | UnboundExpr::Syntax(_, span)
            | UnboundExpr::LocalFunction { span, .. }
            | UnboundExpr::FuncRef { span, .. }
            | UnboundExpr::Tuple(_, span)
            | UnboundExpr::Array { span, .. }
            | UnboundExpr::Record(_, span)
            | UnboundExpr::Return { span, .. }
            | UnboundExpr::TupleField { span, .. } => *span = position,
            UnboundExpr::Bound(_) => {}
        }
        self
    }

    pub fn span(&self) -> Span {
        match self {
            UnboundExpr::Unit(span)
            | UnboundExpr::Bool(_, span)
            | UnboundExpr::Int(_, span)
            | UnboundExpr::String(_, span)
            | UnboundExpr::Name { span, .. }
            | UnboundExpr::Call { span, .. }
            | UnboundExpr::Operator { span, .. }
            | UnboundExpr::Assign { span, .. }
            | UnboundExpr::Define { span, .. }
            | UnboundExpr::Block(_, span)
            | UnboundExpr::If { span, .. }
            | UnboundExpr::While { span, .. }
            | UnboundExpr::Loop { span, .. }
            | UnboundExpr::Let { span, .. }
            | UnboundExpr::Match { span, .. }
            | UnboundExpr::Syntax(_, span)
            | UnboundExpr::LocalFunction { span, .. }
            | UnboundExpr::FuncRef { span, .. }
            | UnboundExpr::Tuple(_, span)
            | UnboundExpr::Array { span, .. }
            | UnboundExpr::Record(_, span)
            | UnboundExpr::Return { span, .. }
            | UnboundExpr::TupleField { span, .. } => *span,
            UnboundExpr::Bound(_) => Span::NONE,
        }
    }
}

// ============================================================================
// Bound expressions
// ============================================================================

/// A primitive operation the virtual machine performs inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    BoolToString,
    IntToString,
    EqualBool,
    EqualInt,
    EqualString,
    LessInt,
    GreaterInt,
    NegateBool,
    NegateInt,
    AndBool,
    OrBool,
    AddInt,
    SubInt,
    MultInt,
    DivInt,
    AddString,
    Print,
    StringSize,
    Substring,
    LoadArray,
    StoreArray,
    SizeArray,
}

/// A fully resolved expression.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundExpr {
    Unit,
    Bool(bool),
    Int(i32),
    String(String),
    /// The current function's local-variable frame.
    Locals,
    /// Reads slot `index` of a heap cell (struct, tuple, union, or locals).
    Load {
        source: Box<BoundExpr>,
        index: u8,
        ty: BoundDecl,
    },
    /// Writes `value` into slot `index` of a heap cell.
    Store {
        target: Box<BoundExpr>,
        index: u8,
        value: Box<BoundExpr>,
    },
    /// Allocates a struct, tuple, record, or array from its fields in order.
    Construct { fields: Vec<BoundExpr>, ty: BoundDecl },
    /// Allocates a union value: tag first, then the payload if present.
    ConstructUnion {
        tag: i32,
        payload: Option<Box<BoundExpr>>,
        ty: BoundDecl,
    },
    /// Evaluates `arg` and runs `ops` on it.
    Intrinsic {
        ops: Vec<Primitive>,
        arg: Box<BoundExpr>,
        ty: BoundDecl,
    },
    /// Calls a function value. `target` is a [`BoundExpr::FuncRef`] for
    /// direct calls.
    Call {
        target: Box<BoundExpr>,
        arg: Box<BoundExpr>,
        ty: BoundDecl,
    },
    /// Calls a host function by id.
    ForeignCall {
        id: i32,
        arity: usize,
        arg: Box<BoundExpr>,
        ty: BoundDecl,
    },
    /// A reference to a bound function, by mangled name.
    FuncRef { unique_name: String, ty: FuncType },
    Block(Vec<BoundExpr>),
    If {
        condition: Box<BoundExpr>,
        then_body: Box<BoundExpr>,
        else_body: Option<Box<BoundExpr>>,
        ty: BoundDecl,
    },
    While {
        condition: Box<BoundExpr>,
        body: Box<BoundExpr>,
    },
    /// Returns `value` from the current function.
    Return(Box<BoundExpr>),
}

impl BoundExpr {
    pub fn ty(&self) -> BoundDecl {
        match self {
            BoundExpr::Unit | BoundExpr::Locals | BoundExpr::Store { .. } | BoundExpr::While { .. } => {
                BoundDecl::UNIT
            }
            BoundExpr::Bool(_) => BoundDecl::BOOL,
            BoundExpr::Int(_) => BoundDecl::INT,
            BoundExpr::String(_) => BoundDecl::STRING,
            BoundExpr::Load { ty, .. }
            | BoundExpr::Construct { ty, .. }
            | BoundExpr::ConstructUnion { ty, .. }
            | BoundExpr::Intrinsic { ty, .. }
            | BoundExpr::Call { ty, .. }
            | BoundExpr::ForeignCall { ty, .. }
            | BoundExpr::If { ty, .. } => ty.clone(),
            BoundExpr::FuncRef { ty, .. } => BoundDecl::Func(Box::new(ty.clone())),
            BoundExpr::Block(exprs) => exprs.last().map(BoundExpr::ty).unwrap_or(BoundDecl::UNIT),
            BoundExpr::Return(_) => BoundDecl::EARLY_RETURN,
        }
    }

    /// Builds a tuple, or returns the lone field for one element and Unit for none.
    pub fn tuple(mut fields: Vec<BoundExpr>) -> Self {
        match fields.len() {
            0 => BoundExpr::Unit,
            1 => fields.remove(0),
            _ => {
                let ty = BoundDecl::Tuple(fields.iter().map(BoundExpr::ty).collect());
                BoundExpr::Construct { fields, ty }
            }
        }
    }

    /// Appends `value` to an argument list: `()` becomes `value`, a tuple
    /// gains a field, and a single argument becomes a pair.
    pub fn append_arg(self, value: BoundExpr) -> Self {
        match self {
            BoundExpr::Unit => value,
            BoundExpr::Construct {
                mut fields,
                ty: BoundDecl::Tuple(mut types),
            } => {
                types.push(value.ty());
                fields.push(value);
                BoundExpr::Construct {
                    fields,
                    ty: BoundDecl::Tuple(types),
                }
            }
            arg => BoundExpr::tuple(vec![arg, value]),
        }
    }

    /// Reads a local slot.
    pub fn local(index: u8, ty: BoundDecl) -> Self {
        BoundExpr::Load {
            source: Box::new(BoundExpr::Locals),
            index,
            ty,
        }
    }

    /// Reads a field out of a heap cell.
    pub fn load(source: BoundExpr, index: u8, ty: BoundDecl) -> Self {
        BoundExpr::Load {
            source: Box::new(source),
            index,
            ty,
        }
    }
}
