//! Lowering a checked `match` into nested conditionals.

use pie_core::{BoundDecl, MatchCase, Pattern, Span, UnboundExpr, qualify};
use pie_registry::TypeTable;

/// Lowers `cases` over the value held in local `temp` into an if/else
/// chain. Every pattern must already have passed the shape check and the
/// cases must be exhaustive: the last case is taken unconditionally.
pub fn lower_cases(types: &TypeTable, temp: &str, ty: &BoundDecl, cases: &[MatchCase]) -> UnboundExpr {
    let mut arms = cases.iter().rev();
    let Some(last) = arms.next() else {
        return UnboundExpr::unit();
    };

    let mut chain = lower_case(types, temp, ty, last).1;
    for case in arms {
        let (test, body) = lower_case(types, temp, ty, case);
        chain = match test {
            Some(test) => UnboundExpr::if_else(test, body, chain).at(case.span),
            None => body,
        };
    }
    chain
}

/// The test for one case, if it can fail, and its body with the pattern's
/// variables defined in front.
fn lower_case(types: &TypeTable, temp: &str, ty: &BoundDecl, case: &MatchCase) -> (Option<UnboundExpr>, UnboundExpr) {
    let mut lowering = CaseLowering {
        types,
        tests: Vec::new(),
        bindings: Vec::new(),
    };
    lowering.visit(&case.pattern, ty, UnboundExpr::name(temp));

    let test = lowering.tests.into_iter().rev().reduce(|rest, test| conjoin(test, rest));

    let body = if lowering.bindings.is_empty() {
        case.body.clone()
    } else {
        let mut exprs = lowering.bindings;
        exprs.push(case.body.clone());
        UnboundExpr::block(exprs).at(case.span)
    };
    (test, body)
}

/// `a & b`, without evaluating `b` when `a` fails. Later tests may only be
/// safe to run once earlier ones pass, e.g. reading a case's payload.
fn conjoin(a: UnboundExpr, b: UnboundExpr) -> UnboundExpr {
    UnboundExpr::if_else(a, b, UnboundExpr::bool(false))
}

struct CaseLowering<'a> {
    types: &'a TypeTable,
    tests: Vec<UnboundExpr>,
    bindings: Vec<UnboundExpr>,
}

impl CaseLowering<'_> {
    /// Collects the tests and bindings for `pattern` applied to `access`.
    fn visit(&mut self, pattern: &Pattern, ty: &BoundDecl, access: UnboundExpr) {
        match (pattern, ty) {
            (Pattern::Wildcard(_), _) => {}
            (Pattern::Variable(name, span), _) => {
                self.bindings.push(UnboundExpr::define(name, access).at(*span));
            }
            (Pattern::Bool(value, span), _) => self.literal(access, UnboundExpr::bool(*value), *span),
            (Pattern::Int(value, span), _) => self.literal(access, UnboundExpr::int(*value), *span),
            (Pattern::String(value, span), _) => self.literal(access, UnboundExpr::string(value.clone()), *span),

            (Pattern::Case { name, payload, span }, BoundDecl::Union(union)) => {
                let Some(def) = self.types.union_def(union) else {
                    panic!("matched union {union} has no definition");
                };
                let short_name = name.rsplit("::").next().unwrap_or(name);
                let Some(case) = def.case(short_name) else {
                    panic!("case {short_name} of {union} was not shape-checked");
                };
                let namespace = &def.search_space.namespace;

                let test = qualify(namespace, &format!("{short_name}?"));
                self.tests.push(UnboundExpr::apply(test, access.clone()).at(*span));

                if let Some(payload) = payload {
                    let value = qualify(namespace, &format!("{short_name}Value"));
                    let payload_ty = case.payload.clone();
                    self.visit(payload, &payload_ty, UnboundExpr::apply(value, access).at(*span));
                }
            }

            (Pattern::Tuple(fields, span), BoundDecl::Tuple(field_types)) => {
                for (index, (field, field_ty)) in fields.iter().zip(field_types).enumerate() {
                    let field_access = UnboundExpr::TupleField {
                        tuple: Box::new(access.clone()),
                        index,
                        span: *span,
                    };
                    self.visit(field, field_ty, field_access);
                }
            }

            (pattern, ty) => panic!("pattern {pattern} was not shape-checked against {ty}"),
        }
    }

    fn literal(&mut self, access: UnboundExpr, literal: UnboundExpr, span: Span) {
        self.tests.push(UnboundExpr::op(access, "=", literal).at(span));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(pattern: Pattern, body: i32) -> MatchCase {
        MatchCase::new(pattern, UnboundExpr::int(body))
    }

    #[test]
    fn last_case_is_unconditional() {
        let types = TypeTable::new();
        let cases = vec![case(Pattern::Bool(true, Span::NONE), 1), case(Pattern::Bool(false, Span::NONE), 2)];

        let lowered = lower_cases(&types, "m", &BoundDecl::BOOL, &cases);
        let UnboundExpr::If {
            condition, else_body, ..
        } = lowered
        else {
            panic!("expected an if");
        };
        assert!(matches!(*condition, UnboundExpr::Operator { ref op, .. } if op == "="));
        assert_eq!(else_body.map(|body| *body), Some(UnboundExpr::int(2)));
    }

    #[test]
    fn variables_become_defines() {
        let types = TypeTable::new();
        let cases = vec![MatchCase::new(Pattern::variable("x"), UnboundExpr::name("x"))];

        let lowered = lower_cases(&types, "m", &BoundDecl::INT, &cases);
        let UnboundExpr::Block(exprs, _) = lowered else {
            panic!("expected a block");
        };
        assert!(matches!(&exprs[0], UnboundExpr::Define { names, .. } if names == &["x".to_string()]));
        assert_eq!(exprs[1], UnboundExpr::name("x"));
    }

    #[test]
    fn tuple_tests_are_short_circuited() {
        let types = TypeTable::new();
        let ty = BoundDecl::Tuple(vec![BoundDecl::INT, BoundDecl::INT]);
        let pair = Pattern::Tuple(vec![Pattern::Int(1, Span::NONE), Pattern::Int(2, Span::NONE)], Span::NONE);
        let cases = vec![case(pair, 1), case(Pattern::wildcard(), 0)];

        let UnboundExpr::If { condition, .. } = lower_cases(&types, "m", &ty, &cases) else {
            panic!("expected an if");
        };
        let UnboundExpr::If {
            condition: first,
            else_body,
            ..
        } = *condition
        else {
            panic!("expected a conjunction");
        };
        assert!(matches!(*first, UnboundExpr::Operator { ref left, .. }
            if matches!(**left, UnboundExpr::TupleField { index: 0, .. })));
        assert_eq!(else_body.map(|body| *body), Some(UnboundExpr::bool(false)));
    }
}
