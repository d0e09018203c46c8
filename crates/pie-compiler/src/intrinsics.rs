//! Built-in functions compiled inline to primitive opcodes.
//!
//! Intrinsics are registered in the function table under their mangled
//! names, so `1 + 2` resolves exactly like a call to a user-defined `+`.
//! Array operations are generic over the element type and are matched by
//! shape instead, see [`array_intrinsic`].

use pie_core::{Atomic, BoundDecl, FuncType, Primitive};
use pie_registry::IntrinsicFunction;

fn unary(name: &str, param: BoundDecl, ret: BoundDecl, ops: &[Primitive]) -> IntrinsicFunction {
    IntrinsicFunction::new(name, ops, FuncType::new(param, ret))
}

fn binary(name: &str, operand: BoundDecl, ret: BoundDecl, ops: &[Primitive]) -> IntrinsicFunction {
    IntrinsicFunction::new(name, ops, FuncType::from_params(vec![operand.clone(), operand], ret))
}

/// Every non-array intrinsic.
pub fn all() -> Vec<IntrinsicFunction> {
    use BoundDecl as T;
    use Primitive::*;

    vec![
        unary("Not", T::BOOL, T::BOOL, &[NegateBool]),
        unary("Neg", T::INT, T::INT, &[NegateInt]),
        // equality
        binary("=", T::BOOL, T::BOOL, &[EqualBool]),
        binary("=", T::INT, T::BOOL, &[EqualInt]),
        binary("=", T::STRING, T::BOOL, &[EqualString]),
        binary("!=", T::BOOL, T::BOOL, &[EqualBool, NegateBool]),
        binary("!=", T::INT, T::BOOL, &[EqualInt, NegateBool]),
        binary("!=", T::STRING, T::BOOL, &[EqualString, NegateBool]),
        // logic
        binary("&", T::BOOL, T::BOOL, &[AndBool]),
        binary("|", T::BOOL, T::BOOL, &[OrBool]),
        // comparison
        binary("<", T::INT, T::BOOL, &[LessInt]),
        binary(">", T::INT, T::BOOL, &[GreaterInt]),
        binary("<=", T::INT, T::BOOL, &[GreaterInt, NegateBool]),
        binary(">=", T::INT, T::BOOL, &[LessInt, NegateBool]),
        // arithmetic
        binary("+", T::INT, T::INT, &[AddInt]),
        binary("-", T::INT, T::INT, &[SubInt]),
        binary("*", T::INT, T::INT, &[MultInt]),
        binary("/", T::INT, T::INT, &[DivInt]),
        binary("+", T::STRING, T::STRING, &[AddString]),
        // conversion
        unary("String", T::BOOL, T::STRING, &[BoolToString]),
        unary("String", T::INT, T::STRING, &[IntToString]),
        unary("String", T::STRING, T::STRING, &[]),
        // strings
        unary("Print", T::STRING, T::UNIT, &[Print]),
        unary("Size", T::STRING, T::INT, &[StringSize]),
        IntrinsicFunction::new(
            "Substring",
            &[Substring],
            FuncType::from_params(vec![T::STRING, T::INT, T::INT], T::STRING),
        ),
    ]
}

/// The array intrinsic `name` would be for an argument of type `arg_ty`:
///
/// - `Size array` reads the element count
/// - `__Call (array, index)` loads an element, so `items 2` indexes
/// - `__Call<- (array, index, value)` stores into a mutable array
pub fn array_intrinsic(name: &str, arg_ty: &BoundDecl) -> Option<IntrinsicFunction> {
    match (name, arg_ty) {
        ("Size", BoundDecl::Array { .. }) => Some(unary(name, arg_ty.clone(), BoundDecl::INT, &[Primitive::SizeArray])),
        ("__Call", BoundDecl::Tuple(fields)) => match fields.as_slice() {
            [BoundDecl::Array { element, .. }, BoundDecl::Atomic(Atomic::Int)] => Some(unary(
                name,
                arg_ty.clone(),
                (**element).clone(),
                &[Primitive::LoadArray],
            )),
            _ => None,
        },
        ("__Call<-", BoundDecl::Tuple(fields)) => match fields.as_slice() {
            [BoundDecl::Array { element, mutable: true }, BoundDecl::Atomic(Atomic::Int), value] if **element == *value => Some(
                unary(name, arg_ty.clone(), BoundDecl::UNIT, &[Primitive::StoreArray]),
            ),
            _ => None,
        },
        _ => None,
    }
}
