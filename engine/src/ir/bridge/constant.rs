use crate::error::{EngineError, EngineResult};
use crate::ir::adapter;
use crate::ir::bridge::typing::{NumRepr, Type, TypeRegistry};
use crate::ir::bridge::value::Identifier;

/// The payload of a constant
#[derive(Eq, PartialEq, Clone, Debug)]
pub enum Const {
    Int { value: i128 },
    Float { value: String },
    Null,
    Undef,
    Default,
    Aggregate { elements: Vec<Constant> },
    GlobalReference(Identifier),
    FunctionReference(Identifier),
    // constant expressions are kept opaque
    Expr,
}

/// An adapted representation of a constant
#[derive(Eq, PartialEq, Clone, Debug)]
pub struct Constant {
    ty: Type,
    repr: Const,
}

impl Constant {
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn repr(&self) -> &Const {
        &self.repr
    }

    pub fn convert(
        constant: &adapter::constant::Constant,
        expected_type: &Type,
        typing: &TypeRegistry,
    ) -> EngineResult<Self> {
        use adapter::constant::Const as AdaptedConst;

        let ty = typing.convert(&constant.ty)?;
        if &ty != expected_type {
            return Err(EngineError::InvariantViolation(format!(
                "constant type mismatch: expect {}, actual {}",
                expected_type, ty
            )));
        }

        let repr = match &constant.repr {
            AdaptedConst::Int { value } => {
                if !matches!(
                    ty,
                    Type::Bitvec {
                        number: NumRepr::Int,
                        length: None,
                        ..
                    }
                ) {
                    return Err(EngineError::InvalidAssumption(format!(
                        "integer constant with non-integer type: {}",
                        ty
                    )));
                }
                let parsed = value.parse::<i128>().map_err(|e| {
                    EngineError::InvalidAssumption(format!(
                        "malformed integer constant {}: {}",
                        value, e
                    ))
                })?;
                Const::Int { value: parsed }
            }
            AdaptedConst::Float { value } => Const::Float {
                value: value.clone(),
            },
            AdaptedConst::Null => {
                if !ty.is_pointer() {
                    return Err(EngineError::InvalidAssumption(
                        "null constant must be a pointer".into(),
                    ));
                }
                Const::Null
            }
            AdaptedConst::None => {
                return Err(EngineError::InvalidAssumption(
                    "unexpected token constant".into(),
                ));
            }
            AdaptedConst::Undef => Const::Undef,
            AdaptedConst::Default => Const::Default,
            AdaptedConst::Array { elements } => {
                let element_ty = match &ty {
                    Type::Array { element, length } => {
                        if *length != elements.len() {
                            return Err(EngineError::InvariantViolation(
                                "array constant length mismatch".into(),
                            ));
                        }
                        element.as_ref()
                    }
                    _ => {
                        return Err(EngineError::InvariantViolation(
                            "array constant with non-array type".into(),
                        ));
                    }
                };
                let converted = elements
                    .iter()
                    .map(|e| Self::convert(e, element_ty, typing))
                    .collect::<EngineResult<_>>()?;
                Const::Aggregate {
                    elements: converted,
                }
            }
            AdaptedConst::Struct { elements } => {
                let field_tys = match &ty {
                    Type::Struct { fields, .. } => {
                        if fields.len() != elements.len() {
                            return Err(EngineError::InvariantViolation(
                                "struct constant field count mismatch".into(),
                            ));
                        }
                        fields
                    }
                    _ => {
                        return Err(EngineError::InvariantViolation(
                            "struct constant with non-struct type".into(),
                        ));
                    }
                };
                let converted = elements
                    .iter()
                    .zip(field_tys)
                    .map(|(e, t)| Self::convert(e, t, typing))
                    .collect::<EngineResult<_>>()?;
                Const::Aggregate {
                    elements: converted,
                }
            }
            AdaptedConst::Variable { name } => {
                let ident = name.as_ref().ok_or_else(|| {
                    EngineError::InvalidAssumption("reference to an anonymous global".into())
                })?;
                Const::GlobalReference(ident.into())
            }
            AdaptedConst::Function { name } => {
                let ident = name.as_ref().ok_or_else(|| {
                    EngineError::InvalidAssumption("reference to an anonymous function".into())
                })?;
                Const::FunctionReference(ident.into())
            }
            AdaptedConst::Expr { .. } => Const::Expr,
        };
        Ok(Self { ty, repr })
    }
}
