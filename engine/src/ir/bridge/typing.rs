use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use crate::error::{EngineError, EngineResult, Unsupported};
use crate::ir::adapter;
use crate::ir::adapter::typing::UserDefinedStruct;
use crate::ir::bridge::value::Identifier;

/// The underlying representation of the bitvec
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum NumRepr {
    Int,
    Float,
}

impl Display for NumRepr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
        }
    }
}

/// An adapted representation of the typing system
#[derive(Eq, PartialEq, Clone, Debug)]
pub enum Type {
    /// Bitvec
    Bitvec {
        bits: usize,
        number: NumRepr,
        // set if vectorized
        length: Option<usize>,
    },
    /// An array with elements being the same type
    Array { element: Box<Type>, length: usize },
    /// A struct type, named or anonymous
    Struct {
        name: Option<Identifier>,
        fields: Vec<Type>,
    },
    /// A function type
    Function {
        params: Vec<Type>,
        variadic: bool,
        ret: Option<Box<Type>>,
    },
    /// An opaque pointer (i.e., any pointee type is valid)
    Pointer,
}

impl Type {
    pub fn is_pointer(&self) -> bool {
        matches!(self, Self::Pointer)
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bitvec {
                bits,
                number,
                length,
            } => {
                write!(
                    f,
                    "{}{}{}",
                    number,
                    bits,
                    length
                        .as_ref()
                        .map_or_else(|| "".to_string(), |l| format!("<{}>", l))
                )
            }
            Self::Array { element, length } => {
                write!(f, "{}[{}]", element, length)
            }
            Self::Struct { name, fields } => {
                let repr: Vec<_> = fields.iter().map(|e| e.to_string()).collect();
                write!(
                    f,
                    "{}{{{}}}",
                    name.as_ref()
                        .map_or_else(|| "<anonymous>".to_string(), |n| n.to_string()),
                    repr.join(",")
                )
            }
            Self::Function {
                params,
                variadic,
                ret,
            } => {
                let repr: Vec<_> = params.iter().map(|e| e.to_string()).collect();
                write!(
                    f,
                    "({}{})->{}",
                    repr.join(","),
                    if *variadic { ", ..." } else { "" },
                    ret.as_ref()
                        .map_or_else(|| "void".to_string(), |t| t.to_string())
                )
            }
            Self::Pointer => write!(f, "ptr"),
        }
    }
}

/// A type registry that holds all the user-defined struct types
pub struct TypeRegistry {
    user_defined_structs: BTreeMap<Identifier, Vec<adapter::typing::Type>>,
}

impl TypeRegistry {
    pub fn populate(user_defined_structs: &[UserDefinedStruct]) -> EngineResult<Self> {
        let mut type_ident_to_fields = BTreeMap::new();
        for def in user_defined_structs {
            let UserDefinedStruct { name, fields } = def;
            let ident: Identifier = name
                .as_ref()
                .ok_or_else(|| {
                    EngineError::InvalidAssumption(
                        "user-defined struct type cannot be anonymous".into(),
                    )
                })?
                .into();
            let items = fields
                .as_ref()
                .ok_or(EngineError::NotSupportedYet(Unsupported::OpaqueType))?
                .clone();

            if type_ident_to_fields.contains_key(&ident) {
                return Err(EngineError::InvalidAssumption(format!(
                    "no duplicated definition of struct: {}",
                    ident
                )));
            }
            type_ident_to_fields.insert(ident, items);
        }

        let registry = Self {
            user_defined_structs: type_ident_to_fields,
        };

        // every field of a definition must be convertible on its own
        for items in registry.user_defined_structs.values() {
            for item in items {
                registry.convert(item)?;
            }
        }
        Ok(registry)
    }

    /// Convert a type where `void` is acceptable
    pub fn convert_or_void(&self, ty: &adapter::typing::Type) -> EngineResult<Option<Type>> {
        match ty {
            adapter::typing::Type::Void => Ok(None),
            _ => self.convert(ty).map(Some),
        }
    }

    /// Convert a type that must carry a value
    pub fn convert(&self, ty: &adapter::typing::Type) -> EngineResult<Type> {
        use adapter::typing::Type as AdaptedType;

        let converted = match ty {
            AdaptedType::Void => {
                return Err(EngineError::InvariantViolation(
                    "unexpected void type".into(),
                ));
            }
            AdaptedType::Int { width } => Type::Bitvec {
                bits: *width,
                number: NumRepr::Int,
                length: None,
            },
            AdaptedType::Float { width, name: _ } => Type::Bitvec {
                bits: *width,
                number: NumRepr::Float,
                length: None,
            },
            AdaptedType::Vector {
                element,
                fixed,
                length,
            } => {
                if !fixed {
                    return Err(EngineError::NotSupportedYet(Unsupported::ScalableVector));
                }
                match self.convert(element)? {
                    Type::Bitvec {
                        bits,
                        number,
                        length: None,
                    } => Type::Bitvec {
                        bits,
                        number,
                        length: Some(*length),
                    },
                    other => {
                        return Err(EngineError::InvalidAssumption(format!(
                            "type cannot be vector element: {}",
                            other
                        )));
                    }
                }
            }
            AdaptedType::Array { element, length } => Type::Array {
                element: Box::new(self.convert(element)?),
                length: *length,
            },
            AdaptedType::Struct { name, fields } => {
                let field_tys = fields.as_ref().ok_or_else(|| {
                    EngineError::InvalidAssumption(
                        "no opaque struct under opaque pointer scheme".into(),
                    )
                })?;
                let name_new: Option<Identifier> = name.as_ref().map(|ident| ident.into());

                // named structs must agree with their registered definition
                if let Some(ident) = &name_new {
                    match self.user_defined_structs.get(ident) {
                        None => {
                            return Err(EngineError::InvalidAssumption(format!(
                                "reference to undefined named struct: {}",
                                ident
                            )));
                        }
                        Some(defined_tys) => {
                            if defined_tys != field_tys {
                                return Err(EngineError::InvalidAssumption(format!(
                                    "conflicting definition of named struct: {}",
                                    ident
                                )));
                            }
                        }
                    }
                }

                let fields_new = field_tys
                    .iter()
                    .map(|e| self.convert(e))
                    .collect::<EngineResult<_>>()?;
                Type::Struct {
                    name: name_new,
                    fields: fields_new,
                }
            }
            AdaptedType::Function {
                params,
                variadic,
                ret,
            } => {
                let params_new = params
                    .iter()
                    .map(|e| self.convert(e))
                    .collect::<EngineResult<_>>()?;
                let ret_new = self.convert_or_void(ret)?.map(Box::new);
                Type::Function {
                    params: params_new,
                    variadic: *variadic,
                    ret: ret_new,
                }
            }
            // the address space does not affect what a pointer may refer to
            AdaptedType::Pointer { address_space: _ } => Type::Pointer,
            AdaptedType::Label => {
                return Err(EngineError::InvalidAssumption(
                    "unexpected primitive type: label".into(),
                ));
            }
            AdaptedType::Token => {
                return Err(EngineError::InvalidAssumption(
                    "unexpected primitive type: token".into(),
                ));
            }
            AdaptedType::Metadata => {
                return Err(EngineError::InvalidAssumption(
                    "unexpected primitive type: metadata".into(),
                ));
            }
        };
        Ok(converted)
    }
}
