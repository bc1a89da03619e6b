use crate::error::{EngineError, EngineResult, Unsupported};
use crate::ir::adapter;
use crate::ir::bridge::cfg::ControlFlowGraph;
use crate::ir::bridge::typing::{Type, TypeRegistry};
use crate::ir::bridge::value::Identifier;

/// An adapted representation of a function parameter
#[derive(Eq, PartialEq, Debug)]
pub struct Parameter {
    /// name
    pub name: Option<Identifier>,
    /// declared type
    pub ty: Type,
}

/// An adapted representation of a function
pub struct Function {
    /// function name
    pub name: Identifier,
    /// parameter definitions
    pub params: Vec<Parameter>,
    /// has variadic args
    pub variadic: bool,
    /// return type
    pub ret: Option<Type>,
    /// body of the function (in terms of a CFG)
    pub body: Option<ControlFlowGraph>,
}

impl Function {
    pub fn convert(
        func: &adapter::function::Function,
        typing: &TypeRegistry,
    ) -> EngineResult<Self> {
        let adapter::function::Function {
            name,
            ty,
            is_defined,
            params,
            blocks,
        } = func;

        // convert the name
        let ident: Identifier = name
            .as_ref()
            .ok_or(EngineError::NotSupportedYet(Unsupported::AnonymousFunction))?
            .into();

        // convert the signature
        let func_ty = typing.convert(ty)?;
        let (param_tys, variadic, ret_ty) = match func_ty {
            Type::Function {
                params,
                variadic,
                ret,
            } => (params, variadic, ret.map(|e| *e)),
            _ => {
                return Err(EngineError::InvalidAssumption(format!(
                    "invalid signature for function: {}",
                    ident
                )));
            }
        };

        // convert parameters
        if params.len() != param_tys.len() {
            return Err(EngineError::InvalidAssumption(format!(
                "parameter count mismatch for function: {}",
                ident
            )));
        }
        let mut params_new = vec![];
        for (param, expected_ty) in params.iter().zip(param_tys.iter()) {
            let param_ty = typing.convert(&param.ty)?;
            if &param_ty != expected_ty {
                return Err(EngineError::InvalidAssumption(format!(
                    "parameter type mismatch: expect {}, actual {}",
                    expected_ty, param_ty
                )));
            }
            params_new.push(Parameter {
                name: param.name.as_ref().map(|e| e.into()),
                ty: param_ty,
            });
        }

        let body = if *is_defined {
            if blocks.is_empty() {
                return Err(EngineError::InvalidAssumption(format!(
                    "a defined function must have at least one basic block: {}",
                    ident
                )));
            }
            Some(ControlFlowGraph::build(
                typing,
                &param_tys,
                ret_ty.as_ref(),
                blocks,
            )?)
        } else {
            if !blocks.is_empty() {
                return Err(EngineError::InvalidAssumption(format!(
                    "a declared function cannot have basic blocks: {}",
                    ident
                )));
            }
            None
        };

        // done with the construction
        Ok(Self {
            name: ident,
            params: params_new,
            variadic,
            ret: ret_ty,
            body,
        })
    }
}
