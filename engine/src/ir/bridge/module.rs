use std::collections::BTreeSet;

use log::debug;

use crate::error::EngineError;
use crate::ir::adapter;
use crate::ir::bridge::function::Function;
use crate::ir::bridge::typing::TypeRegistry;
use crate::ir::bridge::value::Identifier;
use crate::EngineResult;

/// An adapted representation of a module
pub struct Module {
    /// module name
    pub name: Identifier,
    /// functions in the order of declaration
    pub functions: Vec<Function>,
}

impl Module {
    pub fn convert(module_adapted: &adapter::module::Module) -> EngineResult<Self> {
        let adapter::module::Module {
            name,
            asm,
            structs,
            functions,
        } = module_adapted;

        // module-level assembly defines no function bodies
        if !asm.is_empty() {
            debug!("ignoring module-level assembly in {}", name);
        }

        let typing = TypeRegistry::populate(structs)?;

        let mut seen = BTreeSet::new();
        let mut functions_new = vec![];
        for func in functions {
            let converted = Function::convert(func, &typing)?;
            if !seen.insert(converted.name.clone()) {
                return Err(EngineError::InvalidAssumption(format!(
                    "no duplicated function: {}",
                    converted.name
                )));
            }
            functions_new.push(converted);
        }

        // done
        Ok(Self {
            name: name.as_str().into(),
            functions: functions_new,
        })
    }
}
