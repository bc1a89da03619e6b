use crate::ir::adapter;
use crate::ir::bridge::module::Module;
use crate::EngineResult;

pub mod cfg;
pub mod constant;
pub mod function;
pub mod instruction;
pub mod module;
pub mod typing;
pub mod value;

/// Validate a serialized module into the representation the analyses consume
pub fn convert(module_adapted: &adapter::module::Module) -> EngineResult<Module> {
    Module::convert(module_adapted)
}
