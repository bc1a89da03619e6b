use serde::{Deserialize, Serialize};

use crate::ir::adapter::function::Function;
use crate::ir::adapter::typing::UserDefinedStruct;

/// A representation of a module
#[derive(Serialize, Deserialize, Clone)]
pub struct Module {
    /// name of the module
    pub name: String,
    /// module-level assembly
    #[serde(default)]
    pub asm: String,
    /// user-defined structs
    #[serde(default)]
    pub structs: Vec<UserDefinedStruct>,
    /// functions (both declared and defined)
    pub functions: Vec<Function>,
}
