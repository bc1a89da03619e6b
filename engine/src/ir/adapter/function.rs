use serde::{Deserialize, Serialize};

use crate::ir::adapter::cfg::Block;
use crate::ir::adapter::typing::Type;

/// A representation of a function
#[derive(Serialize, Deserialize, Clone)]
pub struct Function {
    /// name of the function
    pub name: Option<String>,
    /// type of the function
    pub ty: Type,
    /// is not just a declaration
    pub is_defined: bool,
    /// parameters
    pub params: Vec<Parameter>,
    /// body of the function, entry block first
    pub blocks: Vec<Block>,
}

/// A representation of a function parameter
#[derive(Serialize, Deserialize, Clone)]
pub struct Parameter {
    /// name of the parameter
    pub name: Option<String>,
    /// type of the parameter
    pub ty: Type,
}
