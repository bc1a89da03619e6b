use serde::{Deserialize, Serialize};

use crate::ir::adapter::instruction::Instruction;

/// A basic block: straight-line body plus exactly one terminator
#[derive(Serialize, Deserialize, Clone)]
pub struct Block {
    /// referenced by branch targets and phi options
    pub label: usize,
    #[serde(default)]
    pub name: Option<String>,
    pub body: Vec<Instruction>,
    pub terminator: Instruction,
}
