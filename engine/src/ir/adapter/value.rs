use serde::{Deserialize, Serialize};

use crate::ir::adapter::constant::Constant;
use crate::ir::adapter::typing::Type;

/// An operand; only `Instruction` names something the analyses track
#[derive(Serialize, Deserialize, Clone)]
pub enum Value {
    /// positional parameter of the enclosing function
    Argument { ty: Type, index: usize },
    Constant(Constant),
    /// result of the instruction with this `index`
    Instruction { ty: Type, index: usize },
}
