use serde::{Deserialize, Serialize};

use crate::ir::adapter::instruction::Inst;
use crate::ir::adapter::typing::Type;

/// Payload of a compile-time constant operand
#[derive(Serialize, Deserialize, Clone)]
pub enum Const {
    /// decimal digits, possibly wider than any native integer
    Int {
        value: String,
    },
    Float {
        value: String,
    },
    Null,
    /// the `none` token
    None,
    Undef,
    /// zero-initializer
    Default,
    Array {
        elements: Vec<Constant>,
    },
    Struct {
        elements: Vec<Constant>,
    },
    /// address of a global variable
    Variable {
        name: Option<String>,
    },
    /// address of a function
    Function {
        name: Option<String>,
    },
    /// constant expression, may nest arbitrarily deep
    Expr {
        inst: Box<Inst>,
    },
}

#[derive(Serialize, Deserialize, Clone)]
pub struct Constant {
    pub ty: Type,
    pub repr: Const,
}
