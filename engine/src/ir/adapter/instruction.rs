use serde::{Deserialize, Serialize};

use crate::ir::adapter::typing::Type;
use crate::ir::adapter::value::Value;

#[derive(Serialize, Deserialize, Clone)]
pub enum Inst {
    // memory
    Alloca {
        allocated_type: Type,
        #[serde(default)]
        size: Option<Value>,
        #[serde(default)]
        address_space: usize,
    },
    Load {
        pointee_type: Type,
        pointer: Value,
        #[serde(default)]
        address_space: usize,
    },
    Store {
        pointee_type: Type,
        pointer: Value,
        value: Value,
        #[serde(default)]
        address_space: usize,
    },
    GEP {
        src_pointee_type: Type,
        pointer: Value,
        indices: Vec<Value>,
        #[serde(default)]
        address_space: usize,
    },
    // conversion
    Cast {
        opcode: String,
        src_ty: Type,
        dst_ty: Type,
        operand: Value,
    },
    // choice
    Select {
        cond: Value,
        then_value: Value,
        else_value: Value,
    },
    Phi {
        options: Vec<PhiOption>,
    },
    // arithmetic
    Binary {
        opcode: String,
        lhs: Value,
        rhs: Value,
    },
    Compare {
        predicate: String,
        operand_type: Type,
        lhs: Value,
        rhs: Value,
    },
    // call
    CallDirect {
        callee: Value,
        target_type: Type,
        args: Vec<Value>,
    },
    CallIndirect {
        callee: Value,
        target_type: Type,
        args: Vec<Value>,
    },
    Asm {
        asm: String,
        args: Vec<Value>,
    },
    // terminators
    Return {
        #[serde(default)]
        value: Option<Value>,
    },
    Branch {
        #[serde(default)]
        cond: Option<Value>,
        targets: Vec<usize>,
    },
    Switch {
        cond: Value,
        cases: Vec<SwitchCase>,
        #[serde(default)]
        default: Option<usize>,
    },
    Unreachable,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct PhiOption {
    /// label of the incoming block
    pub block: usize,
    /// value flowing in from that block
    pub value: Value,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct SwitchCase {
    pub value: u64,
    pub block: usize,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct Instruction {
    /// type of the instruction
    pub ty: Type,
    /// a unique id for the instruction
    pub index: usize,
    /// the actual representation of an instruction
    pub repr: Inst,
}
