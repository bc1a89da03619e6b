//! Shorthands for assembling small functions in unit tests

use crate::ir::adapter::cfg::Block;
use crate::ir::adapter::constant::{Const, Constant};
use crate::ir::adapter::function::Function;
use crate::ir::adapter::instruction::{Inst, Instruction, PhiOption};
use crate::ir::adapter::typing::Type;
use crate::ir::adapter::value::Value;
use crate::ir::bridge;
use crate::ir::bridge::typing::TypeRegistry;

pub fn ptr() -> Type {
    Type::Pointer { address_space: 0 }
}

pub fn int(width: usize) -> Type {
    Type::Int { width }
}

pub fn reg(index: usize, ty: Type) -> Value {
    Value::Instruction { ty, index }
}

pub fn arg(index: usize, ty: Type) -> Value {
    Value::Argument { ty, index }
}

pub fn int_const(width: usize, value: i64) -> Value {
    Value::Constant(Constant {
        ty: int(width),
        repr: Const::Int {
            value: value.to_string(),
        },
    })
}

pub fn null() -> Value {
    Value::Constant(Constant {
        ty: ptr(),
        repr: Const::Null,
    })
}

fn inst(index: usize, ty: Type, repr: Inst) -> Instruction {
    Instruction { ty, index, repr }
}

pub fn alloca(index: usize, allocated_type: Type) -> Instruction {
    inst(
        index,
        ptr(),
        Inst::Alloca {
            allocated_type,
            size: None,
            address_space: 0,
        },
    )
}

pub fn load(index: usize, ty: Type, pointer: Value) -> Instruction {
    inst(
        index,
        ty.clone(),
        Inst::Load {
            pointee_type: ty,
            pointer,
            address_space: 0,
        },
    )
}

pub fn store(index: usize, value: Value, pointer: Value) -> Instruction {
    let pointee_type = match &value {
        Value::Argument { ty, .. } | Value::Instruction { ty, .. } => ty.clone(),
        Value::Constant(constant) => constant.ty.clone(),
    };
    inst(
        index,
        Type::Void,
        Inst::Store {
            pointee_type,
            pointer,
            value,
            address_space: 0,
        },
    )
}

pub fn cast(index: usize, opcode: &str, src_ty: Type, dst_ty: Type, operand: Value) -> Instruction {
    inst(
        index,
        dst_ty.clone(),
        Inst::Cast {
            opcode: opcode.to_string(),
            src_ty,
            dst_ty,
            operand,
        },
    )
}

pub fn bitcast(index: usize, operand: Value) -> Instruction {
    cast(index, "bitcast", ptr(), ptr(), operand)
}

pub fn gep(index: usize, pointer: Value, offset: Value) -> Instruction {
    inst(
        index,
        ptr(),
        Inst::GEP {
            src_pointee_type: int(32),
            pointer,
            indices: vec![offset],
            address_space: 0,
        },
    )
}

pub fn select(index: usize, cond: Value, then_value: Value, else_value: Value) -> Instruction {
    inst(
        index,
        ptr(),
        Inst::Select {
            cond,
            then_value,
            else_value,
        },
    )
}

pub fn phi(index: usize, options: Vec<(usize, Value)>) -> Instruction {
    inst(
        index,
        ptr(),
        Inst::Phi {
            options: options
                .into_iter()
                .map(|(block, value)| PhiOption { block, value })
                .collect(),
        },
    )
}

pub fn binary(index: usize, opcode: &str, lhs: Value, rhs: Value) -> Instruction {
    inst(
        index,
        int(32),
        Inst::Binary {
            opcode: opcode.to_string(),
            lhs,
            rhs,
        },
    )
}

pub fn compare(index: usize, lhs: Value, rhs: Value) -> Instruction {
    inst(
        index,
        int(1),
        Inst::Compare {
            predicate: "eq".to_string(),
            operand_type: int(32),
            lhs,
            rhs,
        },
    )
}

pub fn asm_call(index: usize, args: Vec<Value>) -> Instruction {
    inst(
        index,
        Type::Void,
        Inst::Asm {
            asm: "nop".to_string(),
            args,
        },
    )
}

pub fn ret(index: usize) -> Instruction {
    inst(index, Type::Void, Inst::Return { value: None })
}

pub fn goto(index: usize, target: usize) -> Instruction {
    inst(
        index,
        Type::Void,
        Inst::Branch {
            cond: None,
            targets: vec![target],
        },
    )
}

pub fn branch(index: usize, cond: Value, then_case: usize, else_case: usize) -> Instruction {
    inst(
        index,
        Type::Void,
        Inst::Branch {
            cond: Some(cond),
            targets: vec![then_case, else_case],
        },
    )
}

pub fn block(label: usize, body: Vec<Instruction>, terminator: Instruction) -> Block {
    Block {
        label,
        name: None,
        body,
        terminator,
    }
}

pub fn function(name: &str, params: Vec<Type>, blocks: Vec<Block>) -> Function {
    Function {
        name: Some(name.to_string()),
        ty: Type::Function {
            params: params.clone(),
            variadic: false,
            ret: Box::new(Type::Void),
        },
        is_defined: true,
        params: params
            .into_iter()
            .map(|ty| crate::ir::adapter::function::Parameter { name: None, ty })
            .collect(),
        blocks,
    }
}

/// Validate an assembled function, panicking on malformed input
pub fn convert(func: &Function) -> bridge::function::Function {
    let typing = TypeRegistry::populate(&[]).expect("empty type registry");
    match bridge::function::Function::convert(func, &typing) {
        Ok(converted) => converted,
        Err(e) => panic!("malformed test function: {}", e),
    }
}
