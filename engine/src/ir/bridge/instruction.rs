use std::collections::{BTreeMap, BTreeSet};

use log::warn;

use crate::error::{EngineError, EngineResult};
use crate::ir::adapter;
use crate::ir::bridge::constant::Constant;
use crate::ir::bridge::typing::{NumRepr, Type, TypeRegistry};
use crate::ir::bridge::value::{BlockLabel, InstId, Value};

/// Conversion opcodes
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum CastOp {
    Trunc,
    ZExt,
    SExt,
    FPTrunc,
    FPExt,
    FPToUI,
    FPToSI,
    UIToFP,
    SIToFP,
    PtrToInt,
    IntToPtr,
    BitCast,
    AddrSpaceCast,
}

impl CastOp {
    fn parse(opcode: &str) -> EngineResult<Self> {
        let op = match opcode {
            "trunc" => Self::Trunc,
            "zext" => Self::ZExt,
            "sext" => Self::SExt,
            "fptrunc" => Self::FPTrunc,
            "fpext" => Self::FPExt,
            "fptoui" => Self::FPToUI,
            "fptosi" => Self::FPToSI,
            "uitofp" => Self::UIToFP,
            "sitofp" => Self::SIToFP,
            "ptrtoint" => Self::PtrToInt,
            "inttoptr" => Self::IntToPtr,
            "bitcast" => Self::BitCast,
            "addrspacecast" => Self::AddrSpaceCast,
            _ => {
                return Err(EngineError::InvalidAssumption(format!(
                    "unknown cast opcode: {}",
                    opcode
                )));
            }
        };
        Ok(op)
    }

    /// Whether the result refers to exactly what the operand refers to
    pub fn preserves_pointer(&self) -> bool {
        matches!(self, Self::BitCast | Self::AddrSpaceCast)
    }
}

/// Binary arithmetic opcodes
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    UDiv,
    SDiv,
    URem,
    SRem,
    And,
    Or,
    Xor,
    Shl,
    LShr,
    AShr,
    FAdd,
    FSub,
    FMul,
    FDiv,
    FRem,
}

impl BinaryOp {
    fn parse(opcode: &str) -> EngineResult<Self> {
        let op = match opcode {
            "add" => Self::Add,
            "sub" => Self::Sub,
            "mul" => Self::Mul,
            "udiv" => Self::UDiv,
            "sdiv" => Self::SDiv,
            "urem" => Self::URem,
            "srem" => Self::SRem,
            "and" => Self::And,
            "or" => Self::Or,
            "xor" => Self::Xor,
            "shl" => Self::Shl,
            "lshr" => Self::LShr,
            "ashr" => Self::AShr,
            "fadd" => Self::FAdd,
            "fsub" => Self::FSub,
            "fmul" => Self::FMul,
            "fdiv" => Self::FDiv,
            "frem" => Self::FRem,
            _ => {
                return Err(EngineError::InvalidAssumption(format!(
                    "unknown binary opcode: {}",
                    opcode
                )));
            }
        };
        Ok(op)
    }
}

/// Comparison predicates
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum ComparePredicate {
    EQ,
    NE,
    UGT,
    UGE,
    ULT,
    ULE,
    SGT,
    SGE,
    SLT,
    SLE,
    // any ordered or unordered floating-point comparison
    Float,
}

impl ComparePredicate {
    fn parse(predicate: &str) -> EngineResult<Self> {
        let pred = match predicate {
            "eq" => Self::EQ,
            "ne" => Self::NE,
            "ugt" => Self::UGT,
            "uge" => Self::UGE,
            "ult" => Self::ULT,
            "ule" => Self::ULE,
            "sgt" => Self::SGT,
            "sge" => Self::SGE,
            "slt" => Self::SLT,
            "sle" => Self::SLE,
            "false" | "oeq" | "ogt" | "oge" | "olt" | "ole" | "one" | "ord" | "ueq" | "uno"
            | "true" => Self::Float,
            _ => {
                return Err(EngineError::InvalidAssumption(format!(
                    "unknown comparison predicate: {}",
                    predicate
                )));
            }
        };
        Ok(pred)
    }
}

/// An naive translation of a non-terminator instruction
#[derive(Eq, PartialEq, Clone, Debug)]
pub enum Inst {
    // memory access
    Alloca {
        base_type: Type,
        size: Option<Value>,
    },
    Load {
        pointee_type: Type,
        pointer: Value,
    },
    Store {
        pointee_type: Type,
        pointer: Value,
        value: Value,
    },
    GEP {
        src_pointee_type: Type,
        pointer: Value,
        indices: Vec<Value>,
    },
    // conversion
    Cast {
        opcode: CastOp,
        operand: Value,
    },
    // choice
    Select {
        cond: Value,
        then_value: Value,
        else_value: Value,
    },
    Phi {
        options: Vec<(BlockLabel, Value)>,
    },
    // arithmetic
    Binary {
        opcode: BinaryOp,
        lhs: Value,
        rhs: Value,
    },
    Compare {
        predicate: ComparePredicate,
        lhs: Value,
        rhs: Value,
    },
    // call
    Call {
        callee: Value,
        args: Vec<Value>,
    },
    /// inline assembly
    Asm { asm: String, args: Vec<Value> },
}

/// A non-terminator instruction together with its identity
#[derive(Eq, PartialEq, Clone, Debug)]
pub struct Instruction {
    /// identity of the instruction (and of the register it defines)
    pub index: InstId,
    /// type of the result, none for void
    pub ty: Option<Type>,
    /// the actual operation
    pub repr: Inst,
}

/// An naive translation of a terminator instruction
#[derive(Eq, PartialEq, Clone, Debug)]
pub enum Term {
    /// unconditional branch
    Goto { target: BlockLabel },
    /// conditional branch
    Branch {
        cond: Value,
        then_case: BlockLabel,
        else_case: BlockLabel,
    },
    /// multi-way branch
    Switch {
        cond: Value,
        cases: BTreeMap<u64, BlockLabel>,
        default: Option<BlockLabel>,
    },
    /// function return
    Return { val: Option<Value> },
    /// enters an unreachable state
    Unreachable,
}

/// A terminator instruction together with its identity
#[derive(Eq, PartialEq, Clone, Debug)]
pub struct Terminator {
    pub index: InstId,
    pub repr: Term,
}

impl Terminator {
    /// Distinct successor blocks, sorted by label
    pub fn successors(&self) -> BTreeSet<BlockLabel> {
        let mut result = BTreeSet::new();
        match &self.repr {
            Term::Goto { target } => {
                result.insert(*target);
            }
            Term::Branch {
                cond: _,
                then_case,
                else_case,
            } => {
                result.insert(*then_case);
                result.insert(*else_case);
            }
            Term::Switch {
                cond: _,
                cases,
                default,
            } => {
                result.extend(cases.values().copied());
                result.extend(default.iter().copied());
            }
            Term::Return { .. } | Term::Unreachable => (),
        }
        result
    }
}

/// A context manager for converting instructions
pub struct Context<'a> {
    pub typing: &'a TypeRegistry,
    pub blocks: BTreeSet<usize>,
    pub insts: BTreeSet<usize>,
    pub args: BTreeMap<usize, Type>,
    pub ret: Option<Type>,
}

impl<'a> Context<'a> {
    /// convert a value
    pub fn parse_value(
        &self,
        val: &adapter::value::Value,
        expected_type: &Type,
    ) -> EngineResult<Value> {
        use adapter::value::Value as AdaptedValue;

        let converted = match val {
            AdaptedValue::Constant(constant) => {
                Value::Constant(Constant::convert(constant, expected_type, self.typing)?)
            }
            AdaptedValue::Argument { ty, index } => match self.args.get(index) {
                None => {
                    return Err(EngineError::InvariantViolation(
                        "invalid argument index".into(),
                    ));
                }
                Some(arg_type) => {
                    if expected_type != arg_type {
                        return Err(EngineError::InvariantViolation(
                            "param type mismatch".into(),
                        ));
                    }
                    let actual_ty = self.typing.convert(ty)?;
                    if expected_type != &actual_ty {
                        return Err(EngineError::InvariantViolation(
                            "argument type mismatch".into(),
                        ));
                    }
                    Value::Argument {
                        index: *index,
                        ty: actual_ty,
                    }
                }
            },
            AdaptedValue::Instruction { ty, index } => {
                let actual_ty = self.typing.convert(ty)?;
                if expected_type != &actual_ty {
                    return Err(EngineError::InvariantViolation(
                        "instruction type mismatch".into(),
                    ));
                }
                if self.insts.contains(index) {
                    Value::Register {
                        index: index.into(),
                        ty: actual_ty,
                    }
                } else {
                    warn!("operand refers to an unknown instruction: {}", index);
                    Value::Unresolved {
                        index: *index,
                        ty: actual_ty,
                    }
                }
            }
        };
        Ok(converted)
    }

    /// convert a value whose type is dictated by the value itself
    fn parse_value_as_declared(&self, val: &adapter::value::Value) -> EngineResult<Value> {
        use adapter::value::Value as AdaptedValue;

        let declared = match val {
            AdaptedValue::Constant(constant) => &constant.ty,
            AdaptedValue::Argument { ty, .. } | AdaptedValue::Instruction { ty, .. } => ty,
        };
        let expected_type = self.typing.convert(declared)?;
        self.parse_value(val, &expected_type)
    }

    /// convert a value that must be an integer (or a vector of integers)
    fn parse_int_value(&self, val: &adapter::value::Value) -> EngineResult<Value> {
        let converted = self.parse_value_as_declared(val)?;
        if !matches!(
            converted.ty(),
            Type::Bitvec {
                number: NumRepr::Int,
                ..
            }
        ) {
            return Err(EngineError::InvalidAssumption(format!(
                "expect an integer operand, found {}",
                converted.ty()
            )));
        }
        Ok(converted)
    }

    fn parse_block_label(&self, label: &usize) -> EngineResult<BlockLabel> {
        if !self.blocks.contains(label) {
            return Err(EngineError::InvariantViolation(format!(
                "reference to unknown block: {}",
                label
            )));
        }
        Ok(label.into())
    }

    fn expect_pointer_result(inst_ty: &Option<Type>, tag: &str) -> EngineResult<()> {
        if !matches!(inst_ty, Some(Type::Pointer)) {
            return Err(EngineError::InvalidAssumption(format!(
                "{} should return a pointer type",
                tag
            )));
        }
        Ok(())
    }

    fn expect_value_result(inst_ty: &Option<Type>, tag: &str) -> EngineResult<Type> {
        inst_ty.clone().ok_or_else(|| {
            EngineError::InvalidAssumption(format!("{} should not have void type", tag))
        })
    }

    /// convert an instruction
    pub fn parse_instruction(
        &self,
        inst: &adapter::instruction::Instruction,
    ) -> EngineResult<Instruction> {
        use adapter::instruction::Inst as AdaptedInst;

        let inst_ty = self.typing.convert_or_void(&inst.ty)?;
        let repr = match &inst.repr {
            // memory access
            AdaptedInst::Alloca {
                allocated_type,
                size,
                ..
            } => {
                Self::expect_pointer_result(&inst_ty, "AllocaInst")?;
                let base_type = self.typing.convert(allocated_type)?;
                let size_new = match size.as_ref() {
                    None => None,
                    Some(val) => Some(self.parse_int_value(val)?),
                };
                Inst::Alloca {
                    base_type,
                    size: size_new,
                }
            }
            AdaptedInst::Load {
                pointee_type,
                pointer,
                ..
            } => {
                let pointee_type_new = self.typing.convert(pointee_type)?;
                if inst_ty.as_ref() != Some(&pointee_type_new) {
                    return Err(EngineError::InvalidAssumption(
                        "LoadInst mismatch between result type and pointee type".into(),
                    ));
                }
                let pointer_new = self.parse_value(pointer, &Type::Pointer)?;
                Inst::Load {
                    pointee_type: pointee_type_new,
                    pointer: pointer_new,
                }
            }
            AdaptedInst::Store {
                pointee_type,
                pointer,
                value,
                ..
            } => {
                if inst_ty.is_some() {
                    return Err(EngineError::InvalidAssumption(
                        "StoreInst should have void type".into(),
                    ));
                }
                let pointee_type_new = self.typing.convert(pointee_type)?;
                let pointer_new = self.parse_value(pointer, &Type::Pointer)?;
                let value_new = self.parse_value(value, &pointee_type_new)?;
                Inst::Store {
                    pointee_type: pointee_type_new,
                    pointer: pointer_new,
                    value: value_new,
                }
            }
            AdaptedInst::GEP {
                src_pointee_type,
                pointer,
                indices,
                ..
            } => {
                Self::expect_pointer_result(&inst_ty, "GEPInst")?;
                let src_pointee_type_new = self.typing.convert(src_pointee_type)?;
                let pointer_new = self.parse_value(pointer, &Type::Pointer)?;
                let indices_new = indices
                    .iter()
                    .map(|v| self.parse_int_value(v))
                    .collect::<EngineResult<_>>()?;
                Inst::GEP {
                    src_pointee_type: src_pointee_type_new,
                    pointer: pointer_new,
                    indices: indices_new,
                }
            }
            // conversion
            AdaptedInst::Cast {
                opcode,
                src_ty,
                dst_ty,
                operand,
            } => {
                let opcode_new = CastOp::parse(opcode)?;
                let src_ty_new = self.typing.convert(src_ty)?;
                let dst_ty_new = self.typing.convert(dst_ty)?;
                if inst_ty.as_ref() != Some(&dst_ty_new) {
                    return Err(EngineError::InvalidAssumption(
                        "CastInst mismatch between result type and destination type".into(),
                    ));
                }
                let operand_new = self.parse_value(operand, &src_ty_new)?;
                Inst::Cast {
                    opcode: opcode_new,
                    operand: operand_new,
                }
            }
            // choice
            AdaptedInst::Select {
                cond,
                then_value,
                else_value,
            } => {
                let expected = Self::expect_value_result(&inst_ty, "SelectInst")?;
                Inst::Select {
                    cond: self.parse_int_value(cond)?,
                    then_value: self.parse_value(then_value, &expected)?,
                    else_value: self.parse_value(else_value, &expected)?,
                }
            }
            AdaptedInst::Phi { options } => {
                let expected = Self::expect_value_result(&inst_ty, "PhiNode")?;
                let mut incoming = BTreeSet::new();
                let mut options_new = vec![];
                for option in options {
                    let label = self.parse_block_label(&option.block)?;
                    if !incoming.insert(label) {
                        return Err(EngineError::InvariantViolation(
                            "duplicated incoming block in PhiNode".into(),
                        ));
                    }
                    options_new.push((label, self.parse_value(&option.value, &expected)?));
                }
                Inst::Phi {
                    options: options_new,
                }
            }
            // arithmetic
            AdaptedInst::Binary { opcode, lhs, rhs } => {
                let expected = Self::expect_value_result(&inst_ty, "BinaryOperator")?;
                Inst::Binary {
                    opcode: BinaryOp::parse(opcode)?,
                    lhs: self.parse_value(lhs, &expected)?,
                    rhs: self.parse_value(rhs, &expected)?,
                }
            }
            AdaptedInst::Compare {
                predicate,
                operand_type,
                lhs,
                rhs,
            } => {
                Self::expect_value_result(&inst_ty, "CmpInst")?;
                let expected = self.typing.convert(operand_type)?;
                Inst::Compare {
                    predicate: ComparePredicate::parse(predicate)?,
                    lhs: self.parse_value(lhs, &expected)?,
                    rhs: self.parse_value(rhs, &expected)?,
                }
            }
            // calls
            AdaptedInst::CallDirect {
                callee,
                target_type,
                args,
            }
            | AdaptedInst::CallIndirect {
                callee,
                target_type,
                args,
            } => {
                let func_ty = self.typing.convert(target_type)?;
                let (params, variadic, ret) = match func_ty {
                    Type::Function {
                        params,
                        variadic,
                        ret,
                    } => (params, variadic, ret),
                    _ => {
                        return Err(EngineError::InvalidAssumption(
                            "CallInst refer to a non-function callee".into(),
                        ));
                    }
                };
                if args.len() < params.len() || (!variadic && args.len() != params.len()) {
                    return Err(EngineError::InvalidAssumption(
                        "CallInst number of arguments mismatch".into(),
                    ));
                }
                if ret.as_deref() != inst_ty.as_ref() {
                    return Err(EngineError::InvalidAssumption(
                        "CallInst return type mismatch".into(),
                    ));
                }
                let mut args_new = vec![];
                for (i, arg) in args.iter().enumerate() {
                    let converted = match params.get(i) {
                        Some(t) => self.parse_value(arg, t)?,
                        None => self.parse_value_as_declared(arg)?,
                    };
                    args_new.push(converted);
                }
                Inst::Call {
                    callee: self.parse_value(callee, &Type::Pointer)?,
                    args: args_new,
                }
            }
            AdaptedInst::Asm { asm, args } => {
                let args_new = args
                    .iter()
                    .map(|v| self.parse_value_as_declared(v))
                    .collect::<EngineResult<_>>()?;
                Inst::Asm {
                    asm: asm.clone(),
                    args: args_new,
                }
            }
            // terminators should never appear here
            AdaptedInst::Return { .. }
            | AdaptedInst::Branch { .. }
            | AdaptedInst::Switch { .. }
            | AdaptedInst::Unreachable => {
                return Err(EngineError::InvariantViolation(
                    "malformed block with terminator instruction in the body".into(),
                ));
            }
        };

        Ok(Instruction {
            index: inst.index.into(),
            ty: inst_ty,
            repr,
        })
    }

    /// convert an instruction to a terminator
    pub fn parse_terminator(
        &self,
        inst: &adapter::instruction::Instruction,
    ) -> EngineResult<Terminator> {
        use adapter::instruction::Inst as AdaptedInst;
        use adapter::typing::Type as AdaptedType;

        // all terminator instructions have a void type
        if !matches!(inst.ty, AdaptedType::Void) {
            return Err(EngineError::InvalidAssumption(
                "all terminator instructions must have void type".into(),
            ));
        }

        let repr = match &inst.repr {
            AdaptedInst::Return { value } => match (value, &self.ret) {
                (None, None) => Term::Return { val: None },
                (Some(_), None) | (None, Some(_)) => {
                    return Err(EngineError::InvariantViolation(
                        "return type mismatch".into(),
                    ));
                }
                (Some(val), Some(ty)) => Term::Return {
                    val: Some(self.parse_value(val, ty)?),
                },
            },
            AdaptedInst::Branch { cond, targets } => match (cond, targets.as_slice()) {
                (None, [target]) => Term::Goto {
                    target: self.parse_block_label(target)?,
                },
                (Some(cond), [then_case, else_case]) => Term::Branch {
                    cond: self.parse_value(
                        cond,
                        &Type::Bitvec {
                            bits: 1,
                            number: NumRepr::Int,
                            length: None,
                        },
                    )?,
                    then_case: self.parse_block_label(then_case)?,
                    else_case: self.parse_block_label(else_case)?,
                },
                _ => {
                    return Err(EngineError::InvariantViolation(
                        "malformed branch instruction".into(),
                    ));
                }
            },
            AdaptedInst::Switch {
                cond,
                cases,
                default,
            } => {
                let cond_new = self.parse_int_value(cond)?;
                let mut cases_new = BTreeMap::new();
                for case in cases {
                    let label = self.parse_block_label(&case.block)?;
                    if cases_new.insert(case.value, label).is_some() {
                        return Err(EngineError::InvariantViolation(
                            "duplicated case in switch".into(),
                        ));
                    }
                }
                let default_new = match default {
                    None => None,
                    Some(label) => Some(self.parse_block_label(label)?),
                };
                Term::Switch {
                    cond: cond_new,
                    cases: cases_new,
                    default: default_new,
                }
            }
            AdaptedInst::Unreachable => Term::Unreachable,
            // explicitly list the rest of the instructions
            AdaptedInst::Alloca { .. }
            | AdaptedInst::Load { .. }
            | AdaptedInst::Store { .. }
            | AdaptedInst::GEP { .. }
            | AdaptedInst::Cast { .. }
            | AdaptedInst::Select { .. }
            | AdaptedInst::Phi { .. }
            | AdaptedInst::Binary { .. }
            | AdaptedInst::Compare { .. }
            | AdaptedInst::CallDirect { .. }
            | AdaptedInst::CallIndirect { .. }
            | AdaptedInst::Asm { .. } => {
                return Err(EngineError::InvariantViolation(
                    "malformed block with non-terminator instruction".into(),
                ));
            }
        };

        Ok(Terminator {
            index: inst.index.into(),
            repr,
        })
    }
}
