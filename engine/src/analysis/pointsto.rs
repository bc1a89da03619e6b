use std::fmt::{Display, Formatter};

use crate::analysis::domain::{AbstractDomain, FiniteSetDomain, MapDomain};
use crate::analysis::generic::{execute, CfgDirection, DataflowAnalysis, Solution};
use crate::analysis::index::Statement;
use crate::error::EngineResult;
use crate::ir::bridge::function::Function;
use crate::ir::bridge::instruction::{Inst, Instruction};
use crate::ir::bridge::value::{InstId, Value};

/// An abstract location, named after the instruction that introduces it
#[derive(Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Hash, Debug)]
pub enum Location {
    /// the register defined by an instruction
    Register(InstId),
    /// the memory object allocated by an instruction
    Memory(InstId),
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Register(id) => write!(f, "R{}", id),
            Self::Memory(id) => write!(f, "M{}", id),
        }
    }
}

pub type PointeeSet = FiniteSetDomain<Location>;

/// What every location may point to at one program point
pub type PointsToInfo = MapDomain<Location, PointeeSet>;

impl Display for PointsToInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (key, pointees) in self.iter() {
            write!(f, "{}->(", key)?;
            for pointee in pointees.iter() {
                write!(f, "{}/", pointee)?;
            }
            write!(f, ")|")?;
        }
        Ok(())
    }
}

/// Facts about the register defined by `value`, if it is a register at all
fn lookup<'a>(info: &'a PointsToInfo, value: &Value) -> Option<&'a PointeeSet> {
    value
        .as_register()
        .and_then(|id| info.get(&Location::Register(id)))
}

/// Accumulates the facts contributed by a single instruction
struct Delta {
    facts: PointsToInfo,
}

impl Delta {
    fn new() -> Self {
        Self {
            facts: PointsToInfo::bottom(),
        }
    }

    fn add(&mut self, key: Location, pointees: &PointeeSet) {
        if !pointees.is_empty() {
            self.facts.join_at(key, pointees);
        }
    }

    fn add_one(&mut self, key: Location, pointee: Location) {
        let single: PointeeSet = std::iter::once(pointee).collect();
        self.facts.join_at(key, &single);
    }
}

/// Flow-sensitive, intra-procedural may-point-to analysis
pub struct PointsToAnalysis;

impl PointsToAnalysis {
    fn contribute(inst: &Instruction, input: &PointsToInfo, delta: &mut Delta) {
        let this = Location::Register(inst.index);
        match &inst.repr {
            Inst::Alloca { .. } => {
                delta.add_one(this, Location::Memory(inst.index));
            }
            Inst::Cast { opcode, operand } => {
                if !opcode.preserves_pointer() {
                    return;
                }
                if let Some(pointees) = lookup(input, operand) {
                    delta.add(this, pointees);
                }
            }
            // offsets are not tracked
            Inst::GEP { pointer, .. } => {
                if let Some(pointees) = lookup(input, pointer) {
                    delta.add(this, pointees);
                }
            }
            Inst::Load { pointer, .. } => {
                if !inst.ty.as_ref().map_or(false, |ty| ty.is_pointer()) {
                    return;
                }
                let bases = match lookup(input, pointer) {
                    None => return,
                    Some(bases) => bases,
                };
                for base in bases.iter() {
                    if let Some(pointees) = input.get(base) {
                        delta.add(this, pointees);
                    }
                }
            }
            // weak update: targets keep what they already point to
            Inst::Store { pointer, value, .. } => {
                let (targets, pointees) = match (lookup(input, pointer), lookup(input, value)) {
                    (Some(targets), Some(pointees)) => (targets, pointees),
                    _ => return,
                };
                for target in targets.iter() {
                    delta.add(*target, pointees);
                }
            }
            Inst::Select {
                then_value,
                else_value,
                ..
            } => {
                for operand in [then_value, else_value] {
                    if let Some(pointees) = lookup(input, operand) {
                        delta.add(this, pointees);
                    }
                }
            }
            Inst::Phi { options } => {
                for (_, operand) in options {
                    if let Some(pointees) = lookup(input, operand) {
                        delta.add(this, pointees);
                    }
                }
            }
            Inst::Binary { .. }
            | Inst::Compare { .. }
            | Inst::Call { .. }
            | Inst::Asm { .. } => (),
        }
    }
}

impl DataflowAnalysis for PointsToAnalysis {
    type Domain = PointsToInfo;

    fn direction(&self) -> CfgDirection {
        CfgDirection::Forward
    }

    fn transfer(&self, stmt: &Statement, input: &PointsToInfo) -> PointsToInfo {
        let inst = match stmt {
            Statement::Inst(inst) => inst,
            Statement::Term(_) => return input.clone(),
        };
        let mut delta = Delta::new();
        Self::contribute(inst, input, &mut delta);
        input.join(&delta.facts)
    }
}

/// Run the may-point-to analysis on one function, starting from no facts
pub fn analyze(function: &Function) -> EngineResult<Solution<PointsToInfo>> {
    execute(&PointsToAnalysis, function, &PointsToInfo::bottom())
}
