use std::fmt::{Display, Formatter};

use crate::analysis::generic::Solution;
use crate::analysis::pointsto::PointsToInfo;
use crate::ir::bridge::value::Identifier;

/// Converged may-point-to facts of one function
pub struct FunctionReport {
    pub name: Identifier,
    pub solution: Solution<PointsToInfo>,
}

impl Display for FunctionReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "function {}", self.name)?;
        for (edge, info) in self.solution.edges() {
            writeln!(f, "Edge[{}]:{}", edge, info)?;
        }
        for (index, info) in self.solution.sinks() {
            writeln!(f, "Exit[{}]:{}", index, info)?;
        }
        Ok(())
    }
}

/// Reports of every defined function in a module, in module order
pub struct ModuleReport {
    pub name: Identifier,
    pub functions: Vec<FunctionReport>,
}

impl Display for ModuleReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "module {}", self.name)?;
        for func in &self.functions {
            write!(f, "{}", func)?;
        }
        Ok(())
    }
}
