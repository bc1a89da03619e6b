use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use rayon::prelude::*;
use serde::Deserialize;

use mayalias_shared::logging::Tracer;

use crate::analysis::domain::AbstractDomain;
use crate::analysis::generic::check_fixpoint;
use crate::analysis::pointsto::{analyze, PointsToAnalysis, PointsToInfo};
use crate::error::{EngineError, EngineResult};
use crate::flow::report::{FunctionReport, ModuleReport};
use crate::ir::bridge::function::Function;
use crate::ir::{adapter, bridge};

pub mod report;

pub struct Workflow {
    /// Serialized modules
    inputs: Vec<PathBuf>,
    /// Analyze independent functions on multiple threads
    parallel: bool,
    /// Re-check every solution for fixpoint stability
    verify: bool,
}

impl Workflow {
    pub fn new(inputs: Vec<PathBuf>, parallel: bool, verify: bool) -> Self {
        Self {
            inputs,
            parallel,
            verify,
        }
    }

    pub fn execute(&self) -> EngineResult<Vec<ModuleReport>> {
        let mut reports = vec![];
        for (i, input) in self.inputs.iter().enumerate() {
            let module = Self::load(input)?;
            debug!("[{}] module {} loaded", i, module.name);

            let report = self.analyze_module(&module)?;
            info!(
                "[{}] module {}: {} functions analyzed",
                i,
                report.name,
                report.functions.len()
            );
            reports.push(report);
        }
        Ok(reports)
    }

    /// Deserialize a JSON file and validate it as a module
    pub fn load(input: &Path) -> EngineResult<bridge::module::Module> {
        let content = fs::read_to_string(input)
            .map_err(|e| EngineError::LoadingError(format!("Unreadable JSON file: {}", e)))?;

        // constant expressions may nest arbitrarily deep
        let mut deserializer = serde_json::Deserializer::from_str(&content);
        deserializer.disable_recursion_limit();
        let module_adapted = adapter::module::Module::deserialize(&mut deserializer)
            .and_then(|module| deserializer.end().map(|_| module))
            .map_err(|e| {
                EngineError::LoadingError(format!("Error during deserialization: {}", e))
            })?;

        bridge::convert(&module_adapted)
    }

    fn analyze_module(&self, module: &bridge::module::Module) -> EngineResult<ModuleReport> {
        let defined: Vec<_> = module
            .functions
            .iter()
            .filter(|func| func.body.is_some())
            .collect();

        let functions = if self.parallel {
            defined
                .par_iter()
                .map(|func| self.analyze_function(func))
                .collect::<EngineResult<Vec<_>>>()?
        } else {
            defined
                .iter()
                .map(|func| self.analyze_function(func))
                .collect::<EngineResult<Vec<_>>>()?
        };

        Ok(ModuleReport {
            name: module.name.clone(),
            functions,
        })
    }

    fn analyze_function(&self, func: &Function) -> EngineResult<FunctionReport> {
        let tracer = Tracer::scoped(format!("function {}", func.name), self.parallel);

        let solution = analyze(func)?;
        tracer.log(&format!("fixpoint after {} iterations", solution.iterations()));

        if self.verify {
            let stable =
                check_fixpoint(&PointsToAnalysis, func, &PointsToInfo::bottom(), &solution)?;
            if !stable {
                return Err(EngineError::InvariantViolation(format!(
                    "solution for {} is not a fixpoint",
                    func.name
                )));
            }
            tracer.log("fixpoint verified");
        }

        Ok(FunctionReport {
            name: func.name.clone(),
            solution,
        })
    }
}
