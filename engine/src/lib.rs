pub use error::{EngineError, EngineResult};

pub mod analysis;
pub mod error;
pub mod flow;
pub mod ir;

/// Main entrypoint
pub use analysis::pointsto::analyze;
