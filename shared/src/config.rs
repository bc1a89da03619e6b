use std::env;

use lazy_static::lazy_static;

// common configurations
lazy_static! {
    /// analyze independent functions on multiple threads
    pub static ref PARALLEL: bool = matches!(env::var("MAYALIAS_PARALLEL"), Ok(val) if val == "1");
    /// re-check every converged solution before reporting it
    pub static ref VERIFY: bool = matches!(env::var("MAYALIAS_VERIFY"), Ok(val) if val == "1");
}
