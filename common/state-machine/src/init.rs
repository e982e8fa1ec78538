// Licensed under the Apache-2.0 license

use log::{error, info};
use thiserror::Error;

/// One boot-time initialization step run before the super-loop starts.
pub struct InitFunction<C> {
    pub name: &'static str,
    pub handler: fn(&C) -> bool,
    /// Stop the boot if this step fails.
    pub halt_on_failure: bool,
    /// Ask the caller to restart the boot if this step fails.
    pub restart_on_failure: bool,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    #[error("{0}() failed, halting")]
    Halt(&'static str),
    #[error("{0}() failed, restart requested")]
    Restart(&'static str),
}

/// Runs each step in order. A failing step is logged; the first one flagged
/// to halt or restart ends the run with the matching error.
pub fn run_init_functions<C>(functions: &[InitFunction<C>], context: &C) -> Result<(), InitError> {
    for (i, function) in functions.iter().enumerate() {
        info!("running {} of {}: {}()", i + 1, functions.len(), function.name);
        if (function.handler)(context) {
            continue;
        }
        error!("{}() returned false", function.name);
        if function.halt_on_failure {
            return Err(InitError::Halt(function.name));
        }
        if function.restart_on_failure {
            return Err(InitError::Restart(function.name));
        }
    }
    Ok(())
}
