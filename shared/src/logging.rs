use std::cell::Cell;

use log::{trace, SetLoggerError};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

use crate::config::PARALLEL;

thread_local! {
    /// Records the current depth of the tracer on this thread
    static TRACE_DEPTH: Cell<usize> = Cell::new(0);
}

/// Tracer representing the context
pub struct Tracer {
    title: String,
    depth: Option<usize>,
}

impl Tracer {
    /// Create a tracing session
    pub fn new(title: String) -> Self {
        Self::scoped(title, *PARALLEL)
    }

    /// Create a tracing session, muted when sessions may interleave across threads
    pub fn scoped(title: String, concurrent: bool) -> Self {
        let depth = if concurrent {
            None
        } else {
            let level = TRACE_DEPTH.with(|depth| depth.replace(depth.get() + 1));
            trace!("{}-> {}", "  ".repeat(level), title);
            Some(level)
        };
        Self { title, depth }
    }

    /// Record a new event
    pub fn log(&self, event: &str) {
        match &self.depth {
            None => (),
            Some(level) => trace!("{} {}", "  ".repeat(*level), event),
        }
    }
}

impl Drop for Tracer {
    fn drop(&mut self) {
        let Self { title, depth } = self;
        match depth {
            None => (),
            Some(level) => {
                trace!("{}<- {}", "  ".repeat(*level), title);
                let current = TRACE_DEPTH.with(|depth| depth.replace(*level));
                assert_eq!(current, *level + 1, "TRACE_DEPTH is out of sync");
            }
        }
    }
}

/// Setup the logging globally
pub fn setup(verbose: Option<usize>) -> Result<(), SetLoggerError> {
    let verbosity = match verbose.unwrap_or(0) {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    TermLogger::init(
        verbosity,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    fn current_depth() -> usize {
        TRACE_DEPTH.with(Cell::get)
    }

    #[test]
    fn nested_sessions_restore_depth() {
        let outer = Tracer::scoped("outer".into(), false);
        {
            let inner = Tracer::scoped("inner".into(), false);
            assert_eq!(inner.depth, Some(1));
            assert_eq!(current_depth(), 2);
        }
        assert_eq!(outer.depth, Some(0));
        drop(outer);
        assert_eq!(current_depth(), 0);
    }

    #[test]
    fn muted_sessions_leave_depth_alone() {
        let tracer = Tracer::scoped("muted".into(), true);
        assert_eq!(tracer.depth, None);
        assert_eq!(current_depth(), 0);
    }

    #[test]
    fn threads_track_depth_separately() {
        let _outer = Tracer::scoped("main".into(), false);
        let workers: Vec<_> = (0..4)
            .map(|i| {
                thread::spawn(move || {
                    let tracer = Tracer::scoped(format!("worker {}", i), false);
                    let depth = tracer.depth;
                    drop(tracer);
                    (depth, current_depth())
                })
            })
            .collect();
        for worker in workers {
            assert_eq!(worker.join().unwrap(), (Some(0), 0));
        }
        assert_eq!(current_depth(), 1);
    }
}
