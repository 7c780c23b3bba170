//! Cooperative cancellation and progress reporting for generation runs.
//!
//! There is exactly one "current" run per [`RunRegistry`]. Starting a new run
//! bumps a shared counter; older [`RunToken`]s notice at their next yield point
//! ([`RunContext::checkpoint`] / [`RunContext::tick`]) and unwind with
//! [`GenerateError::Superseded`].
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::errors::GenerateError;

/// Minimum wall time between two throttled progress reports.
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// How long a failed run lingers (reporting its failure) before giving up.
pub const FAILURE_COOLDOWN: Duration = Duration::from_secs(60);

const COOLDOWN_SLICE: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Default)]
pub struct RunRegistry {
    current: Arc<AtomicU64>,
}

impl RunRegistry {
    pub fn new() -> RunRegistry {
        RunRegistry::default()
    }

    /// Starts a new run, superseding whatever was current.
    pub fn begin(&self) -> RunToken {
        let id = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Run {} started", id);
        RunToken {
            id,
            current: self.current.clone(),
        }
    }

    /// Supersedes the current run without starting another.
    pub fn cancel(&self) {
        self.current.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone)]
pub struct RunToken {
    id: u64,
    current: Arc<AtomicU64>,
}

impl RunToken {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.id
    }

    pub fn ensure_current(&self) -> Result<(), GenerateError> {
        if self.is_current() {
            Ok(())
        } else {
            Err(GenerateError::Superseded)
        }
    }
}

/// Anything that can show a human readable status line.
pub trait Progress {
    fn report(&mut self, message: &str);
}

impl<F> Progress for F
where
    F: FnMut(&str),
{
    fn report(&mut self, message: &str) {
        self(message)
    }
}

/// Everything a generator needs to yield: its token, where to send progress,
/// and the pacing rules.
pub struct RunContext<'a> {
    token: RunToken,
    progress: Box<dyn Progress + 'a>,
    throttle: Duration,
    cooldown: Duration,
    last_report: Instant,
}

impl<'a> RunContext<'a> {
    pub fn new<P: Progress + 'a>(token: RunToken, progress: P) -> RunContext<'a> {
        RunContext {
            token,
            progress: Box::new(progress),
            throttle: PROGRESS_INTERVAL,
            cooldown: FAILURE_COOLDOWN,
            last_report: Instant::now(),
        }
    }

    pub fn with_throttle(self, throttle: Duration) -> Self {
        RunContext { throttle, ..self }
    }

    pub fn with_cooldown(self, cooldown: Duration) -> Self {
        RunContext { cooldown, ..self }
    }

    pub fn token(&self) -> &RunToken {
        &self.token
    }

    /// Unconditional yield point: reports `message` if the run is still current.
    pub fn checkpoint(&mut self, message: &str) -> Result<(), GenerateError> {
        self.token.ensure_current()?;
        self.progress.report(message);
        self.last_report = Instant::now();
        Ok(())
    }

    /// Throttled yield point. The token is checked every call; the message is
    /// only built and reported once the throttle interval has passed.
    pub fn tick<F>(&mut self, message: F) -> Result<(), GenerateError>
    where
        F: FnOnce() -> String,
    {
        self.token.ensure_current()?;
        if self.last_report.elapsed() > self.throttle {
            self.progress.report(&message());
            self.last_report = Instant::now();
        }
        Ok(())
    }

    /// Reports `reason`, waits out the failure cooldown (still cancellable)
    /// and returns the [`GenerateError::Abandoned`] to propagate.
    pub fn abandon(&mut self, reason: &str) -> GenerateError {
        info!("Run {} abandoned: {}", self.token.id(), reason);
        if let Err(superseded) = self.checkpoint(reason) {
            return superseded;
        }
        let deadline = Instant::now() + self.cooldown;
        loop {
            if let Err(superseded) = self.token.ensure_current() {
                return superseded;
            }
            let now = Instant::now();
            if now >= deadline {
                return GenerateError::Abandoned(reason.to_string());
            }
            thread::sleep(COOLDOWN_SLICE.min(deadline - now));
        }
    }
}
