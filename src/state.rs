// Application state shared by the HTTP and MCP handlers.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::gemini::{GeminiClient, GenerationError, TextGenerator};

// ── Circuit Breaker ─────────────────────────────────────────────────────────
//
// After `failure_threshold` consecutive upstream failures the circuit opens
// and calls fail fast for `recovery_window`. Once the window elapses exactly
// one call is let through as a trial call (HALF_OPEN) and either closes the circuit
// or trips it again. Everyone else keeps failing fast while the trial call is in
// flight; a trial call that never reports back frees its slot after another window.

const FAILURE_THRESHOLD: u32 = 3;
const RECOVERY_WINDOW: Duration = Duration::from_secs(60);

const STATE_CLOSED: u32 = 0;
const STATE_OPEN: u32 = 1;
const STATE_HALF_OPEN: u32 = 2;

#[derive(Debug)]
pub struct CircuitBreaker {
    state: AtomicU32,
    consecutive_failures: AtomicU32,
    /// When the circuit last opened, or when the current trial call started.
    opened_at: Mutex<Option<Instant>>,
    failure_threshold: u32,
    recovery_window: Duration,
    provider: String,
}

impl CircuitBreaker {
    pub fn new(provider: &str) -> Self {
        Self::with_limits(provider, FAILURE_THRESHOLD, RECOVERY_WINDOW)
    }

    pub fn with_limits(provider: &str, failure_threshold: u32, recovery_window: Duration) -> Self {
        Self {
            state: AtomicU32::new(STATE_CLOSED),
            consecutive_failures: AtomicU32::new(0),
            opened_at: Mutex::new(None),
            failure_threshold: failure_threshold.max(1),
            recovery_window,
            provider: provider.to_string(),
        }
    }

    /// `Ok` when a call may proceed, `Err(CircuitOpen)` with the seconds left
    /// in the recovery window otherwise.
    pub fn check(&self) -> Result<(), GenerationError> {
        if self.state.load(Ordering::Acquire) == STATE_CLOSED {
            return Ok(());
        }

        let mut opened_at = self.opened_at.lock().unwrap_or_else(|p| p.into_inner());
        let current = self.state.load(Ordering::Acquire);
        if current == STATE_CLOSED {
            return Ok(());
        }

        let elapsed = opened_at.map(|t| t.elapsed()).unwrap_or(self.recovery_window);
        if elapsed >= self.recovery_window
            && self
                .state
                .compare_exchange(current, STATE_HALF_OPEN, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        {
            // The trial call's own window starts now.
            *opened_at = Some(Instant::now());
            tracing::info!(
                "circuit_breaker[{}]: {} -> HALF_OPEN, letting one trial call through",
                self.provider,
                state_name(current)
            );
            return Ok(());
        }

        // A success recorded between the two loads above closed the circuit.
        if self.state.load(Ordering::Acquire) == STATE_CLOSED {
            return Ok(());
        }

        Err(GenerationError::CircuitOpen {
            provider: self.provider.clone(),
            retry_in_secs: self.recovery_window.saturating_sub(elapsed).as_secs(),
        })
    }

    pub fn record_success(&self) {
        let prev = self.state.swap(STATE_CLOSED, Ordering::AcqRel);
        self.consecutive_failures.store(0, Ordering::Release);
        if prev != STATE_CLOSED {
            tracing::info!("circuit_breaker[{}]: {} -> CLOSED", self.provider, state_name(prev));
        }
    }

    pub fn record_failure(&self) {
        let count = self.consecutive_failures.fetch_add(1, Ordering::AcqRel) + 1;
        let trial_failed = self.state.load(Ordering::Acquire) == STATE_HALF_OPEN;
        if count < self.failure_threshold && !trial_failed {
            return;
        }

        *self.opened_at.lock().unwrap_or_else(|p| p.into_inner()) = Some(Instant::now());
        let prev = self.state.swap(STATE_OPEN, Ordering::AcqRel);
        if prev != STATE_OPEN {
            tracing::warn!(
                "circuit_breaker[{}]: TRIPPED after {} consecutive failures, failing fast for {}s",
                self.provider,
                count,
                self.recovery_window.as_secs()
            );
        }
    }

    pub fn state_label(&self) -> &'static str {
        state_name(self.state.load(Ordering::Acquire))
    }
}

fn state_name(state: u32) -> &'static str {
    match state {
        STATE_CLOSED => "closed",
        STATE_OPEN => "open",
        STATE_HALF_OPEN => "half_open",
        _ => "unknown",
    }
}

// ── AppState ────────────────────────────────────────────────────────────────

/// Cheap to clone; everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub generator: Arc<dyn TextGenerator>,
    pub gemini_circuit: Arc<CircuitBreaker>,
    pub start_time: Instant,
}

impl AppState {
    /// Production wiring: a Gemini client built from `config`.
    pub fn new(config: Config) -> Result<Self, GenerationError> {
        let config = Arc::new(config);
        let gemini_circuit = Arc::new(CircuitBreaker::new("gemini"));
        let client = GeminiClient::new(config.clone(), gemini_circuit.clone())?;

        if config.has_api_key() {
            tracing::info!("AppState initialised, model={}", config.model);
        } else {
            tracing::warn!("GEMINI_API_KEY not set; tools will return fallback documents");
        }

        Ok(Self {
            config,
            generator: Arc::new(client),
            gemini_circuit,
            start_time: Instant::now(),
        })
    }

    /// Wire an arbitrary generator, e.g. a scripted one in tests. `circuit`
    /// should be the breaker that generator reports to, so health output
    /// reflects it.
    pub fn with_generator(
        config: Config,
        generator: Arc<dyn TextGenerator>,
        circuit: Arc<CircuitBreaker>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            generator,
            gemini_circuit: circuit,
            start_time: Instant::now(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.config.has_api_key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_breaker_allows_calls() {
        let cb = CircuitBreaker::new("test");
        assert!(cb.check().is_ok());
        assert_eq!(cb.state_label(), "closed");
    }

    #[test]
    fn trips_after_threshold() {
        let cb = CircuitBreaker::with_limits("test", 3, Duration::from_secs(60));
        cb.record_failure();
        cb.record_failure();
        assert!(cb.check().is_ok());
        cb.record_failure();
        assert_eq!(cb.state_label(), "open");
        match cb.check() {
            Err(GenerationError::CircuitOpen { provider, retry_in_secs }) => {
                assert_eq!(provider, "test");
                assert!(retry_in_secs <= 60);
            }
            other => panic!("expected CircuitOpen, got {:?}", other),
        }
    }

    #[test]
    fn success_resets_failure_count() {
        let cb = CircuitBreaker::with_limits("test", 2, Duration::from_secs(60));
        cb.record_failure();
        cb.record_success();
        cb.record_failure();
        assert!(cb.check().is_ok());
    }

    #[test]
    fn half_open_trial_then_close() {
        let cb = CircuitBreaker::with_limits("test", 1, Duration::ZERO);
        cb.record_failure();
        assert!(cb.check().is_ok());
        assert_eq!(cb.state_label(), "half_open");
        cb.record_success();
        assert_eq!(cb.state_label(), "closed");
    }

    #[test]
    fn half_open_admits_a_single_trial_call() {
        let cb = CircuitBreaker::with_limits("test", 1, Duration::from_millis(50));
        cb.record_failure();
        std::thread::sleep(Duration::from_millis(80));

        assert!(cb.check().is_ok());
        assert_eq!(cb.state_label(), "half_open");
        assert!(matches!(cb.check(), Err(GenerationError::CircuitOpen { .. })));
        assert!(matches!(cb.check(), Err(GenerationError::CircuitOpen { .. })));
    }

    #[test]
    fn concurrent_callers_race_for_one_trial_call() {
        let cb = Arc::new(CircuitBreaker::with_limits("test", 1, Duration::from_millis(50)));
        cb.record_failure();
        std::thread::sleep(Duration::from_millis(80));

        let barrier = Arc::new(std::sync::Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cb = cb.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    cb.check().is_ok()
                })
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(admitted, 1);
        assert_eq!(cb.state_label(), "half_open");
    }

    #[test]
    fn stalled_trial_call_frees_slot_after_window() {
        let cb = CircuitBreaker::with_limits("test", 1, Duration::from_millis(50));
        cb.record_failure();
        std::thread::sleep(Duration::from_millis(80));
        assert!(cb.check().is_ok());
        assert!(cb.check().is_err());

        std::thread::sleep(Duration::from_millis(80));
        assert!(cb.check().is_ok());
        assert_eq!(cb.state_label(), "half_open");
    }

    #[test]
    fn failed_trial_call_reopens() {
        let cb = CircuitBreaker::with_limits("test", 5, Duration::ZERO);
        for _ in 0..5 {
            cb.record_failure();
        }
        assert!(cb.check().is_ok());
        cb.record_failure();
        assert_eq!(cb.state_label(), "open");
    }
}
