//! Keyed circuit breakers
//!
//! One breaker per operation key, created lazily on the first recorded
//! failure. State transitions are evaluated on access against tokio's clock;
//! no background task drives them.
//!
//! ```text
//! closed --(failures >= threshold)--> open
//! open --(recovery timeout elapsed, on access)--> half-open
//! half-open --(trial success)--> closed
//! half-open --(trial failure)--> open
//! half-open --(trial abandoned or outstanding past recovery timeout)--> open
//! ```

use crate::config::CircuitBreakerConfig;
use dashmap::DashMap;
use resq_domain::CircuitState;
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;

/// Breaker state for a single key
#[derive(Debug, Clone)]
struct BreakerEntry {
    state: CircuitState,
    failure_count: u32,
    last_failure_at: Option<Instant>,
    /// Set while the single half-open trial call is outstanding
    trial_in_flight: bool,
    trial_started_at: Option<Instant>,
    /// Bumped on every trial claim so a stale permit cannot resolve a newer trial
    trial_generation: u64,
}

impl BreakerEntry {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            last_failure_at: None,
            trial_in_flight: false,
            trial_started_at: None,
            trial_generation: 0,
        }
    }
}

/// Outcome of asking a breaker for permission
enum Claim {
    Rejected,
    Permitted,
    /// Holds the generation of the half-open trial that was claimed
    Trial(u64),
}

/// Permission for one call, returned by [`CircuitBreakerRegistry::acquire`]
///
/// A permit that claimed the half-open trial and is dropped without
/// [`resolve`](Self::resolve) counts as a failed trial and reopens the
/// circuit. This covers callers cancelled mid-trial.
#[must_use = "dropping an unresolved trial permit reopens the circuit"]
pub struct CallPermit<'a> {
    registry: &'a CircuitBreakerRegistry,
    key: String,
    trial: Option<u64>,
}

impl CallPermit<'_> {
    /// Whether this permit holds the half-open trial
    pub fn is_trial(&self) -> bool {
        self.trial.is_some()
    }

    /// Mark the call's outcome as recorded
    pub fn resolve(mut self) {
        self.trial = None;
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if let Some(generation) = self.trial.take() {
            self.registry.abandon_trial(&self.key, generation);
        }
    }
}

/// Point-in-time view of a breaker, for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CircuitSnapshot {
    /// Current state
    pub state: CircuitState,
    /// Failures counted toward the threshold
    pub failure_count: u32,
    /// Time since the last recorded failure
    pub since_last_failure: Option<Duration>,
}

/// Registry of per-key circuit breakers
///
/// Every method completes synchronously; no lock is held across an await
/// point, so a check-then-update on one key is never interleaved with
/// another caller's.
pub struct CircuitBreakerRegistry {
    config: CircuitBreakerConfig,
    breakers: DashMap<String, BreakerEntry>,
}

impl CircuitBreakerRegistry {
    /// Create a registry applying `config` to every key
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            breakers: DashMap::new(),
        }
    }

    /// Configuration shared by every breaker
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Move an open breaker to half-open once its recovery timeout has elapsed,
    /// and reopen a half-open breaker whose trial has been outstanding as long
    fn refresh(&self, key: &str, entry: &mut BreakerEntry) {
        if entry.state == CircuitState::HalfOpen {
            let stale = entry.trial_in_flight
                && entry
                    .trial_started_at
                    .is_some_and(|at| at.elapsed() >= self.config.recovery_timeout());
            if stale {
                tracing::warn!(circuit_breaker = %key, "Half-open trial timed out");
                entry.failure_count += 1;
                entry.last_failure_at = Some(Instant::now());
                self.transition(key, entry, CircuitState::Open);
            }
            return;
        }
        if entry.state != CircuitState::Open {
            return;
        }
        let recovered = entry
            .last_failure_at
            .is_none_or(|at| at.elapsed() >= self.config.recovery_timeout());
        if recovered {
            self.transition(key, entry, CircuitState::HalfOpen);
        }
    }

    fn transition(&self, key: &str, entry: &mut BreakerEntry, to: CircuitState) {
        if entry.state == to {
            return;
        }
        tracing::info!(
            circuit_breaker = %key,
            from = %entry.state,
            to = %to,
            failure_count = entry.failure_count,
            "Circuit breaker state transition"
        );
        entry.state = to;
        entry.trial_in_flight = false;
        entry.trial_started_at = None;
        if to == CircuitState::Closed {
            entry.failure_count = 0;
        }
    }

    /// Whether calls for `key` are currently rejected
    ///
    /// Querying an open breaker whose recovery timeout has elapsed moves it to
    /// half-open. A half-open breaker reports open while its trial call is
    /// outstanding.
    pub fn is_open(&self, key: &str) -> bool {
        let Some(mut entry) = self.breakers.get_mut(key) else {
            return false;
        };
        self.refresh(key, &mut entry);
        match entry.state {
            CircuitState::Closed => false,
            CircuitState::Open => true,
            CircuitState::HalfOpen => entry.trial_in_flight,
        }
    }

    /// Claim permission to call the operation for `key`
    ///
    /// Closed breakers always permit. A half-open breaker permits exactly one
    /// caller until that caller's outcome is recorded, or until the trial has
    /// been outstanding for the recovery timeout.
    pub fn try_acquire(&self, key: &str) -> bool {
        !matches!(self.claim(key), Claim::Rejected)
    }

    /// Claim permission as a [`CallPermit`] that releases an abandoned trial on drop
    pub fn acquire(&self, key: &str) -> Option<CallPermit<'_>> {
        let trial = match self.claim(key) {
            Claim::Rejected => return None,
            Claim::Permitted => None,
            Claim::Trial(generation) => Some(generation),
        };
        Some(CallPermit {
            registry: self,
            key: key.to_string(),
            trial,
        })
    }

    fn claim(&self, key: &str) -> Claim {
        let Some(mut entry) = self.breakers.get_mut(key) else {
            return Claim::Permitted;
        };
        self.refresh(key, &mut entry);
        match entry.state {
            CircuitState::Closed => Claim::Permitted,
            CircuitState::Open => Claim::Rejected,
            CircuitState::HalfOpen => {
                if entry.trial_in_flight {
                    Claim::Rejected
                } else {
                    entry.trial_in_flight = true;
                    entry.trial_started_at = Some(Instant::now());
                    entry.trial_generation += 1;
                    Claim::Trial(entry.trial_generation)
                }
            }
        }
    }

    /// Reopen the circuit for a trial whose outcome was never recorded
    fn abandon_trial(&self, key: &str, generation: u64) {
        let Some(mut entry) = self.breakers.get_mut(key) else {
            return;
        };
        let outstanding = entry.state == CircuitState::HalfOpen
            && entry.trial_in_flight
            && entry.trial_generation == generation;
        if outstanding {
            tracing::warn!(circuit_breaker = %key, "Half-open trial abandoned");
            entry.failure_count += 1;
            entry.last_failure_at = Some(Instant::now());
            self.transition(key, &mut entry, CircuitState::Open);
        }
    }

    /// Record a successful call
    ///
    /// Closed and half-open breakers reset to closed. A success reported while
    /// open came from a call admitted before the circuit tripped and is ignored.
    pub fn record_success(&self, key: &str) {
        let Some(mut entry) = self.breakers.get_mut(key) else {
            return;
        };
        match entry.state {
            CircuitState::HalfOpen => self.transition(key, &mut entry, CircuitState::Closed),
            CircuitState::Closed => entry.failure_count = 0,
            CircuitState::Open => {}
        }
    }

    /// Record a failed call, creating the breaker on first failure
    pub fn record_failure(&self, key: &str) {
        let now = Instant::now();
        let mut entry = self
            .breakers
            .entry(key.to_string())
            .or_insert_with(BreakerEntry::new);

        match entry.state {
            CircuitState::Closed => {
                let stale = entry
                    .last_failure_at
                    .is_some_and(|at| now.duration_since(at) >= self.config.monitoring_period());
                if stale {
                    entry.failure_count = 0;
                }
                entry.failure_count += 1;
                entry.last_failure_at = Some(now);
                if entry.failure_count >= self.config.failure_threshold {
                    self.transition(key, &mut entry, CircuitState::Open);
                }
            }
            CircuitState::HalfOpen => {
                entry.failure_count += 1;
                entry.last_failure_at = Some(now);
                self.transition(key, &mut entry, CircuitState::Open);
            }
            CircuitState::Open => {
                entry.failure_count += 1;
                entry.last_failure_at = Some(now);
            }
        }
    }

    /// Current state for `key`, closed when no breaker exists
    pub fn state(&self, key: &str) -> CircuitState {
        let Some(mut entry) = self.breakers.get_mut(key) else {
            return CircuitState::Closed;
        };
        self.refresh(key, &mut entry);
        entry.state
    }

    /// Diagnostic snapshot for `key`
    pub fn snapshot(&self, key: &str) -> Option<CircuitSnapshot> {
        let mut entry = self.breakers.get_mut(key)?;
        self.refresh(key, &mut entry);
        Some(CircuitSnapshot {
            state: entry.state,
            failure_count: entry.failure_count,
            since_last_failure: entry.last_failure_at.map(|at| at.elapsed()),
        })
    }

    /// Keys with a breaker
    pub fn keys(&self) -> Vec<String> {
        self.breakers.iter().map(|entry| entry.key().clone()).collect()
    }
}
