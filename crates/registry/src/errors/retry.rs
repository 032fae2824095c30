/// Classification for retry policy.
///
/// Used by callers (and the HTTP layer) to decide how to react to a failed
/// resolution without matching on individual error variants.
///
/// # Behavior Summary
///
/// | Class | Retry? | Notes |
/// |-------|--------|-------|
/// | `Never` | No | Bad input, confirmed absence, or a provider contract violation |
/// | `WithBackoff` | Yes | Transient infrastructure failure or rate limiting |
/// | `CircuitOpen` | Later | Provider is known-bad; wait for the cool-down |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry - the request is fundamentally invalid or the answer is final.
    Never,

    /// Retry with exponential backoff.
    ///
    /// Used for transient errors like rate limiting, timeouts, an unavailable
    /// upstream, or an exhausted egress pool.
    WithBackoff,

    /// Circuit breaker is open for the provider.
    /// Retry only after the advertised cool-down, not immediately.
    CircuitOpen,
}
