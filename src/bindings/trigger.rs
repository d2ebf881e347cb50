//! Context handed into trigger evaluation, and the deferred mutations it
//! emits.
//!
//! Trigger evaluation needs manager-level state (refire flags, repeated-key
//! tracking, pending press-delay priorities) but must not mutate the refire
//! table mid-iteration. Evaluation therefore reads a `TriggerContext`
//! snapshot and pushes `RefireRequest` values; the manager applies them, in
//! order, once the binding's evaluation returns.

/// Read-only snapshot of dispatch state for one binding evaluation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TriggerContext {
    /// Current time on the pause-appropriate timeline.
    pub now: f32,
    /// The event being evaluated came from the refire table, not hardware.
    pub refiring: bool,
    /// The incoming hardware key is a repeat of the previous one.
    pub input_repeated: bool,
    /// The event's key is the key the manager is currently tracking.
    pub is_current_key: bool,
    /// A hold trigger already fired for the currently repeated key.
    pub repeated_hold_fired: bool,
    /// Highest `press_delay_priority` among pending delayed presses, -1 when
    /// none are pending.
    pub highest_pending_press_priority: i32,
}

/// Mutation requested by trigger evaluation, applied by the manager after the
/// evaluation returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RefireRequest {
    /// Register (or refresh) a refire entry for this binding and event.
    Register,
    /// Drop this binding's refire entry.
    Remove,
    /// Cancel every pending delayed press (a higher/equal priority press won).
    RemoveAllDelayedPress,
    /// The delayed press is still pending; fire a synthetic release after it.
    MarkNeedsRelease,
    /// Record that the repeated key's hold trigger has fired.
    RepeatedHoldTriggerFired,
}
