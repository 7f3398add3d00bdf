//! Turn scheduler
//!
//! Watches session transitions and decides when to ask the engine for a
//! move. An engine ply is never requested immediately: a fixed think
//! delay runs first, and any newer transition clears it so a stale
//! deadline can never fire against a superseded position.
//!
//! A generation counter guards in-flight searches across resets:
//! cancellation of the external engine is best-effort, so a best-move
//! event may still arrive after the position it was computed for is gone.
//! Such results fail the generation check and are dropped.

use std::time::Duration;

use tokio::time::Instant;

/// Decides when the engine is asked to move
#[derive(Debug)]
pub struct TurnScheduler {
    think_delay: Duration,
    generation: u64,
    deadline: Option<Instant>,
    in_flight: Option<u64>,
}

impl TurnScheduler {
    pub fn new(think_delay: Duration) -> Self {
        Self {
            think_delay,
            generation: 0,
            deadline: None,
            in_flight: None,
        }
    }

    /// Deadline of the armed think delay, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True while an analyze request is outstanding
    pub fn is_thinking(&self) -> bool {
        self.in_flight.is_some()
    }

    /// React to a session transition
    ///
    /// Always clears a previously armed deadline; arms a fresh one only
    /// when it is the engine's turn and no search is outstanding.
    pub fn on_state_change(&mut self, engine_to_move: bool) {
        self.deadline = if engine_to_move && self.in_flight.is_none() {
            Some(Instant::now() + self.think_delay)
        } else {
            None
        };
    }

    /// The armed deadline elapsed and its request is being dispatched
    pub fn mark_dispatched(&mut self) {
        self.deadline = None;
        self.in_flight = Some(self.generation);
    }

    /// The deadline elapsed but no request went out
    pub fn clear_deadline(&mut self) {
        self.deadline = None;
    }

    /// Check an arriving best-move event against the current generation
    ///
    /// Returns `false` for stale results (no search outstanding, or one
    /// dispatched before the last invalidation); the outstanding marker
    /// is consumed either way.
    pub fn accept_result(&mut self) -> bool {
        match self.in_flight.take() {
            Some(generation) => generation == self.generation,
            None => false,
        }
    }

    /// Invalidate everything scheduled or in flight (reset, teardown,
    /// engine loss)
    pub fn invalidate(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.deadline = None;
        self.in_flight = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> TurnScheduler {
        TurnScheduler::new(Duration::from_millis(500))
    }

    #[test]
    fn test_arms_deadline_on_engine_turn() {
        let mut sched = scheduler();
        sched.on_state_change(true);
        assert!(sched.deadline().is_some());
        assert!(!sched.is_thinking());
    }

    #[test]
    fn test_no_deadline_on_human_turn() {
        let mut sched = scheduler();
        sched.on_state_change(true);
        sched.on_state_change(false);
        assert!(sched.deadline().is_none());
    }

    #[test]
    fn test_dispatch_then_accept() {
        let mut sched = scheduler();
        sched.on_state_change(true);
        sched.mark_dispatched();
        assert!(sched.is_thinking());
        assert!(sched.deadline().is_none());

        assert!(sched.accept_result());
        assert!(!sched.is_thinking());
    }

    #[test]
    fn test_result_without_request_is_stale() {
        let mut sched = scheduler();
        assert!(!sched.accept_result());
    }

    #[test]
    fn test_invalidation_makes_result_stale() {
        //! A reset between dispatch and arrival drops the result
        let mut sched = scheduler();
        sched.on_state_change(true);
        sched.mark_dispatched();

        sched.invalidate();
        assert!(!sched.is_thinking());
        assert!(!sched.accept_result());
    }

    #[test]
    fn test_no_second_deadline_while_in_flight() {
        let mut sched = scheduler();
        sched.on_state_change(true);
        sched.mark_dispatched();

        sched.on_state_change(true);
        assert!(sched.deadline().is_none());
    }

    #[test]
    fn test_invalidate_clears_deadline() {
        let mut sched = scheduler();
        sched.on_state_change(true);
        sched.invalidate();
        assert!(sched.deadline().is_none());
    }
}
