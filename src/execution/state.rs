//! Timeout supervision state machine.

/// Lifecycle of one supervised execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SupervisorState {
    /// Output is being drained; the deadline (if any) is armed.
    #[default]
    Running,
    /// The child closed its output and exited before the deadline.
    Completed,
    /// The deadline fired first; the child has been signalled.
    TimedOut,
    /// Remaining output was read after the timeout.
    Salvaged,
    /// The salvage read failed or ran out of time.
    SalvageFailed,
}

impl SupervisorState {
    /// Check if transition to target state is valid.
    ///
    /// Valid transitions:
    /// - Running -> Completed
    /// - Running -> TimedOut
    /// - TimedOut -> Salvaged
    /// - TimedOut -> SalvageFailed
    pub fn can_transition_to(&self, target: SupervisorState) -> bool {
        use SupervisorState::*;
        matches!(
            (*self, target),
            (Running, Completed)
                | (Running, TimedOut)
                | (TimedOut, Salvaged)
                | (TimedOut, SalvageFailed)
        )
    }

    /// Attempt to transition to a new state.
    ///
    /// Returns `false` and leaves the state untouched when the transition
    /// is not allowed.
    pub fn transition_to(&mut self, target: SupervisorState) -> bool {
        if self.can_transition_to(target) {
            tracing::trace!(from = ?*self, to = ?target, "supervisor transition");
            *self = target;
            true
        } else {
            false
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SupervisorState::Completed | SupervisorState::Salvaged | SupervisorState::SalvageFailed
        )
    }
}
