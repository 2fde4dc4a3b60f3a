//! State machine for one environment deploy run

/// State of an environment deploy run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    /// Checking every declared service
    Validating,

    /// Running pre-deploy for all services
    PreDeploying,

    /// Computing the leveled deploy order
    Leveling,

    /// Binding the services in a level
    Binding(usize),

    /// Deploying the services in a level
    Deploying(usize),

    /// Terminal: the run succeeded
    Succeeded,

    /// Terminal: the run failed
    Failed,
}

/// Run event
#[derive(Debug, Clone)]
pub enum RunEvent {
    /// All service checks passed
    ChecksPassed,

    /// Pre-deploy finished for every service
    PreDeployed,

    /// Deploy order computed
    OrderComputed,

    /// Every bind in the current level finished
    LevelBound,

    /// Every deploy in the current level finished; more levels remain
    LevelDeployed,

    /// The run finished successfully
    Completed,

    /// The run failed
    RunFailed(String),
}

/// Deploy run FSM
#[derive(Debug, Clone)]
pub struct RunFsm {
    state: RunState,
    error: Option<String>,
}

impl Default for RunFsm {
    fn default() -> Self {
        Self::new()
    }
}

impl RunFsm {
    /// Create a new FSM in the validating state
    pub fn new() -> Self {
        Self {
            state: RunState::Validating,
            error: None,
        }
    }

    /// Get current state
    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Get error message if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the run reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self.state, RunState::Succeeded | RunState::Failed)
    }

    /// Process an event, transitioning state.
    ///
    /// Returns an error for transitions the run lifecycle does not allow.
    pub fn process(&mut self, event: RunEvent) -> Result<(), String> {
        let next = match (&self.state, &event) {
            (RunState::Validating, RunEvent::ChecksPassed) => RunState::PreDeploying,
            (RunState::PreDeploying, RunEvent::PreDeployed) => RunState::Leveling,
            (RunState::Leveling, RunEvent::OrderComputed) => RunState::Binding(0),
            (RunState::Binding(level), RunEvent::LevelBound) => RunState::Deploying(*level),
            (RunState::Deploying(level), RunEvent::LevelDeployed) => RunState::Binding(level + 1),
            (RunState::Binding(_), RunEvent::Completed) => RunState::Succeeded,
            (RunState::Deploying(_), RunEvent::Completed) => RunState::Succeeded,
            (state, RunEvent::RunFailed(message)) if !matches!(state, RunState::Succeeded) => {
                self.error = Some(message.clone());
                RunState::Failed
            }
            (state, event) => {
                return Err(format!("Invalid transition: {:?} on {:?}", event, state));
            }
        };

        self.state = next;
        Ok(())
    }
}
