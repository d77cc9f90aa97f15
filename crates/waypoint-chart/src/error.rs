//! Error types for waypoint-chart

use thiserror::Error;

/// Error type returned by chart actions, guards and wait completions
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while building or running a statechart
#[derive(Error, Debug)]
pub enum ChartError {
    /// A chart level has no Initial state
    #[error("{level} has no initial state")]
    MissingInitial { level: String },

    /// A chart level has more than one Initial state
    #[error("{level} has more than one initial state")]
    MultipleInitial { level: String },

    /// An Initial state lacks its single unconditional transition
    #[error("initial state {state} needs exactly one transition")]
    InitialWithoutTransition { state: String },

    /// A Choice state lacks its fallback transition
    #[error("choice {state} has no fallback transition")]
    ChoiceWithoutFallback { state: String },

    /// An AsyncWait state has no operation to start
    #[error("wait state {state} has no operation")]
    WaitWithoutOperation { state: String },

    /// A Nested state was declared without any child states
    #[error("nested state {state} has no sub-chart")]
    NestedWithoutSubchart { state: String },

    /// A pseudostate transitions to itself
    #[error("{state} transitions to itself")]
    SelfTargetingPseudostate { state: String },

    /// A completion transition can never fire, or a completion can never
    /// be followed
    #[error("completion of {state} is unreachable: {reason}")]
    UnreachableCompletion { state: String, reason: String },

    /// A transition was declared on a state kind that cannot have it
    #[error("invalid transition from {state}: {reason}")]
    InvalidTransition { state: String, reason: String },

    /// The chart was started twice
    #[error("chart {0} is already started")]
    AlreadyStarted(String),

    /// An entry action, exit action, guard or completion failed at runtime
    #[error("action in {state} failed: {source}")]
    Action {
        state: String,
        #[source]
        source: BoxError,
    },

    /// Every handle to a running driver was dropped
    #[error("chart driver is no longer running")]
    DriverClosed,
}

impl ChartError {
    pub(crate) fn action(state: &str, source: BoxError) -> Self {
        ChartError::Action {
            state: state.to_string(),
            source,
        }
    }

    /// Whether this error was detected while building the chart
    pub fn is_build_error(&self) -> bool {
        !matches!(
            self,
            ChartError::Action { .. } | ChartError::DriverClosed | ChartError::AlreadyStarted(_)
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ChartError>;
