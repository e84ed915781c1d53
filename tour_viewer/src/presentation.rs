use std::fmt;

use serde::Deserialize;

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load image";

/// Load state of the currently selected scene's panorama.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    Error(String),
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, LoadState::Ready)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            LoadState::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// Identifies one scene selection. Every selection, including re-selecting
/// the same scene, gets a fresh generation so completions for an abandoned
/// selection can be told apart from the live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
pub struct SceneTicket {
    pub scene: usize,
    pub generation: u64,
}

impl fmt::Display for SceneTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scene {}#{}", self.scene, self.generation)
    }
}

/// Scene load lifecycle guarded against stale completions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenePresentation {
    ticket: SceneTicket,
    state: LoadState,
}

impl ScenePresentation {
    pub fn new(scene: usize) -> Self {
        Self::starting_at(scene, 0)
    }

    /// First selection numbered `generation`, for sessions that must not
    /// reuse tickets handed out by an earlier one.
    pub fn starting_at(scene: usize, generation: u64) -> Self {
        Self {
            ticket: SceneTicket { scene, generation },
            state: LoadState::Loading,
        }
    }

    pub fn ticket(&self) -> SceneTicket {
        self.ticket
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Starts a new selection and returns its ticket.
    pub fn select(&mut self, scene: usize) -> SceneTicket {
        self.ticket = SceneTicket {
            scene,
            generation: self.ticket.generation + 1,
        };
        self.state = LoadState::Loading;
        self.ticket
    }

    pub fn resolve(&mut self, ticket: SceneTicket) -> bool {
        self.complete(ticket, LoadState::Ready)
    }

    pub fn fail(&mut self, ticket: SceneTicket, message: impl Into<String>) -> bool {
        self.complete(ticket, LoadState::Error(message.into()))
    }

    fn complete(&mut self, ticket: SceneTicket, outcome: LoadState) -> bool {
        if ticket != self.ticket {
            log::debug!("discarding stale load result for {ticket} (current {})", self.ticket);
            return false;
        }
        if !self.state.is_loading() {
            log::debug!("load result for {ticket} arrived after it settled");
            return false;
        }
        self.state = outcome;
        true
    }
}
