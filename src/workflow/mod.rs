pub mod failure;
pub mod state;

pub use failure::{Stage, WorkflowFailure};
pub use state::WorkflowState;
