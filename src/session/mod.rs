//! Per-session conversation state.

pub mod registry;
pub mod state;
pub mod turn;
pub mod view;

pub use registry::{SessionHandle, SessionRegistry};
pub use state::ConversationState;
pub use turn::{Role, Turn, TurnDetails, TurnIcon};
pub use view::{render_conversation, ConversationView};
