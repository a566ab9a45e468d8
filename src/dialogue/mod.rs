pub mod ordinal;
pub mod request;
pub mod state;

pub use request::{ExtractedIntent, Flexibility, MeetingRequest, Urgency};
pub use state::{Conversation, ConversationState};
