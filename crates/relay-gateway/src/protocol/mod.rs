//! Gateway protocol definitions
//!
//! Frames are JSON objects of the form `{"event": <name>, "data": {...}}`.

mod close_codes;
mod events;
mod payloads;

pub use close_codes::CloseCode;
pub use events::{ClientEvent, FrameError, ServerEvent};
pub use payloads::{AuthenticatePayload, RoomPayload, SendMessagePayload, TypingPayload};
