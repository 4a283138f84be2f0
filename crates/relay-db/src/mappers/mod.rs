//! Entity <-> Model mappers
//!
//! Status and kind columns are stored as text; converting them back to
//! entities can fail, so those mappers are `TryFrom`.

mod message;
mod notification;
mod preference;
mod room;
mod support;
