pub mod ai;
pub mod availability;
pub mod booking;
pub mod clock;
pub mod comments;
pub mod conversation;
pub mod dialogue;
pub mod messaging;
