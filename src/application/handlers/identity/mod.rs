//! Identity command handlers.

mod register_user;

pub use register_user::RegisterUserHandler;
