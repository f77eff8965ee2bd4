//! Attendance Bot - classroom attendance over chat
//!
//! A teacher opens a round for a class, every enrolled student is prompted,
//! and each acknowledgement is reflected once in the teacher's session
//! message.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
