//! Read entities definitions.

pub mod application;
pub mod lease;
pub mod message;
pub mod payment;
pub mod property;
pub mod user;
