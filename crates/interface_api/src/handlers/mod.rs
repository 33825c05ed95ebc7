//! Request handlers

pub mod billing;
pub mod health;
pub mod utility;
pub mod webhook;
