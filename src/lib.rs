//! Session Booking: multi-step coaching session booking wizard.

pub mod booking;
pub mod cli;
pub mod config;
pub mod error;
pub mod services;
