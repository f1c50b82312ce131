//! Data models for the clinic booking forms.
//!
//! Field names match the JSON the browser and the booking API already exchange.

mod booking;
mod contact;
mod draft;
mod service;
mod submission_flag;

pub use booking::*;
pub use contact::*;
pub use draft::*;
pub use service::*;
pub use submission_flag::*;
