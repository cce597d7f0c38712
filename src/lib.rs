//! Contact relay: contact-form email forwarding and a keyword chat responder.

pub mod api;
pub mod chat;
pub mod config;
pub mod error;
pub mod mail;
