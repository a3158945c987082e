//! Core Wedahamine client library (sessions, OTP flow, catalog, config).

pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod credentials;
