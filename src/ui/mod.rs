//! # User Interface Module
//!
//! Web front for the walkthrough. Everything lives in the `routes`
//! submodule.

pub mod routes;
