// htmlscrub-core/src/engines/mod.rs
//! Concrete implementations of the `SanitizationEngine` trait.
//!
//! Each engine lives in its own file and is declared here.

pub mod html_engine;
