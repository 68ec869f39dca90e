//! Policy compilation and tree sanitisation.
//!
//! `compiler` turns allow-list rule text into an immutable [`crate::policy::Policy`];
//! `tree` applies a policy to a parsed [`crate::dom::Fragment`].

pub mod compiler;
pub mod tree;
