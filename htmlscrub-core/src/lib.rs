// htmlscrub-core/src/lib.rs
//! # htmlscrub Core Library
//!
//! `htmlscrub-core` provides allow-list sanitisation of rich-text HTML. It
//! compiles a compact rule language (`p[id|class],a[href|target|rel],-strong/b`)
//! into an immutable policy, applies that policy to a parsed fragment, and
//! serialises the result. The library performs no I/O beyond loading
//! configuration files on request.
//!
//! ## Modules
//!
//! * `config`: `SanitiserConfig` sets, loaded from YAML and merged.
//! * `policy`: The compiled allow-list table.
//! * `sanitizers`: The rule compiler and the tree sanitiser.
//! * `dom`: The owned document tree and its serialisation.
//! * `parser`: Builds a tree from markup.
//! * `report`: Records and summarises every change made by a pass.
//! * `validators`: Programmatic checks on attribute values.
//! * `engine`: Defines the `SanitizationEngine` trait.
//! * `engines`: Contains concrete implementations of the `SanitizationEngine` trait.
//! * `headless`: One-shot convenience wrapper.
//! * `errors`: Library error types.
//!
//! ## Usage Example
//!
//! ```rust
//! use htmlscrub_core::{headless_sanitize_string, SanitiserConfig};
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!     let config = SanitiserConfig::from_valid_elements("p,strong");
//!     let input = "<p>Leave Alone</p><div>Strip parent<strong>But keep children</strong> in order</div>";
//!
//!     let output = headless_sanitize_string(config, input, "example")?;
//!     assert_eq!(output, "<p>Leave Alone</p>Strip parent<strong>But keep children</strong> in order");
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Malformed rule text is reported as a [`PolicyFormatError`] naming the
//! offending fragment. Sanitisation itself never fails. Application-level
//! functions return `anyhow::Result` with context attached.
//!
//! ---
//! License: MIT OR APACHE 2.0

pub mod config;
pub mod dom;
pub mod engine;
pub mod engines;
pub mod errors;
pub mod headless;
pub mod parser;
pub mod policy;
pub mod report;
pub mod sanitizers;
pub mod validators;

/// Re-exports the configuration types and loaders.
pub use config::{
    config_candidate_paths, load_config_by_name, merge_configs, ConfigSetNotFoundError,
    SanitiserConfig, DEFAULT_LINK_REL_VALUE,
};

/// Re-exports the error types.
pub use errors::{HtmlScrubError, PolicyFormatError};

/// Re-exports the compiled policy model.
pub use policy::{AttributeKind, AttributeRule, ElementEntry, ElementRule, Policy};

/// Re-exports the document tree and parser.
pub use dom::{Attribute, Element, Fragment, Node};
pub use parser::parse_fragment;

/// Re-exports the engine trait and its HTML implementation.
pub use engine::SanitizationEngine;
pub use engines::html_engine::HtmlEngine;

/// Re-exports change reporting types.
pub use report::{SanitiseAction, SanitiseEvent, SanitiseReport, SanitizationSummaryItem};

pub use headless::headless_sanitize_string;

/// Re-exports the compiler entry points and the tree sanitiser.
pub use sanitizers::compiler::{compile, get_or_compile_policy};
pub use sanitizers::tree::{ConditionalRule, TreeSanitiser};
