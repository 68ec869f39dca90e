// htmlscrub/src/lib.rs
//! # htmlscrub CLI Application
//!
//! This crate provides the command-line interface for the htmlscrub
//! allow-list sanitiser. The sanitisation itself lives in `htmlscrub-core`;
//! this crate handles argument parsing, configuration resolution, input and
//! output, and terminal presentation.

pub mod cli;
pub mod commands;
pub mod logger;
pub mod ui;
pub mod utils;
