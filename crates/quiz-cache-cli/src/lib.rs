//! Command-line front end for the quiz document cache.

pub mod commands;
