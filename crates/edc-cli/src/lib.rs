//! Shared infrastructure for the EDC command-line front end.

pub mod logging;
