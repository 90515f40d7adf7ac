//! Depot integration test harness.
//!
//! Each test starts an in-process daemon on 127.0.0.1:0 with its own
//! scratch file repository and talks to it over real TCP sockets, so the
//! full accept → slot → command-loop → transfer path is exercised.
//!
//! Tests are independent: every one owns its server, its directories, and
//! every connection it opens.

mod commands;
mod infra;
mod sessions;
mod transfer;

pub use infra::*;
