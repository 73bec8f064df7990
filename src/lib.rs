//! # `sfrpc`
//!
//! `sfrpc` serves warehouse external functions over HTTP. The warehouse POSTs a
//! single row of arguments to `/rpc` and, when the function needs more time,
//! polls the same endpoint with GET requests carrying the query id it used to
//! start the call.
//!
//! ## Example
//!
//! ```rust
//! use sfrpc::server::ServerState;
//! use sfrpc::work::{EchoTask, Task};
//!
//! let state = ServerState::default();
//! state.functions.register("ECHO", "(ARG VARCHAR)", |headers, _args| {
//!     Box::new(EchoTask::new(headers.clone())) as Box<dyn Task>
//! });
//!
//! assert!(state.functions.lookup("ECHO", "(ARG VARCHAR)").is_some());
//! ```
//!
//! ## Features
//!
//! - Routing by function name and signature
//! - Query id correlation between the starting POST and polling GETs
//! - Optional expiry of abandoned tasks

pub mod error;
pub mod server;
pub mod work;

pub use error::{Error, Result};
