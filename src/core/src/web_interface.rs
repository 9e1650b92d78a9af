//! HTTP interface
//!
//! - `routes`: warp filters for the token and recording endpoints.
//! - `web_server`: binds the combined filter and serves it.
//! - `types`: shared response and query payloads.

pub mod routes;
pub mod types;
pub mod web_server;

pub use routes::all_routes;
pub use web_server::WebServer;
