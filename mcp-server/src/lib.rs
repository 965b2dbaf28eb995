// JSON-RPC tool surface over the baloto pick controller
pub mod mcp_handler;
pub mod use_cases;

pub use mcp_handler::*;
pub use use_cases::*;
