// Adapters layer: concrete implementations for external systems (processes, http).

pub mod http;
pub mod process;

pub use http::{router, serve};
pub use process::ProcessRunner;
