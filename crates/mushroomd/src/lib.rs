//! mushroomd - HTTP front of the Mushroom AI runtime
//!
//! ## Modules
//!
//! - `cli`: command-line definitions (`serve`, `provision`, `chat`)
//! - `http`: the axum router for `/api/chat/*`
//! - `client`: reqwest client and the interactive prompt loop

pub mod cli;
pub mod client;
pub mod http;

pub use client::{prompt_loop, ChatClient, ChatReply};
pub use http::{router, serve, GenerateRequest};
