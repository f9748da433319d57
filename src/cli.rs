//! CLI domain: parse and route only.
//! No session logic; the route table dispatches to the replay and config services.

mod parse;
mod route;

pub use parse::{Cli, Commands};
pub use route::RunContext;
