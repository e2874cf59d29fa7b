//! edgekit - Interactive scaffolding for queue-backed edge workers
//!
//! Detects an existing worker project (wrangler.jsonc/json/toml) or scaffolds
//! a new one, then wires in a selected primitive: prompts for names, patches
//! the configuration file in its own format without disturbing comments or
//! formatting, generates source files, and optionally deploys.

pub mod config;
pub mod context;
pub mod flow;
pub mod patcher;
pub mod primitives;
pub mod prompt;
pub mod registry;
pub mod templates;
pub mod tools;
pub mod util;
