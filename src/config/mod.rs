//! Configuration Management
//!
//! Unified configuration system with hierarchical resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/ai-router/config.toml)
//! 3. Project config (./ai-router.toml)
//! 4. Environment variables (AI_ROUTER_*)
//! 5. Vendor key variables (OPENAI_API_KEY, ANTHROPIC_API_KEY, GEMINI_API_KEY)

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::*;
