//! User interaction front ends

mod cli;

use async_trait::async_trait;

use crate::error::Result;

pub use cli::CliInterface;

#[async_trait]
pub trait Interface: Send + Sync {
    /// Next user message, or `None` once the user ends the session
    async fn input(&self) -> Result<Option<String>>;

    /// Show an agent message to the user
    async fn output(&self, message: &str) -> Result<()>;
}
