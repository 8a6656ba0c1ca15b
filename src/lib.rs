pub mod agent;
pub mod config;
pub mod error;
pub mod failure;
pub mod precision;
pub mod rpc;
pub mod server;
pub mod tools;

pub use agent::{create_test_agent, AgentConfig, PartialAgentConfig, SomniaAgent};
pub use config::Config;
pub use error::{Result, SomniaError};
pub use rpc::{ChainBackend, KeySlot, RpcClient};
pub use server::McpServer;
