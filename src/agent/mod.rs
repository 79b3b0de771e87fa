pub mod agent;
pub mod agent_config;
pub mod sources;
