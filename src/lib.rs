//! Client instrumentation agent: assigns position-independent stable ids to
//! elements and delivers interaction events to a remote collector in
//! batches.
//!
//! The two load-bearing pieces are the identity engine ([`signature`] +
//! [`identity`]) and the batching pipeline ([`event`] + [`pipeline`]); the
//! [`agent`] module wires them into a start/stop lifecycle the host drives.

pub mod agent;
pub mod cli;
pub mod event;
pub mod identity;
pub mod pipeline;
pub mod signature;

pub use agent::agent::{Agent, AgentState};
pub use agent::agent_config::AgentConfig;
pub use agent::sources::DomEvent;
pub use event::enrich::PageContext;
