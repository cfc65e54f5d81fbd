pub mod api_server;
pub mod broker_client;

pub use api_server::{build_state, serve, start_api_server, start_api_server_background};
pub use broker_client::{BrokerClient, WorkItem};
