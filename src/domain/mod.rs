pub mod agent;
pub mod fleet;
pub mod request;
pub mod telemetry;

pub use agent::*;
pub use fleet::*;
pub use request::*;
pub use telemetry::*;
