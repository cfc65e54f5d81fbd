pub mod agents;
pub mod fleet;
pub mod logs;
pub mod movement;
pub mod requests;
pub mod system;

pub use agents::*;
pub use fleet::*;
pub use logs::*;
pub use movement::*;
pub use requests::*;
pub use system::*;
