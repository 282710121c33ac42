mod config;
mod floating;
mod state;
mod window;

pub use config::*;
pub use floating::*;
pub use state::*;
pub use window::*;
