pub mod shutdown;
pub mod startup;

pub use shutdown::wait_for_signal;
pub use startup::{StartupContext, prepare_server_startup};
