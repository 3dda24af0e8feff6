mod window_host;

pub use window_host::{WindowConfig, WindowHost};
