pub mod logger;

pub use logger::{Timer, init_logger};
