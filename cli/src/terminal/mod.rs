pub mod colors;
pub mod logging;
pub mod network_fmt;
pub mod print;
pub mod progress;
pub mod prompt;
