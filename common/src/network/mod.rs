pub mod broadcast;
pub mod interface;
pub mod target;
