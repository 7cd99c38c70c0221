pub mod structs;
pub mod timestamp;
