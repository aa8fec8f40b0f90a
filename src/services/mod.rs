pub mod ai;
pub mod photos;
pub mod weather;
