pub mod energy;
pub mod weather;
