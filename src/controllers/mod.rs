pub mod energy_controller;
pub mod weather_controller;
