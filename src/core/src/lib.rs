pub mod configuration;
pub use configuration::*;

pub mod controller;
pub use controller::*;

pub mod error_handling;

pub mod recording;

pub mod token;

pub mod web_interface;
