pub mod assignment;
pub mod booking;
pub mod earnings;
pub mod host;
pub mod settings;
