pub mod assignment_repository;
pub mod booking_repository;
pub mod host_repository;
pub mod settings_repository;
