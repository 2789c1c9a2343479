pub mod config;
pub mod events;
pub mod form;
pub mod model;
pub mod status;
