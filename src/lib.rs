pub mod api;
pub mod config;
pub mod error;
pub mod logger;
pub mod model;
pub mod service;
pub mod time;
pub mod timeline;

pub trait Located {
    fn location(&self) -> snafu::Location;
}
