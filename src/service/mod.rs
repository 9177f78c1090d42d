pub mod credential;
pub mod gateway;
pub mod transport;
