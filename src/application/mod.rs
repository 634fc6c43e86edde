//! Application layer - Use cases orchestrated over the domain and the ports

pub mod dto;
pub mod ports;
pub mod services;
