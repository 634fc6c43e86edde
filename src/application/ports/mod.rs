//! Ports - Boundaries between the application and the outside world

pub mod outbound;
