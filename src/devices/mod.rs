//! Device implementations behind the driver traits

pub mod sim;
