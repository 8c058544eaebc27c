//! Wire types and configuration shared by the certificate back-office
//! server and its tests.

pub mod config;
pub mod types;
