pub mod auth;
pub mod certificate;
pub mod menu;
pub mod routes;
pub mod utils;
