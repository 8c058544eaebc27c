/// Tower middleware module
///
/// Layers wrapped around the router, outermost first:
/// compression, request timeout, authentication gate.
pub mod hyper_to_tower_adapter;
pub mod tower_auth_gate;
pub mod tower_timeout_handler;

pub use hyper_to_tower_adapter::HyperToTowerAdapter;
pub use tower_auth_gate::{AuthGateLayer, AuthGateService, HOSTNAME_HEADER};
pub use tower_timeout_handler::{TimeoutLayer, TimeoutService};
