mod state;

pub use state::GatewayState;
