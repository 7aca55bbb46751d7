pub mod attestation;
pub mod authenticator_data;
pub mod types;

mod authenticate;
mod register;

pub use authenticate::authenticate;
pub use register::register;
