//! Concrete transports

mod builder;

#[cfg(all(feature = "bitreq", not(target_arch = "wasm32")))]
mod bitreq_backend;
#[cfg(all(feature = "reqwest", not(target_arch = "wasm32")))]
mod reqwest_backend;

#[cfg(all(feature = "bitreq", not(target_arch = "wasm32")))]
pub use bitreq_backend::BitreqTransport;
pub use builder::TransportBuilder;
#[cfg(all(feature = "reqwest", not(target_arch = "wasm32")))]
pub use reqwest_backend::ReqwestTransport;
