//! REST/JSON backend: request building, transport, bearer-token issuance,
//! response normalization, and the facade tying them together.

mod facade;
pub(crate) mod request;
pub(crate) mod response;
mod token;
mod transport;

pub use facade::RestFacade;
