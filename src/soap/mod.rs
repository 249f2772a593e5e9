//! Legacy SOAP/XML backend: request building, transport, response
//! normalization, and the facade tying them together.

mod facade;
pub(crate) mod request;
pub(crate) mod response;
mod transport;

pub use facade::SoapFacade;
