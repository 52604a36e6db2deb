//! HTTP implementation of the `trekdesk-core` API seams over the booking backend's REST
//! interface.

pub mod client;
pub mod response;

pub use client::{ApiClient, ClientError, CORRELATION_HEADER};
