//! HTTP surface and transport subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (hyper HTTP/1, body collection)
//!     → request.rs / form.rs (request surface, form store)
//!     → [registry picks the service; service runs the lifecycle]
//!     → response.rs (buffered writer → transport response)
//!     → Send to client
//! ```

pub mod form;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use form::FormValues;
pub use request::Request;
pub use response::ResponseWriter;
