//! Stock middleware built from ordinary handlers.

mod json;

pub use json::json_response_writer;
