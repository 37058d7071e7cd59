//! Core types for the courier declarative HTTP invoker.
//!
//! This crate provides the foundational types used by courier:
//! - [`ApiGroup`] and [`CallDescriptor`] - Static call registration
//! - [`Args`] and [`ArgValue`] - Invocation arguments
//! - [`Request`], [`WireRequest`], and [`Response`] - HTTP value types
//! - [`Method`] - HTTP method enum
//! - [`RetryPolicy`] - Retry classification and budgets
//! - [`EnvelopeConfig`] - `{code, message, data}` unwrapping
//! - [`PropertyResolver`] - Configuration placeholder sources
//! - [`Error`] and [`Result`] - Error handling
//!
//! URL templating lives in [`template`], body encoding helpers in the
//! crate root (`to_json`, `to_form`, `to_query_string`), and multipart
//! forms in [`Form`]/[`Part`].

mod body;
mod descriptor;
pub mod envelope;
mod error;
mod method;
mod multipart;
mod properties;
mod request;
mod response;
mod retry;
mod strmap;
pub mod template;

pub use body::{
    from_json, query_pairs, to_form, to_json, to_query_string, value_to_string, ContentType,
};
pub use descriptor::{
    ApiGroup, ArgValue, Args, CallDescriptor, EnvelopeMode, ParamBinding, DEFAULT_TIMEOUT,
};
pub use envelope::EnvelopeConfig;
pub use error::{Error, Result};
pub use method::Method;
pub use multipart::{Form, Part};
pub use properties::{EnvResolver, PropertyResolver, ResolverChain, StaticResolver};
pub use request::{Body, Request, WireRequest};
pub use response::Response;
pub use retry::{RetryOn, RetryPolicy, StatusRange};
pub use strmap::StrMap;

// Re-export http crate types for status codes and headers
pub use http::{header, StatusCode};
