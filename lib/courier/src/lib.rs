//! Declarative HTTP API invoker.
//!
//! Register typed call descriptors once, then invoke them by name with
//! positional arguments. The pipeline resolves templated URLs from
//! configuration sources, negotiates the body encoding, dispatches with
//! per-call retry policies, and unwraps `{code, message, data}` response
//! envelopes.
//!
//! # Example
//!
//! ```no_run
//! use courier::{ApiGroup, Args, CallDescriptor, Invoker, Method, StaticResolver, ResolverChain};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! pub struct City {
//!     id: u64,
//!     name: String,
//! }
//!
//! # async fn run() -> courier::Result<()> {
//! let group = ApiGroup::new("city-api")
//!     .prefix("${api.host}/city")
//!     .call(CallDescriptor::new("get_by_id", Method::Get, "/getById/{id}").param("id"));
//!
//! let invoker = Invoker::new(group).resolver(
//!     ResolverChain::new().with(StaticResolver::default().with("api.host", "http://localhost:8080")),
//! );
//! let city: City = invoker.invoke("get_by_id", Args::new().value(42)).await?;
//! # Ok(())
//! # }
//! ```

mod builder;
mod client;
mod config;
mod encode;
mod hooks;
mod invoker;
mod retry;
mod transport;

// Re-export pipeline types
pub use client::HyperTransport;
pub use config::{TransportConfig, TransportConfigBuilder};
pub use hooks::{RequestHook, ResponseHook};
pub use invoker::{Factory, Invoker};
pub use transport::Transport;

// Re-export core types
pub use courier_core::{
    envelope, from_json, template, to_form, to_json, to_query_string, ApiGroup, ArgValue, Args,
    Body, CallDescriptor, ContentType, EnvResolver, EnvelopeConfig, EnvelopeMode, Error, Form,
    Method, ParamBinding, Part, PropertyResolver, Request, ResolverChain, Response, Result,
    RetryOn, RetryPolicy, StaticResolver, StatusRange, StrMap, WireRequest,
};

// Re-export http types for status codes and headers
pub use courier_core::{header, StatusCode};
