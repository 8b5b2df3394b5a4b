//! Prelude module for convenient imports.
//!
//! ```ignore
//! use sprig::prelude::*;
//! ```

pub use crate::{
    ClientConfig, Decoder, Error, ErrorKind, HttpClient, HyperClient, KeyDecoding, Method,
    PinningPolicy, QueryItem, Request, Response, Result, Service, ServiceConfig, service,
};
pub use serde::{Deserialize, Serialize};
