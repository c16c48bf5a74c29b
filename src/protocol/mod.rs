//! KV/1.0 Protocol Implementation
//!
//! KV/1.0 is a line-oriented text protocol: one UTF-8 request line in,
//! one status line out.
//!
//! ## Modules
//!
//! - `types`: Status codes and the `Response` line
//! - `parser`: Request line tokenizer and version negotiation
//!
//! ## Example
//!
//! ```
//! use kvss::protocol::{parse_request, Response, Verb};
//!
//! let command = parse_request(b"KV/1.0 GET user42").unwrap();
//! assert_eq!(command.verb(), &Verb::Get);
//!
//! let response = Response::not_found();
//! assert_eq!(&response.serialize()[..], b"404 NOT_FOUND\n");
//! ```

pub mod parser;
pub mod types;

pub use parser::{
    parse_request, Command, ParseError, ParseResult, Verb, PROTOCOL_TAG, PROTOCOL_VERSION,
};
pub use types::{Response, StatusCode};
