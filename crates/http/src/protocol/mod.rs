//! Core request types shared by the parser and its consumers.
//!
//! # Architecture
//!
//! - **Start line** ([`Method`], [`HttpVersion`]): the closed method set and the two
//!   supported protocol versions
//! - **Headers** ([`header`]): [`HeaderCollection`], the normalized multi-map, plus
//!   the character-set predicates the parser validates against
//! - **Requests** ([`request`]): [`RequestHead`] and [`Request`]
//! - **Body** ([`body`]): [`RequestBody`], the handle on the rest of the stream
//! - **Errors** ([`error`]): [`ParseError`] for the head, [`BodyError`] for the body

mod method;
pub use method::Method;

mod version;
pub use version::HttpVersion;

pub mod header;
pub use header::HeaderCollection;

mod request;
pub use request::Request;
pub use request::RequestHead;

mod body;
pub use body::RequestBody;

mod error;
pub use error::BodyError;
pub use error::ParseError;
pub use error::ParseErrorKind;
