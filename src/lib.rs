pub mod client;
pub mod dict;
pub mod encode;
pub mod error;
pub mod grammar;
pub mod response;
pub mod session;

pub use client::{Response, Tl1Client};
pub use encode::Params;
pub use error::ParseError;
pub use response::{CompletionCode, Header, OperationResult, QueryResult, Row, Terminator};
pub use session::{Session, SessionError};
