//! Error types and result definitions for the rowmap crates.
//!
//! Every fallible operation in the workspace returns [`Result<T>`], whose error
//! variant is the single [`Error`] enum defined here. Value conversion failures
//! raised while filling a receiver slot keep their own small type in
//! `rowmap-types` and are folded into [`Error::FieldAssign`] once the engine
//! knows which column and field they belong to.
//!
//! # Error Categories
//!
//! - **Shape errors** ([`Error::NotARecordType`], [`Error::DestinationNotAddressable`]):
//!   the destination cannot receive a row.
//! - **Column errors** ([`Error::NoColumns`], [`Error::UnknownColumn`],
//!   [`Error::InvalidNotationSyntax`]): the column list does not line up with
//!   the destination.
//! - **Value errors** ([`Error::FieldAssign`]): the row source rejected a value
//!   for a specific column.
//! - **Source errors** ([`Error::RowSource`], [`Error::NoRows`], [`Error::Arrow`]):
//!   failures owned by the underlying cursor.

pub mod error;
pub mod result;

pub use error::{BoxError, Error};
pub use result::Result;
