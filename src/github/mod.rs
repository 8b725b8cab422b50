//! GitHub page fetchers
//!
//! `PageFetcher` implementations for the two GitHub APIs:
//!
//! - `GraphQlFetcher` - Relay connections (`nodes`/`edges` + `pageInfo`),
//!   forward (`endCursor`/`hasNextPage`) or backward
//!   (`startCursor`/`hasPreviousPage`), or single-shot queries read as one
//!   page
//! - `RestFetcher` - listings paginated by the `Link` header
//!
//! Both own transport, auth, JSON decoding and response mapping; the
//! pagination core only sees `Page`s and errors.

pub mod extract;
mod graphql;
mod rest;

pub use graphql::{
    parse_connection_page, parse_single_page, ConnectionQuery, GraphQlFetcher, RecordShape, CURSOR_VAR,
    PAGE_SIZE_VAR,
};
pub use rest::{parse_link_header, RestFetcher, RestListing};

#[cfg(test)]
mod tests;
