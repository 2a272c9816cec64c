//! Filter compiler for grove.
//!
//! Turns the flat, operator-suffixed where input callers send into the
//! structured [`Where`](grove_storage::Where) tree storage drivers consume.
//!
//! ```text
//! { name: "a", price_gt: 5, notes__score_lte: 10 }
//!   -> { name: {eq: "a"}, price: {gt: 5}, notes.score: {lte: 10} }
//! ```
//!
//! Relation fields compile against their target model and carry the join
//! layout with them. A field path takes at most one predicate; ranges use
//! `_between`.

mod compiler;
mod error;
mod key;

pub use compiler::{compile_unique_where, compile_where, FilterCompiler};
pub use error::{FilterError, FilterResult};
pub use key::{parse_key, ParsedKey};
