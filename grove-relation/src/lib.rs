//! Relation engine for grove.
//!
//! A [`RelationEngine`] is built once per schema relation and picks its
//! storage layout from the relation's kind:
//!
//! - [`OneToOne`]: the owning side holds the other side's id.
//! - [`OneToMany`]: every record of the many side holds the id of its one.
//! - [`ManyToMany`]: both sides hold arrays of opposite ids.
//!
//! [`relation_hooks`] turns an engine into hook contributions that apply
//! nested `create`/`connect`/`disconnect`/`delete` payloads and resolve the
//! relation fields on read.

mod engine;
mod hooks;
mod keyed;
mod many_to_many;
mod one_to_many;
mod one_to_one;
mod payload;
mod store;

pub use engine::RelationEngine;
pub use hooks::relation_hooks;
pub use many_to_many::ManyToMany;
pub use one_to_many::OneToMany;
pub use one_to_one::OneToOne;
pub use payload::{parse_to_many, parse_to_one, ToMany, ToOne};
pub use store::SideStore;
