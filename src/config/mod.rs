//! Layered configuration resolution.
//!
//! This module owns the directive storage and the precedence algorithm that
//! maps a client-supplied login name to an effective user and scope. Parsing
//! configuration files into a [`scope::ServerScope`] is out of scope for this
//! crate; callers are expected to populate the tree from whatever directive
//! source they already have.

pub mod directives;
pub mod resolver;
pub mod scope;

pub use directives::DirectiveTable;
pub use resolver::{EffectiveScope, GroupMembership, ResolvedLogin};
pub use scope::{AliasDirective, AnonymousGroupRule, AnonymousScope, PasswordDirective, ServerScope};
