//! # Folio Markup
//!
//! Rich-content node model and the serialized markup form that Folio uses
//! as its persistence contract.
//!
//! ```text
//! "<p>Hello <b>world</b></p>"  ──parse──▶  [Node(p) → [Text, Node(b) → [Text]]]
//!            ▲                                         │
//!            └──────────────serialize──────────────────┘
//! ```
//!
//! Parsing is lenient (browser-like): it never fails. Canonical markup (as
//! produced by [`serialize`]) round-trips exactly.

pub mod ast;
pub mod entities;
pub mod error;
pub mod id_generator;
pub mod parser;
pub mod serializer;
pub mod tokenizer;

pub use ast::{is_void_tag, Attribute, Element, Node, NodeId, NodeKind, TagCategory};
pub use error::{ParseError, ParseResult};
pub use id_generator::IdGenerator;
pub use parser::{parse, parse_strict, parse_with_ids, Parser};
pub use serializer::{serialize, serialize_node, Serializer};
pub use tokenizer::{tokenize, Token};
