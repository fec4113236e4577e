//! Semantic element queries over captured page snapshots.
//!
//! A selector such as `role=button text~'Sign in'` is parsed once into a
//! [`Query`] and evaluated against any number of [`Snapshot`]s. Matches are
//! returned as [`ElementId`]s ranked by importance; callers resolve them back
//! to records with [`Snapshot::element`].
//!
//! - [`selector`]: DSL and structured selector parsing
//! - [`schema`]: the closed set of queryable fields
//! - [`resolve`]: field resolution with tier masking
//! - [`evaluate`]: per-term operator semantics
//! - [`engine`]: filtering, ranking, best match
//! - [`diff`]: change detection between snapshots
//!
//! # Examples
//!
//! ```rust
//! use sentience_query::{select, select_one, Element, ElementId, Snapshot, Tier};
//!
//! let snap = Snapshot::new(
//!     vec![
//!         Element::new(1, "button").with_text("Sign Up").with_importance(400.0),
//!         Element::new(2, "button").with_text("Sign In").with_importance(900.0),
//!     ],
//!     Tier::Elevated,
//! );
//!
//! assert_eq!(select(&snap, "text~'sign'").unwrap(), vec![ElementId(2), ElementId(1)]);
//! assert_eq!(select_one(&snap, "role!=button").unwrap(), None);
//! ```

pub mod diff;
pub mod engine;
pub mod error;
pub mod evaluate;
pub mod resolve;
pub mod schema;
pub mod selector;
pub mod snapshot;

pub use diff::{DiffStatus, ElementDiff, SnapshotDiff};
pub use engine::{find, query, query_elements, select, select_one};
pub use error::ParseError;
pub use resolve::{masked_element, Resolved, Value};
pub use selector::{split_terms, Literal, Operator, Query, Selector, Term};
pub use snapshot::{BBox, Element, ElementId, Snapshot, Tier, Viewport, VisualCues};
