//! Merges a tree of protobuf source files into a single schema file.
//!
//! Every file is parsed, and its declarations are written into one output. Files whose package
//! is below the root package are wrapped in one message per remaining package name segment, so
//! the output is a single self-contained file in the root package.
//!
//! Messages may inherit the fields of other messages using an extends option:
//!
//! ```proto
//! message User {
//!     option (oneproto.extends) = "root.Entity";
//!     string name = 2;
//! }
//! ```
//!
//! For merging files in a single function, see [`transpile()`]. For more options see
//! [`Transpiler`].
//!
//! # Examples
//!
//! ```rust
//! # use std::fs;
//! # let tempdir = tempfile::TempDir::new().unwrap();
//! # fs::create_dir(tempdir.path().join("model")).unwrap();
//! fs::write(
//!     tempdir.path().join("entity.proto"),
//!     "package root; message Entity { optional string id = 1; }",
//! ).unwrap();
//! fs::write(
//!     tempdir.path().join("model/user.proto"),
//!     "package root.model;
//!      message User {
//!          option (oneproto.extends) = \"root.Entity\";
//!          optional string name = 2;
//!      }",
//! ).unwrap();
//!
//! let schema = oneproto::Transpiler::new([tempdir.path()], "root")
//!     .template("syntax = \"proto2\";\n\npackage root;\n")
//!     .open_dir(tempdir.path())?
//!     .generate()?;
//!
//! assert_eq!(schema, "\
//! syntax = \"proto2\";
//!
//! package root;
//!
//! message Entity {
//!     string id = 1;
//! }
//!
//! message model {
//!     message User {
//!         string id = 1;
//!         string name = 2;
//!     }
//! }
//! ");
//! # Ok::<(), oneproto::Error>(())
//! ```
//!
//! ### Error messages
//!
//! This crate uses [`miette`](https://crates.io/crates/miette) to add additional details to errors. For nice error messages, add `miette` as a dependency with the `fancy` feature enabled and return a [`miette::Result`](https://docs.rs/miette/latest/miette/type.Result.html) from your build script.
#![warn(missing_debug_implementations, missing_docs)]
#![deny(unsafe_code)]
#![doc(html_root_url = "https://docs.rs/oneproto/0.1.0/")]

pub mod file;
pub mod generate;
pub mod namespace;
pub mod options;

mod error;
mod fmt;
mod resolve;
mod transpile;

pub use {prost, prost_types};

pub use self::error::Error;
pub use self::generate::Generator;
pub use self::resolve::Resolver;
pub use self::transpile::{transpile, Transpiler};
