//! `dswift_core` is the engine behind [dswift](https://github.com/dswift-rs/dswift), a template preprocessor that turns `.dswift` templates into Swift source files. Rather than interpreting a template, the engine compiles it into a small Swift program whose output is the generated file.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Template file
//!   -> Tag expansion (include / reference tags replaced, recursively for included files)
//!   -> Block scanner (text, basic, inline, class-scoped and global-scoped blocks)
//!   -> Compiler (blocks sorted into generator body, class section and global section)
//!   -> Generator program (built and run by a ProgramRunner)
//!   -> Generated Swift file
//! ```
//!
//! ## Template Syntax
//!
//! | Block | Meaning |
//! | --- | --- |
//! | `<% code %>` | statements run while generating |
//! | `<%= expression %>` | the interpolated value is written to the output |
//! | `<%! declarations %>` | members of the generator class |
//! | `<%!! declarations %>` | top-level declarations of the generator program |
//! | `<%@include file="a.dswift" %>` | tags, expanded before compilation |
//!
//! Tags are only available to templates whose first line is a tools version
//! header such as `// dswift-tools-version: 2.0.0`.
//!
//! ## Key Types
//!
//! - [`BlockScanner`]: Walks a template and yields [`ParsedBlock`]s.
//! - [`TagExpander`]: Expands include and reference tags into [`ProcessedTags`].
//! - [`GeneratorProgram`]: The compiled Swift program and its package dependencies.
//! - [`ProjectContext`]: Project root, `dswift.toml` configuration and declared encodings.
//! - [`Services`]: Caches and the class name allocator shared across generations.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use dswift_core::ProjectContext;
//! use dswift_core::Services;
//! use dswift_core::compile_template;
//!
//! let project = ProjectContext::load(".").unwrap();
//! let services = Services::new();
//! let compiled = compile_template(Path::new("Sources/Model.dswift"), &project, &services).unwrap();
//! println!("{}", compiled.program.source);
//! ```

pub use attributes::*;
pub use cache::*;
pub use compiler::*;
pub use config::*;
pub use edits::*;
pub use encoding::*;
pub use error::*;
pub use expansion::*;
pub use generate::*;
pub use grammar::*;
pub use project::*;
pub use scanner::*;
pub use session::*;
pub use tags::*;
pub use version::*;

pub mod attributes;
mod cache;
mod compiler;
pub mod config;
mod edits;
pub mod encoding;
#[allow(unused_assignments)]
mod error;
mod expansion;
mod generate;
mod grammar;
pub mod project;
pub mod scanner;
mod session;
pub mod tags;
mod version;

#[cfg(test)]
mod __fixtures;
