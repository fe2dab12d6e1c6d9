//! Tokenizer, grammar engine and compiler for the `.idea` schema language.
//!
//! ```
//! let config = idea_core::parse(r#"enum Status { ACTIVE "Active" }"#).unwrap();
//! assert_eq!(config.enums["Status"]["ACTIVE"], "Active");
//! ```

pub mod api;
pub mod ast;
pub mod compiler;
pub mod error;
mod grammar;
pub mod imports;
pub mod lexer;
pub mod merge;
pub mod parser;
pub mod resolver;
pub mod serialization;
pub mod utils;

pub use api::{
    analyze, analyze_with_imports, final_with_imports, parse, parse_final, parse_with_imports,
    Analysis,
};
pub use error::IdeaError;
pub use imports::ImportSources;
pub use serialization::{FinalSchemaConfig, SchemaConfig};
