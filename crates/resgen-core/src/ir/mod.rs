pub mod context;
pub mod optimize;
pub mod parser;
pub mod types;

pub use context::{NamedSchema, SchemaContext};
pub use optimize::{inline_simple_refs, optimize};
pub use parser::{parse_schema, MAX_DEPTH};
pub use types::{IrLiteral, IrProperty, IrType};
