//! Data module: attribute vectors and the schema that describes them
#![warn(missing_docs)]

pub mod data_type;
pub mod metadata;
pub mod value;

pub use data_type::DataType;
pub use metadata::{AttributeSchema, ModelMetadata, SimpleSchema};
pub use value::Data;
