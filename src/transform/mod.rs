//! Record transformation
//!
//! Turns one source document at a time into a normalized output record and
//! feeds the columns it implies into the run's [`SchemaAccumulator`].
//!
//! [`SchemaAccumulator`]: crate::schema::SchemaAccumulator

mod transformer;

pub use transformer::{
    RecordTransformer, TransformedRecord, TransformerConfig, DEFAULT_BOOKKEEPING_KEYS,
    DEFAULT_ID_FIELD,
};

#[cfg(test)]
mod tests;
