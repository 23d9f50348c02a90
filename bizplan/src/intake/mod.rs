//! The intake model: schema, values, records and the session builder.

mod builder;
mod record;
mod schema;
mod value;

pub use builder::IntakeBuilder;
pub use record::{IntakeRecord, IntakeSnapshot};
pub use schema::{FieldKind, FieldSpec, IntakeSchema, Section};
pub use value::IntakeValue;
