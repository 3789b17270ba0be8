pub mod envelope;

pub use envelope::{CommandEnvelope, CommandEnvelopeError, CommandFailure, ENVELOPE_SCHEMA_VERSION};
