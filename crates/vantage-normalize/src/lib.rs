//! Normalization envelopes, the normalizer registry, and the wire-min codec.
//! Part of the tool decorator stack (spec §4.B.4, §4.B.5), split into its own
//! crate because it has no dependency on the `Tool` trait and is
//! independently testable (see `SPEC_FULL.md` §0).

pub mod envelope;
pub mod normalizer;
pub mod normalizers;
pub mod wiremin;

pub use envelope::{EnvelopeKind, EnvelopePayload, NormalizationEnvelope};
pub use normalizer::{NormalizeStatus, Normalizer, NormalizerRegistry};
pub use wiremin::WireMinPayload;
