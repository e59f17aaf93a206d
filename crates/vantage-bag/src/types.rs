//! Typed payloads the orchestrator seeds into the bag at init (spec §4.E
//! "bag seeding"). Kept here, rather than in the orchestrator crate, so that
//! [`crate::SharedBag`] can expose genuine typed accessors for them.

use serde::{Deserialize, Serialize};

/// One portfolio snapshot, seeded into the bag before an engine runs. A real
/// deployment loads this from whatever store holds account data; the shape
/// is left as an opaque JSON document since this crate doesn't model
/// positions itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio(pub serde_json::Value);

/// One investor's risk tolerance and preferences, seeded alongside the
/// portfolio it pairs with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestorProfile(pub serde_json::Value);
