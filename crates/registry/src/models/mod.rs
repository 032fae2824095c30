//! Registry data models
//!
//! This module contains the core data types for entity resolution:
//! - `country` - Supported registry jurisdictions (Country)
//! - `identifier` - Parsed, immutable entity identity (Identifier, IdentifierKind)
//! - `record` - The provider-agnostic normalized record (CanonicalRecord and parts)

mod country;
mod identifier;
mod record;

pub use country::Country;
pub use identifier::{Identifier, IdentifierKind};
pub use record::{
    Address, Associate, AssociateRole, CanonicalRecord, EntityStatus, Money, Party, TaxFlags,
};
