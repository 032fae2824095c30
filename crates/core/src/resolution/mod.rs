//! Single-entity resolution: fast cache, durable store, then live acquisition.
//!
//! ```text
//! resolve(identifier, tier)
//!   ├─ cache hit ─────────────────────────────> record / NotFound
//!   ├─ store hit ──> promote to cache ────────> record
//!   └─ miss ──> join or start in-flight acquisition
//!                  owner: tier bucket ─> ProviderRegistry::acquire
//!                         ├─ Ok        ─> store + cache (positive TTL)
//!                         ├─ NotFound  ─> cache marker (negative TTL)
//!                         └─ other     ─> nothing cached
//!                  every waiter receives the owner's outcome
//! ```

mod pipeline;


pub use pipeline::ResolutionPipeline;
