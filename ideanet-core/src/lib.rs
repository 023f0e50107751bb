//! IdeaNet core - pure accountability-contract logic
//!
//! Two stateless, single-call computations shared by the gateway:
//!
//! - **Settlement**: converts (required count, completed count, stake)
//!   into a transfer amount and a pass/fail verdict.
//! - **Similarity**: ranks pairwise token overlap between idea texts,
//!   used when the remote scorer is unavailable or silent.
//!
//! Both are synchronous and side-effect free; they may be called
//! concurrently without coordination. Serializing the balance mutation
//! that follows a settlement is the caller's responsibility.

pub mod settlement;
pub mod similarity;

pub use settlement::{compute_transfer, round2, Settlement};
pub use similarity::{estimate_similarities, SimilarityPair};
