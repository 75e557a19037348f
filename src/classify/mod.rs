// Classification capabilities — trait-based abstractions for the
// content-risk classifiers, translator, and language detector.
//
// The traits define the contracts; the hf module implements them
// against a hosted inference API, and normalize turns whatever raw
// shape a provider returns into the canonical result schema.

pub mod hf;
pub mod normalize;
pub mod traits;
