//! Sampling and pairing policy definitions.

pub mod sampling;
pub mod pairing;

pub use sampling::SamplingPolicy;
pub use pairing::PairingPolicy;
