//! Condenser system: gun plus the pre-sample optical chain

use super::beam::Beam;
use super::chain::OpticalChain;
use super::gun::Gun;
use super::OpticalComponent;

/// Gun and the ordered components between it and the specimen
#[derive(Debug, Clone)]
pub struct Illumination {
    pub gun: Gun,
    pub chain: OpticalChain,
}

impl Illumination {
    pub fn new(gun: Gun, chain: OpticalChain) -> Self {
        Self { gun, chain }
    }

    /// Beam footprint in the specimen plane
    ///
    /// Starts from the gun's seed beam and folds it through the chain. Not
    /// cached: deflector settings may change between calls.
    pub fn get_beam_on_stage(&self) -> Beam {
        self.chain.propagate_beam(&self.gun.get_beam())
    }
}
