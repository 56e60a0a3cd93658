//! Ordered optical column section with handle-based access
//!
//! An [`OpticalChain`] owns its lenses, deflectors and apertures in typed
//! arenas and records the order in which a beam traverses them. Handles
//! returned on insertion give the instrument facade direct access to the same
//! live components the chain propagates through.

use std::ops::{Index, IndexMut};

use super::aperture::Aperture;
use super::beam::Beam;
use super::deflector::Deflector;
use super::lens::Lens;
use super::OpticalComponent;

/// Handle to a lens owned by an [`OpticalChain`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LensId(usize);

/// Handle to a deflector owned by an [`OpticalChain`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeflectorId(usize);

/// Handle to an aperture owned by an [`OpticalChain`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ApertureId(usize);

/// One position in the propagation order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Lens(LensId),
    Deflector(DeflectorId),
    Aperture(ApertureId),
}

#[derive(Debug, Clone, Default)]
pub struct OpticalChain {
    lenses: Vec<Lens>,
    deflectors: Vec<Deflector>,
    apertures: Vec<Aperture>,
    order: Vec<Slot>,
}

impl OpticalChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a lens to the end of the chain
    pub fn push_lens(&mut self, lens: Lens) -> LensId {
        let id = LensId(self.lenses.len());
        self.lenses.push(lens);
        self.order.push(Slot::Lens(id));
        id
    }

    /// Append a deflector to the end of the chain
    pub fn push_deflector(&mut self, deflector: Deflector) -> DeflectorId {
        let id = DeflectorId(self.deflectors.len());
        self.deflectors.push(deflector);
        self.order.push(Slot::Deflector(id));
        id
    }

    /// Append an aperture to the end of the chain
    pub fn push_aperture(&mut self, aperture: Aperture) -> ApertureId {
        let id = ApertureId(self.apertures.len());
        self.apertures.push(aperture);
        self.order.push(Slot::Aperture(id));
        id
    }

    /// Number of components in propagation order
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn component(&self, slot: Slot) -> &dyn OpticalComponent {
        match slot {
            Slot::Lens(id) => &self[id],
            Slot::Deflector(id) => &self[id],
            Slot::Aperture(id) => &self[id],
        }
    }

    /// Components in the order a beam traverses them
    pub fn components(&self) -> impl Iterator<Item = &dyn OpticalComponent> + '_ {
        self.order.iter().map(move |&slot| self.component(slot))
    }
}

impl OpticalComponent for OpticalChain {
    /// Fold the beam through every component, left to right
    fn propagate_beam(&self, beam: &Beam) -> Beam {
        self.components()
            .fold(beam.copy(), |beam, component| component.propagate_beam(&beam))
    }
}

impl Index<LensId> for OpticalChain {
    type Output = Lens;

    fn index(&self, id: LensId) -> &Lens {
        &self.lenses[id.0]
    }
}

impl IndexMut<LensId> for OpticalChain {
    fn index_mut(&mut self, id: LensId) -> &mut Lens {
        &mut self.lenses[id.0]
    }
}

impl Index<DeflectorId> for OpticalChain {
    type Output = Deflector;

    fn index(&self, id: DeflectorId) -> &Deflector {
        &self.deflectors[id.0]
    }
}

impl IndexMut<DeflectorId> for OpticalChain {
    fn index_mut(&mut self, id: DeflectorId) -> &mut Deflector {
        &mut self.deflectors[id.0]
    }
}

impl Index<ApertureId> for OpticalChain {
    type Output = Aperture;

    fn index(&self, id: ApertureId) -> &Aperture {
        &self.apertures[id.0]
    }
}

impl IndexMut<ApertureId> for OpticalChain {
    fn index_mut(&mut self, id: ApertureId) -> &mut Aperture {
        &mut self.apertures[id.0]
    }
}
