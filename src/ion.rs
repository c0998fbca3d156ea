//! The closed set of ions and elements tracked by the solver.

use serde::{Deserialize, Serialize};

/// Fixed index order matches the reference `IonName` enum: hydrogen and
/// helium first, then the five coolants in the order Carbon, Nitrogen,
/// Oxygen, Neon, Sulphur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(usize)]
pub enum IonName {
    HN = 0,
    HeN,
    CP1,
    CP2,
    NN,
    NP1,
    NP2,
    ON,
    OP1,
    NeN,
    NeP1,
    SP1,
    SP2,
    SP3,
}

pub const NUMBER_OF_IONNAMES: usize = 14;

pub const ALL_IONS: [IonName; NUMBER_OF_IONNAMES] = [
    IonName::HN,
    IonName::HeN,
    IonName::CP1,
    IonName::CP2,
    IonName::NN,
    IonName::NP1,
    IonName::NP2,
    IonName::ON,
    IonName::OP1,
    IonName::NeN,
    IonName::NeP1,
    IonName::SP1,
    IonName::SP2,
    IonName::SP3,
];

impl IonName {
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn element(&self) -> Element {
        match self {
            IonName::HN => Element::H,
            IonName::HeN => Element::He,
            IonName::CP1 | IonName::CP2 => Element::C,
            IonName::NN | IonName::NP1 | IonName::NP2 => Element::N,
            IonName::ON | IonName::OP1 => Element::O,
            IonName::NeN | IonName::NeP1 => Element::Ne,
            IonName::SP1 | IonName::SP2 | IonName::SP3 => Element::S,
        }
    }

    /// All ions belonging to the given element, in increasing ionization
    /// stage order. Used for the `sum over stages == 1` invariant.
    pub fn stages_of(element: Element) -> &'static [IonName] {
        match element {
            Element::H => &[IonName::HN],
            Element::He => &[IonName::HeN],
            Element::C => &[IonName::CP1, IonName::CP2],
            Element::N => &[IonName::NN, IonName::NP1, IonName::NP2],
            Element::O => &[IonName::ON, IonName::OP1],
            Element::Ne => &[IonName::NeN, IonName::NeP1],
            Element::S => &[IonName::SP1, IonName::SP2, IonName::SP3],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Element {
    H,
    He,
    C,
    N,
    O,
    Ne,
    S,
}

pub const ELEMENTS: [Element; 7] = [
    Element::H,
    Element::He,
    Element::C,
    Element::N,
    Element::O,
    Element::Ne,
    Element::S,
];

/// Every photon is born `Primary`; its type is retagged on absorption or
/// (future) re-emission. `Absorbed` marks packets that deposited their full
/// target optical depth rather than exiting the domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(usize)]
pub enum PhotonType {
    Primary = 0,
    DiffuseHI,
    DiffuseHeI,
    Absorbed,
}

pub const NUMBER_OF_PHOTONTYPES: usize = 4;
