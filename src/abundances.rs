//! Read-only element abundances, expressed relative to hydrogen.

use serde::{Deserialize, Serialize};

use crate::ion::Element;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Abundances {
    pub he: f64,
    pub c: f64,
    pub n: f64,
    pub o: f64,
    pub ne: f64,
    pub s: f64,
}

impl Abundances {
    pub fn get(&self, element: Element) -> f64 {
        match element {
            Element::H => 1.0,
            Element::He => self.he,
            Element::C => self.c,
            Element::N => self.n,
            Element::O => self.o,
            Element::Ne => self.ne,
            Element::S => self.s,
        }
    }
}

impl Default for Abundances {
    /// Roughly solar abundances, matching the defaults CMacIonize ships with.
    fn default() -> Self {
        Self {
            he: 0.1,
            c: 2.2e-4,
            n: 4.0e-5,
            o: 3.3e-4,
            ne: 5.0e-5,
            s: 9.0e-6,
        }
    }
}
