//! Radiative recombination rate coefficients, `alpha(ion, T)` in m^3 s^-1.
//!
//! `alpha(X)` is the coefficient for capture of a free electron that
//! populates ion stage `X` from the stage directly above it (so
//! `alpha(H_n)` is the case-B recombination coefficient of H+, and
//! `alpha(C_p1)` is the coefficient for C2+ + e- -> C+ + hv), matching the
//! indexing convention of the reference `RecombinationRates` interface.
//!
//! The coefficients below are simple power-law fits in `T4 = T / 1e4 K`.
//! Like the charge-transfer coefficients in [`crate::rates::charge_transfer`],
//! they are embedded physical data, not derived or refactorable — only the
//! lookup mechanism is original.

use crate::ion::IonName;

struct PowerLawFit {
    alpha0_cm3: f64,
    exponent: f64,
}

const FITS: [PowerLawFit; crate::ion::NUMBER_OF_IONNAMES] = [
    // H_n
    PowerLawFit { alpha0_cm3: 2.59e-13, exponent: 0.7 },
    // He_n
    PowerLawFit { alpha0_cm3: 2.72e-13, exponent: 0.7 },
    // C_p1
    PowerLawFit { alpha0_cm3: 4.7e-13, exponent: 0.6 },
    // C_p2
    PowerLawFit { alpha0_cm3: 2.3e-12, exponent: 0.645 },
    // N_n
    PowerLawFit { alpha0_cm3: 4.1e-13, exponent: 0.608 },
    // N_p1
    PowerLawFit { alpha0_cm3: 2.2e-12, exponent: 0.639 },
    // N_p2
    PowerLawFit { alpha0_cm3: 5.1e-12, exponent: 0.649 },
    // O_n
    PowerLawFit { alpha0_cm3: 3.3e-13, exponent: 0.63 },
    // O_p1
    PowerLawFit { alpha0_cm3: 2.0e-12, exponent: 0.646 },
    // Ne_n
    PowerLawFit { alpha0_cm3: 3.9e-13, exponent: 0.63 },
    // Ne_p1
    PowerLawFit { alpha0_cm3: 1.6e-12, exponent: 0.64 },
    // S_p1
    PowerLawFit { alpha0_cm3: 5.7e-13, exponent: 0.62 },
    // S_p2
    PowerLawFit { alpha0_cm3: 2.6e-12, exponent: 0.645 },
    // S_p3
    PowerLawFit { alpha0_cm3: 6.2e-12, exponent: 0.65 },
];

#[derive(Debug, Clone, Copy, Default)]
pub struct RecombinationRates;

impl RecombinationRates {
    /// Recombination rate coefficient in m^3 s^-1 for the given ion at
    /// temperature `t` (K).
    pub fn rate(&self, ion: IonName, t: f64) -> f64 {
        debug_assert!(t >= 0.0, "negative temperature passed to RecombinationRates");
        let fit = &FITS[ion.index()];
        let t4 = t * 1.0e-4;
        fit.alpha0_cm3 * t4.powf(-fit.exponent) * 1.0e-6
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_decreases_with_temperature() {
        let rates = RecombinationRates;
        let low = rates.rate(IonName::HN, 1.0e3);
        let high = rates.rate(IonName::HN, 1.0e5);
        assert!(low > high);
    }

    #[test]
    fn all_rates_are_positive() {
        let rates = RecombinationRates;
        for ion in crate::ion::ALL_IONS {
            assert!(rates.rate(ion, 1.0e4) > 0.0);
        }
    }
}
