//! Coolant ionization-stage ladders: Carbon, Nitrogen, Oxygen, Neon,
//! Sulphur. Each stage ratio is photoionization-plus-charge-transfer-
//! ionization over recombination-plus-charge-transfer-recombination;
//! cumulative products of the ratios are then normalised to sum to 1.
//! The charge-transfer atomic-number pairs and the He-charge-transfer
//! (`CTHe`) analytic-fit coefficients below are embedded physical data,
//! not subject to refactoring.

use crate::abundances::Abundances;
use crate::ion::{Element, IonName, NUMBER_OF_IONNAMES};
use crate::rates::{ChargeTransferRates, RecombinationRates};

pub struct CoolantInputs<'a> {
    pub mean_intensities: &'a [f64; NUMBER_OF_IONNAMES],
    pub jfac: f64,
    pub n_tot: f64,
    pub n_e: f64,
    /// Neutral hydrogen fraction, `x(H)`.
    pub x_h: f64,
    /// Neutral helium fraction, `x(He)`.
    pub x_he: f64,
    pub temperature: f64,
    pub abundances: &'a Abundances,
    pub recombination_rates: &'a RecombinationRates,
    pub charge_transfer_rates: &'a ChargeTransferRates,
}

/// Solves and normalises every coolant's ionic fractions in place, leaving
/// the hydrogen and helium entries of `fractions` untouched.
pub fn solve_coolants(inputs: &CoolantInputs, fractions: &mut [f64; NUMBER_OF_IONNAMES]) {
    let t = inputs.temperature;
    let t4 = t * 1.0e-4;
    let n_tot = inputs.n_tot;
    let n_e = inputs.n_e;
    let x_h = inputs.x_h;
    let x_he = inputs.x_he;
    let a_he = inputs.abundances.get(Element::He);
    let n_hp = n_tot * (1.0 - x_h);
    let rec = inputs.recombination_rates;
    let ctr = inputs.charge_transfer_rates;
    let j = |ion: IonName| inputs.jfac * inputs.mean_intensities[ion.index()];

    // Carbon
    let c21 = j(IonName::CP1) / (n_e * rec.rate(IonName::CP1, t));
    let cthe_c32 = 1.0e-15 * 0.046 * t4 * t4;
    let c32 = j(IonName::CP2)
        / (n_e * rec.rate(IonName::CP2, t)
            + n_tot * x_h * ctr.recombination_rate(4, 6, t)
            + n_tot * x_he * a_he * cthe_c32);
    let c31 = c32 * c21;
    let sum_c = c21 + c31;
    fractions[IonName::CP1.index()] = c21 / (1.0 + sum_c);
    fractions[IonName::CP2.index()] = c31 / (1.0 + sum_c);

    // Nitrogen
    let n21 = (j(IonName::NN) + n_hp * ctr.ionization_rate(1, 7, t))
        / (n_e * rec.rate(IonName::NN, t) + n_tot * x_h * ctr.recombination_rate(2, 7, t));
    let cthe_n32 = 1.0e-15 * 0.33 * t4.powf(0.29) * (1.0 + 1.3 * (-4.5 / t4).exp());
    let n32 = j(IonName::NP1)
        / (n_e * rec.rate(IonName::NP1, t)
            + n_tot * x_h * ctr.recombination_rate(3, 7, t)
            + n_tot * x_he * a_he * cthe_n32);
    let cthe_n43 = 1.0e-15 * 0.15;
    let n43 = j(IonName::NP2)
        / (n_e * rec.rate(IonName::NP2, t)
            + n_tot * x_h * ctr.recombination_rate(4, 7, t)
            + n_tot * x_he * a_he * cthe_n43);
    let n31 = n32 * n21;
    let n41 = n43 * n31;
    let sum_n = n21 + n31 + n41;
    fractions[IonName::NN.index()] = n21 / (1.0 + sum_n);
    fractions[IonName::NP1.index()] = n31 / (1.0 + sum_n);
    fractions[IonName::NP2.index()] = n41 / (1.0 + sum_n);

    // Sulphur
    let s21 = j(IonName::SP1) / (n_e * rec.rate(IonName::SP1, t) + n_tot * x_h * ctr.recombination_rate(3, 16, t));
    let cthe_s32 = 1.0e-15 * 1.1 * t4.powf(0.56);
    let s32 = j(IonName::SP2)
        / (n_e * rec.rate(IonName::SP2, t)
            + n_tot * x_h * ctr.recombination_rate(4, 16, t)
            + n_tot * x_he * a_he * cthe_s32);
    let cthe_s43 = 1.0e-15 * 7.6e-4 * t4.powf(0.32) * (1.0 + 3.4 * (-5.25 * t4).exp());
    let s43 = j(IonName::SP3)
        / (n_e * rec.rate(IonName::SP3, t)
            + n_tot * x_h * ctr.recombination_rate(5, 16, t)
            + n_tot * x_he * a_he * cthe_s43);
    let s31 = s32 * s21;
    let s41 = s43 * s31;
    let sum_s = s21 + s31 + s41;
    fractions[IonName::SP1.index()] = s21 / (1.0 + sum_s);
    fractions[IonName::SP2.index()] = s31 / (1.0 + sum_s);
    fractions[IonName::SP3.index()] = s41 / (1.0 + sum_s);

    // Neon (no H charge-transfer recombination term)
    let ne21 = j(IonName::NeN) / (n_e * rec.rate(IonName::NeN, t));
    let cthe_ne32 = 1.0e-15 * 1.0e-5;
    let ne32 = j(IonName::NeP1)
        / (n_e * rec.rate(IonName::NeP1, t)
            + n_tot * x_h * ctr.recombination_rate(3, 10, t)
            + n_tot * x_he * a_he * cthe_ne32);
    let ne31 = ne32 * ne21;
    let sum_ne = ne21 + ne31;
    fractions[IonName::NeN.index()] = ne21 / (1.0 + sum_ne);
    fractions[IonName::NeP1.index()] = ne31 / (1.0 + sum_ne);

    // Oxygen
    let o21 = (j(IonName::ON) + n_hp * ctr.ionization_rate(1, 8, t))
        / (n_e * rec.rate(IonName::ON, t) + n_tot * x_h * ctr.recombination_rate(2, 8, t));
    let cthe_o32 = 0.2e-15 * t4.powf(0.95);
    let o32 = j(IonName::OP1)
        / (n_e * rec.rate(IonName::OP1, t)
            + n_tot * x_h * ctr.recombination_rate(3, 8, t)
            + n_tot * x_he * a_he * cthe_o32);
    let o31 = o32 * o21;
    let sum_o = o21 + o31;
    fractions[IonName::ON.index()] = o21 / (1.0 + sum_o);
    fractions[IonName::OP1.index()] = o31 / (1.0 + sum_o);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_coolant_stage_sums_to_one() {
        let mut intensities = [1.0e-12; NUMBER_OF_IONNAMES];
        intensities[IonName::HN.index()] = 0.0;
        intensities[IonName::HeN.index()] = 0.0;
        let abundances = Abundances::default();
        let recombination_rates = RecombinationRates;
        let charge_transfer_rates = ChargeTransferRates;
        let inputs = CoolantInputs {
            mean_intensities: &intensities,
            jfac: 1.0,
            n_tot: 1.0e8,
            n_e: 1.0e6,
            x_h: 0.1,
            x_he: 0.2,
            temperature: 1.0e4,
            abundances: &abundances,
            recombination_rates: &recombination_rates,
            charge_transfer_rates: &charge_transfer_rates,
        };
        let mut fractions = [0.0; NUMBER_OF_IONNAMES];
        solve_coolants(&inputs, &mut fractions);

        for element in [Element::C, Element::N, Element::O, Element::Ne, Element::S] {
            let sum: f64 = IonName::stages_of(element).iter().map(|ion| fractions[ion.index()]).sum();
            assert!((sum - 1.0).abs() < 1e-9, "{element:?} stages sum to {sum}");
        }
    }
}
