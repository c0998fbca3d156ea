//! The per-cell ionization-balance solver (C7): the coupled hydrogen/
//! helium neutral-fraction iteration and the five coolant ladders,
//! distributed across cells with the same job-market mechanism photon
//! transport uses.

pub mod coolants;

use std::sync::Mutex;

use log::{debug, warn};

use crate::abundances::Abundances;
use crate::density::IonizationVariables;
use crate::error::{CoreError, Result};
use crate::ion::{Element, IonName, NUMBER_OF_IONNAMES};
use crate::jobs::JobMarket;
use crate::rates::{ChargeTransferRates, RecombinationRates};

use coolants::{solve_coolants, CoolantInputs};

/// Solves the coupled H/He neutral-fraction system by the alternating
/// scheme in `IonizationStateCalculator::find_H0`: seed, iterate until
/// both fractions change by less than `1e-4` relative, damp after 10
/// iterations, and fail after 20.
pub fn find_h0(alpha_h: f64, alpha_he: f64, j_h: f64, j_he: f64, n_tot: f64, a_he: f64, t: f64) -> Result<(f64, f64)> {
    debug_assert!(alpha_h >= 0.0 && alpha_he >= 0.0 && j_h >= 0.0 && j_he >= 0.0);
    debug_assert!(n_tot >= 0.0 && a_he >= 0.0 && t >= 0.0);

    if j_h < 1.0e-20 {
        return Ok((1.0, 1.0));
    }

    let alpha_e_2s_p = 4.27e-20 * (t * 1.0e-4).powf(-0.695);
    let ch1 = alpha_h * n_tot / j_h;
    let ch2 = a_he * alpha_e_2s_p * n_tot / j_h;
    let che = if j_he > 0.0 { alpha_he * n_tot / j_he } else { 0.0 };

    let mut h0old = 0.99 * (1.0 - (-0.5 / ch1).exp());
    let mut h0 = 0.9 * h0old;
    let mut he0old = if che > 0.0 { (0.5 / che).min(1.0) } else { 1.0 };
    let mut he0 = 0.0;

    let mut niter = 0u32;
    while (h0 - h0old).abs() > 1.0e-4 * h0old && (he0 - he0old).abs() > 1.0e-4 * he0old {
        niter += 1;
        h0old = h0;
        he0old = if he0 > 0.0 { he0 } else { 0.0 };

        let p_hots = 1.0 / (1.0 + 77.0 * he0old / t.sqrt() / h0old);
        let ch = ch1 - ch2 * a_he * (1.0 - he0old) * p_hots / (1.0 - h0old);

        he0 = if che > 0.0 {
            let bhe = (1.0 + 2.0 * a_he - h0) * che + 1.0;
            let discriminant_ratio = 4.0 * a_he * (1.0 + a_he - h0) * che * che / (bhe * bhe);
            if discriminant_ratio < 1.0e-3 {
                (1.0 + a_he - h0) * che / bhe
            } else {
                (bhe - (bhe * bhe - 4.0 * a_he * (1.0 + a_he - h0) * che * che).sqrt()) / (2.0 * a_he * che)
            }
        } else {
            1.0
        };

        let b = ch * (2.0 + a_he - he0 * a_he) + 1.0;
        let discriminant_ratio = 4.0 * ch * ch * (1.0 + a_he - he0 * a_he) / (b * b);
        h0 = if discriminant_ratio < 1.0e-3 {
            ch * (1.0 + a_he - he0 * a_he) / b
        } else {
            (b - (b * b - 4.0 * ch * ch * (1.0 + a_he - he0 * a_he)).sqrt()) / (2.0 * ch)
        };

        if niter > 10 {
            h0 = 0.5 * (h0 + h0old);
            he0 = 0.5 * (he0 + he0old);
        }
        if niter > 20 {
            return Err(CoreError::SolverDivergence { iterations: niter, temperature: t, j_h, j_he, n_tot });
        }
    }

    Ok((h0, he0))
}

/// `find_h0` for a system without helium: the closed-form solution of a
/// single quadratic, no iteration needed.
pub fn find_h0_simple(alpha_h: f64, j_h: f64, n_tot: f64) -> f64 {
    if j_h > 0.0 && n_tot > 0.0 {
        let a = 0.5 * j_h / n_tot / alpha_h;
        let b = 2.0 / a;
        let c = (b + 1.0).sqrt();
        1.0 + a * (1.0 - c)
    } else {
        1.0
    }
}

/// Solves one cell's full ionization state in place: hydrogen, helium and
/// all five coolants. `jfac = L_total / total_weight` converts the cell's
/// dimensionless accumulated integrals into physical photoionization
/// rates.
pub fn solve_cell(
    vars: &mut IonizationVariables,
    jfac: f64,
    abundances: &Abundances,
    recombination_rates: &RecombinationRates,
    charge_transfer_rates: &ChargeTransferRates,
) -> Result<()> {
    vars.neutral_fraction_h_old = vars.ionic_fractions[IonName::HN.index()];

    let n_tot = vars.number_density;
    if n_tot <= 0.0 {
        vars.ionic_fractions = [0.0; NUMBER_OF_IONNAMES];
        return Ok(());
    }

    let j_h = jfac * vars.mean_intensities[IonName::HN.index()];
    let j_he = jfac * vars.mean_intensities[IonName::HeN.index()];
    if j_h <= 0.0 {
        vars.ionic_fractions = [0.0; NUMBER_OF_IONNAMES];
        vars.ionic_fractions[IonName::HN.index()] = 1.0;
        vars.ionic_fractions[IonName::HeN.index()] = 1.0;
        return Ok(());
    }

    let t = vars.temperature;
    let alpha_h = recombination_rates.rate(IonName::HN, t);
    let alpha_he = recombination_rates.rate(IonName::HeN, t);
    let a_he = abundances.get(Element::He);

    let (x_h, x_he) = if a_he != 0.0 {
        find_h0(alpha_h, alpha_he, j_h, j_he, n_tot, a_he, t)?
    } else {
        (find_h0_simple(alpha_h, j_h, n_tot), 0.0)
    };

    vars.ionic_fractions[IonName::HN.index()] = x_h;
    vars.ionic_fractions[IonName::HeN.index()] = x_he;

    let n_e = n_tot * ((1.0 - x_h) + a_he * (1.0 - x_he));
    let inputs = CoolantInputs {
        mean_intensities: &vars.mean_intensities,
        jfac,
        n_tot,
        n_e,
        x_h,
        x_he,
        temperature: t,
        abundances,
        recombination_rates,
        charge_transfer_rates,
    };
    solve_coolants(&inputs, &mut vars.ionic_fractions);

    Ok(())
}

/// Solves every cell's ionization state in parallel, `worksize` workers
/// pulling batches from the same job-market mechanism photon transport
/// uses. Each worker solves its batch's cells into a private copy and
/// hands the results back over a `Mutex`-guarded results vector (the same
/// pattern `VoronoiGrid::compute_grid` uses for parallel cell
/// construction); `variables` itself is only read (via a shared
/// reborrow) while workers are running and only written afterwards, so
/// no unsafe aliasing is needed.
pub fn run(
    variables: &mut [IonizationVariables],
    luminosity: f64,
    total_weight: f64,
    worksize: usize,
    abundances: &Abundances,
    recombination_rates: &RecombinationRates,
    charge_transfer_rates: &ChargeTransferRates,
) -> Result<()> {
    if total_weight <= 0.0 {
        debug!("ionization solve skipped: zero total photon weight");
        return Ok(());
    }
    let jfac = luminosity / total_weight;
    let n = variables.len();
    let snapshot: &[IonizationVariables] = variables;
    let results: Mutex<Vec<(usize, IonizationVariables)>> = Mutex::new(Vec::with_capacity(n));
    let first_error: Mutex<Option<CoreError>> = Mutex::new(None);

    JobMarket::run(n, worksize.max(1), 256, |batch| {
        let mut local = Vec::with_capacity(batch.len());
        for i in batch {
            let mut cell = snapshot[i];
            match solve_cell(&mut cell, jfac, abundances, recombination_rates, charge_transfer_rates) {
                Ok(()) => local.push((i, cell)),
                Err(e) => {
                    let mut slot = first_error.lock().unwrap();
                    if slot.is_none() {
                        warn!("ionization solver diverged in cell {i}: {e}");
                        *slot = Some(e);
                    }
                }
            }
        }
        results.lock().unwrap().extend(local);
    });

    for (i, cell) in results.into_inner().unwrap() {
        variables[i] = cell;
    }

    match first_error.into_inner().unwrap() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_h0_simple_with_zero_flux_is_fully_neutral() {
        assert_eq!(find_h0_simple(2.6e-19, 0.0, 1.0e8), 1.0);
    }

    #[test]
    fn find_h0_converges_within_twenty_iterations_over_the_physical_domain() {
        let alpha_h = 2.6e-19;
        let alpha_he = 2.7e-19;
        for &t in &[1.0e2, 1.0e3, 1.0e4, 1.0e5] {
            for &n in &[1.0e2, 1.0e6, 1.0e10] {
                for &j in &[1.0e-2, 1.0, 1.0e4] {
                    let result = find_h0(alpha_h, alpha_he, j * n, j * n * 0.1, n, 0.1, t);
                    assert!(result.is_ok(), "diverged at T={t}, n={n}, j={j}");
                    let (h0, he0) = result.unwrap();
                    assert!((0.0..=1.0).contains(&h0));
                    assert!((0.0..=1.0).contains(&he0));
                }
            }
        }
    }

    #[test]
    fn vacuum_cells_are_fully_neutral_at_zero_density() {
        let mut vars = IonizationVariables::new(0.0, 1.0e4, [0.0; NUMBER_OF_IONNAMES]);
        let abundances = Abundances::default();
        solve_cell(&mut vars, 1.0, &abundances, &RecombinationRates, &ChargeTransferRates).unwrap();
        assert!(vars.ionic_fractions.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn dark_cells_with_nonzero_density_are_fully_neutral_hydrogen_and_helium() {
        let mut vars = IonizationVariables::new(1.0e8, 1.0e4, [0.0; NUMBER_OF_IONNAMES]);
        let abundances = Abundances::default();
        solve_cell(&mut vars, 1.0, &abundances, &RecombinationRates, &ChargeTransferRates).unwrap();
        assert_eq!(vars.ionic_fractions[IonName::HN.index()], 1.0);
        assert_eq!(vars.ionic_fractions[IonName::HeN.index()], 1.0);
        for ion in [IonName::CP1, IonName::NN, IonName::ON, IonName::NeN, IonName::SP1] {
            assert_eq!(vars.ionic_fractions[ion.index()], 0.0);
        }
    }

    #[test]
    fn a_strongly_illuminated_cell_is_mostly_ionized() {
        let mut vars = IonizationVariables::new(1.0e8, 1.0e4, [0.0; NUMBER_OF_IONNAMES]);
        vars.mean_intensities[IonName::HN.index()] = 1.0e20;
        vars.mean_intensities[IonName::HeN.index()] = 1.0e19;
        let abundances = Abundances::default();
        solve_cell(&mut vars, 1.0, &abundances, &RecombinationRates, &ChargeTransferRates).unwrap();
        assert!(vars.ionic_fractions[IonName::HN.index()] < 0.1);
    }

    #[test]
    fn run_solves_every_cell_without_cross_contamination() {
        let mut variables = vec![
            IonizationVariables::new(1.0e8, 1.0e4, [0.0; NUMBER_OF_IONNAMES]),
            IonizationVariables::new(0.0, 1.0e4, [0.0; NUMBER_OF_IONNAMES]),
        ];
        variables[0].mean_intensities[IonName::HN.index()] = 1.0e20;
        let abundances = Abundances::default();
        run(&mut variables, 1.0e49, 1.0e6, 2, &abundances, &RecombinationRates, &ChargeTransferRates).unwrap();
        assert!(variables[0].ionic_fractions[IonName::HN.index()] < 1.0);
        assert!(variables[1].ionic_fractions.iter().all(|&x| x == 0.0));
    }
}
