//! Deterministic growth model: coefficients, residual round trip and
//! residual sampling around the steady state.

use approx::assert_relative_eq;
use pertsol::evaluate::{sample, GridAxis, GridOptions, ResidualGrid};
use pertsol::prelude::*;
use pertsol::SolveError;

fn reference_solution(order: usize) -> Solution {
    let params = ModelParams::deterministic_reference().with_order(order);
    let model = GrowthModel::deterministic(params).expect("reference parameters are valid");
    solve(&model).expect("reference model is solvable")
}

/// Positive root of -gamma a^2 + gamma rho a + a0 f''(1) = 0
fn first_order_root(params: &ModelParams) -> f64 {
    let a0 = params.rho / params.alpha;
    let f2 = params.rho * (params.alpha - 1.0);
    let (a, b, c) = (-params.gamma, params.gamma * params.rho, a0 * f2);
    let disc = (b * b - 4.0 * a * c).sqrt();
    [(-b + disc) / (2.0 * a), (-b - disc) / (2.0 * a)]
        .into_iter()
        .find(|r| *r > 0.0)
        .unwrap()
}

#[test]
fn reference_scenario_coefficients() {
    let solution = reference_solution(5);
    let table = solution.coefficients();
    assert!(table.is_complete());
    assert_eq!(table.len(), 6);

    assert_relative_eq!(
        table.get(CoefficientIndex::new(0, 0)).unwrap(),
        0.2,
        epsilon = 1e-12
    );

    let a1 = table.get(CoefficientIndex::new(1, 0)).unwrap();
    assert!(a1 > 0.0);
    assert_relative_eq!(
        a1,
        first_order_root(&ModelParams::deterministic_reference()),
        epsilon = 1e-10
    );
    assert_relative_eq!(a1, 0.0620809, epsilon = 1e-6);
}

#[test]
fn steady_state_consumption_equals_output() {
    for order in [1, 2, 5] {
        let solution = reference_solution(order);
        let kss = solution.model().params().kss;
        assert_relative_eq!(
            solution.policy_value_at(kss, 0.0),
            solution.production_value_at(kss),
            epsilon = 1e-9
        );
    }
}

#[test]
fn residual_derivatives_vanish_up_to_order() {
    let order = 5;
    let solution = reference_solution(order);
    for i in 0..=order {
        let derivative = solution
            .residual_derivative(CoefficientIndex::new(i, 0))
            .unwrap();
        assert!(
            derivative.abs() < 1e-9,
            "d^{i}R/dk^{i} at kss = {derivative:e}"
        );
    }
}

#[test]
fn first_order_root_is_positive_across_calibrations() {
    for (rho, alpha, gamma) in [
        (0.05, 0.25, -10.0),
        (0.03, 0.33, -2.0),
        (0.1, 0.5, -0.5),
        (0.02, 0.2, -25.0),
    ] {
        let params = ModelParams::deterministic_reference()
            .with_order(3)
            .with_rho(rho)
            .with_alpha(alpha)
            .with_gamma(gamma);
        let model = GrowthModel::deterministic(params).unwrap();
        let solution = solve(&model).unwrap();
        let a1 = solution
            .coefficients()
            .get(CoefficientIndex::new(1, 0))
            .unwrap();
        assert!(a1 > 0.0, "rho = {rho}, alpha = {alpha}, gamma = {gamma}");
        assert_relative_eq!(a1, first_order_root(&params), epsilon = 1e-9);
    }
}

#[test]
fn repeated_runs_are_identical() {
    let first = reference_solution(5);
    let second = reference_solution(5);
    assert_eq!(
        first.coefficients().derivatives(),
        second.coefficients().derivatives()
    );
}

#[test]
fn first_order_expansion_skips_higher_orders() {
    let solution = reference_solution(1);
    let table = solution.coefficients();
    assert_eq!(table.len(), 2);
    assert_eq!(table.derivatives().dim(), (2, 1));
    assert!(matches!(
        table.get(CoefficientIndex::new(2, 0)),
        Err(SolveError::OutsideExpansion { .. })
    ));
}

#[test]
fn positive_curvature_has_no_admissible_first_order_root() {
    // gamma > 0: both roots positive or complex
    let params = ModelParams::deterministic_reference()
        .with_order(2)
        .with_gamma(2.0);
    let model = GrowthModel::deterministic(params).unwrap();
    match solve(&model) {
        Err(SolveError::Unsolvable { index, .. }) => {
            assert_eq!(index, CoefficientIndex::new(1, 0))
        }
        other => panic!("expected an unsolvable first-order step, got {other:?}"),
    }
}

#[test]
fn normalized_residual_is_zero_at_steady_state() {
    let solution = reference_solution(5);
    let residual = ResidualFunction::new(&solution).unwrap();
    assert_relative_eq!(residual.normalization(), 0.01, epsilon = 1e-14);
    assert!(residual.at(1.0, 0.0).unwrap().abs() < 1e-6);
}

#[test]
fn residual_grows_away_from_steady_state() {
    let solution = reference_solution(5);
    let residual = ResidualFunction::new(&solution).unwrap();
    let near = residual.at(1.05, 0.0).unwrap().abs();
    let far = residual.at(1.5, 0.0).unwrap().abs();
    assert!(near < far, "|R(1.05)| = {near:e}, |R(1.5)| = {far:e}");
}

#[test]
fn sampled_residual_is_smooth_near_steady_state() {
    let solution = reference_solution(5);
    let residual = ResidualFunction::new(&solution).unwrap();

    let changes: Vec<f64> = [41, 81]
        .into_iter()
        .map(|points| {
            let grid = GridOptions::default().with_capital(GridAxis::new(0.8, 1.2, points));
            let sampled = sample(&residual, &grid).unwrap();
            match &sampled {
                ResidualGrid::Curve(curve) => {
                    assert_eq!(curve.capital.len(), points);
                    assert!(curve.residual.iter().all(|r| r.is_finite()));
                }
                ResidualGrid::Surface(_) => panic!("deterministic model sampled as a surface"),
            }
            sampled.max_adjacent_change()
        })
        .collect();

    // Halving the step roughly halves the largest jump of a smooth curve
    assert!(
        changes[1] < 0.75 * changes[0],
        "adjacent changes {changes:?}"
    );
}

#[test]
fn compiled_policy_matches_power_series() {
    let solution = reference_solution(5);
    let policy = PolicyFunction::new(&solution).unwrap();
    for k in [0.5, 0.9, 1.0, 1.3, 2.0] {
        assert_relative_eq!(
            policy.at(k, 0.0).unwrap(),
            solution.policy_value_at(k, 0.0),
            epsilon = 1e-12
        );
    }
}
