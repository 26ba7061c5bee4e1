//! Mapping solver vectors back onto network quantities.

use lopf_core::{EntityKind, LopfError, LopfResult, Network};

use crate::builder::{DispatchProblem, VariableLayout};
use crate::solution::{BusPrices, CapacityDecision, GeneratorDispatch, LineFlow, Solution};
use crate::traits::SolverOutput;

/// Build a [`Solution`] from a backend's output.
///
/// Reads the primal and dual vectors through the same layout the builder
/// used. A non-optimal output yields a solution with that status and empty
/// tables. An optimal output whose vectors do not match the problem's size
/// is an [`LopfError::InconsistentSolution`].
pub fn extract(
    network: &Network,
    problem: &DispatchProblem,
    output: &SolverOutput,
) -> LopfResult<Solution> {
    let n_t = network.snapshot_count();
    if problem.snapshot_count() != n_t {
        return Err(LopfError::InconsistentSolution(format!(
            "problem was built for {} snapshots, network '{}' has {n_t}",
            problem.snapshot_count(),
            network.name()
        )));
    }

    let mut solution = Solution {
        network: network.name().to_string(),
        status: output.status,
        objective: output.objective,
        operating_cost: f64::NAN,
        investment_cost: f64::NAN,
        backend: String::new(),
        iterations: output.iterations,
        solve_time_ms: 0.0,
        message: output.message.clone(),
        snapshots: network.snapshots().clone(),
        demand: (0..n_t).map(|t| network.total_demand(t).value()).collect(),
        generators: Vec::new(),
        capacities: Vec::new(),
        prices: Vec::new(),
        line_flows: Vec::new(),
    };
    if !output.status.is_optimal() {
        return Ok(solution);
    }

    if output.primal.len() != problem.num_variables() {
        return Err(LopfError::InconsistentSolution(format!(
            "solver returned {} primal values for {} variables",
            output.primal.len(),
            problem.num_variables()
        )));
    }
    if output.duals.len() != problem.num_constraints() {
        return Err(LopfError::InconsistentSolution(format!(
            "solver returned {} dual values for {} constraints",
            output.duals.len(),
            problem.num_constraints()
        )));
    }

    let layout = problem.layout();
    let x = &output.primal;
    let bus_name = |id: lopf_core::BusId| network.bus(id).name.clone();

    let mut operating_cost = 0.0;
    for (g, generator) in network.generators().iter().enumerate() {
        let p: Vec<f64> = (0..n_t).map(|t| x[layout.dispatch(g, t)]).collect();
        operating_cost += generator.marginal_cost * p.iter().sum::<f64>();
        solution.generators.push(GeneratorDispatch {
            name: generator.name.clone(),
            bus: bus_name(generator.bus),
            carrier: generator.carrier.clone(),
            emission_factor: generator.emission_factor,
            p,
        });
    }

    let mut investment_cost = 0.0;
    let generator_caps = network
        .generators()
        .iter()
        .zip(&layout.generator_capacity)
        .map(|(g, col)| (EntityKind::Generator, g.name.as_str(), g.capacity.capital_cost(), *col));
    let line_caps = network
        .lines()
        .iter()
        .zip(&layout.line_capacity)
        .map(|(l, col)| (EntityKind::Line, l.name.as_str(), l.capacity.capital_cost(), *col));
    for (kind, name, capital_cost, col) in generator_caps.chain(line_caps) {
        let Some(col) = col else { continue };
        investment_cost += capital_cost * x[col];
        solution.capacities.push(CapacityDecision {
            component: kind.as_str(),
            name: name.to_string(),
            p_nom_opt: x[col],
        });
    }

    let mut prices: Vec<Vec<f64>> = network
        .buses()
        .iter()
        .map(|bus| {
            (0..n_t)
                .map(|t| output.duals[layout.balance_row(bus.id.value(), t)])
                .collect()
        })
        .collect();
    settle_degenerate_prices(network, layout, x, &mut prices);
    for (bus, marginal_price) in network.buses().iter().zip(prices) {
        solution.prices.push(BusPrices {
            bus: bus.name.clone(),
            marginal_price,
        });
    }

    for (l, line) in network.lines().iter().enumerate() {
        solution.line_flows.push(LineFlow {
            name: line.name.clone(),
            bus0: bus_name(line.bus0),
            bus1: bus_name(line.bus1),
            p0: (0..n_t).map(|t| x[layout.flow(l, t)]).collect(),
        });
    }

    solution.operating_cost = operating_cost;
    solution.investment_cost = investment_cost;
    Ok(solution)
}

fn slack(value: f64, limit: f64) -> f64 {
    1e-6 * (1.0 + limit.abs().max(value.abs()))
}

/// Pick a vertex price where the dual is degenerate.
///
/// When the marginal unit sits exactly on its limit, any price between the
/// dearest running unit and the cheapest idle one is optimal, and an
/// interior-point backend reports the middle of that range. Within an island
/// whose lines are all below their limits and whose extendable generators
/// all have headroom, prices are uniform and only the generators bound them,
/// so the price is moved down to the dearest running unit. Elsewhere the
/// dual is left as the backend returned it.
fn settle_degenerate_prices(
    network: &Network,
    layout: &VariableLayout,
    x: &[f64],
    prices: &mut [Vec<f64>],
) {
    let islands = network.islands();
    let mut island_of = vec![0; network.buses().len()];
    for (i, buses) in islands.iter().enumerate() {
        for bus in buses {
            island_of[bus.value()] = i;
        }
    }

    for (i, buses) in islands.iter().enumerate() {
        let Some(first) = buses.first() else { continue };
        'snapshot: for t in 0..network.snapshot_count() {
            for (l, line) in network.lines().iter().enumerate() {
                if island_of[line.bus0.value()] != i {
                    continue;
                }
                let limit = match layout.line_capacity[l] {
                    Some(col) => x[col],
                    None => line.capacity.upper_limit().value(),
                };
                let flow = x[layout.flow(l, t)].abs();
                if flow >= limit - slack(flow, limit) {
                    continue 'snapshot;
                }
            }

            let mut floor = f64::NEG_INFINITY;
            let mut ceiling = f64::INFINITY;
            for (g, generator) in network.generators().iter().enumerate() {
                if island_of[generator.bus.value()] != i {
                    continue;
                }
                let p = x[layout.dispatch(g, t)];
                let available = match layout.generator_capacity[g] {
                    Some(col) => generator.p_max_pu[t] * x[col],
                    None => generator.max_output(t).value(),
                };
                let tol = slack(p, available);
                let headroom = p < available - tol;
                if generator.is_extendable() && !headroom && available > tol {
                    continue 'snapshot;
                }
                if p > tol {
                    floor = floor.max(generator.marginal_cost);
                }
                if headroom {
                    ceiling = ceiling.min(generator.marginal_cost);
                }
            }
            if !floor.is_finite() {
                continue;
            }

            let price = prices[first.value()][t];
            let uniform = buses
                .iter()
                .all(|bus| (prices[bus.value()][t] - price).abs() <= slack(price, price));
            let above_floor = price > floor + slack(floor, floor);
            let below_ceiling =
                ceiling.is_infinite() || price < ceiling - slack(ceiling, ceiling);
            if uniform && above_floor && below_ceiling {
                for bus in buses {
                    prices[bus.value()][t] = floor;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ProblemBuilder;
    use crate::test_support::{single_bus, two_bus};
    use crate::traits::SolveStatus;
    use lopf_core::Capacity;

    #[test]
    fn test_maps_vectors_through_layout() {
        let network = single_bus(180.0);
        let problem = ProblemBuilder::new(&network).build().unwrap();
        // p[Coal, t] = 180, p[Gas, t] = 0
        let primal = vec![180.0, 180.0, 180.0, 0.0, 0.0, 0.0];
        let duals = vec![40.0; 3];
        let output = SolverOutput::optimal(21_600.0, primal, duals, 5);

        let solution = extract(&network, &problem, &output).unwrap();
        assert_eq!(solution.dispatch("Coal Plant"), Some(&[180.0; 3][..]));
        assert_eq!(solution.dispatch("Gas Plant"), Some(&[0.0; 3][..]));
        assert_eq!(solution.marginal_price("Bus"), Some(&[40.0; 3][..]));
        assert_eq!(solution.operating_cost(), 21_600.0);
        assert_eq!(solution.investment_cost(), 0.0);
        assert_eq!(solution.iterations(), 5);
        assert!(solution.capacities().is_empty());
    }

    #[test]
    fn test_capacity_and_flow_records() {
        let mut network = two_bus(50.0);
        network
            .add_generator("Wind", "East", Capacity::extendable(0.0, 100.0, 10.0), 0.0)
            .unwrap();
        let problem = ProblemBuilder::new(&network).build().unwrap();
        let mut primal = vec![0.0; problem.num_variables()];
        let cap = problem.layout().generator_capacity[2].unwrap();
        primal[cap] = 42.0;
        primal[problem.layout().flow(0, 1)] = -12.5;
        let output = SolverOutput::optimal(420.0, primal, vec![0.0; problem.num_constraints()], 1);

        let solution = extract(&network, &problem, &output).unwrap();
        assert_eq!(solution.generator_capacity("Wind"), Some(42.0));
        assert_eq!(solution.capacities()[0].component, "generator");
        assert_eq!(solution.investment_cost(), 420.0);
        let flow = &solution.line_flows()[0];
        assert_eq!((flow.bus0.as_str(), flow.bus1.as_str()), ("West", "East"));
        assert_eq!(flow.p0[1], -12.5);
    }

    #[test]
    fn test_degenerate_price_moves_to_running_unit() {
        // Coal exactly at 200 MW, Gas idle: any price in [40, 70] is optimal.
        let network = single_bus(200.0);
        let problem = ProblemBuilder::new(&network).build().unwrap();
        let primal = vec![199.99999996, 199.99999996, 199.99999996, 4e-8, 4e-8, 4e-8];
        let output = SolverOutput::optimal(24_000.0, primal, vec![54.99999997; 3], 12);

        let solution = extract(&network, &problem, &output).unwrap();
        assert_eq!(solution.marginal_price("Bus"), Some(&[40.0; 3][..]));
    }

    #[test]
    fn test_price_kept_when_extendable_generator_is_at_limit() {
        let mut network = single_bus(200.0);
        network
            .add_generator("Solar", "Bus", Capacity::extendable(0.0, 100.0, 5.0), 0.0)
            .unwrap();
        let problem = ProblemBuilder::new(&network).build().unwrap();
        let layout = problem.layout();
        let mut primal = vec![0.0; problem.num_variables()];
        for t in 0..3 {
            primal[layout.dispatch(0, t)] = 150.0;
            primal[layout.dispatch(2, t)] = 50.0;
        }
        primal[layout.generator_capacity[2].unwrap()] = 50.0;
        let output = SolverOutput::optimal(0.0, primal, vec![55.0; 3], 1);

        let solution = extract(&network, &problem, &output).unwrap();
        assert_eq!(solution.marginal_price("Bus"), Some(&[55.0; 3][..]));
    }

    #[test]
    fn test_price_kept_behind_congested_line() {
        // Line at its 50 MW limit: prices on either side stay independent.
        let network = two_bus(50.0);
        let problem = ProblemBuilder::new(&network).build().unwrap();
        let layout = problem.layout();
        let mut primal = vec![0.0; problem.num_variables()];
        for t in 0..network.snapshot_count() {
            primal[layout.dispatch(0, t)] = 50.0;
            primal[layout.dispatch(1, t)] = 50.0;
            primal[layout.flow(0, t)] = 50.0;
        }
        let mut duals = vec![0.0; problem.num_constraints()];
        for t in 0..network.snapshot_count() {
            duals[layout.balance_row(0, t)] = 20.0;
            duals[layout.balance_row(1, t)] = 60.0;
        }
        let output = SolverOutput::optimal(0.0, primal, duals, 1);

        let solution = extract(&network, &problem, &output).unwrap();
        assert!(solution.marginal_price("West").unwrap().iter().all(|&p| p == 20.0));
        assert!(solution.marginal_price("East").unwrap().iter().all(|&p| p == 60.0));
    }

    #[test]
    fn test_non_optimal_output_gives_empty_tables() {
        let network = single_bus(500.0);
        let problem = ProblemBuilder::new(&network).build().unwrap();
        let output = SolverOutput::failed(SolveStatus::Infeasible, "primal infeasible");
        let solution = extract(&network, &problem, &output).unwrap();
        assert_eq!(solution.status(), SolveStatus::Infeasible);
        assert!(solution.objective().is_nan());
        assert!(solution.generators().is_empty());
        assert!(solution.prices().is_empty());
        assert_eq!(solution.message(), Some("primal infeasible"));
    }

    #[test]
    fn test_length_mismatch_is_inconsistent() {
        let network = single_bus(180.0);
        let problem = ProblemBuilder::new(&network).build().unwrap();
        let short = SolverOutput::optimal(0.0, vec![0.0; 5], vec![0.0; 3], 1);
        assert!(matches!(
            extract(&network, &problem, &short),
            Err(LopfError::InconsistentSolution(_))
        ));
        let no_duals = SolverOutput::optimal(0.0, vec![0.0; 6], Vec::new(), 1);
        assert!(matches!(
            extract(&network, &problem, &no_duals),
            Err(LopfError::InconsistentSolution(_))
        ));
    }
}
