//! Route optimizer
//!
//! Finds the visiting order with the smallest total distance for an open
//! path that starts at the depot and does not return. Small stop sets are
//! searched exhaustively in lexicographic order; larger ones use Held-Karp.

use tracing::debug;

use super::distance::{AreaDistanceTable, Leg, Place};
use crate::error::{PlannerError, PlannerResult};
use crate::types::{
    Customer, CustomerDirectory, Depot, RouteLeg, RouteResult, RouteStop, SearchStrategy, StopSet,
};

/// Largest stop count searched by full enumeration
pub const EXHAUSTIVE_LIMIT: usize = 8;

/// Largest stop count accepted at all
pub const MAX_STOPS: usize = 16;

const START_LABEL: &str = "Start Location";

/// Pairwise legs between the depot and every stop
struct CostMatrix {
    from_depot: Vec<Leg>,
    between: Vec<Vec<Leg>>,
}

impl CostMatrix {
    fn build(table: &AreaDistanceTable, stops: &[(&Customer, u32)]) -> Self {
        let from_depot = stops
            .iter()
            .map(|(customer, _)| table.between(Place::Depot, Place::Area(customer.area)))
            .collect();
        let between = stops
            .iter()
            .map(|(a, _)| {
                stops
                    .iter()
                    .map(|(b, _)| table.between(Place::Area(a.area), Place::Area(b.area)))
                    .collect()
            })
            .collect();
        Self {
            from_depot,
            between,
        }
    }

    fn len(&self) -> usize {
        self.from_depot.len()
    }

    /// Depot → first plus consecutive legs, no return
    fn path_distance(&self, order: &[usize]) -> f64 {
        let Some(&first) = order.first() else {
            return 0.0;
        };
        let mut total = self.from_depot[first].distance_km;
        for pair in order.windows(2) {
            total += self.between[pair[0]][pair[1]].distance_km;
        }
        total
    }
}

/// Rearrange into the next lexicographic permutation; false once the last one is reached
fn next_permutation(items: &mut [usize]) -> bool {
    if items.len() < 2 {
        return false;
    }
    let mut i = items.len() - 1;
    while i > 0 && items[i - 1] >= items[i] {
        i -= 1;
    }
    if i == 0 {
        return false;
    }
    let mut j = items.len() - 1;
    while items[j] <= items[i - 1] {
        j -= 1;
    }
    items.swap(i - 1, j);
    items[i..].reverse();
    true
}

/// Every ordering, first strict minimum wins
fn search_exhaustive(matrix: &CostMatrix) -> (Vec<usize>, u64) {
    let mut current: Vec<usize> = (0..matrix.len()).collect();
    let mut best = current.clone();
    let mut best_distance = matrix.path_distance(&current);
    let mut evaluated = 1u64;

    while next_permutation(&mut current) {
        evaluated += 1;
        let distance = matrix.path_distance(&current);
        if distance < best_distance {
            best_distance = distance;
            best.copy_from_slice(&current);
        }
    }
    (best, evaluated)
}

/// Held-Karp over subsets, for an open path from the depot
fn search_held_karp(matrix: &CostMatrix) -> Vec<usize> {
    let n = matrix.len();
    let full = 1usize << n;
    let mut cost = vec![f64::INFINITY; full * n];
    let mut parent = vec![usize::MAX; full * n];

    for j in 0..n {
        cost[(1 << j) * n + j] = matrix.from_depot[j].distance_km;
    }

    for mask in 1..full {
        for last in 0..n {
            if mask & (1 << last) == 0 {
                continue;
            }
            let here = cost[mask * n + last];
            if !here.is_finite() {
                continue;
            }
            for next in 0..n {
                if mask & (1 << next) != 0 {
                    continue;
                }
                let extended = mask | (1 << next);
                let candidate = here + matrix.between[last][next].distance_km;
                if candidate < cost[extended * n + next] {
                    cost[extended * n + next] = candidate;
                    parent[extended * n + next] = last;
                }
            }
        }
    }

    let all = full - 1;
    let mut last = 0;
    for j in 1..n {
        if cost[all * n + j] < cost[all * n + last] {
            last = j;
        }
    }

    let mut order = Vec::with_capacity(n);
    let mut mask = all;
    loop {
        order.push(last);
        let previous = parent[mask * n + last];
        mask &= !(1 << last);
        if previous == usize::MAX {
            break;
        }
        last = previous;
    }
    order.reverse();
    order
}

/// Orders stops for a single courier leaving the depot
#[derive(Debug, Clone)]
pub struct RouteOptimizer {
    directory: CustomerDirectory,
    table: AreaDistanceTable,
    depot: Depot,
}

impl RouteOptimizer {
    pub fn new(directory: CustomerDirectory, table: AreaDistanceTable, depot: Depot) -> Self {
        Self {
            directory,
            table,
            depot,
        }
    }

    /// Find the shortest visiting order for `stops`.
    ///
    /// Fails on the first unknown customer or when there are more than
    /// [`MAX_STOPS`] distinct stops.
    pub fn optimize(&self, stops: &StopSet) -> PlannerResult<RouteResult> {
        let resolved = stops
            .iter()
            .map(|(name, parcels)| self.directory.resolve(name).map(|c| (c, parcels)))
            .collect::<PlannerResult<Vec<_>>>()?;

        if resolved.len() > MAX_STOPS {
            return Err(PlannerError::TooManyStops {
                count: resolved.len(),
                limit: MAX_STOPS,
            });
        }

        let matrix = CostMatrix::build(&self.table, &resolved);
        let (order, strategy, evaluated) = match resolved.len() {
            0 | 1 => ((0..resolved.len()).collect(), SearchStrategy::Trivial, 0),
            n if n <= EXHAUSTIVE_LIMIT => {
                let (order, evaluated) = search_exhaustive(&matrix);
                (order, SearchStrategy::Exhaustive, evaluated)
            }
            _ => (search_held_karp(&matrix), SearchStrategy::DynamicProgramming, 0),
        };

        debug!(
            stops = resolved.len(),
            ?strategy,
            evaluated,
            "Route search finished"
        );

        Ok(self.assemble(&resolved, &matrix, &order, strategy, evaluated))
    }

    fn assemble(
        &self,
        resolved: &[(&Customer, u32)],
        matrix: &CostMatrix,
        order: &[usize],
        strategy: SearchStrategy,
        evaluated: u64,
    ) -> RouteResult {
        let stops: Vec<RouteStop> = order
            .iter()
            .map(|&i| {
                let (customer, parcels) = resolved[i];
                RouteStop {
                    customer: customer.name.clone(),
                    area: customer.area,
                    address: customer.address.clone(),
                    parcels,
                }
            })
            .collect();

        let mut details = Vec::with_capacity(order.len());
        let mut previous: Option<usize> = None;
        for (position, &i) in order.iter().enumerate() {
            let leg = match previous {
                None => matrix.from_depot[i],
                Some(p) => matrix.between[p][i],
            };
            let (from, from_address) = match previous {
                None => (START_LABEL.to_string(), self.depot.label.clone()),
                Some(_) => (
                    stops[position - 1].customer.clone(),
                    stops[position - 1].address.clone(),
                ),
            };
            details.push(RouteLeg {
                from,
                from_address,
                to: stops[position].customer.clone(),
                to_address: stops[position].address.clone(),
                distance_km: leg.distance_km,
                duration_minutes: leg.duration_minutes,
                distance: leg.text_distance(),
                duration: leg.text_duration(),
            });
            previous = Some(i);
        }

        let total_distance_km = matrix.path_distance(order);
        let total_duration_minutes = details.iter().map(|leg| leg.duration_minutes).sum();
        let total = Leg::new(total_distance_km, total_duration_minutes);

        RouteResult {
            depot: self.depot.label.clone(),
            route: stops.iter().map(|stop| stop.customer.clone()).collect(),
            total_parcels: stops
                .iter()
                .fold(0u32, |total, stop| total.saturating_add(stop.parcels)),
            stops,
            details,
            total_distance_km,
            total_duration_minutes,
            total_distance: total.text_distance(),
            total_duration: total.text_duration(),
            strategy,
            permutations_evaluated: evaluated,
        }
    }
}
