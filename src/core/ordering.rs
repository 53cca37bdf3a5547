use std::iter::once;

use itertools::Itertools;

use crate::{
    core::route::FALLBACK_SPEED_MPH,
    geo::Coordinates,
    prelude::*,
    quantity::time::Minutes,
};

/// Up to this many waypoints after the start are ordered by trying every permutation.
pub const MAX_EXHAUSTIVE_WAYPOINTS: usize = 7;

/// Arriving with less slack than this before the window closes counts as a tight window.
pub const TIGHT_SLACK: Minutes = Minutes(15.0);

const WAIT_WEIGHT: f64 = 2.0;
const LATE_WEIGHT: f64 = 10_000.0;
const TIGHT_WINDOW_PENALTY: f64 = 25.0;

/// Arrival window in minutes after the departure from the first waypoint.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TimeWindow {
    pub earliest: Minutes,
    pub latest: Minutes,
}

impl TimeWindow {
    pub fn new(earliest: Minutes, latest: Minutes) -> Result<Self> {
        ensure!(earliest <= latest, "the window closes before it opens: {earliest}..{latest}");
        Ok(Self { earliest, latest })
    }
}

#[must_use]
#[derive(Clone, Debug, bon::Builder)]
pub struct Waypoint {
    #[builder(into)]
    pub label: String,

    pub location: Coordinates,

    /// Time spent at the waypoint.
    #[builder(default)]
    pub dwell: Minutes,

    pub window: Option<TimeWindow>,
}

/// Square matrix of travel times between waypoints.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct TravelTimes {
    n_points: usize,

    /// Row-major.
    minutes: Vec<Minutes>,
}

impl TravelTimes {
    /// Rough travel times from straight-line distances, for when routing is unavailable.
    pub fn estimate(points: &[Coordinates]) -> Self {
        let minutes = points
            .iter()
            .cartesian_product(points)
            .map(|(from, to)| Minutes::from_hours(from.road_distance(*to).0 / FALLBACK_SPEED_MPH))
            .collect();
        Self { n_points: points.len(), minutes }
    }

    pub const fn len(&self) -> usize {
        self.n_points
    }

    pub fn get(&self, from: usize, to: usize) -> Minutes {
        self.minutes[from * self.n_points + to]
    }
}

impl TryFrom<Vec<Vec<Minutes>>> for TravelTimes {
    type Error = Error;

    fn try_from(rows: Vec<Vec<Minutes>>) -> Result<Self> {
        let n_points = rows.len();
        ensure!(
            rows.iter().all(|row| row.len() == n_points),
            "the travel time matrix must be {n_points}×{n_points}",
        );
        let minutes: Vec<Minutes> = rows.into_iter().flatten().collect();
        ensure!(
            minutes.iter().all(|minutes| minutes.0.is_finite() && *minutes >= Minutes::ZERO),
            "travel times must be finite and non-negative",
        );
        Ok(Self { n_points, minutes })
    }
}

#[must_use]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Cost {
    pub travel: Minutes,
    pub dwell: Minutes,
    pub wait: Minutes,
    pub late: Minutes,
    pub n_tight_windows: usize,
}

impl Cost {
    #[must_use]
    pub fn score(&self) -> f64 {
        #[expect(clippy::cast_precision_loss)]
        let n_tight_windows = self.n_tight_windows as f64;
        self.travel.0
            + self.dwell.0
            + WAIT_WEIGHT * self.wait.0
            + LATE_WEIGHT * self.late.0
            + TIGHT_WINDOW_PENALTY * n_tight_windows
    }

    #[must_use]
    pub fn is_on_time(&self) -> bool {
        self.late <= Minutes::ZERO
    }
}

/// Visiting order with its timeline.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct StopOrder {
    /// Waypoint indices, starting with `0`.
    pub order: Vec<usize>,

    /// Arrival time at each waypoint of the order, in minutes after departure.
    pub arrivals: Vec<Minutes>,

    pub cost: Cost,
}

impl StopOrder {
    fn simulate(order: Vec<usize>, waypoints: &[Waypoint], travel_times: &TravelTimes) -> Self {
        let mut cost = Cost::default();
        let mut arrivals = Vec::with_capacity(order.len());
        let mut clock = Minutes::ZERO;
        let mut previous = None;
        for &index in &order {
            if let Some(previous) = previous {
                let travel = travel_times.get(previous, index);
                cost.travel += travel;
                clock += travel;
            }
            previous = Some(index);
            arrivals.push(clock);

            let waypoint = &waypoints[index];
            if let Some(window) = waypoint.window {
                if clock < window.earliest {
                    cost.wait += window.earliest - clock;
                    clock = window.earliest;
                }
                if clock > window.latest {
                    cost.late += clock - window.latest;
                } else if window.latest - clock < TIGHT_SLACK {
                    cost.n_tight_windows += 1;
                }
            }
            cost.dwell += waypoint.dwell;
            clock += waypoint.dwell;
        }
        Self { order, arrivals, cost }
    }

    /// Total time from the departure until leaving the last waypoint.
    pub fn duration(&self) -> Minutes {
        self.cost.travel + self.cost.dwell + self.cost.wait
    }
}

/// Find the cheapest visiting order, the first waypoint being fixed as the start.
#[instrument(skip_all, name = "Ordering the stops…", fields(n_waypoints = waypoints.len()))]
pub fn optimize(waypoints: &[Waypoint], travel_times: &TravelTimes) -> Result<StopOrder> {
    ensure!(!waypoints.is_empty(), "at least the starting waypoint is required");
    ensure!(
        travel_times.len() == waypoints.len(),
        "expected {} travel time rows, got {}",
        waypoints.len(),
        travel_times.len(),
    );
    let n_free = waypoints.len() - 1;
    let best = if n_free <= MAX_EXHAUSTIVE_WAYPOINTS {
        exhaustive(waypoints, travel_times)
    } else {
        greedy(waypoints, travel_times)
    };
    info!(score = best.cost.score(), is_on_time = best.cost.is_on_time(), "Ordered");
    Ok(best)
}

/// Try every order, an on-time one wins over any late one.
fn exhaustive(waypoints: &[Waypoint], travel_times: &TravelTimes) -> StopOrder {
    let n_free = waypoints.len() - 1;
    let mut best: Option<StopOrder> = None;
    let mut best_on_time: Option<StopOrder> = None;
    for permutation in (1..waypoints.len()).permutations(n_free) {
        let order = once(0).chain(permutation).collect();
        let candidate = StopOrder::simulate(order, waypoints, travel_times);
        let score = candidate.cost.score();
        if candidate.cost.is_on_time()
            && best_on_time.as_ref().is_none_or(|best| score < best.cost.score())
        {
            best_on_time = Some(candidate.clone());
        }
        if best.as_ref().is_none_or(|best| score < best.cost.score()) {
            best = Some(candidate);
        }
    }
    debug!(has_on_time = best_on_time.is_some(), "Tried all permutations");
    best_on_time
        .or(best)
        .unwrap_or_else(|| StopOrder::simulate(vec![0], waypoints, travel_times))
}

/// Repeatedly append the waypoint that keeps the partial order cheapest.
fn greedy(waypoints: &[Waypoint], travel_times: &TravelTimes) -> StopOrder {
    let mut order = vec![0];
    let mut unvisited: Vec<usize> = (1..waypoints.len()).collect();
    while !unvisited.is_empty() {
        let mut best: Option<(usize, f64)> = None;
        for (position, candidate) in unvisited.iter().enumerate() {
            let tentative = order.iter().copied().chain(once(*candidate)).collect();
            let score = StopOrder::simulate(tentative, waypoints, travel_times).cost.score();
            if best.is_none_or(|(_, best_score)| score < best_score) {
                best = Some((position, score));
            }
        }
        let Some((position, _)) = best else { break };
        order.push(unvisited.remove(position));
    }
    StopOrder::simulate(order, waypoints, travel_times)
}
