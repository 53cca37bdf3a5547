use crate::{
    geo::{Coordinates, ROAD_FACTOR},
    prelude::*,
    quantity::{distance::Miles, time::Minutes},
};

/// Average speed assumed when the routing service did not report a duration.
pub const FALLBACK_SPEED_MPH: f64 = 55.0;

/// What the routing service returned for an origin→destination query.
#[must_use]
#[derive(Clone, Debug, Default)]
pub struct RouteResponse {
    pub distance: Option<Miles>,
    pub duration: Option<Minutes>,
    pub polyline: Vec<Coordinates>,
}

/// Driving path with cumulative along-route mileage for each polyline sample.
#[must_use]
#[derive(Clone, Debug)]
pub struct Route {
    points: Vec<Coordinates>,

    /// Mileage from the first point, same length as `points`.
    cumulative: Vec<Miles>,

    duration: Minutes,
}

impl Route {
    /// Build the route from a routing response, falling back to a straight line.
    #[instrument(
        skip_all,
        fields(n_points = response.as_ref().map_or(0, |response| response.polyline.len())),
    )]
    pub fn new(
        origin: Coordinates,
        destination: Coordinates,
        response: Option<RouteResponse>,
    ) -> Self {
        let RouteResponse { distance, duration, polyline } = response.unwrap_or_default();
        let points = if polyline.len() < 2 {
            warn!("no usable polyline, assuming a straight line");
            vec![origin, destination]
        } else {
            polyline
        };

        let mut cumulative = Vec::with_capacity(points.len());
        let mut total = Miles::ZERO;
        cumulative.push(total);
        for (from, to) in points.iter().zip(&points[1..]) {
            total += from.haversine(*to);
            cumulative.push(total);
        }

        // Road mileage is only known for the whole route, spread it proportionally:
        let scale = match distance {
            Some(distance) if total > Miles::ZERO && distance > Miles::ZERO => distance / total,
            _ => ROAD_FACTOR,
        };
        for miles in &mut cumulative {
            *miles = *miles * scale;
        }

        let duration = duration.unwrap_or_else(|| {
            let total = cumulative.last().copied().unwrap_or_default();
            Minutes::from_hours(total.0 / FALLBACK_SPEED_MPH)
        });
        Self { points, cumulative, duration }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn last_index(&self) -> usize {
        self.points.len() - 1
    }

    pub fn point(&self, index: usize) -> Coordinates {
        self.points[index]
    }

    pub fn origin(&self) -> Coordinates {
        self.points[0]
    }

    pub fn destination(&self) -> Coordinates {
        self.points[self.last_index()]
    }

    pub fn total_distance(&self) -> Miles {
        self.cumulative[self.last_index()]
    }

    pub const fn duration(&self) -> Minutes {
        self.duration
    }

    /// Along-route distance between two polyline indices.
    pub fn distance_between(&self, from: usize, to: usize) -> Miles {
        (self.cumulative[to] - self.cumulative[from]).abs()
    }

    pub fn remaining_from(&self, index: usize) -> Miles {
        self.distance_between(index, self.last_index())
    }

    /// Walk forward from `start` while the accumulated distance stays within `budget`.
    ///
    /// # Returns
    ///
    /// The last reachable index and the distance to it.
    pub fn frontier(&self, start: usize, budget: Miles) -> (usize, Miles) {
        let index = (start + 1..self.len())
            .take_while(|index| self.distance_between(start, *index) <= budget)
            .last()
            .unwrap_or(start);
        (index, self.distance_between(start, index))
    }

    /// Find the polyline sample closest to the point.
    ///
    /// # Returns
    ///
    /// The index and the estimated road distance between the sample and the point.
    pub fn project(&self, point: Coordinates) -> (usize, Miles) {
        let (index, sample) = self
            .points
            .iter()
            .enumerate()
            .min_by_key(|(_, sample)| sample.haversine(point))
            .map(|(index, sample)| (index, *sample))
            .unwrap_or((0, self.points[0]));
        (index, sample.road_distance(point))
    }

    /// Points spread evenly by distance, endpoints included.
    pub fn sample_points(&self, n_points: usize) -> Vec<Coordinates> {
        if n_points < 2 {
            return vec![self.origin()];
        }
        #[expect(clippy::cast_precision_loss)]
        let step = self.total_distance() / (n_points - 1) as f64;
        (0..n_points)
            .map(|n| {
                #[expect(clippy::cast_precision_loss)]
                let target = step * n as f64;
                let index = (0..self.len())
                    .min_by_key(|index| (self.cumulative[*index] - target).abs())
                    .unwrap_or_default();
                self.points[index]
            })
            .collect()
    }
}
