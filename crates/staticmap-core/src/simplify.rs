//! Path simplification by cumulative turning angle.
//!
//! Walks the interior vertices of a path and sums the signed turning
//! angle at each one. Whenever the running sum reaches the angle
//! threshold, the vertex that crossed it is kept, together with a
//! handful of the sharpest vertices since the previous kept vertex.
//!
//! This is lossy compression tuned for long, mostly straight tracks
//! (GPS traces, road geometry). It is not a distance-based method:
//! a gentle curve whose total turn never reaches the threshold collapses
//! to its two endpoints.
//!
//! Applied by the geometry serializer to paths longer than
//! [`PathStyle::min_points_to_simplify`](crate::PathStyle::min_points_to_simplify).

use serde::{Deserialize, Serialize};

use crate::types::{Coordinate, MapError, Path};

/// Tuning knobs for [`simplify`].
///
/// Deserializes from partial JSON: any missing field keeps its default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimplificationOptions {
    /// Cumulative turn (degrees) that forces a vertex to be kept.
    pub angle_threshold: f64,

    /// Minimum turn (degrees) for an intermediate vertex to survive
    /// subdivision. Compared strictly: equal angles are dropped.
    pub subdivision_threshold: f64,

    /// Tenths of the intermediate vertices considered for subdivision.
    /// `1.0` considers one in ten, `10.0` considers all of them.
    pub precision: f64,

    /// Upper bound on intermediate vertices kept per triggered segment.
    pub max_subdivision: usize,
}

impl SimplificationOptions {
    /// Default cumulative angle threshold in degrees.
    pub const DEFAULT_ANGLE_THRESHOLD: f64 = 45.0;
    /// Default subdivision threshold in degrees.
    pub const DEFAULT_SUBDIVISION_THRESHOLD: f64 = 5.0;
    /// Default precision multiplier.
    pub const DEFAULT_PRECISION: f64 = 1.0;
    /// Default cap on extra points per segment.
    pub const DEFAULT_MAX_SUBDIVISION: usize = 8;

    /// Check that every threshold is finite and non-negative.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> Result<(), MapError> {
        let fields = [
            ("angleThreshold", self.angle_threshold),
            ("subdivisionThreshold", self.subdivision_threshold),
            ("precision", self.precision),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(MapError::InvalidConfig(format!(
                    "simplification {name} must be finite and non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for SimplificationOptions {
    fn default() -> Self {
        Self {
            angle_threshold: Self::DEFAULT_ANGLE_THRESHOLD,
            subdivision_threshold: Self::DEFAULT_SUBDIVISION_THRESHOLD,
            precision: Self::DEFAULT_PRECISION,
            max_subdivision: Self::DEFAULT_MAX_SUBDIVISION,
        }
    }
}

/// Trait for path simplification strategies.
///
/// Input: an ordered path. Output: a path with the same endpoints and a
/// subset of the interior points, in their original order.
pub trait PathSimplifier {
    /// Simplify the given path.
    fn simplify(&self, path: &Path) -> Path;
}

impl PathSimplifier for SimplificationOptions {
    fn simplify(&self, path: &Path) -> Path {
        simplify(path, self)
    }
}

/// Reduce a dense path to the vertices that carry its shape.
///
/// The first and last points are always kept. Paths with fewer than two
/// points are returned unchanged.
///
/// Coincident consecutive points are not an error: the bearing between
/// identical points is `atan2(0, 0) = 0`, so they contribute a
/// deterministic (possibly large) turning angle.
#[must_use = "returns the simplified path"]
pub fn simplify(path: &Path, options: &SimplificationOptions) -> Path {
    let points = path.points();
    let n = points.len();
    if n < 2 {
        return path.clone();
    }

    let mut kept: Vec<Coordinate> = Vec::with_capacity(n.min(64));
    kept.push(points[0]);

    // Absolute turning angle per vertex, indexed like `points`.
    let mut turns = vec![0.0_f64; n];
    let mut cumulative = 0.0_f64;
    let mut last_trigger = 0;

    for index in 1..n - 1 {
        let angle = turning_angle(points[index - 1], points[index], points[index + 1]);
        turns[index] = angle.abs();
        cumulative += angle;

        if cumulative.abs() >= options.angle_threshold {
            let between = last_trigger + 1..index;
            kept.extend(
                subdivide(&turns, between, options)
                    .into_iter()
                    .map(|i| points[i]),
            );
            kept.push(points[index]);
            last_trigger = index;
            cumulative = 0.0;
        }
    }

    kept.push(points[n - 1]);

    tracing::trace!(
        before = n,
        after = kept.len(),
        "simplified path by cumulative turning angle"
    );

    Path::new(kept)
}

/// Pick the sharpest vertices in `range` worth keeping, in path order.
///
/// Ranks the range by absolute turn (descending, ties in path order),
/// keeps `floor(len * precision / 10)` of them capped at
/// `max_subdivision`, then drops any turn not strictly above the
/// subdivision threshold.
fn subdivide(
    turns: &[f64],
    range: std::ops::Range<usize>,
    options: &SimplificationOptions,
) -> Vec<usize> {
    let mut ranked: Vec<usize> = range.collect();
    ranked.sort_by(|&a, &b| turns[b].total_cmp(&turns[a]));

    let budget = subdivision_budget(ranked.len(), options);
    let mut chosen: Vec<usize> = ranked
        .into_iter()
        .take(budget)
        .filter(|&i| turns[i] > options.subdivision_threshold)
        .collect();
    chosen.sort_unstable();
    chosen
}

/// Number of intermediate vertices a segment of `len` may contribute.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn subdivision_budget(len: usize, options: &SimplificationOptions) -> usize {
    let raw = (len as f64 * options.precision / 10.0).floor();
    if raw <= 0.0 {
        return 0;
    }
    (raw as usize).min(options.max_subdivision)
}

/// Signed turn at `point`: incoming bearing minus outgoing bearing.
///
/// Not normalized to (-180, 180]; a path crossing the bearing seam
/// reports a turn near 360 degrees.
fn turning_angle(previous: Coordinate, point: Coordinate, next: Coordinate) -> f64 {
    bearing(previous, point) - bearing(point, next)
}

/// Direction from `a` to `b` in degrees: `atan2(dlng, dlat)`.
fn bearing(a: Coordinate, b: Coordinate) -> f64 {
    (b.lng - a.lng).atan2(b.lat - a.lat).to_degrees()
}
