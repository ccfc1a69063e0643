//! Shared types for static-map request assembly.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codec;
use crate::simplify::SimplificationOptions;
use crate::style::StyleRule;

/// A geographic coordinate in degrees.
///
/// No range check is applied to latitude or longitude; the only
/// invariant the builder enforces is finiteness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl Coordinate {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Create a coordinate, rejecting values the codec cannot carry.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::NonFiniteCoordinate`] if either component is
    /// not finite, or [`MapError::CoordinateOutOfRange`] if either
    /// component is beyond [`codec::MAX_DEGREES`].
    pub fn try_new(lat: f64, lng: f64) -> Result<Self, MapError> {
        let coordinate = Self::new(lat, lng);
        coordinate.ensure_valid()?;
        Ok(coordinate)
    }

    /// Build a coordinate from a raw `[lat, lng]` array.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::MalformedCoordinate`] if `raw` does not hold
    /// exactly two values, or the errors of [`Coordinate::try_new`].
    pub fn try_from_raw(raw: &[f64]) -> Result<Self, MapError> {
        match *raw {
            [lat, lng] => Self::try_new(lat, lng),
            _ => Err(MapError::MalformedCoordinate { len: raw.len() }),
        }
    }

    /// Returns `true` if both components are finite.
    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// Returns `true` if both components fit the polyline encoding.
    #[must_use]
    pub fn is_encodable(self) -> bool {
        codec::is_encodable(self.lat) && codec::is_encodable(self.lng)
    }

    pub(crate) fn ensure_valid(self) -> Result<(), MapError> {
        let Self { lat, lng } = self;
        if !self.is_finite() {
            Err(MapError::NonFiniteCoordinate { lat, lng })
        } else if !self.is_encodable() {
            Err(MapError::CoordinateOutOfRange { lat, lng })
        } else {
            Ok(())
        }
    }
}

/// Formats as `lat,lng`, the shape used inside `markers=` fragments.
impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// An ordered sequence of coordinates.
///
/// Point order defines the shape of the polyline or polygon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Path(Vec<Coordinate>);

impl Path {
    /// Create a new path from a vector of coordinates.
    #[must_use]
    pub const fn new(points: Vec<Coordinate>) -> Self {
        Self(points)
    }

    /// Returns `true` if the path has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the path.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Coordinate> {
        self.0.first()
    }

    /// Returns the last point, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Coordinate> {
        self.0.last()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Coordinate] {
        &self.0
    }

    /// Consumes the path and returns the underlying vector of points.
    #[must_use]
    pub fn into_points(self) -> Vec<Coordinate> {
        self.0
    }

    /// Returns `true` if the path is non-empty and its first and last
    /// points are equal.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!((self.first(), self.last()), (Some(first), Some(last)) if first == last)
    }

    /// Close the path by appending a copy of the first point when the
    /// first and last points differ.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::EmptyPolygon`] if the path has no points.
    pub fn close(mut self) -> Result<Self, MapError> {
        let first = *self.first().ok_or(MapError::EmptyPolygon)?;
        if !self.is_closed() {
            self.0.push(first);
        }
        Ok(self)
    }

    /// Build a path from raw `[lat, lng]` arrays.
    ///
    /// # Errors
    ///
    /// Propagates the first error from [`Coordinate::try_from_raw`].
    pub fn try_from_raw<P: AsRef<[f64]>>(raw: &[P]) -> Result<Self, MapError> {
        raw.iter()
            .map(|p| Coordinate::try_from_raw(p.as_ref()))
            .collect()
    }

    pub(crate) fn ensure_valid(&self) -> Result<(), MapError> {
        self.0.iter().try_for_each(|c| c.ensure_valid())
    }
}

impl From<Vec<Coordinate>> for Path {
    fn from(points: Vec<Coordinate>) -> Self {
        Self(points)
    }
}

impl FromIterator<Coordinate> for Path {
    fn from_iter<I: IntoIterator<Item = Coordinate>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A typed geometry to be drawn on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    /// A single pin.
    Marker(Coordinate),
    /// An open path.
    Polyline(Path),
    /// A filled path. Closed by the serializer if the caller did not.
    Polygon(Path),
}

impl Geometry {
    /// The kind of this geometry.
    #[must_use]
    pub const fn kind(&self) -> GeometryKind {
        match self {
            Self::Marker(_) => GeometryKind::Marker,
            Self::Polyline(_) => GeometryKind::Polyline,
            Self::Polygon(_) => GeometryKind::Polygon,
        }
    }
}

/// Geometry classification used by bulk input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    /// `markers` or `points`.
    Marker,
    /// `polyline` or `polylines`.
    Polyline,
    /// `polygon` or `polygons`.
    Polygon,
}

impl GeometryKind {
    /// Resolve a bulk-input kind name.
    ///
    /// Returns `None` for names the builder does not recognize; callers
    /// skip those groups instead of failing.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "markers" | "points" => Some(Self::Marker),
            "polyline" | "polylines" => Some(Self::Polyline),
            "polygon" | "polygons" => Some(Self::Polygon),
            _ => None,
        }
    }

    /// Canonical name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Marker => "marker",
            Self::Polyline => "polyline",
            Self::Polygon => "polygon",
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An untyped bulk-input item: either a single `[lat, lng]` pair or a
/// list of pairs.
///
/// Deserializes from plain JSON arrays, so `[45, -73]` becomes
/// [`RawGeometry::Point`] and `[[0, 0], [1, 1]]` becomes
/// [`RawGeometry::Path`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawGeometry {
    /// A single coordinate pair.
    Point(Vec<f64>),
    /// A sequence of coordinate pairs.
    Path(Vec<Vec<f64>>),
}

impl RawGeometry {
    /// Convert into a typed geometry of the given kind.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::MalformedGeometry`] when the nesting does not
    /// match `kind`, or any coordinate error from the point arrays.
    pub fn into_geometry(self, kind: GeometryKind) -> Result<Geometry, MapError> {
        match (kind, self) {
            (GeometryKind::Marker, Self::Point(raw)) => {
                Coordinate::try_from_raw(&raw).map(Geometry::Marker)
            }
            (GeometryKind::Polyline, Self::Path(raw)) => {
                Path::try_from_raw(&raw).map(Geometry::Polyline)
            }
            (GeometryKind::Polygon, Self::Path(raw)) => {
                Path::try_from_raw(&raw).map(Geometry::Polygon)
            }
            (kind, _) => Err(MapError::MalformedGeometry { kind }),
        }
    }
}

/// Stroke and fill settings applied to every `path=` fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PathStyle {
    /// Stroke color as six hex digits, without prefix.
    pub color: String,
    /// Polygon fill color as six hex digits, without prefix.
    pub fill_color: String,
    /// Polygon fill opacity, 0.0 to 1.0.
    pub fill_opacity: f64,
    /// Stroke weight in pixels.
    pub weight: u32,
    /// Paths with more points than this are simplified before encoding.
    pub min_points_to_simplify: usize,
}

impl PathStyle {
    /// Default stroke color (red).
    pub const DEFAULT_COLOR: &str = "ff0000";
    /// Default polygon fill color.
    pub const DEFAULT_FILL_COLOR: &str = "ff6666";
    /// Default polygon fill opacity.
    pub const DEFAULT_FILL_OPACITY: f64 = 0.35;
    /// Default stroke weight.
    pub const DEFAULT_WEIGHT: u32 = 3;
    /// Default simplification trigger.
    pub const DEFAULT_MIN_POINTS_TO_SIMPLIFY: usize = 100;
}

impl Default for PathStyle {
    fn default() -> Self {
        Self {
            color: Self::DEFAULT_COLOR.to_owned(),
            fill_color: Self::DEFAULT_FILL_COLOR.to_owned(),
            fill_opacity: Self::DEFAULT_FILL_OPACITY,
            weight: Self::DEFAULT_WEIGHT,
            min_points_to_simplify: Self::DEFAULT_MIN_POINTS_TO_SIMPLIFY,
        }
    }
}

/// Configuration shared by every builder drawing the same kind of map.
///
/// Immutable once handed to a [`RequestBuilder`](crate::RequestBuilder);
/// several builders may borrow the same config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapConfig {
    /// API access key appended as `key=...`.
    pub key: String,
    /// Endpoint prefix, including the trailing `?`.
    pub base_url: String,
    /// Style rules, serialized in order.
    pub styles: Vec<StyleRule>,
    /// Options for simplifying dense paths.
    pub simplification: SimplificationOptions,
    /// Stroke and fill settings for paths.
    pub path_style: PathStyle,
}

impl MapConfig {
    /// Google Static Maps endpoint.
    pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/staticmap?";

    /// Default configuration with the given API key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    /// Check the invariants the serializers rely on.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidConfig`] describing the first violation.
    pub fn validate(&self) -> Result<(), MapError> {
        let style = &self.path_style;
        if !is_hex_color(&style.color) {
            return Err(MapError::InvalidConfig(format!(
                "path color {:?} is not six hex digits",
                style.color
            )));
        }
        if !is_hex_color(&style.fill_color) {
            return Err(MapError::InvalidConfig(format!(
                "fill color {:?} is not six hex digits",
                style.fill_color
            )));
        }
        if !(0.0..=1.0).contains(&style.fill_opacity) {
            return Err(MapError::InvalidConfig(format!(
                "fill opacity {} is outside 0..=1",
                style.fill_opacity
            )));
        }
        self.simplification.validate()
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            base_url: Self::DEFAULT_BASE_URL.to_owned(),
            styles: Vec::new(),
            simplification: SimplificationOptions::default(),
            path_style: PathStyle::default(),
        }
    }
}

/// Returns `true` for exactly six ASCII hex digits.
pub(crate) fn is_hex_color(value: &str) -> bool {
    value.len() == 6 && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Errors that can occur while building a map request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MapError {
    /// A polygon was given no points, so it cannot be closed.
    #[error("polygon has no points")]
    EmptyPolygon,

    /// A raw coordinate array did not hold exactly `[lat, lng]`.
    #[error("coordinate must have exactly 2 values, got {len}")]
    MalformedCoordinate {
        /// Number of values found.
        len: usize,
    },

    /// A bulk-input item had the wrong nesting for its kind.
    #[error("malformed {kind} geometry")]
    MalformedGeometry {
        /// The kind the item was filed under.
        kind: GeometryKind,
    },

    /// A coordinate component was NaN or infinite.
    #[error("coordinate ({lat}, {lng}) is not finite")]
    NonFiniteCoordinate {
        /// Latitude as given.
        lat: f64,
        /// Longitude as given.
        lng: f64,
    },

    /// A coordinate component is too large to polyline-encode.
    #[error("coordinate ({lat}, {lng}) is out of encodable range")]
    CoordinateOutOfRange {
        /// Latitude as given.
        lat: f64,
        /// Longitude as given.
        lng: f64,
    },

    /// Map configuration is invalid.
    #[error("invalid map configuration: {0}")]
    InvalidConfig(String),
}
