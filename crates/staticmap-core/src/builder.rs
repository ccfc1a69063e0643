//! Request assembly: accumulate geometries, then build the URL.
//!
//! A [`RequestBuilder`] owns one [`RequestBuffer`] and borrows an
//! immutable [`MapConfig`]. Geometries are only validated when added;
//! simplification and encoding happen at build time. Builders are not
//! meant to be shared: give each logical map its own builder, and share
//! the config between them instead.

use crate::geometry::serialize_geometries;
use crate::request::MapRequest;
use crate::style::serialize_styles;
use crate::types::{Coordinate, Geometry, GeometryKind, MapConfig, MapError, Path, RawGeometry};

/// Geometries waiting to be serialized, in the order they were added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestBuffer {
    geometries: Vec<Geometry>,
}

impl RequestBuffer {
    /// All buffered geometries in insertion order.
    #[must_use]
    pub fn geometries(&self) -> &[Geometry] {
        &self.geometries
    }

    /// Returns `true` if nothing has been added.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    /// Number of buffered geometries.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.geometries.len()
    }

    /// Number of buffered geometries of the given kind.
    #[must_use]
    pub fn count(&self, kind: GeometryKind) -> usize {
        self.geometries.iter().filter(|g| g.kind() == kind).count()
    }

    pub(crate) fn push(&mut self, geometry: Geometry) {
        self.geometries.push(geometry);
    }

    fn clear(&mut self) {
        self.geometries.clear();
    }
}

/// Builds [`MapRequest`]s from buffered geometries and a map config.
///
/// `F` maps each finished [`MapRequest`] into the caller's output type;
/// [`RequestBuilder::new`] uses the identity.
///
/// # Examples
///
/// ```
/// use staticmap_core::{Coordinate, MapConfig, RequestBuilder};
///
/// let config = MapConfig {
///     base_url: "https://host/?".to_owned(),
///     ..MapConfig::new("ABC")
/// };
/// let mut builder = RequestBuilder::new(&config)?;
/// builder.add_marker(Coordinate::new(45.0, -73.0))?;
/// let request = builder.build()?;
/// assert_eq!(request.url(), "https://host/?&markers=45,-73&key=ABC");
/// # Ok::<(), staticmap_core::MapError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RequestBuilder<'c, F = fn(MapRequest) -> MapRequest> {
    config: &'c MapConfig,
    buffer: RequestBuffer,
    factory: F,
}

impl<'c> RequestBuilder<'c> {
    /// Create a builder producing plain [`MapRequest`]s.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidConfig`] if `config` fails
    /// [`MapConfig::validate`].
    pub fn new(config: &'c MapConfig) -> Result<Self, MapError> {
        Self::with_factory(config, std::convert::identity)
    }
}

impl<'c, F> RequestBuilder<'c, F> {
    /// Create a builder whose output is `factory(request)`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidConfig`] if `config` fails
    /// [`MapConfig::validate`].
    pub fn with_factory(config: &'c MapConfig, factory: F) -> Result<Self, MapError> {
        config.validate()?;
        Ok(Self {
            config,
            buffer: RequestBuffer::default(),
            factory,
        })
    }

    /// The configuration this builder draws with.
    #[must_use]
    pub const fn config(&self) -> &'c MapConfig {
        self.config
    }

    /// The geometries accumulated so far.
    #[must_use]
    pub const fn buffer(&self) -> &RequestBuffer {
        &self.buffer
    }

    /// Add a marker.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::NonFiniteCoordinate`] for NaN or infinite input,
    /// or [`MapError::CoordinateOutOfRange`] for values too large to encode.
    pub fn add_marker(&mut self, point: Coordinate) -> Result<&mut Self, MapError> {
        self.add(Geometry::Marker(point))
    }

    /// Add an open path.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::NonFiniteCoordinate`] for NaN or infinite input,
    /// or [`MapError::CoordinateOutOfRange`] for values too large to encode.
    pub fn add_polyline(&mut self, path: Path) -> Result<&mut Self, MapError> {
        self.add(Geometry::Polyline(path))
    }

    /// Add a polygon. It is closed at build time if needed.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::EmptyPolygon`] if `path` has no points, or
    /// [`MapError::NonFiniteCoordinate`] or [`MapError::CoordinateOutOfRange`]
    /// for a point that cannot be encoded.
    pub fn add_polygon(&mut self, path: Path) -> Result<&mut Self, MapError> {
        self.add(Geometry::Polygon(path))
    }

    /// Add any geometry after validating it.
    ///
    /// # Errors
    ///
    /// See [`add_marker`](Self::add_marker), [`add_polyline`](Self::add_polyline)
    /// and [`add_polygon`](Self::add_polygon).
    pub fn add(&mut self, geometry: Geometry) -> Result<&mut Self, MapError> {
        validate(&geometry)?;
        self.buffer.push(geometry);
        Ok(self)
    }

    /// Add geometries grouped by kind name.
    ///
    /// Kind names are resolved with [`GeometryKind::from_name`]; groups
    /// with unrecognized names are skipped. The whole input is validated
    /// before anything is added, so a failure leaves the buffer as it was.
    ///
    /// # Errors
    ///
    /// Returns the first [`MapError`] raised while converting or
    /// validating an item of a recognized group.
    pub fn set_geometries<I, K, V>(&mut self, groups: I) -> Result<&mut Self, MapError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: IntoIterator<Item = RawGeometry>,
    {
        let mut staged = Vec::new();
        for (name, items) in groups {
            let name = name.as_ref();
            let Some(kind) = GeometryKind::from_name(name) else {
                tracing::debug!(kind = name, "ignoring unrecognized geometry kind");
                continue;
            };
            for item in items {
                let geometry = item.into_geometry(kind)?;
                validate(&geometry)?;
                staged.push(geometry);
            }
        }

        tracing::trace!(added = staged.len(), "buffered grouped geometries");
        staged.into_iter().for_each(|g| self.buffer.push(g));
        Ok(self)
    }

    /// Consuming variant of [`set_geometries`](Self::set_geometries).
    ///
    /// # Errors
    ///
    /// Same as [`set_geometries`](Self::set_geometries).
    pub fn with_geometries<I, K, V>(mut self, groups: I) -> Result<Self, MapError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: IntoIterator<Item = RawGeometry>,
    {
        self.set_geometries(groups)?;
        Ok(self)
    }

    /// Drop every buffered geometry.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Assemble the request URL from the config and the buffer.
    ///
    /// `base_url + styles + "&" + geometries + "&key=" + key`. Either
    /// fragment may be empty.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::EmptyPolygon`] if a buffered polygon has no
    /// points.
    pub fn url(&self) -> Result<String, MapError> {
        let styles = serialize_styles(&self.config.styles);
        let geometries = serialize_geometries(&self.buffer, self.config)?;
        Ok(format!(
            "{}{styles}&{geometries}&key={}",
            self.config.base_url, self.config.key
        ))
    }

    /// Build the request with an identifier derived from the URL.
    ///
    /// # Errors
    ///
    /// Same as [`url`](Self::url).
    pub fn build<R>(&self) -> Result<R, MapError>
    where
        F: Fn(MapRequest) -> R,
    {
        self.build_with_ident(None)
    }

    /// Build the request, using `ident` when supplied.
    ///
    /// # Errors
    ///
    /// Same as [`url`](Self::url).
    pub fn build_with_ident<R>(&self, ident: Option<String>) -> Result<R, MapError>
    where
        F: Fn(MapRequest) -> R,
    {
        let request = MapRequest::new(self.url()?, ident);
        tracing::debug!(
            ident = request.ident(),
            geometries = self.buffer.len(),
            "built map request"
        );
        Ok((self.factory)(request))
    }

    /// Add grouped geometries, then build.
    ///
    /// # Errors
    ///
    /// Same as [`set_geometries`](Self::set_geometries) and
    /// [`url`](Self::url).
    pub fn build_from<R, I, K, V>(&mut self, groups: I) -> Result<R, MapError>
    where
        F: Fn(MapRequest) -> R,
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: IntoIterator<Item = RawGeometry>,
    {
        self.set_geometries(groups)?;
        self.build()
    }
}

/// Reject geometry the serializers cannot handle.
fn validate(geometry: &Geometry) -> Result<(), MapError> {
    match geometry {
        Geometry::Marker(point) => point.ensure_valid(),
        Geometry::Polyline(path) => path.ensure_valid(),
        Geometry::Polygon(path) if path.is_empty() => Err(MapError::EmptyPolygon),
        Geometry::Polygon(path) => path.ensure_valid(),
    }
}
