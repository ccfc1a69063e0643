//! staticmap-core: Static-map request assembly (sans-IO).
//!
//! Turns markers, polylines and polygons plus a style sheet into a
//! single static-map request URL:
//!
//! geometries -> buffer -> simplification (dense paths only) ->
//! polyline encoding -> `path=`/`markers=` fragments, and
//! style rules -> `style=` fragments, joined under the base URL with the
//! access key.
//!
//! This crate has **no I/O dependencies** -- it never fetches or renders
//! an image, and it does not check the assembled URL against the target
//! API's length limits. Loading configuration and geometry files lives
//! in `staticmap-cli`.

pub mod builder;
pub mod codec;
pub mod geometry;
pub mod request;
pub mod simplify;
pub mod style;
pub mod types;

pub use builder::{RequestBuffer, RequestBuilder};
pub use codec::DecodeError;
pub use request::{MapRequest, derive_ident};
pub use simplify::{PathSimplifier, SimplificationOptions};
pub use style::{StyleRule, StylerValue};
pub use types::{
    Coordinate, Geometry, GeometryKind, MapConfig, MapError, Path, PathStyle, RawGeometry,
};
