//! Integration test: load a map config from JSON, add geometries, and check the assembled URL.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use staticmap_core::{
    Coordinate, GeometryKind, MapConfig, MapRequest, Path, RawGeometry, RequestBuilder, codec,
    derive_ident,
};

const CONFIG_JSON: &str = r##"{
    "key": "ABC",
    "baseUrl": "https://host/?",
    "styles": [
        {"featureType": "poi", "stylers": [{"visibility": "off"}]},
        {"featureType": "water", "elementType": "geometry", "stylers": [{"color": "#1A2B3C"}]},
        {"featureType": "transit"}
    ],
    "simplification": {"precision": 2},
    "pathStyle": {"fillOpacity": 0.5}
}"##;

fn load_config() -> MapConfig {
    serde_json::from_str(CONFIG_JSON).expect("config should parse")
}

/// Pull the raw (unescaped) `enc:` token out of every `path=` fragment.
fn encoded_tokens(url: &str) -> Vec<String> {
    url.split('&')
        .filter_map(|part| part.strip_prefix("path="))
        .filter_map(|fragment| fragment.split('|').find_map(|p| p.strip_prefix("enc:")))
        .map(|enc| {
            url::form_urlencoded::parse(format!("t={enc}").as_bytes())
                .map(|(_, v)| v.into_owned())
                .next()
                .unwrap()
        })
        .collect()
}

#[test]
fn config_json_drives_url() {
    let config = load_config();
    assert!((config.simplification.precision - 2.0).abs() < f64::EPSILON);
    assert!((config.simplification.angle_threshold - 45.0).abs() < f64::EPSILON);

    let mut builder = RequestBuilder::new(&config).unwrap();
    builder.add_marker(Coordinate::new(45.0, -73.0)).unwrap();
    let request = builder.build().unwrap();

    assert_eq!(
        request.url(),
        "https://host/?style=feature:poi|visibility:off\
         &style=feature:water|element:geometry|color:0x1A2B3C\
         &markers=45,-73&key=ABC"
    );
    assert_eq!(request.ident(), derive_ident(request.url()));
}

#[test]
fn grouped_json_geometries() {
    let config = load_config();
    let groups: serde_json::Map<String, serde_json::Value> = serde_json::from_str(
        r#"{
            "polygons": [[[0, 0], [0, 1], [1, 1]]],
            "markers": [[45, -73], [46.5, -74.25]],
            "polylines": [[[10, 10], [10.5, 10.5]]],
            "labels": [[1, 2]]
        }"#,
    )
    .unwrap();

    let groups = groups.into_iter().filter_map(|(name, value)| {
        serde_json::from_value::<Vec<RawGeometry>>(value)
            .ok()
            .map(|items| (name, items))
    });

    let mut builder = RequestBuilder::new(&config).unwrap();
    let request = builder.build_from(groups).unwrap();

    let buffer = builder.buffer();
    assert_eq!(buffer.count(GeometryKind::Polygon), 1);
    assert_eq!(buffer.count(GeometryKind::Marker), 2);
    assert_eq!(buffer.count(GeometryKind::Polyline), 1);

    let url = request.url();
    let polygon_at = url.find("path=fillcolor:0xff666680|").unwrap();
    let polyline_at = url.find("path=color:0xff0000|").unwrap();
    let markers_at = url.find("&markers=45,-73|46.5,-74.25&key=ABC").unwrap();
    assert!(polygon_at < polyline_at, "paths keep insertion order");
    assert!(polyline_at < markers_at, "markers follow paths");

    let tokens = encoded_tokens(url);
    assert_eq!(tokens.len(), 2);
    let polygon = codec::decode(&tokens[0]).unwrap();
    assert_eq!(polygon.len(), 4);
    assert_eq!(polygon.first(), polygon.last());
}

#[test]
fn dense_track_is_simplified_before_encoding() {
    let config = load_config();

    // 300 points heading north, with a right-angle corner halfway.
    let corner_lat = f64::from(149) * 0.001;
    let mut points: Vec<Coordinate> = (0..150)
        .map(|i| Coordinate::new(f64::from(i) * 0.001, 0.0))
        .collect();
    points.extend((1..=150).map(|i| Coordinate::new(corner_lat, f64::from(i) * 0.001)));
    let track = Path::new(points);

    let mut builder = RequestBuilder::new(&config).unwrap();
    builder.add_polyline(track.clone()).unwrap();
    let url = builder.url().unwrap();

    let tokens = encoded_tokens(&url);
    let decoded = codec::decode(&tokens[0]).unwrap();
    assert_eq!(decoded.len(), 3, "start, corner and end survive");
    let corner = decoded.points()[1];
    assert!((corner.lat - 0.149).abs() < 1e-9 && corner.lng.abs() < 1e-9);
    assert_eq!(decoded.first(), track.first());
    assert!((decoded.last().unwrap().lng - 0.15).abs() < 1e-9);
}

#[test]
fn builders_share_one_config() {
    let config = load_config();
    let mut a = RequestBuilder::new(&config).unwrap();
    let mut b = RequestBuilder::new(&config).unwrap();
    a.add_marker(Coordinate::new(1.0, 1.0)).unwrap();
    b.add_marker(Coordinate::new(2.0, 2.0)).unwrap();

    let ra: MapRequest = a.build().unwrap();
    let rb: MapRequest = b.build().unwrap();
    assert!(ra.url().contains("markers=1,1&"));
    assert!(rb.url().contains("markers=2,2&"));
    assert_ne!(ra.ident(), rb.ident());
}
