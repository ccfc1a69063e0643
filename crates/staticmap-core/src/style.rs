//! Style sheet serialization into `style=` fragments.
//!
//! Rules use the JSON shape of the JavaScript map styling API:
//!
//! ```json
//! { "featureType": "road", "elementType": "geometry",
//!   "stylers": [ { "color": "#1a2b3c" }, { "lightness": -20 } ] }
//! ```
//!
//! Each rule becomes `style=feature:road|element:geometry|color:0x1a2b3c|lightness:-20`.
//! Later rules are emitted after earlier ones; the target API decides
//! how they combine.

use std::borrow::Cow;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One entry of a rule's `stylers` list.
///
/// Usually a single key (`{"visibility": "off"}`). Several keys are
/// emitted in the order they were written.
pub type Styler = IndexMap<String, StylerValue>;

/// A styler value as it appears in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StylerValue {
    /// `true` / `false`.
    Flag(bool),
    /// Numeric value such as lightness or weight.
    Number(f64),
    /// Color or qualitative token.
    Text(String),
}

impl fmt::Display for StylerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(flag) => write!(f, "{flag}"),
            Self::Number(number) => write!(f, "{number}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for StylerValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<f64> for StylerValue {
    fn from(number: f64) -> Self {
        Self::Number(number)
    }
}

impl From<bool> for StylerValue {
    fn from(flag: bool) -> Self {
        Self::Flag(flag)
    }
}

/// A single style rule: optional selectors plus stylers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleRule {
    /// Feature selector, e.g. `road.highway`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_type: Option<String>,
    /// Element selector, e.g. `labels.text.fill`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_type: Option<String>,
    /// Styler entries in order.
    pub stylers: Vec<Styler>,
}

impl StyleRule {
    /// Rule with no selectors.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the feature selector.
    #[must_use]
    pub fn feature(mut self, feature: impl Into<String>) -> Self {
        self.feature_type = Some(feature.into());
        self
    }

    /// Set the element selector.
    #[must_use]
    pub fn element(mut self, element: impl Into<String>) -> Self {
        self.element_type = Some(element.into());
        self
    }

    /// Append a single-key styler.
    #[must_use]
    pub fn styler(mut self, key: impl Into<String>, value: impl Into<StylerValue>) -> Self {
        self.stylers
            .push(IndexMap::from([(key.into(), value.into())]));
        self
    }

    /// Ordered `key:value` parameters for this rule, or `None` if the
    /// rule has no stylers.
    ///
    /// A key repeated across stylers keeps its first position and takes
    /// the last value.
    #[must_use]
    pub fn params(&self) -> Option<Vec<(String, String)>> {
        if self.stylers.iter().all(IndexMap::is_empty) {
            return None;
        }

        let mut params: Vec<(String, String)> = Vec::new();
        if let Some(feature) = &self.feature_type {
            params.push(("feature".to_owned(), feature.clone()));
        }
        if let Some(element) = &self.element_type {
            params.push(("element".to_owned(), element.clone()));
        }

        for (key, value) in self.stylers.iter().flatten() {
            let value = rewrite_color(&value.to_string()).into_owned();
            match params.iter_mut().find(|(k, _)| k == key) {
                Some(slot) => slot.1 = value,
                None => params.push((key.clone(), value)),
            }
        }

        Some(params)
    }
}

/// Serialize rules into `style=...` fragments joined with `&`.
///
/// Rules without stylers are omitted entirely. An empty rule list
/// yields an empty string.
#[must_use]
pub fn serialize_styles(rules: &[StyleRule]) -> String {
    let fragments: Vec<String> = rules
        .iter()
        .filter_map(StyleRule::params)
        .map(|params| format!("style={}", join_params(&params)))
        .collect();
    fragments.join("&")
}

/// Rewrite `#rrggbb` colors to the `0xrrggbb` form the URL API expects.
///
/// Triggers when the value contains a `#` followed by six hex digits
/// (either case); every `#` is then replaced. Anything else passes
/// through untouched.
#[must_use]
pub fn rewrite_color(value: &str) -> Cow<'_, str> {
    let has_hex_color = value
        .as_bytes()
        .windows(7)
        .any(|w| w[0] == b'#' && w[1..].iter().all(u8::is_ascii_hexdigit));

    if has_hex_color {
        Cow::Owned(value.replace('#', "0x"))
    } else {
        Cow::Borrowed(value)
    }
}

/// Join `key:value` pairs with `|`, form-urlencoding each value.
pub(crate) fn join_params<K, V>(params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    params
        .iter()
        .map(|(key, value)| {
            let escaped: String =
                url::form_urlencoded::byte_serialize(value.as_ref().as_bytes()).collect();
            format!("{}:{escaped}", key.as_ref())
        })
        .collect::<Vec<_>>()
        .join("|")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn rewrite_hex_color() {
        assert_eq!(rewrite_color("#1a2b3c"), "0x1a2b3c");
        assert_eq!(rewrite_color("#1A2B3C"), "0x1A2B3C");
    }

    #[test]
    fn rewrite_passes_other_values_through() {
        assert_eq!(rewrite_color("off"), "off");
        assert_eq!(rewrite_color("#abc"), "#abc");
        assert_eq!(rewrite_color("#12345g"), "#12345g");
        assert!(matches!(rewrite_color("simplified"), Cow::Borrowed(_)));
    }

    #[test]
    fn full_rule_serializes_in_order() {
        let rule = StyleRule::new()
            .feature("road.highway")
            .element("geometry")
            .styler("color", "#1a2b3c")
            .styler("visibility", "simplified");
        assert_eq!(
            serialize_styles(&[rule]),
            "style=feature:road.highway|element:geometry|color:0x1a2b3c|visibility:simplified"
        );
    }

    #[test]
    fn selectors_are_optional() {
        let rule = StyleRule::new().styler("saturation", -100.0);
        assert_eq!(serialize_styles(&[rule]), "style=saturation:-100");
    }

    #[test]
    fn rules_without_stylers_are_omitted() {
        let rules = [
            StyleRule::new().feature("poi"),
            StyleRule::new().feature("water").styler("color", "#0000ff"),
        ];
        assert_eq!(
            serialize_styles(&rules),
            "style=feature:water|color:0x0000ff"
        );
    }

    #[test]
    fn multiple_rules_join_with_ampersand() {
        let rules = [
            StyleRule::new().styler("visibility", "off"),
            StyleRule::new().feature("road").styler("visibility", "on"),
        ];
        assert_eq!(
            serialize_styles(&rules),
            "style=visibility:off&style=feature:road|visibility:on"
        );
    }

    #[test]
    fn empty_rule_list_is_empty_string() {
        assert_eq!(serialize_styles(&[]), "");
    }

    #[test]
    fn repeated_key_keeps_position_takes_last_value() {
        let rule = StyleRule::new()
            .styler("color", "#111111")
            .styler("weight", 2.0)
            .styler("color", "#222222");
        assert_eq!(
            rule.params().unwrap(),
            vec![
                ("color".to_owned(), "0x222222".to_owned()),
                ("weight".to_owned(), "2".to_owned()),
            ]
        );
    }

    #[test]
    fn values_are_form_encoded() {
        let rule = StyleRule::new().styler("label", "a b&c");
        assert_eq!(serialize_styles(&[rule]), "style=label:a+b%26c");
    }

    #[test]
    fn rules_deserialize_from_styling_json() {
        let json = r##"[
            {"featureType": "road", "elementType": "labels",
             "stylers": [{"visibility": "off"}, {"lightness": 20}, {"invert_lightness": true}]},
            {"stylers": [{"hue": "#ff0000"}]}
        ]"##;
        let rules: Vec<StyleRule> = serde_json::from_str(json).unwrap();
        assert_eq!(
            serialize_styles(&rules),
            "style=feature:road|element:labels|visibility:off|lightness:20|invert_lightness:true\
             &style=hue:0xff0000"
        );
    }

    #[test]
    fn multi_key_styler_keeps_written_order() {
        let json = r##"[{"stylers": [{"visibility": "on", "color": "#ff0000", "lightness": -5}]}]"##;
        let rules: Vec<StyleRule> = serde_json::from_str(json).unwrap();
        assert_eq!(
            serialize_styles(&rules),
            "style=visibility:on|color:0xff0000|lightness:-5"
        );
    }
}
