// src/rendering/primitives.rs
//
// Scene documents: a tree of groups and typed drawable primitives, JSON
// compatible with the web viewer's scene format. Fields this crate does not
// interpret are kept in `extra` and written back unchanged.

use crate::utils::geometry::Point3;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `type` values that select a [`Primitive`] variant.
const PRIMITIVE_KINDS: [&str; 9] = [
    "spheres",
    "cylinders",
    "lines",
    "cubes",
    "ellipsoids",
    "arrows",
    "surface",
    "convex",
    "bezier",
];

/// Group node; also the document root.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Point3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lattice: Option<Vec<Point3>>,
    #[serde(default)]
    pub contents: Vec<SceneNode>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An object with a known `type` must parse as that primitive; any other
/// object is a group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SceneNode {
    Primitive(Primitive),
    Group(Scene),
    /// Anything that is not an object; carried through untouched
    Other(Value),
}

impl<'de> Deserialize<'de> for SceneNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .filter(|kind| PRIMITIVE_KINDS.contains(kind))
            .map(str::to_owned);

        match kind {
            Some(kind) => Primitive::deserialize(value)
                .map(SceneNode::Primitive)
                .map_err(|e| de::Error::custom(format!("malformed {} primitive: {}", kind, e))),
            None if value.is_object() => Scene::deserialize(value)
                .map(SceneNode::Group)
                .map_err(|e| de::Error::custom(format!("malformed group: {}", e))),
            None => Ok(SceneNode::Other(value)),
        }
    }
}

/// One drawable kind per variant, selected by the `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Primitive {
    Spheres(PointSet),
    Cylinders(PairSet),
    Lines(PointSet),
    Cubes(PointSet),
    Ellipsoids(Ellipsoids),
    Arrows(PairSet),
    Surface(PointSet),
    Convex(PointSet),
    Bezier(Bezier),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PointSet {
    #[serde(default)]
    pub positions: Vec<Point3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Point3>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contents: Vec<SceneNode>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PairSet {
    #[serde(default, rename = "positionPairs")]
    pub position_pairs: Vec<[Point3; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Point3>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contents: Vec<SceneNode>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Ellipsoids {
    #[serde(default)]
    pub positions: Vec<Point3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotate_to: Option<Vec<Point3>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Point3>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contents: Vec<SceneNode>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Bezier {
    #[serde(default, rename = "controlPoints")]
    pub control_points: Vec<Vec<Point3>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Point3>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contents: Vec<SceneNode>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Primitive {
    pub fn kind(&self) -> &'static str {
        match self {
            Primitive::Spheres(_) => "spheres",
            Primitive::Cylinders(_) => "cylinders",
            Primitive::Lines(_) => "lines",
            Primitive::Cubes(_) => "cubes",
            Primitive::Ellipsoids(_) => "ellipsoids",
            Primitive::Arrows(_) => "arrows",
            Primitive::Surface(_) => "surface",
            Primitive::Convex(_) => "convex",
            Primitive::Bezier(_) => "bezier",
        }
    }

    pub fn contents(&self) -> &[SceneNode] {
        match self {
            Primitive::Spheres(p)
            | Primitive::Lines(p)
            | Primitive::Cubes(p)
            | Primitive::Surface(p)
            | Primitive::Convex(p) => &p.contents,
            Primitive::Cylinders(p) | Primitive::Arrows(p) => &p.contents,
            Primitive::Ellipsoids(p) => &p.contents,
            Primitive::Bezier(p) => &p.contents,
        }
    }
}

/// Every primitive in the tree, in document order. A primitive comes before
/// its own children.
pub fn flatten_primitives(scene: &Scene) -> Vec<&Primitive> {
    let mut out = Vec::new();
    collect(&scene.contents, &mut out);
    out
}

fn collect<'a>(nodes: &'a [SceneNode], out: &mut Vec<&'a Primitive>) {
    for node in nodes {
        match node {
            SceneNode::Primitive(p) => {
                out.push(p);
                collect(p.contents(), out);
            }
            SceneNode::Group(group) => collect(&group.contents, out),
            SceneNode::Other(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r##"{
        "name": "root",
        "origin": [0, 0, 0],
        "contents": [
            {"name": "atoms", "visible": true, "contents": [
                {"type": "spheres", "positions": [[0, 0, 0], [1, 1, 1]], "color": "#ff0000", "radius": 0.5,
                 "clickable": true, "contents": [
                    {"type": "lines", "positions": [[0, 0, 0], [0, 0, 1]]}
                 ]}
            ]},
            {"type": "cylinders", "positionPairs": [[[0, 0, 0], [1, 0, 0]]]},
            {"type": "text", "positions": [[0, 0, 0]], "text": ["Na"]},
            {"type": "bezier", "controlPoints": [[[0, 0, 0], [1, 0, 0], [1, 1, 0]]]},
            "comment"
        ]
    }"##;

    #[test]
    fn test_parse_tree_and_flatten_in_order() {
        let scene: Scene = serde_json::from_str(DOC).unwrap();
        let kinds: Vec<&str> = flatten_primitives(&scene).iter().map(|p| p.kind()).collect();
        assert_eq!(kinds, vec!["spheres", "lines", "cylinders", "bezier"]);
        assert!(matches!(scene.contents[4], SceneNode::Other(_)));
    }

    #[test]
    fn test_unknown_fields_survive() {
        let scene: Scene = serde_json::from_str(DOC).unwrap();
        let out = serde_json::to_value(&scene).unwrap();
        assert_eq!(out["contents"][0]["visible"], Value::Bool(true));
        assert_eq!(out["contents"][0]["contents"][0]["clickable"], Value::Bool(true));
        assert_eq!(out["contents"][0]["contents"][0]["type"], "spheres");
        // an unrecognised kind is kept as a group with its type intact
        assert_eq!(out["contents"][2]["type"], "text");
        assert_eq!(out["contents"][2]["text"][0], "Na");
        assert_eq!(out["contents"][4], "comment");
    }

    #[test]
    fn test_malformed_primitive_is_an_error() {
        let bad = r#"{"contents": [{"type": "spheres", "positions": "not a list"}]}"#;
        let err = serde_json::from_str::<Scene>(bad).unwrap_err();
        assert!(err.to_string().contains("malformed spheres primitive"), "{}", err);

        let bad_pairs = r#"{"contents": [{"type": "cylinders", "positionPairs": [[[0, 0, 0]]]}]}"#;
        assert!(serde_json::from_str::<Scene>(bad_pairs).is_err());
    }

    #[test]
    fn test_primitive_origin_is_a_field() {
        let doc = r#"{"contents": [{"type": "spheres", "positions": [[1, 0, 0]], "origin": [0, 2, 0]}]}"#;
        let scene: Scene = serde_json::from_str(doc).unwrap();
        match &scene.contents[0] {
            SceneNode::Primitive(Primitive::Spheres(p)) => {
                assert_eq!(p.origin, Some([0.0, 2.0, 0.0]));
                assert!(!p.extra.contains_key("origin"));
            }
            other => panic!("expected spheres, got {:?}", other),
        }
        let out = serde_json::to_value(&scene).unwrap();
        assert_eq!(out["contents"][0]["origin"][1], 2.0);
    }
}
