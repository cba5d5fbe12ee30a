use std::fmt;

/// Stable identity of a menu-owning node.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identity of an object in the authoring hierarchy.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub String);

impl ObjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    /// Object enabled state.
    Active,
    BlendShape,
    MaterialFloat,
    MaterialVector,
}

impl PropertyKind {
    fn tag(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::BlendShape => "blendshape",
            Self::MaterialFloat => "material_float",
            Self::MaterialVector => "material_vector",
        }
    }
}

/// An animatable property: an object path, what kind of channel, and the
/// channel name (empty for `Active`).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct PropertyId {
    pub path: String,
    pub kind: PropertyKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

impl PropertyId {
    pub fn new(path: impl Into<String>, kind: PropertyKind, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            name: name.into(),
        }
    }

    pub fn active(path: impl Into<String>) -> Self {
        Self::new(path, PropertyKind::Active, "")
    }

    pub fn blend_shape(path: impl Into<String>, shape: impl Into<String>) -> Self {
        Self::new(path, PropertyKind::BlendShape, shape)
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}#{}", self.path, self.kind.tag())
        } else {
            write!(f, "{}#{}:{}", self.path, self.kind.tag(), self.name)
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Value {
    Float(f64),
    Bool(bool),
    Vector4([f64; 4]),
}

impl Value {
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Float(v) => *v,
            Self::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Vector4(v) => v[0],
        }
    }
}

pub trait Lerp: Sized {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a + (b - a) * t
    }
}

impl Lerp for [f64; 4] {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        let mut out = [0.0; 4];
        for (i, o) in out.iter_mut().enumerate() {
            *o = f64::lerp(&a[i], &b[i], t);
        }
        out
    }
}

impl Lerp for Value {
    /// Booleans step at the midpoint; mismatched kinds hold `a`.
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        match (a, b) {
            (Self::Float(x), Self::Float(y)) => Self::Float(f64::lerp(x, y, t)),
            (Self::Vector4(x), Self::Vector4(y)) => Self::Vector4(<[f64; 4]>::lerp(x, y, t)),
            (Self::Bool(_), Self::Bool(_)) => {
                if t < 0.5 {
                    a.clone()
                } else {
                    b.clone()
                }
            }
            _ => a.clone(),
        }
    }
}

/// Clamp a declared frame position into `[0, 1]`.
pub fn clamp01(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_display_is_compact() {
        assert_eq!(PropertyId::active("Body/Hat").to_string(), "Body/Hat#active");
        assert_eq!(
            PropertyId::blend_shape("Body", "smile").to_string(),
            "Body#blendshape:smile"
        );
    }

    #[test]
    fn property_order_is_path_then_kind() {
        let a = PropertyId::active("A");
        let b = PropertyId::blend_shape("A", "x");
        let c = PropertyId::active("B");
        let mut v = vec![c.clone(), b.clone(), a.clone()];
        v.sort();
        assert_eq!(v, vec![a, b, c]);
    }

    #[test]
    fn value_lerp_by_kind() {
        assert_eq!(
            Value::lerp(&Value::Float(0.0), &Value::Float(4.0), 0.25),
            Value::Float(1.0)
        );
        assert_eq!(
            Value::lerp(&Value::Bool(false), &Value::Bool(true), 0.49),
            Value::Bool(false)
        );
        assert_eq!(
            Value::lerp(&Value::Bool(false), &Value::Bool(true), 0.5),
            Value::Bool(true)
        );
        assert_eq!(
            Value::lerp(
                &Value::Vector4([0.0, 0.0, 0.0, 0.0]),
                &Value::Vector4([2.0, 4.0, 6.0, 8.0]),
                0.5
            ),
            Value::Vector4([1.0, 2.0, 3.0, 4.0])
        );
        assert_eq!(
            Value::lerp(&Value::Float(1.0), &Value::Bool(true), 0.9),
            Value::Float(1.0)
        );
    }

    #[test]
    fn clamp01_bounds() {
        assert_eq!(clamp01(-0.5), 0.0);
        assert_eq!(clamp01(0.25), 0.25);
        assert_eq!(clamp01(7.0), 1.0);
    }
}
