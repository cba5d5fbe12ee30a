//! Clips and the small algebra used to make every synthesized clip animate the
//! full union of touched properties.

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    core::{Lerp, PropertyId, Value},
    error::LoweringError,
};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CurveKey {
    pub time: f64, // normalized 0..1
    pub value: Value,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Curve {
    pub property: PropertyId,
    pub keys: Vec<CurveKey>, // sorted by time
}

impl Curve {
    pub fn constant(property: PropertyId, value: Value) -> Self {
        Self {
            property,
            keys: vec![CurveKey { time: 0.0, value }],
        }
    }

    pub fn sample(&self, t: f64) -> Option<Value> {
        let first = self.keys.first()?;
        let idx = self.keys.partition_point(|k| k.time <= t);
        if idx == 0 {
            return Some(first.value.clone());
        }
        if idx >= self.keys.len() {
            return Some(self.keys[self.keys.len() - 1].value.clone());
        }

        let a = &self.keys[idx - 1];
        let b = &self.keys[idx];
        let denom = b.time - a.time;
        if denom <= 0.0 {
            return Some(a.value.clone());
        }
        Some(Value::lerp(&a.value, &b.value, (t - a.time) / denom))
    }
}

/// A named set of curves, at most one per property, ordered by property.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Clip {
    pub name: String,
    curves: Vec<Curve>,
}

impl Clip {
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            curves: Vec::new(),
        }
    }

    /// Build a clip, rejecting two curves for the same property.
    pub fn from_curves(
        name: impl Into<String>,
        curves: impl IntoIterator<Item = Curve>,
    ) -> Result<Self, LoweringError> {
        let mut by_property = BTreeMap::new();
        for curve in curves {
            if by_property.contains_key(&curve.property) {
                return Err(LoweringError::DuplicateProperty {
                    property: curve.property,
                });
            }
            by_property.insert(curve.property.clone(), curve);
        }
        Ok(Self {
            name: name.into(),
            curves: by_property.into_values().collect(),
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn curves(&self) -> &[Curve] {
        &self.curves
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    pub fn curve(&self, property: &PropertyId) -> Option<&Curve> {
        self.curves
            .binary_search_by(|c| c.property.cmp(property))
            .ok()
            .map(|i| &self.curves[i])
    }

    pub fn contains(&self, property: &PropertyId) -> bool {
        self.curve(property).is_some()
    }

    pub fn properties(&self) -> impl Iterator<Item = &PropertyId> {
        self.curves.iter().map(|c| &c.property)
    }

    pub fn value(&self, property: &PropertyId, t: f64) -> Option<Value> {
        self.curve(property)?.sample(t)
    }

    /// Every property's value at normalized time `t`.
    pub fn sample(&self, t: f64) -> BTreeMap<PropertyId, Value> {
        self.curves
            .iter()
            .filter_map(|c| Some((c.property.clone(), c.sample(t)?)))
            .collect()
    }
}

/// Every curve of `a` and `b`; `b` wins where both animate a property.
/// The result keeps `a`'s name.
pub fn union(a: &Clip, b: &Clip) -> Clip {
    let mut merged: BTreeMap<&PropertyId, &Curve> = BTreeMap::new();
    for curve in a.curves.iter().chain(b.curves.iter()) {
        merged.insert(&curve.property, curve);
    }
    Clip {
        name: a.name.clone(),
        curves: merged.into_values().cloned().collect(),
    }
}

/// Fold per-keyframe default clips left to right. Later defaults win.
pub fn restrict_to_baseline(name: impl Into<String>, defaults: &[Clip]) -> Clip {
    defaults
        .iter()
        .fold(Clip::empty(name), |acc, clip| union(&acc, clip))
}

/// Baseline everywhere, then this keyframe's changes on top.
pub fn overlay(base: &Clip, changed: &Clip) -> Clip {
    union(base, changed).with_name(changed.name.clone())
}

/// A two-key clip moving from the end state of `from` (t=0) to the start
/// state of `to` (t=1). A property animated by only one side is held.
pub fn segment(name: impl Into<String>, from: &Clip, to: &Clip) -> Clip {
    let properties: BTreeSet<&PropertyId> = from.properties().chain(to.properties()).collect();
    let curves = properties
        .into_iter()
        .filter_map(|p| {
            let start = from.value(p, 1.0).or_else(|| to.value(p, 0.0))?;
            let end = to.value(p, 0.0).unwrap_or_else(|| start.clone());
            Some(Curve {
                property: p.clone(),
                keys: vec![
                    CurveKey {
                        time: 0.0,
                        value: start,
                    },
                    CurveKey {
                        time: 1.0,
                        value: end,
                    },
                ],
            })
        })
        .collect();
    Clip {
        name: name.into(),
        curves,
    }
}
