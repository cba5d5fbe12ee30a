use std::collections::BTreeMap;

use crate::{
    clip::{Clip, Curve},
    core::{PropertyId, Value},
    error::LoweringError,
    model::PropertyEntry,
    source::BaselineSource,
};

/// The two clips a single preset lowers into.
#[derive(Clone, Debug, PartialEq)]
pub struct LoweredClips {
    /// Every touched property at its resting value.
    pub default: Clip,
    /// Every touched property at its declared target.
    pub changed: Clip,
}

pub fn default_clip_name(base_name: &str, index: usize) -> String {
    format!("{base_name}_{index}_Default")
}

pub fn changed_clip_name(base_name: &str, index: usize) -> String {
    format!("{base_name}_{index}_Changed")
}

/// Lower one property set. Repeated entries with equal values collapse;
/// repeated entries that disagree are rejected.
pub fn lower_property_set(
    base_name: &str,
    index: usize,
    entries: &[PropertyEntry],
    baseline: &dyn BaselineSource,
) -> Result<LoweredClips, LoweringError> {
    let mut targets: BTreeMap<&PropertyId, &Value> = BTreeMap::new();
    for entry in entries {
        match targets.get(&entry.property) {
            Some(existing) if **existing != entry.value => {
                return Err(LoweringError::DuplicateProperty {
                    property: entry.property.clone(),
                });
            }
            Some(_) => {}
            None => {
                targets.insert(&entry.property, &entry.value);
            }
        }
    }

    let mut defaults = Vec::with_capacity(targets.len());
    for property in targets.keys() {
        let value = baseline
            .baseline(property)
            .ok_or_else(|| LoweringError::MissingBaseline {
                property: (*property).clone(),
            })?;
        defaults.push(Curve::constant((*property).clone(), value));
    }

    let changed = targets
        .into_iter()
        .map(|(p, v)| Curve::constant(p.clone(), v.clone()));

    Ok(LoweredClips {
        default: Clip::from_curves(default_clip_name(base_name, index), defaults)?,
        changed: Clip::from_curves(changed_clip_name(base_name, index), changed)?,
    })
}
