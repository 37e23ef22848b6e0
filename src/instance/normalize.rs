//! Normalization of raw resident/hospital input into an [`Instance`].
//!
//! Raw data mirrors a two-sheet intake: residents with a comma-separated
//! preference string, hospitals with a possibly negative capacity.

use super::model::InstanceBuilder;
use super::Instance;
use crate::error::{MatchError, Result};
use log::{debug, warn};
use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A resident row as it appears in the raw input.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RawResident {
    pub name: String,
    /// Hospital identifiers separated by commas, most preferred first.
    #[cfg_attr(feature = "serde", serde(default))]
    pub preferences: String,
}

/// A hospital row as it appears in the raw input.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RawHospital {
    pub name: String,
    pub capacity: i64,
}

/// Raw, un-normalized input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RawInstance {
    pub residents: Vec<RawResident>,
    pub hospitals: Vec<RawHospital>,
}

impl RawInstance {
    pub fn with_resident(
        mut self,
        name: impl Into<String>,
        preferences: impl Into<String>,
    ) -> Self {
        self.residents.push(RawResident {
            name: name.into(),
            preferences: preferences.into(),
        });
        self
    }

    pub fn with_hospital(mut self, name: impl Into<String>, capacity: i64) -> Self {
        self.hospitals.push(RawHospital {
            name: name.into(),
            capacity,
        });
        self
    }
}

/// Normalization settings.
///
/// # Examples
///
/// ```
/// use u_rankmatch::instance::NormalizeConfig;
///
/// let config = NormalizeConfig::default()
///     .with_sentinel_name("Unmatched")
///     .with_id_pad_width(4);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeConfig {
    /// Name of the appended "unassigned" slot.
    pub sentinel_name: String,

    /// Left-pad hospital identifiers with zeros to this width.
    pub id_pad_width: Option<usize>,

    /// Sentinel capacity. `None` = resident count + 1.
    pub sentinel_capacity: Option<u32>,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            sentinel_name: "None".into(),
            id_pad_width: None,
            sentinel_capacity: None,
        }
    }
}

impl NormalizeConfig {
    pub fn with_sentinel_name(mut self, name: impl Into<String>) -> Self {
        self.sentinel_name = name.into();
        self
    }

    pub fn with_id_pad_width(mut self, width: usize) -> Self {
        self.id_pad_width = Some(width);
        self
    }

    pub fn with_sentinel_capacity(mut self, capacity: u32) -> Self {
        self.sentinel_capacity = Some(capacity);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.sentinel_name.trim().is_empty() {
            return Err(MatchError::InvalidConfig(
                "sentinel_name must not be blank".into(),
            ));
        }
        if self.id_pad_width == Some(0) {
            return Err(MatchError::InvalidConfig(
                "id_pad_width must be positive".into(),
            ));
        }
        Ok(())
    }

    fn normalize_id(&self, raw: &str) -> String {
        let id = raw.trim();
        match self.id_pad_width {
            Some(width) => format!("{id:0>width$}"),
            None => id.to_string(),
        }
    }
}

/// Normalizes raw input and builds a validated [`Instance`].
///
/// Hospital identifiers are trimmed (and padded when configured),
/// negative capacities are clipped to zero, and each preference string
/// is split on commas. Unknown or repeated hospitals are dropped from a
/// resident's list. The sentinel is appended to the slot set and to
/// every list.
///
/// # Errors
///
/// [`MatchError::InvalidConfig`] for a bad config, or
/// [`MatchError::InvalidInstance`] when names collide (including a
/// hospital named like the sentinel) or the instance is otherwise invalid.
pub fn normalize(raw: &RawInstance, config: &NormalizeConfig) -> Result<Instance> {
    config.validate()?;

    let sentinel = config.sentinel_name.trim().to_string();
    let mut builder = InstanceBuilder::new();
    let mut known: HashSet<String> = HashSet::with_capacity(raw.hospitals.len());

    for hospital in &raw.hospitals {
        let id = config.normalize_id(&hospital.name);
        if id == sentinel {
            return Err(MatchError::InvalidInstance(format!(
                "hospital {id:?} collides with the sentinel name"
            )));
        }
        let capacity = hospital.capacity.clamp(0, u32::MAX as i64) as u32;
        if hospital.capacity < 0 {
            debug!("clipping capacity of {id} from {} to 0", hospital.capacity);
        }
        known.insert(id.clone());
        builder = builder.with_slot(id, capacity);
    }

    let sentinel_capacity = config
        .sentinel_capacity
        .unwrap_or(raw.residents.len() as u32 + 1);
    builder = builder.with_sentinel(sentinel, sentinel_capacity);

    let mut dropped = 0usize;
    for resident in &raw.residents {
        let name = resident.name.trim().to_string();
        let mut seen = HashSet::new();
        let mut list = Vec::new();
        for token in resident.preferences.split(',') {
            if token.trim().is_empty() {
                continue;
            }
            let id = config.normalize_id(token);
            if !known.contains(&id) || !seen.insert(id.clone()) {
                dropped += 1;
                continue;
            }
            list.push(id);
        }
        builder = builder.with_agent(name, list);
    }

    if dropped > 0 {
        warn!("dropped {dropped} unknown or repeated hospital preferences");
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawInstance {
        RawInstance::default()
            .with_hospital(" 12 ", 2)
            .with_hospital("7", -3)
            .with_hospital("0099", 1)
            .with_resident(" r1 ", "12, 7,99")
            .with_resident("r2", "7,,12,12,unknown")
            .with_resident("r3", "")
    }

    #[test]
    fn test_padding_and_clipping() {
        let config = NormalizeConfig::default().with_id_pad_width(4);
        let inst = normalize(&raw(), &config).unwrap();

        let names: Vec<&str> = inst.slots().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["0012", "0007", "0099", "None"]);
        assert_eq!(inst.slots()[1].capacity, 0);
        assert_eq!(inst.slots()[3].capacity, 4);
        assert_eq!(inst.agents()[0], "r1");
    }

    #[test]
    fn test_filters_unknown_and_repeated() {
        let config = NormalizeConfig::default().with_id_pad_width(4);
        let inst = normalize(&raw(), &config).unwrap();

        let r2 = inst.agent_index("r2").unwrap();
        let slots: Vec<&str> = inst
            .edges_of_agent(r2)
            .iter()
            .map(|&e| inst.slots()[inst.edges()[e].slot].name.as_str())
            .collect();
        assert_eq!(slots, vec!["0007", "0012", "None"]);

        let r3 = inst.agent_index("r3").unwrap();
        assert_eq!(inst.edges_of_agent(r3).len(), 1);
    }

    #[test]
    fn test_without_padding_keeps_ids() {
        let inst = normalize(&raw(), &NormalizeConfig::default()).unwrap();
        let r1 = inst.agent_index("r1").unwrap();
        // "99" does not match "0099" without padding.
        assert_eq!(inst.edges_of_agent(r1).len(), 3);
    }

    #[test]
    fn test_sentinel_collision() {
        let raw = RawInstance::default()
            .with_hospital("None", 1)
            .with_resident("r1", "None");
        let err = normalize(&raw, &NormalizeConfig::default()).unwrap_err();
        assert!(matches!(err, MatchError::InvalidInstance(_)));
    }

    #[test]
    fn test_custom_sentinel_capacity() {
        let config = NormalizeConfig::default()
            .with_sentinel_name("Unmatched")
            .with_sentinel_capacity(100);
        let inst = normalize(&raw(), &config).unwrap();
        let s = inst.sentinel();
        assert_eq!(inst.slots()[s].name, "Unmatched");
        assert_eq!(inst.slots()[s].capacity, 100);
    }

    #[test]
    fn test_invalid_config() {
        assert!(NormalizeConfig::default()
            .with_sentinel_name("  ")
            .validate()
            .is_err());
        assert!(NormalizeConfig::default()
            .with_id_pad_width(0)
            .validate()
            .is_err());
    }
}
