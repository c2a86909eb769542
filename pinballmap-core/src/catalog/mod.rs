//! Pinball Map API records
//!
//! Serde models for the JSON documents returned by the API. Only the fields
//! the client relies on are typed; everything else is kept in `extra` so it
//! survives a trip through the cache and can be shown with `--json`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::matching::CatalogItem;

/// A machine from the catalog (`/machines.json`) or a location listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    /// Pinball Map machine id
    pub id: u64,

    /// Display name, e.g. "Medieval Madness (Remake)"
    pub name: String,

    #[serde(default)]
    pub manufacturer: Option<String>,

    #[serde(default)]
    pub year: Option<i32>,

    /// Internet Pinball Database id
    #[serde(default)]
    pub ipdb_id: Option<u64>,

    /// Remaining API fields, passed through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CatalogItem for Machine {
    fn id(&self) -> u64 {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

/// Just enough of a nested record to identify it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordRef {
    pub id: u64,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Association between a location and a machine (an "LMX")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationMachineXref {
    pub id: u64,
    pub location: RecordRef,
    pub machine: RecordRef,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Account details returned by the login and sign-up endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDetails {
    #[serde(default)]
    pub id: Option<u64>,

    #[serde(default)]
    pub username: Option<String>,

    pub email: String,

    pub authentication_token: String,
}

/// `{"machines": [...]}`
#[derive(Debug, Deserialize)]
pub(crate) struct MachinesResponse {
    pub machines: Vec<Machine>,
}

/// `{"location_machine_xrefs": [...]}`
#[derive(Debug, Deserialize)]
pub(crate) struct XrefsResponse {
    pub location_machine_xrefs: Vec<LocationMachineXref>,
}

/// Machine ids to add, remove, or leave alone so the map matches a location
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LocationDiff {
    /// Ours but not on the map
    pub add: BTreeSet<u64>,
    /// On the map but not ours
    pub remove: BTreeSet<u64>,
    /// Already listed
    pub ignore: BTreeSet<u64>,
}

impl LocationDiff {
    /// Compare our machine ids with the ids currently on the map
    pub fn between<M, P>(mine: M, on_map: P) -> Self
    where
        M: IntoIterator<Item = u64>,
        P: IntoIterator<Item = u64>,
    {
        let mine: BTreeSet<u64> = mine.into_iter().collect();
        let on_map: BTreeSet<u64> = on_map.into_iter().collect();
        Self {
            add: mine.difference(&on_map).copied().collect(),
            remove: on_map.difference(&mine).copied().collect(),
            ignore: mine.intersection(&on_map).copied().collect(),
        }
    }

    pub fn is_in_sync(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

/// Outcome of a location sync
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub added: usize,
    pub removed: usize,
    pub ignored: usize,
    /// Failure message per machine id
    pub errors: std::collections::BTreeMap<u64, String>,
    pub error_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_machine_keeps_unknown_fields() {
        let raw = json!({
            "id": 1,
            "name": "Medieval Madness",
            "manufacturer": "Williams",
            "year": 1997,
            "ipdb_id": 4032,
            "machine_group_id": null,
            "opdb_id": "G5pe4-MePZv"
        });

        let machine: Machine = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(machine.ipdb_id, Some(4032));
        assert_eq!(machine.extra["opdb_id"], "G5pe4-MePZv");
        assert_eq!(serde_json::to_value(&machine).unwrap(), raw);
    }

    #[test]
    fn test_machine_optional_fields_default() {
        let machine: Machine = serde_json::from_value(json!({"id": 7, "name": "Gorgar"})).unwrap();
        assert_eq!(machine.manufacturer, None);
        assert_eq!(machine.year, None);
        assert_eq!(machine.ipdb_id, None);
    }

    #[test]
    fn test_xref_parses_nested_ids() {
        let raw = json!({
            "location_machine_xrefs": [{
                "id": 99,
                "condition": "Flippers weak",
                "location": {"id": 12, "name": "Ground Kontrol"},
                "machine": {"id": 7, "name": "Gorgar"}
            }]
        });

        let parsed: XrefsResponse = serde_json::from_value(raw).unwrap();
        let lmx = &parsed.location_machine_xrefs[0];
        assert_eq!(lmx.id, 99);
        assert_eq!(lmx.location.id, 12);
        assert_eq!(lmx.machine.id, 7);
        assert_eq!(lmx.extra["condition"], "Flippers weak");
    }

    #[test]
    fn test_location_diff() {
        let diff = LocationDiff::between([1, 2, 3], [3, 4]);
        assert_eq!(diff.add, BTreeSet::from([1, 2]));
        assert_eq!(diff.remove, BTreeSet::from([4]));
        assert_eq!(diff.ignore, BTreeSet::from([3]));
        assert!(!diff.is_in_sync());

        let diff = LocationDiff::between([5, 5, 6], [6, 5]);
        assert!(diff.is_in_sync());
        assert_eq!(diff.ignore.len(), 2);
    }
}
