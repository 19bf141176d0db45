use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{DailyRequirement, RequirementSet, VehicleRecord};

/// Date-keyed fleet snapshots, as exported by the fleet data source.
///
/// Keys are ISO dates ("2025-09-18"), so lexical order is chronological.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct FleetData {
    by_date: BTreeMap<String, Vec<VehicleRecord>>,
}

/// The snapshot chosen for a requested date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot<'a> {
    /// Key of the snapshot actually used.
    pub date: &'a str,
    pub vehicles: &'a [VehicleRecord],
    /// True when the requested date had no snapshot and the latest was used.
    pub fallback: bool,
}

impl FleetData {
    pub fn new() -> Self {
        FleetData::default()
    }

    pub fn insert(&mut self, date: impl Into<String>, vehicles: Vec<VehicleRecord>) {
        self.by_date.insert(date.into(), vehicles);
    }

    pub fn with(mut self, date: impl Into<String>, vehicles: Vec<VehicleRecord>) -> Self {
        self.insert(date, vehicles);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = &str> {
        self.by_date.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[VehicleRecord])> {
        self.by_date.iter().map(|(d, v)| (d.as_str(), v.as_slice()))
    }

    /// The snapshot for `date`, or the most recent one when `date` is absent.
    /// `None` only when there are no snapshots at all.
    pub fn snapshot(&self, date: &str) -> Option<Snapshot<'_>> {
        if let Some((key, vehicles)) = self.by_date.get_key_value(date) {
            return Some(Snapshot {
                date: key,
                vehicles,
                fallback: false,
            });
        }
        self.by_date.iter().next_back().map(|(key, vehicles)| Snapshot {
            date: key,
            vehicles,
            fallback: true,
        })
    }
}

/// Where a resolved requirement set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequirementSource {
    Request,
    Table,
    TableLatest,
    PolicyDefault,
}

/// Pick the quotas for `date`: the explicit request wins, then the table row
/// for the date, then the table's last row, then `default`.
pub fn resolve_requirements(
    explicit: Option<RequirementSet>,
    table: &[DailyRequirement],
    date: &str,
    default: RequirementSet,
) -> (RequirementSet, RequirementSource) {
    if let Some(r) = explicit {
        return (r, RequirementSource::Request);
    }
    if let Some(row) = table.iter().find(|r| r.date == date) {
        return (row.requirements, RequirementSource::Table);
    }
    match table.last() {
        Some(row) => (row.requirements, RequirementSource::TableLatest),
        None => (default, RequirementSource::PolicyDefault),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fleet() -> FleetData {
        FleetData::new()
            .with("2025-09-19", vec![VehicleRecord::new("B")])
            .with("2025-09-18", vec![VehicleRecord::new("A")])
            .with("2025-09-21", vec![VehicleRecord::new("C")])
    }

    #[test]
    fn test_snapshot_exact_date() {
        let f = fleet();
        let s = f.snapshot("2025-09-19").unwrap();
        assert_eq!(s.date, "2025-09-19");
        assert_eq!(s.vehicles[0].id, "B");
        assert!(!s.fallback);
    }

    #[test]
    fn test_snapshot_falls_back_to_latest() {
        let f = fleet();
        let s = f.snapshot("2025-09-20").unwrap();
        assert_eq!(s.date, "2025-09-21");
        assert_eq!(s.vehicles[0].id, "C");
        assert!(s.fallback);
    }

    #[test]
    fn test_snapshot_of_empty_fleet() {
        assert!(FleetData::new().snapshot("2025-09-18").is_none());
    }

    #[test]
    fn test_fleet_data_reads_date_keyed_json() {
        let f: FleetData = serde_json::from_str(
            r#"{"2025-09-18": [{"id": "T01", "fitnessScore": 0.9}], "2025-09-19": []}"#,
        )
        .unwrap();
        let dates: Vec<&str> = f.dates().collect();
        assert_eq!(dates, vec!["2025-09-18", "2025-09-19"]);
        assert_eq!(f.snapshot("2025-09-18").unwrap().vehicles[0].fitness_score, 0.9);
    }

    #[test]
    fn test_requirement_resolution_order() {
        let table = vec![
            DailyRequirement {
                date: "2025-09-18".to_string(),
                requirements: RequirementSet::new(18, 4),
            },
            DailyRequirement {
                date: "2025-09-19".to_string(),
                requirements: RequirementSet::new(16, 6),
            },
        ];
        let default = RequirementSet::new(15, 5);

        let explicit = Some(RequirementSet::new(3, 1));
        assert_eq!(
            resolve_requirements(explicit, &table, "2025-09-18", default),
            (RequirementSet::new(3, 1), RequirementSource::Request)
        );
        assert_eq!(
            resolve_requirements(None, &table, "2025-09-18", default),
            (RequirementSet::new(18, 4), RequirementSource::Table)
        );
        assert_eq!(
            resolve_requirements(None, &table, "2025-12-01", default),
            (RequirementSet::new(16, 6), RequirementSource::TableLatest)
        );
        assert_eq!(
            resolve_requirements(None, &[], "2025-12-01", default),
            (default, RequirementSource::PolicyDefault)
        );
    }
}
