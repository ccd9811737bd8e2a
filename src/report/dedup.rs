//! Collapsing duplicate indications and spotting duplicate gaps.

use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

use super::models::{identity, Indication};

/// Unique indications keyed by identity, each attributed to a vehicle.
///
/// Inserting an existing key replaces the earlier entry, so attribution
/// follows the last report an indication was seen in.
#[derive(Debug, Default)]
pub struct IndicationSet<'a> {
    by_key: BTreeMap<String, (&'a Indication, Option<&'a str>)>,
}

impl<'a> IndicationSet<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an indication. Returns false when it has no identity and was skipped.
    pub fn insert(&mut self, indication: &'a Indication, vehicle: Option<&'a str>) -> bool {
        match indication.key() {
            Some(key) => {
                self.by_key.insert(key, (indication, vehicle));
                true
            }
            None => false,
        }
    }

    pub fn extend<I>(&mut self, indications: I, vehicle: Option<&'a str>)
    where
        I: IntoIterator<Item = &'a Indication>,
    {
        for indication in indications {
            self.insert(indication, vehicle);
        }
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    /// Unique indications last seen on the given vehicle.
    pub fn count_for_vehicle(&self, vehicle: &str) -> usize {
        self.by_key
            .values()
            .filter(|(_, v)| *v == Some(vehicle))
            .count()
    }
}

/// Number of distinct indication identities in a list.
pub fn unique_count(indications: &[Indication]) -> usize {
    let mut set = IndicationSet::new();
    set.extend(indications, None);
    set.len()
}

/// Number of distinct gap ids (`gap_id`, else `id`) within one report.
///
/// Gaps without any id share a single slot.
pub fn distinct_gap_ids(gaps: &[Value]) -> usize {
    gaps.iter()
        .map(|gap| identity(gap.get("gap_id")).or_else(|| identity(gap.get("id"))))
        .collect::<HashSet<_>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn indications(values: Vec<Value>) -> Vec<Indication> {
        values
            .into_iter()
            .map(|v| match v {
                Value::Object(map) => Indication(map),
                _ => unreachable!(),
            })
            .collect()
    }

    #[test]
    fn test_unique_count_excludes_anonymous() {
        let list = indications(vec![
            json!({"lisa_id": "A"}),
            json!({"lisa_id": "A"}),
            json!({"lisa_id": "B"}),
            json!({"lisa_name": "C"}),
            json!({}),
        ]);
        assert_eq!(list.len(), 5);
        assert_eq!(unique_count(&list), 3);
    }

    #[test]
    fn test_last_attribution_wins() {
        let first = indications(vec![json!({"lisa_id": "A"}), json!({"lisa_id": "B"})]);
        let second = indications(vec![json!({"lisa_id": "A"})]);

        let mut set = IndicationSet::new();
        set.extend(&first, Some("Vehicle #1"));
        set.extend(&second, Some("Vehicle #2"));

        assert_eq!(set.len(), 2);
        assert_eq!(set.count_for_vehicle("Vehicle #1"), 1);
        assert_eq!(set.count_for_vehicle("Vehicle #2"), 1);
    }

    #[test]
    fn test_insert_reports_skipped_records() {
        let list = indications(vec![json!({"lisa_name": ""})]);
        let mut set = IndicationSet::new();
        assert!(!set.insert(&list[0], None));
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn test_typed_ids_do_not_collapse() {
        let list = indications(vec![json!({"lisa_id": 17}), json!({"lisa_id": "17"})]);
        assert_eq!(unique_count(&list), 2);
    }

    #[test]
    fn test_distinct_gap_ids() {
        let gaps = vec![
            json!({"gap_id": "g1", "id": "x"}),
            json!({"gap_id": "g1", "id": "y"}),
            json!({"id": "z"}),
            json!({}),
            json!({}),
        ];
        assert_eq!(distinct_gap_ids(&gaps), 3);
        assert_eq!(distinct_gap_ids(&[]), 0);
    }

    proptest! {
        #[test]
        fn prop_unique_never_exceeds_raw(ids in proptest::collection::vec(proptest::option::of(0u8..8), 0..40)) {
            let list = indications(
                ids.iter()
                    .map(|id| match id {
                        Some(n) => json!({"lisa_id": format!("L{}", n)}),
                        None => json!({}),
                    })
                    .collect(),
            );
            let unique = unique_count(&list);
            let named: HashSet<_> = ids.iter().flatten().collect();
            prop_assert!(unique <= list.len());
            prop_assert_eq!(unique, named.len());
        }
    }
}
