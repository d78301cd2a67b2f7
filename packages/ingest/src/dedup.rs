//! Grouping of parsed rows by address.
//!
//! Rows are keyed on trimmed, case-sensitive `(Address, City, State)`
//! ([`AddressKey`]). `Address 2` and `Region` do not participate, so
//! several programs in one building collapse onto a single marker. The
//! first row seen for a key supplies the composed full address, region,
//! and city/state used for geocoding.

use std::collections::BTreeMap;

use locator_geocoder::address::compose_full_address;
use locator_ingest_models::{AddressKey, AddressRecord, UniqueAddress};

/// Groups `records` into unique addresses, preserving first-seen order of
/// keys and input order of rows within each group.
///
/// Rows without a city and state are skipped; the parser never produces
/// them.
#[must_use]
pub fn deduplicate(records: Vec<AddressRecord>) -> Vec<UniqueAddress> {
    let mut index: BTreeMap<AddressKey, usize> = BTreeMap::new();
    let mut unique: Vec<UniqueAddress> = Vec::new();

    for record in records {
        if !record.is_admissible() {
            log::debug!("Skipping record '{}' without city/state", record.id());
            continue;
        }

        let key = AddressKey::from_record(&record);
        if let Some(&i) = index.get(&key) {
            unique[i].records.push(record);
            continue;
        }

        index.insert(key.clone(), unique.len());
        unique.push(UniqueAddress {
            key,
            full_address: compose_full_address(record.address(), record.address2()),
            city: record.city().to_string(),
            state: record.state().to_string(),
            region: record.region().to_string(),
            records: vec![record],
        });
    }

    log::info!("Unique locations to geocode: {}", unique.len());

    unique
}

/// Number of source rows across all groups.
#[must_use]
pub fn total_records(unique: &[UniqueAddress]) -> usize {
    unique.iter().map(|u| u.records.len()).sum()
}

#[cfg(test)]
mod tests {
    use locator_ingest_models::columns;

    use super::*;

    fn row(id: &str, address: &str, address2: &str, city: &str, state: &str) -> AddressRecord {
        AddressRecord::from_pairs([
            (columns::ID, id),
            (columns::ADDRESS, address),
            (columns::ADDRESS_2, address2),
            (columns::CITY, city),
            (columns::STATE, state),
            (columns::REGION, "East"),
        ])
    }

    #[test]
    fn groups_identical_addresses() {
        let unique = deduplicate(vec![
            row("1", "100 Main St", "", "Richmond", "VA"),
            row("2", "100 Main St", "", "Richmond", "VA"),
            row("3", "5 Oak Ave", "", "Austin", "TX"),
        ]);
        let counts: Vec<usize> = unique.iter().map(|u| u.records.len()).collect();
        assert_eq!(counts, [2, 1]);
        assert_eq!(total_records(&unique), 3);
    }

    #[test]
    fn preserves_first_seen_and_input_order() {
        let unique = deduplicate(vec![
            row("1", "B St", "", "Reno", "NV"),
            row("2", "A St", "", "Reno", "NV"),
            row("3", "B St", "", "Reno", "NV"),
            row("4", "A St", "", "Reno", "NV"),
            row("5", "B St", "", "Reno", "NV"),
        ]);
        assert_eq!(unique[0].key.address, "B St");
        assert_eq!(unique[1].key.address, "A St");
        let ids: Vec<&str> = unique[0].records.iter().map(AddressRecord::id).collect();
        assert_eq!(ids, ["1", "3", "5"]);
    }

    #[test]
    fn line_two_does_not_split_groups() {
        let unique = deduplicate(vec![
            row("1", "100 Main St", "Suite 4", "Richmond", "VA"),
            row("2", "100 Main St", "Suite 9", "Richmond", "VA"),
        ]);
        assert_eq!(unique.len(), 1);
        assert_eq!(unique[0].full_address, "100 Main St, Suite 4");
        assert_eq!(unique[0].region, "East");
    }

    #[test]
    fn case_differences_split_groups() {
        let unique = deduplicate(vec![
            row("1", "100 Main St", "", "Richmond", "VA"),
            row("2", "100 MAIN ST", "", "Richmond", "VA"),
        ]);
        assert_eq!(unique.len(), 2);
    }

    #[test]
    fn keys_are_exactly_the_distinct_triples() {
        let records = vec![
            row("1", "1 A St", "", "X", "NY"),
            row("2", "1 A St", "", "Y", "NY"),
            row("3", "1 A St", "", "X", "NJ"),
            row("4", "1 A St", "", "X", "NY"),
            row("5", "2 A St", "", "X", "NY"),
        ];
        let expected: std::collections::BTreeSet<AddressKey> =
            records.iter().map(AddressKey::from_record).collect();

        let unique = deduplicate(records);
        let actual: std::collections::BTreeSet<AddressKey> =
            unique.iter().map(|u| u.key.clone()).collect();

        assert_eq!(unique.len(), actual.len());
        assert_eq!(actual, expected);
        for u in &unique {
            for r in &u.records {
                assert_eq!(AddressKey::from_record(r), u.key);
            }
        }
    }

    #[test]
    fn skips_rows_without_city_or_state() {
        let unique = deduplicate(vec![
            row("1", "100 Main St", "", "", "VA"),
            row("2", "100 Main St", "", "Richmond", "VA"),
        ]);
        assert_eq!(total_records(&unique), 1);
    }
}
