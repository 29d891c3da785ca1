//! Property-Based Tests for the entity managers
//!
//! Uses proptest to check the dedup and ordering invariants of the favorites
//! and discovery log.

use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;

use crate::cache::{ImageCache, MemoryCacheStorage};
use crate::entities::{DiscoveryLog, Favorites, NewDiscovery};
use crate::models::Observation;
use crate::store::{MemoryKv, Records};

fn observation(id: u64) -> Observation {
    serde_json::from_value(serde_json::json!({"id": id, "taxon": {"name": "x"}})).unwrap()
}

fn managers() -> (Favorites, DiscoveryLog) {
    let records = Records::new(Arc::new(MemoryKv::new()));
    let images = ImageCache::new(Arc::new(MemoryCacheStorage::new()));
    (
        Favorites::new(records.clone()),
        DiscoveryLog::new(records, images),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Toggling the same id twice returns the list to its previous state.
    #[test]
    fn prop_toggle_pair_is_identity(
        initial in prop::collection::vec(1u64..50, 0..10),
        id in 1u64..50,
    ) {
        let (before, after) = tokio_test::block_on(async {
            let (favorites, _) = managers();
            for existing in &initial {
                if !favorites.contains(*existing).await.unwrap() {
                    favorites.toggle(&observation(*existing)).await.unwrap();
                }
            }
            let before = favorites.list().await.unwrap();
            favorites.toggle(&observation(id)).await.unwrap();
            favorites.toggle(&observation(id)).await.unwrap();
            (before, favorites.list().await.unwrap())
        });

        prop_assert_eq!(before, after);
    }

    // Any toggle sequence keeps at most one favorite per id.
    #[test]
    fn prop_favorites_unique(ids in prop::collection::vec(1u64..20, 0..40)) {
        let list = tokio_test::block_on(async {
            let (favorites, _) = managers();
            for id in &ids {
                favorites.toggle(&observation(*id)).await.unwrap();
            }
            favorites.list().await.unwrap()
        });

        let unique: HashSet<u64> = list.iter().map(|f| f.id).collect();
        prop_assert_eq!(unique.len(), list.len());
        // An id ends up favorited iff it was toggled an odd number of times
        for id in unique {
            let toggles = ids.iter().filter(|&&i| i == id).count();
            prop_assert_eq!(toggles % 2, 1);
        }
    }

    // The log holds one entry per distinct scientific name, newest first.
    #[test]
    fn prop_discovery_dedup_by_scientific_name(
        names in prop::collection::vec("[A-E] [a-c]", 0..20),
    ) {
        let entries = tokio_test::block_on(async {
            let (_, log) = managers();
            for (i, name) in names.iter().enumerate() {
                log.add(NewDiscovery {
                    nom: format!("common {}", i),
                    nom_sci: name.clone(),
                    image: None,
                })
                .await
                .unwrap();
            }
            log.list().await.unwrap()
        });

        let mut first_seen: Vec<&String> = Vec::new();
        for name in &names {
            if !first_seen.contains(&name) {
                first_seen.push(name);
            }
        }
        let logged: Vec<&String> = entries.iter().map(|e| &e.nom_sci).collect();
        let expected: Vec<&String> = first_seen.into_iter().rev().collect();
        prop_assert_eq!(logged, expected);

        // First add wins: every entry keeps the common name of its first add
        for entry in &entries {
            let first = names.iter().position(|n| n == &entry.nom_sci).unwrap();
            prop_assert_eq!(&entry.nom, &format!("common {}", first));
        }
    }
}
