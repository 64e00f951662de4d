//! Upward propagation of leaf energy types into ancestor flags
//!
//! Pure functions over id maps; nothing here talks to the service.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use log::debug;

use crate::api::Asset;
use crate::sync::CreatedAsset;

use super::types::{EnergyFlags, EnergyMap, EnergyType, ParentMap};

/// An asset with its display name and a link to its parent
pub trait HierarchyLink {
    fn asset_id(&self) -> &str;
    fn asset_name(&self) -> &str;
    fn parent_asset_id(&self) -> Option<&str>;
}

impl HierarchyLink for CreatedAsset {
    fn asset_id(&self) -> &str {
        &self.asset_id
    }

    fn asset_name(&self) -> &str {
        &self.name
    }

    fn parent_asset_id(&self) -> Option<&str> {
        Some(self.parent_id.as_str())
    }
}

impl HierarchyLink for Asset {
    fn asset_id(&self) -> &str {
        &self.id
    }

    fn asset_name(&self) -> &str {
        &self.name
    }

    fn parent_asset_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }
}

/// Ids of assets that no other asset names as its parent
pub fn identify_leaf_assets<T: HierarchyLink>(assets: &[T]) -> BTreeSet<String> {
    let parents: HashSet<&str> = assets.iter().filter_map(|a| a.parent_asset_id()).collect();

    assets
        .iter()
        .map(|a| a.asset_id())
        .filter(|id| !parents.contains(id))
        .map(str::to_string)
        .collect()
}

/// Child to parent links, leaving out roots (empty parent or `root_parent_id`)
pub fn build_parent_map<T: HierarchyLink>(assets: &[T], root_parent_id: &str) -> ParentMap {
    assets
        .iter()
        .filter_map(|a| {
            let parent = a.parent_asset_id()?;
            if parent.is_empty() || parent == root_parent_id {
                None
            } else {
                Some((a.asset_id().to_string(), parent.to_string()))
            }
        })
        .collect()
}

/// Compute flags for every ancestor reachable from a tagged asset.
///
/// A parent's flags are the union of the types known on all of its children,
/// so a type arriving through one branch is combined with types from sibling
/// branches. Every type first seen at a parent is carried on to that parent's
/// own parent, so each ancestor ends up with every type below it. Each
/// `(asset, type)` pair is walked at most once, which bounds the work and
/// terminates on cyclic parent maps.
pub fn propagate_energy_types(
    energy: &EnergyMap,
    parents: &ParentMap,
) -> BTreeMap<String, EnergyFlags> {
    let mut children: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (child, parent) in parents {
        children.entry(parent.as_str()).or_default().push(child.as_str());
    }

    let mut known: BTreeMap<String, BTreeSet<EnergyType>> = BTreeMap::new();
    for (asset, kind) in energy {
        known.entry(asset.clone()).or_default().insert(*kind);
    }

    let mut stack: Vec<(String, EnergyType)> =
        energy.iter().map(|(asset, kind)| (asset.clone(), *kind)).collect();
    let mut visited: HashSet<(String, EnergyType)> = HashSet::new();
    let mut reached: BTreeSet<String> = BTreeSet::new();

    while let Some((asset, kind)) = stack.pop() {
        let Some(parent) = parents.get(&asset) else {
            continue;
        };
        if !visited.insert((asset.clone(), kind)) {
            continue;
        }
        reached.insert(parent.clone());

        // A type new to this parent must keep climbing, whenever it arrives
        if known.entry(parent.clone()).or_default().insert(kind) {
            stack.push((parent.clone(), kind));
        }
    }

    let flags: BTreeMap<String, EnergyFlags> = reached
        .into_iter()
        .map(|parent| {
            let types = types_of_children(&children, &known, &parent);
            (parent, EnergyFlags::from_types(&types))
        })
        .collect();

    debug!("Propagated energy types to {} ancestors", flags.len());
    flags
}

fn types_of_children(
    children: &BTreeMap<&str, Vec<&str>>,
    known: &BTreeMap<String, BTreeSet<EnergyType>>,
    parent: &str,
) -> BTreeSet<EnergyType> {
    children
        .get(parent)
        .into_iter()
        .flatten()
        .filter_map(|child| known.get(*child))
        .flatten()
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created(id: &str, parent: &str) -> CreatedAsset {
        CreatedAsset {
            asset_id: id.to_string(),
            name: id.to_string(),
            parent_id: parent.to_string(),
            external_id: id.to_string(),
        }
    }

    /// plant -> areaA -> (pump1, pump2), plant -> areaB -> fan1
    fn plant() -> Vec<CreatedAsset> {
        vec![
            created("plant", "0"),
            created("areaA", "plant"),
            created("areaB", "plant"),
            created("pump1", "areaA"),
            created("pump2", "areaA"),
            created("fan1", "areaB"),
        ]
    }

    #[test]
    fn test_identify_leaves() {
        let leaves = identify_leaf_assets(&plant());
        assert_eq!(
            leaves,
            BTreeSet::from(["fan1".to_string(), "pump1".to_string(), "pump2".to_string()])
        );
    }

    #[test]
    fn test_parent_map_excludes_roots() {
        let parents = build_parent_map(&plant(), "0");
        assert_eq!(parents.len(), 5);
        assert!(!parents.contains_key("plant"));
        assert_eq!(parents["fan1"], "areaB");
    }

    #[test]
    fn test_plant_scenario() {
        let assets = plant();
        let parents = build_parent_map(&assets, "0");
        let energy = EnergyMap::from([
            ("pump1".to_string(), EnergyType::Electricity),
            ("fan1".to_string(), EnergyType::Gas),
        ]);

        let flags = propagate_energy_types(&energy, &parents);

        let plant = &flags["plant"];
        assert_eq!(plant.is_electricity, Some(true));
        assert_eq!(plant.is_gas, Some(true));

        let area_b = &flags["areaB"];
        assert_eq!(area_b.types(), BTreeSet::from([EnergyType::Gas]));
        assert_eq!(area_b.is_electricity, None);

        assert_eq!(flags["areaA"].types(), BTreeSet::from([EnergyType::Electricity]));
        assert!(!flags.contains_key("pump1"));
    }

    #[test]
    fn test_sibling_types_combine_at_shared_ancestor() {
        let parents = build_parent_map(&plant(), "0");
        let energy = EnergyMap::from([
            ("pump1".to_string(), EnergyType::Electricity),
            ("pump2".to_string(), EnergyType::Water),
        ]);

        let flags = propagate_energy_types(&energy, &parents);

        let expected = BTreeSet::from([EnergyType::Electricity, EnergyType::Water]);
        assert_eq!(flags["areaA"].types(), expected);
        assert_eq!(flags["plant"].types(), expected);
        assert!(!flags.contains_key("areaB"));
    }

    #[test]
    fn test_deep_chain_carries_every_type_to_the_top() {
        // top <- r <- x <- y <- (z1, z2)
        let assets = vec![
            created("top", "0"),
            created("r", "top"),
            created("x", "r"),
            created("y", "x"),
            created("z1", "y"),
            created("z2", "y"),
        ];
        let parents = build_parent_map(&assets, "0");
        let energy = EnergyMap::from([
            ("z1".to_string(), EnergyType::Electricity),
            ("z2".to_string(), EnergyType::Gas),
        ]);

        let flags = propagate_energy_types(&energy, &parents);

        let expected = BTreeSet::from([EnergyType::Electricity, EnergyType::Gas]);
        for ancestor in ["y", "x", "r", "top"] {
            assert_eq!(flags[ancestor].types(), expected, "ancestor {}", ancestor);
        }
        assert_eq!(flags.len(), 4);
    }

    #[test]
    fn test_types_from_separate_deep_branches_meet_at_root() {
        // site <- b1 <- m1 <- leafA, site <- b2 <- m2 <- leafB
        let assets = vec![
            created("site", "0"),
            created("b1", "site"),
            created("b2", "site"),
            created("m1", "b1"),
            created("m2", "b2"),
            created("leafA", "m1"),
            created("leafB", "m2"),
        ];
        let parents = build_parent_map(&assets, "0");
        let energy = EnergyMap::from([
            ("leafA".to_string(), EnergyType::Water),
            ("leafB".to_string(), EnergyType::Thermal),
        ]);

        let flags = propagate_energy_types(&energy, &parents);

        assert_eq!(
            flags["site"].types(),
            BTreeSet::from([EnergyType::Water, EnergyType::Thermal])
        );
        assert_eq!(flags["b1"].types(), BTreeSet::from([EnergyType::Water]));
        assert_eq!(flags["m2"].types(), BTreeSet::from([EnergyType::Thermal]));
    }

    #[test]
    fn test_propagation_is_idempotent() {
        let parents = build_parent_map(&plant(), "0");
        let energy = EnergyMap::from([
            ("pump1".to_string(), EnergyType::Electricity),
            ("pump2".to_string(), EnergyType::Thermal),
            ("fan1".to_string(), EnergyType::Gas),
        ]);

        let first = propagate_energy_types(&energy, &parents);
        let second = propagate_energy_types(&energy, &parents);
        assert_eq!(first, second);
    }

    #[test]
    fn test_cycle_terminates() {
        let parents = ParentMap::from([
            ("a".to_string(), "b".to_string()),
            ("b".to_string(), "c".to_string()),
            ("c".to_string(), "a".to_string()),
        ]);
        let energy = EnergyMap::from([("a".to_string(), EnergyType::Gas)]);

        let flags = propagate_energy_types(&energy, &parents);

        assert_eq!(flags.len(), 3);
        assert!(flags.values().all(|f| f.is_gas == Some(true)));
    }

    #[test]
    fn test_other_type_propagates_without_flags() {
        let parents = build_parent_map(&plant(), "0");
        let energy = EnergyMap::from([("fan1".to_string(), EnergyType::Other)]);

        let flags = propagate_energy_types(&energy, &parents);

        assert!(flags["areaB"].is_empty());
        assert!(flags["plant"].is_empty());
    }

    #[test]
    fn test_listed_assets_use_optional_parent() {
        let assets = vec![
            Asset {
                id: "root".to_string(),
                parent_id: None,
                ..Default::default()
            },
            Asset {
                id: "leaf".to_string(),
                parent_id: Some("root".to_string()),
                ..Default::default()
            },
        ];

        assert_eq!(identify_leaf_assets(&assets), BTreeSet::from(["leaf".to_string()]));
        assert_eq!(build_parent_map(&assets, "0").len(), 1);
    }
}
