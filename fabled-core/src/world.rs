//! # World model
//!
//! A traversable object/location view built from the interpreter's raw
//! snapshot. The model is rebuilt whole after every state change - it is
//! never patched incrementally, so its staleness is bounded by the last
//! engine call that produced it. Nothing here is fabricated: every object,
//! attribute, and exit comes from an interpreter-reported fact.

use crate::engine::{Attribute, Direction, ObjectId, RawSnapshot};
use crate::error::{self, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ============================================================================
// Model types
// ============================================================================

/// The single owner of a non-room object: the room it lies in, or the object
/// (container, supporter, or the player) that holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Owner {
    Location(ObjectId),
    Object(ObjectId),
}

impl Owner {
    pub fn id(&self) -> ObjectId {
        match self {
            Owner::Location(id) | Owner::Object(id) => *id,
        }
    }
}

/// A non-room object in the world tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldObject {
    pub id: ObjectId,
    pub name: String,
    pub owner: Owner,
    pub attributes: BTreeSet<Attribute>,
    /// Objects contained within this one (ownership)
    pub children: Vec<ObjectId>,
}

impl WorldObject {
    pub fn has(&self, attr: Attribute) -> bool {
        self.attributes.contains(&attr)
    }

    /// Contents are visible and reachable (open container, or not a
    /// container at all)
    pub fn exposes_contents(&self) -> bool {
        !self.has(Attribute::Container) || self.has(Attribute::Open)
    }
}

/// A room. Exits cover only edges the interpreter has disclosed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: ObjectId,
    pub name: String,
    pub exits: BTreeMap<Direction, ObjectId>,
    /// Objects lying directly in this room (references, not ownership)
    pub objects: Vec<ObjectId>,
}

/// The world as of one snapshot
#[derive(Debug, Clone)]
pub struct WorldModel {
    objects: BTreeMap<ObjectId, WorldObject>,
    locations: BTreeMap<ObjectId, Location>,
    player: ObjectId,
    player_location: ObjectId,
    score: i32,
}

impl WorldModel {
    /// Build the model from a raw snapshot, resolving each object's single
    /// owner. Any inconsistency the interpreter should never produce -
    /// duplicate ownership, ownership cycles, rooms inside objects, objects
    /// with no owner - is an `EngineFailure`.
    pub fn from_raw(raw: &RawSnapshot) -> Result<Self> {
        let mut raws: BTreeMap<ObjectId, &crate::engine::RawObject> = BTreeMap::new();
        for obj in &raw.objects {
            if raws.insert(obj.id, obj).is_some() {
                return Err(error::engine_failure(format!(
                    "object {} reported with two owners",
                    obj.id
                ))
                .with_operation("world::from_raw"));
            }
        }

        // Ownership sanity: parents exist, rooms are roots, nothing floats,
        // and no object is its own ancestor.
        for obj in raws.values() {
            let is_room = obj.attributes.contains(&Attribute::Room);
            match obj.parent {
                Some(parent) => {
                    if is_room {
                        return Err(error::engine_failure(format!(
                            "room {} ('{}') reported as owned by object {}",
                            obj.id, obj.name, parent
                        ))
                        .with_operation("world::from_raw"));
                    }
                    if !raws.contains_key(&parent) {
                        return Err(error::engine_failure(format!(
                            "object {} ('{}') owned by unknown object {}",
                            obj.id, obj.name, parent
                        ))
                        .with_operation("world::from_raw"));
                    }
                }
                None => {
                    if !is_room {
                        return Err(error::engine_failure(format!(
                            "object {} ('{}') has no owner",
                            obj.id, obj.name
                        ))
                        .with_operation("world::from_raw"));
                    }
                }
            }

            let mut cursor = obj.parent;
            let mut hops = 0usize;
            while let Some(parent) = cursor {
                if parent == obj.id {
                    return Err(error::engine_failure(format!(
                        "object {} ('{}') is its own ancestor",
                        obj.id, obj.name
                    ))
                    .with_operation("world::from_raw"));
                }
                hops += 1;
                if hops > raws.len() {
                    return Err(error::engine_failure("ownership chain does not terminate")
                        .with_operation("world::from_raw"));
                }
                cursor = raws.get(&parent).and_then(|p| p.parent);
            }
        }

        let player_raw = raws.get(&raw.player).ok_or_else(|| {
            error::engine_failure(format!("player object {} missing from snapshot", raw.player))
                .with_operation("world::from_raw")
        })?;
        if player_raw.attributes.contains(&Attribute::Room) {
            return Err(error::engine_failure("player object is flagged as a room")
                .with_operation("world::from_raw"));
        }

        // Children, sorted by id for deterministic listings
        let mut children: BTreeMap<ObjectId, Vec<ObjectId>> = BTreeMap::new();
        for obj in raws.values() {
            if let Some(parent) = obj.parent {
                children.entry(parent).or_default().push(obj.id);
            }
        }

        let mut objects = BTreeMap::new();
        let mut locations = BTreeMap::new();
        for obj in raws.values() {
            if obj.attributes.contains(&Attribute::Room) {
                locations.insert(
                    obj.id,
                    Location {
                        id: obj.id,
                        name: obj.name.clone(),
                        exits: BTreeMap::new(),
                        objects: children.get(&obj.id).cloned().unwrap_or_default(),
                    },
                );
            } else {
                let parent = obj.parent.expect("checked above");
                let owner = if raws[&parent].attributes.contains(&Attribute::Room) {
                    Owner::Location(parent)
                } else {
                    Owner::Object(parent)
                };
                objects.insert(
                    obj.id,
                    WorldObject {
                        id: obj.id,
                        name: obj.name.clone(),
                        owner,
                        attributes: obj.attributes.iter().copied().collect(),
                        children: children.get(&obj.id).cloned().unwrap_or_default(),
                    },
                );
            }
        }

        // Disclosed exits: both endpoints must be rooms
        for exit in &raw.exits {
            let from = locations.get_mut(&exit.from).ok_or_else(|| {
                error::engine_failure(format!("exit from non-room object {}", exit.from))
                    .with_operation("world::from_raw")
            })?;
            if !raws
                .get(&exit.to)
                .map(|o| o.attributes.contains(&Attribute::Room))
                .unwrap_or(false)
            {
                return Err(error::engine_failure(format!(
                    "exit to non-room object {}",
                    exit.to
                ))
                .with_operation("world::from_raw"));
            }
            from.exits.insert(exit.direction, exit.to);
        }

        // Player's room: nearest room ancestor
        let mut cursor = player_raw.parent;
        let player_location = loop {
            match cursor {
                Some(id) if locations.contains_key(&id) => break id,
                Some(id) => cursor = raws[&id].parent,
                None => {
                    return Err(error::engine_failure("player is not inside any room")
                        .with_operation("world::from_raw"))
                }
            }
        };

        Ok(Self {
            objects,
            locations,
            player: raw.player,
            player_location,
            score: raw.score,
        })
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn player(&self) -> ObjectId {
        self.player
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn player_location(&self) -> &Location {
        &self.locations[&self.player_location]
    }

    /// Look up a discovered location
    pub fn location(&self, id: ObjectId) -> Result<&Location> {
        self.locations
            .get(&id)
            .ok_or_else(|| error::location_not_found(id).with_operation("world::location"))
    }

    /// All rooms present in this snapshot, in id order
    pub fn locations(&self) -> impl Iterator<Item = &Location> {
        self.locations.values()
    }

    /// All non-room objects, in id order
    pub fn objects(&self) -> impl Iterator<Item = &WorldObject> {
        self.objects.values()
    }

    /// Full details for one object
    pub fn object_details(&self, id: ObjectId) -> Result<&WorldObject> {
        self.objects
            .get(&id)
            .ok_or_else(|| error::object_not_found(id).with_operation("world::object_details"))
    }

    /// Objects lying directly in a room (`None` = the player's current room)
    pub fn objects_in(&self, location: Option<ObjectId>) -> Result<Vec<&WorldObject>> {
        let location = match location {
            Some(id) => self.location(id)?,
            None => self.player_location(),
        };
        Ok(location
            .objects
            .iter()
            .filter(|id| **id != self.player)
            .filter_map(|id| self.objects.get(id))
            .collect())
    }

    /// Objects held by the player (direct possessions)
    pub fn inventory(&self) -> Vec<&WorldObject> {
        self.objects
            .get(&self.player)
            .map(|p| {
                p.children
                    .iter()
                    .filter_map(|id| self.objects.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether the player directly holds this object
    pub fn is_held(&self, obj: &WorldObject) -> bool {
        obj.owner == Owner::Object(self.player)
    }

    /// Objects the player can currently interact with: everything lying in
    /// the current room or held, descending into open containers. The player
    /// avatar itself is excluded.
    pub fn reachable_objects(&self) -> Vec<&WorldObject> {
        let mut out = Vec::new();
        let mut queue: Vec<ObjectId> = self
            .player_location()
            .objects
            .iter()
            .chain(
                self.objects
                    .get(&self.player)
                    .map(|p| p.children.iter())
                    .into_iter()
                    .flatten(),
            )
            .copied()
            .filter(|id| *id != self.player)
            .collect();

        while let Some(id) = queue.pop() {
            let Some(obj) = self.objects.get(&id) else { continue };
            out.push(obj);
            if obj.exposes_contents() {
                queue.extend(obj.children.iter().copied());
            }
        }

        out.sort_by_key(|o| o.id);
        out
    }
}

// ============================================================================
// Discovered atlas
// ============================================================================

/// What one session has actually seen of the map. The world model is rebuilt
/// from each snapshot; the atlas accumulates across them, recording visited
/// rooms and the exits disclosed while standing in them.
#[derive(Debug, Clone, Default)]
pub struct DiscoveredAtlas {
    visited: BTreeMap<ObjectId, AtlasEntry>,
}

#[derive(Debug, Clone)]
struct AtlasEntry {
    name: String,
    exits: BTreeMap<Direction, ObjectId>,
}

/// Serializable rendering of the discovered subgraph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationGraph {
    pub locations: Vec<LocationNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationNode {
    pub id: ObjectId,
    pub name: String,
    pub exits: Vec<ExitEdge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitEdge {
    pub direction: Direction,
    pub to: ObjectId,
    /// Known only once the target room has been visited
    pub to_name: Option<String>,
}

impl DiscoveredAtlas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the player's current room and its disclosed exits
    pub fn observe(&mut self, model: &WorldModel) {
        let here = model.player_location();
        let entry = self
            .visited
            .entry(here.id)
            .or_insert_with(|| AtlasEntry { name: here.name.clone(), exits: BTreeMap::new() });
        entry.name = here.name.clone();
        for (direction, to) in &here.exits {
            entry.exits.insert(*direction, *to);
        }
    }

    pub fn len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.visited.contains_key(&id)
    }

    /// Forget everything (session reset)
    pub fn clear(&mut self) {
        self.visited.clear();
    }

    /// The discovered subgraph: visited rooms and their disclosed edges
    pub fn graph(&self) -> LocationGraph {
        let locations = self
            .visited
            .iter()
            .map(|(id, entry)| LocationNode {
                id: *id,
                name: entry.name.clone(),
                exits: entry
                    .exits
                    .iter()
                    .map(|(direction, to)| ExitEdge {
                        direction: *direction,
                        to: *to,
                        to_name: self.visited.get(to).map(|e| e.name.clone()),
                    })
                    .collect(),
            })
            .collect();
        LocationGraph { locations }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{RawExit, RawObject};
    use crate::error::ErrorKind;

    fn obj(id: ObjectId, name: &str, parent: Option<ObjectId>, attrs: &[Attribute]) -> RawObject {
        RawObject {
            id,
            name: name.to_string(),
            parent,
            attributes: attrs.to_vec(),
        }
    }

    fn opening_snapshot() -> RawSnapshot {
        RawSnapshot {
            player: 1,
            score: 0,
            objects: vec![
                obj(10, "West of House", None, &[Attribute::Room]),
                obj(11, "North of House", None, &[Attribute::Room]),
                obj(1, "you", Some(10), &[Attribute::Player, Attribute::Container]),
                obj(
                    20,
                    "small mailbox",
                    Some(10),
                    &[Attribute::Container, Attribute::Openable, Attribute::Open],
                ),
                obj(21, "leaflet", Some(20), &[Attribute::Takeable, Attribute::Readable]),
                obj(22, "door", Some(10), &[Attribute::Scenery]),
            ],
            exits: vec![RawExit { from: 10, direction: Direction::North, to: 11 }],
        }
    }

    #[test]
    fn test_build_resolves_owners() {
        let model = WorldModel::from_raw(&opening_snapshot()).unwrap();

        let mailbox = model.object_details(20).unwrap();
        assert_eq!(mailbox.owner, Owner::Location(10));

        let leaflet = model.object_details(21).unwrap();
        assert_eq!(leaflet.owner, Owner::Object(20));
        assert_eq!(mailbox.children, vec![21]);

        assert_eq!(model.player_location().name, "West of House");
    }

    #[test]
    fn test_objects_in_current_location() {
        let model = WorldModel::from_raw(&opening_snapshot()).unwrap();
        let here: Vec<_> = model.objects_in(None).unwrap().iter().map(|o| o.id).collect();
        assert!(!here.contains(&1), "player avatar is not listed");
        assert!(here.contains(&20));
        assert!(here.contains(&22));
        assert!(!here.contains(&21)); // inside the mailbox, not in the room
    }

    #[test]
    fn test_reachable_descends_open_containers() {
        let model = WorldModel::from_raw(&opening_snapshot()).unwrap();
        let reachable: Vec<_> = model.reachable_objects().iter().map(|o| o.id).collect();
        assert!(reachable.contains(&21), "leaflet inside open mailbox is reachable");

        // Close the mailbox: the leaflet disappears from reach
        let mut raw = opening_snapshot();
        for o in &mut raw.objects {
            if o.id == 20 {
                o.attributes.retain(|a| *a != Attribute::Open);
            }
        }
        let model = WorldModel::from_raw(&raw).unwrap();
        let reachable: Vec<_> = model.reachable_objects().iter().map(|o| o.id).collect();
        assert!(!reachable.contains(&21));
    }

    #[test]
    fn test_duplicate_owner_is_engine_failure() {
        let mut raw = opening_snapshot();
        raw.objects.push(obj(21, "leaflet", Some(10), &[Attribute::Takeable]));
        let err = WorldModel::from_raw(&raw).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EngineFailure);
    }

    #[test]
    fn test_ownership_cycle_is_engine_failure() {
        let raw = RawSnapshot {
            player: 1,
            score: 0,
            objects: vec![
                obj(10, "Vault", None, &[Attribute::Room]),
                obj(1, "you", Some(10), &[Attribute::Player]),
                obj(30, "box", Some(31), &[Attribute::Container]),
                obj(31, "bag", Some(30), &[Attribute::Container]),
            ],
            exits: vec![],
        };
        let err = WorldModel::from_raw(&raw).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EngineFailure);
    }

    #[test]
    fn test_floating_object_is_engine_failure() {
        let mut raw = opening_snapshot();
        raw.objects.push(obj(40, "ghost", None, &[Attribute::Takeable]));
        let err = WorldModel::from_raw(&raw).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EngineFailure);
    }

    #[test]
    fn test_unknown_object_lookup() {
        let model = WorldModel::from_raw(&opening_snapshot()).unwrap();
        let err = model.object_details(999).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ObjectNotFound);

        let err = model.location(999).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LocationNotFound);
    }

    #[test]
    fn test_atlas_accumulates_visits() {
        let model = WorldModel::from_raw(&opening_snapshot()).unwrap();
        let mut atlas = DiscoveredAtlas::new();
        atlas.observe(&model);

        assert_eq!(atlas.len(), 1);
        let graph = atlas.graph();
        assert_eq!(graph.locations.len(), 1);
        let node = &graph.locations[0];
        assert_eq!(node.name, "West of House");
        assert_eq!(node.exits.len(), 1);
        // North of House disclosed as an edge target but not yet visited
        assert_eq!(node.exits[0].to, 11);
        assert_eq!(node.exits[0].to_name, None);
    }

    #[test]
    fn test_atlas_clear() {
        let model = WorldModel::from_raw(&opening_snapshot()).unwrap();
        let mut atlas = DiscoveredAtlas::new();
        atlas.observe(&model);
        atlas.clear();
        assert!(atlas.is_empty());
    }
}
