//! # State fingerprinting
//!
//! Canonical SHA-256 fingerprints of world snapshots, used to answer "has
//! this exact state been seen before in this session". The rendering is
//! canonical with respect to construction order: objects, attributes, and
//! exits are folded in sorted order, so two snapshots of the same interpreter
//! state hash identically no matter how they were traversed.
//!
//! Hash equality is treated as state equality. A 256-bit digest collision is
//! accepted as negligible; no structural comparison is attempted.

use crate::world::WorldModel;
use sha2::{Digest, Sha256};

/// Stateless hasher over world models
pub struct StateHasher;

impl StateHasher {
    /// Compute the fingerprint of a world model (hex-encoded SHA-256)
    pub fn fingerprint(model: &WorldModel) -> String {
        let mut hasher = Sha256::new();

        // Objects in id order; attributes already sorted (BTreeSet)
        for obj in model.objects() {
            hasher.update(obj.id.to_le_bytes());
            hasher.update(obj.name.as_bytes());
            hasher.update([0x1f]);
            hasher.update(obj.owner.id().to_le_bytes());
            for attr in &obj.attributes {
                hasher.update([*attr as u8]);
            }
            hasher.update([0x1e]);
        }

        // Rooms and their disclosed exits, in id / direction order
        for location in model.locations() {
            hasher.update(location.id.to_le_bytes());
            hasher.update(location.name.as_bytes());
            hasher.update([0x1f]);
            for (direction, to) in &location.exits {
                hasher.update([*direction as u8]);
                hasher.update(to.to_le_bytes());
            }
            hasher.update([0x1e]);
        }

        hasher.update(model.player_location().id.to_le_bytes());
        hasher.update(model.score().to_le_bytes());

        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Attribute, Direction, RawExit, RawObject, RawSnapshot};

    fn obj(id: u32, name: &str, parent: Option<u32>, attrs: &[Attribute]) -> RawObject {
        RawObject {
            id,
            name: name.to_string(),
            parent,
            attributes: attrs.to_vec(),
        }
    }

    fn snapshot(order: &[usize]) -> RawSnapshot {
        let pool = vec![
            obj(10, "Cellar", None, &[Attribute::Room]),
            obj(11, "Gallery", None, &[Attribute::Room]),
            obj(1, "you", Some(10), &[Attribute::Player]),
            obj(20, "lamp", Some(10), &[Attribute::Takeable]),
            obj(21, "painting", Some(11), &[Attribute::Takeable]),
        ];
        RawSnapshot {
            player: 1,
            score: 5,
            objects: order.iter().map(|i| pool[*i].clone()).collect(),
            exits: vec![RawExit { from: 10, direction: Direction::Up, to: 11 }],
        }
    }

    #[test]
    fn test_deterministic() {
        let model = crate::world::WorldModel::from_raw(&snapshot(&[0, 1, 2, 3, 4])).unwrap();
        assert_eq!(StateHasher::fingerprint(&model), StateHasher::fingerprint(&model));
    }

    #[test]
    fn test_traversal_order_independent() {
        let a = crate::world::WorldModel::from_raw(&snapshot(&[0, 1, 2, 3, 4])).unwrap();
        let b = crate::world::WorldModel::from_raw(&snapshot(&[4, 3, 2, 1, 0])).unwrap();
        assert_eq!(StateHasher::fingerprint(&a), StateHasher::fingerprint(&b));
    }

    #[test]
    fn test_sensitive_to_object_moves() {
        let base = crate::world::WorldModel::from_raw(&snapshot(&[0, 1, 2, 3, 4])).unwrap();

        let mut raw = snapshot(&[0, 1, 2, 3, 4]);
        for o in &mut raw.objects {
            if o.id == 20 {
                o.parent = Some(1); // lamp picked up
            }
        }
        let moved = crate::world::WorldModel::from_raw(&raw).unwrap();

        assert_ne!(StateHasher::fingerprint(&base), StateHasher::fingerprint(&moved));
    }

    #[test]
    fn test_sensitive_to_score() {
        let base = crate::world::WorldModel::from_raw(&snapshot(&[0, 1, 2, 3, 4])).unwrap();

        let mut raw = snapshot(&[0, 1, 2, 3, 4]);
        raw.score = 6;
        let scored = crate::world::WorldModel::from_raw(&raw).unwrap();

        assert_ne!(StateHasher::fingerprint(&base), StateHasher::fingerprint(&scored));
    }
}
