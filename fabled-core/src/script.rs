//! # Scripted engine
//!
//! A deterministic, in-process `GameEngine` implementation driven by a
//! declarative game script. This is the slot a real interpreter binding
//! plugs into; the scripted engine exists so the session layer, tests, and
//! demos run self-contained with fully predictable observations.
//!
//! The command grammar is the small verb set the template engine generates:
//! look / inventory / go / take / drop / open / close / read / examine /
//! put-in, plus bare direction words. Parser rejections mirror the classic
//! interpreter responses ("I don't know the word ...") and do not consume
//! a turn.

use crate::engine::{
    Attribute, DictWord, Direction, GameEngine, ObjectId, RawExit, RawObject, RawSnapshot,
    StepOutcome,
};
use crate::error::{self, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

const VERBS: &[&str] = &[
    "look", "inventory", "i", "go", "take", "drop", "open", "close", "read", "examine", "put",
];

// ============================================================================
// Script definition
// ============================================================================

/// One object in a game script (rooms, items, and the player)
#[derive(Debug, Clone)]
pub struct ScriptObject {
    pub id: ObjectId,
    pub name: &'static str,
    pub parent: Option<ObjectId>,
    pub attributes: &'static [Attribute],
}

/// Declarative definition of a scripted game
#[derive(Debug, Clone)]
pub struct GameScript {
    pub id: &'static str,
    pub name: &'static str,
    pub intro: &'static str,
    pub win_text: &'static str,
    pub max_score: i32,
    pub player: ObjectId,
    pub objects: &'static [ScriptObject],
    pub exits: &'static [(ObjectId, Direction, ObjectId)],
    /// Points granted the first time an object is taken
    pub take_points: &'static [(ObjectId, i32)],
    /// Points granted the first time a room is entered
    pub visit_points: &'static [(ObjectId, i32)],
    /// Points granted the first time an object is read
    pub read_points: &'static [(ObjectId, i32)],
    /// Text revealed by read/examine
    pub texts: &'static [(ObjectId, &'static str)],
    pub walkthrough: &'static [&'static str],
}

// ============================================================================
// Mutable state
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StateObject {
    name: String,
    parent: Option<ObjectId>,
    attributes: BTreeSet<Attribute>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScriptedState {
    objects: BTreeMap<ObjectId, StateObject>,
    score: i32,
    moves: u32,
    game_over: bool,
    scored_takes: BTreeSet<ObjectId>,
    scored_reads: BTreeSet<ObjectId>,
    visited: BTreeSet<ObjectId>,
}

/// Deterministic in-process game engine
pub struct ScriptedEngine {
    script: GameScript,
    state: ScriptedState,
}

impl ScriptedEngine {
    pub fn new(script: GameScript) -> Self {
        let state = Self::initial_state(&script);
        Self { script, state }
    }

    fn initial_state(script: &GameScript) -> ScriptedState {
        let objects = script
            .objects
            .iter()
            .map(|o| {
                (
                    o.id,
                    StateObject {
                        name: o.name.to_string(),
                        parent: o.parent,
                        attributes: o.attributes.iter().copied().collect(),
                    },
                )
            })
            .collect();
        ScriptedState {
            objects,
            score: 0,
            moves: 0,
            game_over: false,
            scored_takes: BTreeSet::new(),
            scored_reads: BTreeSet::new(),
            visited: BTreeSet::new(),
        }
    }

    // ------------------------------------------------------------------
    // World queries
    // ------------------------------------------------------------------

    fn player_room(&self) -> ObjectId {
        let mut cursor = self.state.objects[&self.script.player].parent;
        while let Some(id) = cursor {
            let obj = &self.state.objects[&id];
            if obj.attributes.contains(&Attribute::Room) {
                return id;
            }
            cursor = obj.parent;
        }
        // Scripts always place the player in a room
        self.script.player
    }

    fn children_of(&self, parent: ObjectId) -> Vec<ObjectId> {
        self.state
            .objects
            .iter()
            .filter(|(_, o)| o.parent == Some(parent))
            .map(|(id, _)| *id)
            .collect()
    }

    fn exits_from(&self, room: ObjectId) -> Vec<(Direction, ObjectId)> {
        let mut exits: Vec<_> = self
            .script
            .exits
            .iter()
            .filter(|(from, _, _)| *from == room)
            .map(|(_, d, to)| (*d, *to))
            .collect();
        exits.sort_by_key(|(d, _)| *d);
        exits
    }

    /// Objects the player can refer to: room contents and held items,
    /// descending into open containers
    fn reachable(&self) -> Vec<ObjectId> {
        let mut queue: Vec<ObjectId> = self
            .children_of(self.player_room())
            .into_iter()
            .chain(self.children_of(self.script.player))
            .filter(|id| *id != self.script.player)
            .collect();
        let mut out = Vec::new();
        while let Some(id) = queue.pop() {
            out.push(id);
            let obj = &self.state.objects[&id];
            let closed_container = obj.attributes.contains(&Attribute::Container)
                && !obj.attributes.contains(&Attribute::Open);
            if !closed_container {
                queue.extend(self.children_of(id));
            }
        }
        out.sort_unstable();
        out
    }

    fn is_held(&self, id: ObjectId) -> bool {
        self.state.objects[&id].parent == Some(self.script.player)
    }

    /// Resolve a noun phrase against reachable objects: the given words must
    /// be a suffix of the object's name words (so "mailbox" matches
    /// "small mailbox"), compared after parser truncation.
    fn resolve_noun(&self, words: &[&str]) -> Option<ObjectId> {
        if words.is_empty() {
            return None;
        }
        let wl = self.word_length();
        let wanted: Vec<String> = words.iter().map(|w| truncate(w, wl)).collect();
        self.reachable().into_iter().find(|id| {
            let name_words: Vec<String> = self.state.objects[id]
                .name
                .split_whitespace()
                .map(|w| truncate(w, wl))
                .collect();
            name_words.len() >= wanted.len()
                && name_words[name_words.len() - wanted.len()..] == wanted[..]
        })
    }

    fn known_word(&self, word: &str) -> bool {
        let wl = self.word_length();
        let truncated = truncate(word, wl);
        self.dictionary_words()
            .iter()
            .any(|w| truncate(&w.word, wl) == truncated)
    }

    // ------------------------------------------------------------------
    // Descriptions
    // ------------------------------------------------------------------

    fn describe_room(&self) -> String {
        let room_id = self.player_room();
        let room = &self.state.objects[&room_id];
        let mut text = room.name.clone();

        for id in self.children_of(room_id) {
            if id == self.script.player {
                continue;
            }
            let obj = &self.state.objects[&id];
            text.push_str(&format!("\nThere is a {} here.", obj.name));
            if obj.attributes.contains(&Attribute::Container)
                && obj.attributes.contains(&Attribute::Open)
            {
                for inner in self.children_of(id) {
                    text.push_str(&format!(
                        "\nThe {} contains a {}.",
                        obj.name, self.state.objects[&inner].name
                    ));
                }
            }
        }
        text
    }

    fn describe_inventory(&self) -> String {
        let held = self.children_of(self.script.player);
        if held.is_empty() {
            "You are empty-handed.".to_string()
        } else {
            let mut text = "You are carrying:".to_string();
            for id in held {
                text.push_str(&format!("\n  a {}", self.state.objects[&id].name));
            }
            text
        }
    }

    fn outcome(&self, text: String) -> StepOutcome {
        StepOutcome {
            text,
            score: self.state.score,
            moves: self.state.moves,
            game_over: self.state.game_over,
            reward: 0,
        }
    }

    // ------------------------------------------------------------------
    // Scoring
    // ------------------------------------------------------------------

    fn enter_room(&mut self, room: ObjectId) {
        if self.state.visited.insert(room) {
            if let Some((_, points)) =
                self.script.visit_points.iter().find(|(id, _)| *id == room)
            {
                self.state.score += points;
            }
        }
        self.check_win();
    }

    fn check_win(&mut self) {
        if self.script.max_score > 0 && self.state.score >= self.script.max_score {
            self.state.game_over = true;
        }
    }

    // ------------------------------------------------------------------
    // Command execution
    // ------------------------------------------------------------------

    fn execute(&mut self, command: &str) -> String {
        let lowered = command.to_lowercase();
        let words: Vec<&str> = lowered.split_whitespace().collect();

        let Some(&first) = words.first() else {
            return "I beg your pardon?".to_string();
        };

        // Every word must be in the dictionary before anything is attempted
        if let Some(unknown) = words.iter().find(|w| !self.known_word(w)) {
            return format!("I don't know the word \"{}\".", unknown);
        }

        // Bare direction or "go <direction>"
        let direction = if let Some(d) = Direction::parse(first) {
            Some(d)
        } else if first == "go" {
            words.get(1).and_then(|w| Direction::parse(w))
        } else {
            None
        };
        if let Some(direction) = direction {
            return self.walk(direction);
        }
        if first == "go" {
            return "You have to specify a compass direction.".to_string();
        }

        match first {
            "look" => {
                self.state.moves += 1;
                self.describe_room()
            }
            "inventory" | "i" => {
                self.state.moves += 1;
                self.describe_inventory()
            }
            "take" => self.take(&words[1..]),
            "drop" => self.drop(&words[1..]),
            "open" => self.set_open(&words[1..], true),
            "close" => self.set_open(&words[1..], false),
            "read" => self.read(&words[1..], true),
            "examine" => self.read(&words[1..], false),
            "put" => self.put(&words[1..]),
            _ => format!("You can't see how to {} that.", first),
        }
    }

    fn walk(&mut self, direction: Direction) -> String {
        let here = self.player_room();
        match self.exits_from(here).iter().find(|(d, _)| *d == direction) {
            Some((_, to)) => {
                self.state.moves += 1;
                let to = *to;
                self.state
                    .objects
                    .get_mut(&self.script.player)
                    .expect("player exists")
                    .parent = Some(to);
                self.enter_room(to);
                self.describe_room()
            }
            None => "You can't go that way.".to_string(),
        }
    }

    fn take(&mut self, noun: &[&str]) -> String {
        let Some(id) = self.resolve_noun(noun) else {
            return "You can't see any such thing.".to_string();
        };
        self.state.moves += 1;
        if self.is_held(id) {
            return "You already have that.".to_string();
        }
        let obj = &self.state.objects[&id];
        if !obj.attributes.contains(&Attribute::Takeable) {
            return format!("The {} is securely anchored.", obj.name);
        }
        self.state.objects.get_mut(&id).expect("resolved").parent = Some(self.script.player);
        if self.state.scored_takes.insert(id) {
            if let Some((_, points)) = self.script.take_points.iter().find(|(i, _)| *i == id) {
                self.state.score += points;
            }
        }
        self.check_win();
        "Taken.".to_string()
    }

    fn drop(&mut self, noun: &[&str]) -> String {
        let Some(id) = self.resolve_noun(noun) else {
            return "You can't see any such thing.".to_string();
        };
        self.state.moves += 1;
        if !self.is_held(id) {
            return "You don't have that.".to_string();
        }
        let room = self.player_room();
        self.state.objects.get_mut(&id).expect("resolved").parent = Some(room);
        "Dropped.".to_string()
    }

    fn set_open(&mut self, noun: &[&str], open: bool) -> String {
        let Some(id) = self.resolve_noun(noun) else {
            return "You can't see any such thing.".to_string();
        };
        self.state.moves += 1;
        let obj = &self.state.objects[&id];
        if !obj.attributes.contains(&Attribute::Openable) {
            return format!("You can't do that to the {}.", obj.name);
        }
        let already = obj.attributes.contains(&Attribute::Open);
        if open == already {
            return if open { "It's already open.".into() } else { "It's already closed.".into() };
        }
        let name = obj.name.clone();
        if open {
            self.state
                .objects
                .get_mut(&id)
                .expect("resolved")
                .attributes
                .insert(Attribute::Open);
            let contents = self.children_of(id);
            if contents.is_empty() {
                "Opened.".to_string()
            } else {
                let inner: Vec<String> = contents
                    .iter()
                    .map(|c| self.state.objects[c].name.clone())
                    .collect();
                format!("Opening the {} reveals a {}.", name, inner.join(", a "))
            }
        } else {
            self.state
                .objects
                .get_mut(&id)
                .expect("resolved")
                .attributes
                .remove(&Attribute::Open);
            "Closed.".to_string()
        }
    }

    fn read(&mut self, noun: &[&str], reading: bool) -> String {
        let Some(id) = self.resolve_noun(noun) else {
            return "You can't see any such thing.".to_string();
        };
        self.state.moves += 1;
        if reading && !self.state.objects[&id].attributes.contains(&Attribute::Readable) {
            return format!(
                "There is nothing written on the {}.",
                self.state.objects[&id].name
            );
        }
        if reading && self.state.scored_reads.insert(id) {
            if let Some((_, points)) = self.script.read_points.iter().find(|(i, _)| *i == id) {
                self.state.score += points;
                self.check_win();
            }
        }
        match self.script.texts.iter().find(|(i, _)| *i == id) {
            Some((_, text)) => text.to_string(),
            None => format!(
                "You see nothing special about the {}.",
                self.state.objects[&id].name
            ),
        }
    }

    fn put(&mut self, rest: &[&str]) -> String {
        let Some(split) = rest.iter().position(|w| *w == "in") else {
            return "You need to say what to put it in.".to_string();
        };
        let (first, second) = (&rest[..split], &rest[split + 1..]);
        let Some(item) = self.resolve_noun(first) else {
            return "You can't see any such thing.".to_string();
        };
        let Some(target) = self.resolve_noun(second) else {
            return "You can't see any such thing.".to_string();
        };
        self.state.moves += 1;
        if !self.is_held(item) {
            return "You don't have that.".to_string();
        }
        let target_obj = &self.state.objects[&target];
        if !target_obj.attributes.contains(&Attribute::Container)
            || !target_obj.attributes.contains(&Attribute::Open)
        {
            return format!("You can't put things in the {}.", target_obj.name);
        }
        if item == target {
            return "You can't put something inside itself.".to_string();
        }
        self.state.objects.get_mut(&item).expect("resolved").parent = Some(target);
        "Done.".to_string()
    }

    // ------------------------------------------------------------------
    // Dictionary
    // ------------------------------------------------------------------

    fn dictionary_words(&self) -> Vec<DictWord> {
        let mut words: Vec<DictWord> = Vec::new();
        let mut seen: BTreeSet<String> = BTreeSet::new();

        for verb in VERBS {
            if seen.insert(verb.to_string()) {
                words.push(DictWord::verb(*verb));
            }
        }
        if seen.insert("in".to_string()) {
            words.push(DictWord::preposition("in"));
        }
        for direction in Direction::ALL {
            if seen.insert(direction.as_str().to_string()) {
                words.push(DictWord::direction(direction.as_str()));
            }
        }
        for obj in self.state.objects.values() {
            let name_words: Vec<&str> = obj.name.split_whitespace().collect();
            for (i, word) in name_words.iter().enumerate() {
                let lowered = word.to_lowercase();
                if !seen.insert(lowered.clone()) {
                    continue;
                }
                if i + 1 == name_words.len() {
                    words.push(DictWord::noun(lowered));
                } else {
                    words.push(DictWord::adjective(lowered));
                }
            }
        }
        words
    }
}

fn truncate(word: &str, word_length: usize) -> String {
    word.chars().take(word_length).collect::<String>().to_lowercase()
}

// ============================================================================
// GameEngine implementation
// ============================================================================

impl GameEngine for ScriptedEngine {
    fn reset(&mut self) -> Result<StepOutcome> {
        self.state = Self::initial_state(&self.script);
        let start = self.player_room();
        self.enter_room(start);
        let text = format!("{}\n\n{}", self.script.intro, self.describe_room());
        Ok(self.outcome(text))
    }

    fn step(&mut self, command: &str) -> Result<StepOutcome> {
        if self.state.game_over {
            return Ok(self.outcome("The game is over. Reset to play again.".to_string()));
        }
        let mut text = self.execute(command);
        if self.state.game_over {
            text.push_str(&format!("\n\n{}", self.script.win_text));
        }
        Ok(self.outcome(text))
    }

    fn status(&self) -> Result<StepOutcome> {
        Ok(self.outcome(self.describe_room()))
    }

    fn world_snapshot(&self) -> Result<RawSnapshot> {
        let objects = self
            .state
            .objects
            .iter()
            .map(|(id, o)| RawObject {
                id: *id,
                name: o.name.clone(),
                parent: o.parent,
                attributes: o.attributes.iter().copied().collect(),
            })
            .collect();

        // Disclose only the current room's exits; the agent learns the rest
        // of the map by walking it.
        let here = self.player_room();
        let exits = self
            .exits_from(here)
            .into_iter()
            .map(|(direction, to)| RawExit { from: here, direction, to })
            .collect();

        Ok(RawSnapshot {
            player: self.script.player,
            score: self.state.score,
            objects,
            exits,
        })
    }

    fn serialize_state(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.state)
            .map_err(|e| error::serialization_error(e.to_string()).set_source(e))
    }

    fn deserialize_state(&mut self, blob: &[u8]) -> Result<()> {
        self.state = serde_json::from_slice(blob)
            .map_err(|e| error::serialization_error(e.to_string()).set_source(e))?;
        Ok(())
    }

    fn dictionary(&self) -> Result<Vec<DictWord>> {
        Ok(self.dictionary_words())
    }

    fn max_score(&self) -> i32 {
        self.script.max_score
    }

    fn walkthrough(&self) -> Vec<String> {
        self.script.walkthrough.iter().map(|c| c.to_string()).collect()
    }
}

// ============================================================================
// Built-in scripts
// ============================================================================

impl ScriptedEngine {
    /// The opening scene of the classic: a white house, a mailbox, a leaflet.
    pub fn zork_opening() -> Self {
        const OBJECTS: &[ScriptObject] = &[
            ScriptObject { id: 10, name: "West of House", parent: None, attributes: &[Attribute::Room] },
            ScriptObject { id: 11, name: "North of House", parent: None, attributes: &[Attribute::Room] },
            ScriptObject { id: 12, name: "South of House", parent: None, attributes: &[Attribute::Room] },
            ScriptObject { id: 14, name: "Behind House", parent: None, attributes: &[Attribute::Room] },
            ScriptObject {
                id: 1,
                name: "you",
                parent: Some(10),
                attributes: &[Attribute::Player, Attribute::Container, Attribute::Open],
            },
            ScriptObject {
                id: 20,
                name: "small mailbox",
                parent: Some(10),
                attributes: &[Attribute::Container, Attribute::Openable],
            },
            ScriptObject {
                id: 21,
                name: "leaflet",
                parent: Some(20),
                attributes: &[Attribute::Takeable, Attribute::Readable],
            },
            ScriptObject { id: 22, name: "front door", parent: Some(10), attributes: &[Attribute::Scenery] },
            ScriptObject {
                id: 23,
                name: "window",
                parent: Some(14),
                attributes: &[Attribute::Scenery, Attribute::Openable],
            },
        ];
        const EXITS: &[(ObjectId, Direction, ObjectId)] = &[
            (10, Direction::North, 11),
            (10, Direction::South, 12),
            (11, Direction::West, 10),
            (11, Direction::East, 14),
            (12, Direction::West, 10),
            (12, Direction::East, 14),
            (14, Direction::Northwest, 11),
            (14, Direction::Southwest, 12),
        ];
        Self::new(GameScript {
            id: "zork1",
            name: "Zork I: The Great Underground Empire (opening)",
            intro: "ZORK I: The Great Underground Empire\nCopyright (c) 1981, 1982, 1983 Infocom, Inc.",
            win_text: "Your score puts you in the ranks of the Beginner adventurers.",
            max_score: 10,
            player: 1,
            objects: OBJECTS,
            exits: EXITS,
            take_points: &[(21, 5)],
            visit_points: &[(14, 5)],
            read_points: &[],
            texts: &[
                (21, "WELCOME TO ZORK!\n\nZORK is a game of adventure, danger, and low cunning. In it you will explore some of the most amazing territory ever seen by mortals."),
                (20, "It's a small mailbox."),
            ],
            walkthrough: &["open mailbox", "take leaflet", "north", "east"],
        })
    }

    /// A three-room riff on the standard IF demo game.
    pub fn cloak_of_darkness() -> Self {
        const OBJECTS: &[ScriptObject] = &[
            ScriptObject { id: 30, name: "Foyer of the Opera House", parent: None, attributes: &[Attribute::Room] },
            ScriptObject { id: 31, name: "Cloakroom", parent: None, attributes: &[Attribute::Room] },
            ScriptObject { id: 32, name: "Foyer Bar", parent: None, attributes: &[Attribute::Room] },
            ScriptObject {
                id: 1,
                name: "you",
                parent: Some(30),
                attributes: &[Attribute::Player, Attribute::Container, Attribute::Open],
            },
            ScriptObject {
                id: 40,
                name: "velvet cloak",
                parent: Some(1),
                attributes: &[Attribute::Takeable],
            },
            ScriptObject {
                id: 41,
                name: "brass hook",
                parent: Some(31),
                attributes: &[Attribute::Scenery, Attribute::Container, Attribute::Open],
            },
            ScriptObject {
                id: 42,
                name: "message",
                parent: Some(32),
                attributes: &[Attribute::Scenery, Attribute::Readable],
            },
        ];
        const EXITS: &[(ObjectId, Direction, ObjectId)] = &[
            (30, Direction::West, 31),
            (30, Direction::South, 32),
            (31, Direction::East, 30),
            (32, Direction::North, 30),
        ];
        Self::new(GameScript {
            id: "cloak",
            name: "Cloak of Darkness",
            intro: "Hurrying through the rainswept November night, you're glad to see the bright lights of the Opera House.",
            win_text: "You have won.",
            max_score: 2,
            player: 1,
            objects: OBJECTS,
            exits: EXITS,
            take_points: &[],
            visit_points: &[(32, 1)],
            read_points: &[(42, 1)],
            texts: &[(42, "The message, neatly marked in the sawdust, reads: \"You win.\"")],
            walkthrough: &["west", "put cloak in hook", "east", "south", "read message"],
        })
    }
}
