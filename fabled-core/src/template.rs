//! # Action templates
//!
//! Candidate-command generation: a fixed, ordered table of verb templates is
//! combined with nouns drawn from the world model (current room plus held
//! inventory, descending into open containers) and restricted to words the
//! game's parser actually recognizes.
//!
//! Output order is deterministic - templates in declaration order, objects in
//! the order the world model lists them - and duplicates are never emitted,
//! so an agent's search over candidates is stable across runs.

use crate::engine::{Attribute, DictWord};
use crate::world::{WorldModel, WorldObject};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

// ============================================================================
// Vocabulary
// ============================================================================

/// The set of words the parser recognizes, after Z-machine word truncation.
/// Classic interpreters only read the first 6 (or 9) characters of each
/// word, so "examine" and "examined" are the same word to the parser.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    words: BTreeSet<String>,
    word_length: usize,
}

impl Vocabulary {
    pub fn from_dictionary(words: &[DictWord], word_length: usize) -> Self {
        let word_length = word_length.max(1);
        Self {
            words: words
                .iter()
                .map(|w| truncate_word(&w.word, word_length))
                .collect(),
            word_length,
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn recognizes(&self, word: &str) -> bool {
        self.words.contains(&truncate_word(word, self.word_length))
    }

    /// Every word of the phrase must be recognized
    pub fn recognizes_phrase(&self, phrase: &str) -> bool {
        phrase.split_whitespace().all(|w| self.recognizes(w))
    }
}

fn truncate_word(word: &str, word_length: usize) -> String {
    word.chars().take(word_length).collect::<String>().to_lowercase()
}

/// Dictionary grouped by part of speech, for the vocabulary tool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyReport {
    pub total_words: usize,
    pub verbs: Vec<String>,
    pub nouns: Vec<String>,
    pub adjectives: Vec<String>,
    pub directions: Vec<String>,
    pub prepositions: Vec<String>,
    pub meta: Vec<String>,
    pub unclassified: Vec<String>,
}

impl VocabularyReport {
    pub fn from_words(words: &[DictWord]) -> Self {
        let mut report = Self { total_words: words.len(), ..Default::default() };
        for w in words {
            let mut classified = false;
            if w.is_verb {
                report.verbs.push(w.word.clone());
                classified = true;
            }
            if w.is_noun {
                report.nouns.push(w.word.clone());
                classified = true;
            }
            if w.is_adjective {
                report.adjectives.push(w.word.clone());
                classified = true;
            }
            if w.is_direction {
                report.directions.push(w.word.clone());
                classified = true;
            }
            if w.is_preposition {
                report.prepositions.push(w.word.clone());
                classified = true;
            }
            if w.is_meta {
                report.meta.push(w.word.clone());
                classified = true;
            }
            if !classified {
                report.unclassified.push(w.word.clone());
            }
        }
        report
    }
}

// ============================================================================
// Templates
// ============================================================================

/// Applicability predicate over one candidate object
pub type ObjPred = fn(&WorldObject, &WorldModel) -> bool;

/// How a template fills its argument slots
pub enum TemplateKind {
    /// Verb alone ("look")
    Bare,
    /// One command per disclosed exit of the current room ("go north")
    Go,
    /// Verb plus one object satisfying the predicate ("take leaflet")
    Object(ObjPred),
    /// Verb plus two distinct objects joined by the preposition
    /// ("put leaflet in mailbox")
    ObjectObject(ObjPred, ObjPred),
}

/// One entry in the fixed verb table
pub struct ActionTemplate {
    pub verb: &'static str,
    pub preposition: Option<&'static str>,
    pub kind: TemplateKind,
}

impl ActionTemplate {
    /// Number of argument slots (0, 1, or 2)
    pub fn slots(&self) -> u8 {
        match self.kind {
            TemplateKind::Bare | TemplateKind::Go => 0,
            TemplateKind::Object(_) => 1,
            TemplateKind::ObjectObject(_, _) => 2,
        }
    }
}

impl std::fmt::Debug for ActionTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionTemplate")
            .field("verb", &self.verb)
            .field("slots", &self.slots())
            .finish()
    }
}

fn any(_obj: &WorldObject, _model: &WorldModel) -> bool {
    true
}

fn readable(obj: &WorldObject, _model: &WorldModel) -> bool {
    obj.has(Attribute::Readable)
}

fn takeable(obj: &WorldObject, model: &WorldModel) -> bool {
    obj.has(Attribute::Takeable) && !obj.has(Attribute::Scenery) && !model.is_held(obj)
}

fn held(obj: &WorldObject, model: &WorldModel) -> bool {
    model.is_held(obj)
}

fn closed_openable(obj: &WorldObject, _model: &WorldModel) -> bool {
    obj.has(Attribute::Openable) && !obj.has(Attribute::Open)
}

fn open_openable(obj: &WorldObject, _model: &WorldModel) -> bool {
    obj.has(Attribute::Openable) && obj.has(Attribute::Open)
}

fn open_container(obj: &WorldObject, _model: &WorldModel) -> bool {
    obj.has(Attribute::Container) && obj.has(Attribute::Open)
}

const TEMPLATES: &[ActionTemplate] = &[
    ActionTemplate { verb: "look", preposition: None, kind: TemplateKind::Bare },
    ActionTemplate { verb: "inventory", preposition: None, kind: TemplateKind::Bare },
    ActionTemplate { verb: "go", preposition: None, kind: TemplateKind::Go },
    ActionTemplate { verb: "examine", preposition: None, kind: TemplateKind::Object(any) },
    ActionTemplate { verb: "read", preposition: None, kind: TemplateKind::Object(readable) },
    ActionTemplate { verb: "take", preposition: None, kind: TemplateKind::Object(takeable) },
    ActionTemplate { verb: "drop", preposition: None, kind: TemplateKind::Object(held) },
    ActionTemplate { verb: "open", preposition: None, kind: TemplateKind::Object(closed_openable) },
    ActionTemplate { verb: "close", preposition: None, kind: TemplateKind::Object(open_openable) },
    ActionTemplate {
        verb: "put",
        preposition: Some("in"),
        kind: TemplateKind::ObjectObject(held, open_container),
    },
];

/// The fixed template table, in generation order
pub fn templates() -> &'static [ActionTemplate] {
    TEMPLATES
}

/// Generate candidate commands for the current state.
///
/// `filter` restricts output to the named verbs. Every emitted command
/// references only objects in the current room or inventory, uses only
/// parser-recognized words, and appears exactly once.
pub fn generate(model: &WorldModel, vocab: &Vocabulary, filter: Option<&[String]>) -> Vec<String> {
    let reachable = model.reachable_objects();
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();

    let mut push = |command: String, out: &mut Vec<String>| {
        if seen.insert(command.clone()) {
            out.push(command);
        }
    };

    for template in TEMPLATES {
        if let Some(verbs) = filter {
            if !verbs.iter().any(|v| v == template.verb) {
                continue;
            }
        }
        if !vocab.recognizes(template.verb) {
            continue;
        }

        match template.kind {
            TemplateKind::Bare => push(template.verb.to_string(), &mut out),
            TemplateKind::Go => {
                for direction in model.player_location().exits.keys() {
                    if vocab.recognizes(direction.as_str()) {
                        push(format!("{} {}", template.verb, direction), &mut out);
                    }
                }
            }
            TemplateKind::Object(pred) => {
                for obj in &reachable {
                    if pred(obj, model) && vocab.recognizes_phrase(&obj.name) {
                        push(format!("{} {}", template.verb, obj.name), &mut out);
                    }
                }
            }
            TemplateKind::ObjectObject(first, second) => {
                let prep = template.preposition.unwrap_or("in");
                if !vocab.recognizes(prep) {
                    continue;
                }
                for a in &reachable {
                    if !first(a, model) || !vocab.recognizes_phrase(&a.name) {
                        continue;
                    }
                    for b in &reachable {
                        if a.id == b.id || !second(b, model) || !vocab.recognizes_phrase(&b.name) {
                            continue;
                        }
                        push(
                            format!("{} {} {} {}", template.verb, a.name, prep, b.name),
                            &mut out,
                        );
                    }
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Attribute, Direction, RawExit, RawObject, RawSnapshot};

    fn obj(id: u32, name: &str, parent: Option<u32>, attrs: &[Attribute]) -> RawObject {
        RawObject { id, name: name.to_string(), parent, attributes: attrs.to_vec() }
    }

    fn snapshot(mailbox_open: bool) -> RawSnapshot {
        let mut mailbox_attrs = vec![Attribute::Container, Attribute::Openable];
        if mailbox_open {
            mailbox_attrs.push(Attribute::Open);
        }
        RawSnapshot {
            player: 1,
            score: 0,
            objects: vec![
                obj(10, "West of House", None, &[Attribute::Room]),
                obj(11, "North of House", None, &[Attribute::Room]),
                obj(1, "you", Some(10), &[Attribute::Player, Attribute::Container]),
                obj(20, "mailbox", Some(10), &mailbox_attrs),
                obj(21, "leaflet", Some(20), &[Attribute::Takeable, Attribute::Readable]),
                obj(22, "sword", Some(1), &[Attribute::Takeable]),
            ],
            exits: vec![RawExit { from: 10, direction: Direction::North, to: 11 }],
        }
    }

    fn vocab() -> Vocabulary {
        let words = [
            "look", "inventory", "go", "examine", "read", "take", "drop", "open", "close",
            "put", "in", "north", "mailbox", "leaflet", "sword",
        ];
        let dict: Vec<DictWord> = words.iter().map(|w| DictWord::noun(*w)).collect();
        Vocabulary::from_dictionary(&dict, 6)
    }

    fn model(mailbox_open: bool) -> WorldModel {
        WorldModel::from_raw(&snapshot(mailbox_open)).unwrap()
    }

    #[test]
    fn test_word_truncation() {
        let v = vocab();
        // "examine" stored as "examin"; longer spellings collapse to it
        assert!(v.recognizes("examine"));
        assert!(v.recognizes("examined"));
        assert!(!v.recognizes("grue"));
        assert!(v.recognizes_phrase("take leaflet"));
        assert!(!v.recognizes_phrase("take grue"));
    }

    #[test]
    fn test_generate_is_deterministic_and_duplicate_free() {
        let m = model(true);
        let v = vocab();
        let first = generate(&m, &v, None);
        let second = generate(&m, &v, None);
        assert_eq!(first, second);

        let unique: std::collections::HashSet<_> = first.iter().collect();
        assert_eq!(unique.len(), first.len());
    }

    #[test]
    fn test_open_mailbox_exposes_leaflet_commands() {
        let v = vocab();

        let closed = generate(&model(false), &v, None);
        assert!(closed.contains(&"open mailbox".to_string()));
        assert!(!closed.iter().any(|c| c.contains("leaflet")));

        let open = generate(&model(true), &v, None);
        assert!(open.contains(&"close mailbox".to_string()));
        assert!(open.contains(&"take leaflet".to_string()));
        assert!(open.contains(&"read leaflet".to_string()));
    }

    #[test]
    fn test_held_objects_drop_not_take() {
        let commands = generate(&model(true), &vocab(), None);
        assert!(commands.contains(&"drop sword".to_string()));
        assert!(!commands.contains(&"take sword".to_string()));
    }

    #[test]
    fn test_put_pairs_held_with_open_container() {
        let commands = generate(&model(true), &vocab(), None);
        assert!(commands.contains(&"put sword in mailbox".to_string()));
        // Mailbox closed: no put targets
        let closed = generate(&model(false), &vocab(), None);
        assert!(!closed.iter().any(|c| c.starts_with("put ")));
    }

    #[test]
    fn test_go_follows_disclosed_exits() {
        let commands = generate(&model(true), &vocab(), None);
        assert!(commands.contains(&"go north".to_string()));
        assert!(!commands.contains(&"go south".to_string()));
    }

    #[test]
    fn test_filter_restricts_verbs() {
        let commands = generate(&model(true), &vocab(), Some(&["take".to_string()]));
        assert!(!commands.is_empty());
        assert!(commands.iter().all(|c| c.starts_with("take ")));
    }

    #[test]
    fn test_unknown_words_are_suppressed() {
        // Vocabulary without "leaflet": no command may mention it
        let words = ["look", "go", "take", "open", "north", "mailbox"];
        let dict: Vec<DictWord> = words.iter().map(|w| DictWord::noun(*w)).collect();
        let v = Vocabulary::from_dictionary(&dict, 6);

        let commands = generate(&model(true), &v, None);
        assert!(!commands.iter().any(|c| c.contains("leaflet")));
        assert!(commands.contains(&"open mailbox".to_string()));
    }

    #[test]
    fn test_template_table_shape() {
        let table = templates();
        assert_eq!(table[0].verb, "look");
        assert_eq!(table[0].slots(), 0);
        assert!(table.iter().any(|t| t.slots() == 1));
        assert!(table.iter().any(|t| t.slots() == 2));
    }

    #[test]
    fn test_vocabulary_report_groups() {
        let words = vec![
            DictWord::verb("take"),
            DictWord::noun("mailbox"),
            DictWord::direction("north"),
            DictWord { word: "xyzzy".to_string(), ..Default::default() },
        ];
        let report = VocabularyReport::from_words(&words);
        assert_eq!(report.total_words, 4);
        assert_eq!(report.verbs, vec!["take"]);
        assert_eq!(report.nouns, vec!["mailbox"]);
        assert_eq!(report.directions, vec!["north"]);
        assert_eq!(report.unclassified, vec!["xyzzy"]);
    }
}
