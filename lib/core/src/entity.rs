//! Entity-mention matching.
//!
//! [`EntityMatcher`] is an Aho-Corasick automaton whose alphabet is whole
//! tokens rather than characters, so every match is word-aligned. Scanning
//! uses leftmost-longest semantics: among the matches that start at the
//! leftmost possible token, the longest one is reported, and scanning
//! resumes right after it. Overlapping shorter matches are never reported.
//!
//! Matching is case-exact. Surface forms are stored lowercase and callers
//! lowercase text before scanning.

use crate::{Error, Result, Vector};
use ahash::AHashMap;
use std::collections::VecDeque;

const ROOT: usize = 0;

/// A dictionary entry: a surface form and the vector of the entity it names.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityEntry {
    pub surface: String,
    pub entity: String,
    pub vector: Vector,
}

impl EntityEntry {
    pub fn new(surface: impl Into<String>, vector: Vector) -> Self {
        let surface = surface.into();
        Self {
            entity: surface.clone(),
            surface,
            vector,
        }
    }

    #[must_use]
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = entity.into();
        self
    }
}

/// One reported mention. `start..end` are token offsets into the scanned text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mention<'m> {
    pub surface: &'m str,
    pub entity: &'m str,
    pub vector: &'m Vector,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Default)]
struct Node {
    next: AHashMap<u32, usize>,
    fail: usize,
    /// Nearest proper suffix state that ends an entry.
    dict: Option<usize>,
    depth: usize,
    output: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct EntityMatcher {
    dim: usize,
    symbols: AHashMap<String, u32>,
    nodes: Vec<Node>,
    entries: Vec<EntityEntry>,
}

impl EntityMatcher {
    /// Build the automaton. Every vector must have dimension `dim`; surface
    /// forms must be non-blank and lowercase. A repeated surface form
    /// replaces the earlier entry.
    pub fn build<I>(entries: I, dim: usize) -> Result<Self>
    where
        I: IntoIterator<Item = EntityEntry>,
    {
        let mut matcher = Self {
            dim,
            symbols: AHashMap::new(),
            nodes: vec![Node::default()],
            entries: Vec::new(),
        };
        for entry in entries {
            matcher.insert(entry)?;
        }
        matcher.link();
        Ok(matcher)
    }

    fn insert(&mut self, entry: EntityEntry) -> Result<()> {
        if entry.vector.dim() != self.dim {
            return Err(Error::InvalidDimension {
                expected: self.dim,
                actual: entry.vector.dim(),
            });
        }
        if entry.surface.to_lowercase() != entry.surface {
            return Err(Error::InvalidEntity(format!(
                "surface form {:?} is not lowercase",
                entry.surface
            )));
        }

        let mut state = ROOT;
        let mut depth = 0;
        for token in entry.surface.split_whitespace() {
            let next_symbol = self.symbols.len() as u32;
            let symbol = *self.symbols.entry(token.to_string()).or_insert(next_symbol);
            depth += 1;
            state = match self.nodes[state].next.get(&symbol) {
                Some(&child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(Node {
                        depth,
                        ..Node::default()
                    });
                    self.nodes[state].next.insert(symbol, child);
                    child
                }
            };
        }
        if state == ROOT {
            return Err(Error::InvalidEntity("blank surface form".to_string()));
        }

        match self.nodes[state].output {
            Some(existing) => self.entries[existing] = entry,
            None => {
                self.nodes[state].output = Some(self.entries.len());
                self.entries.push(entry);
            }
        }
        Ok(())
    }

    /// Breadth-first pass computing failure and dictionary-suffix links.
    fn link(&mut self) {
        let mut queue: VecDeque<usize> = self.nodes[ROOT].next.values().copied().collect();
        while let Some(u) = queue.pop_front() {
            let children: Vec<(u32, usize)> =
                self.nodes[u].next.iter().map(|(s, c)| (*s, *c)).collect();
            for (symbol, child) in children {
                let mut f = self.nodes[u].fail;
                let fail = loop {
                    if let Some(&target) = self.nodes[f].next.get(&symbol) {
                        break target;
                    }
                    if f == ROOT {
                        break ROOT;
                    }
                    f = self.nodes[f].fail;
                };
                let dict = if self.nodes[fail].output.is_some() {
                    Some(fail)
                } else {
                    self.nodes[fail].dict
                };
                self.nodes[child].fail = fail;
                self.nodes[child].dict = dict;
                queue.push_back(child);
            }
        }
    }

    #[inline]
    fn step(&self, mut state: usize, symbol: Option<u32>) -> usize {
        let Some(symbol) = symbol else {
            return ROOT;
        };
        loop {
            if let Some(&next) = self.nodes[state].next.get(&symbol) {
                return next;
            }
            if state == ROOT {
                return ROOT;
            }
            state = self.nodes[state].fail;
        }
    }

    /// Longest entry ending at `state`: `(entry index, length in tokens)`.
    #[inline]
    fn longest_output(&self, state: usize) -> Option<(usize, usize)> {
        let node = if self.nodes[state].output.is_some() {
            state
        } else {
            self.nodes[state].dict?
        };
        let entry = self.nodes[node].output?;
        Some((entry, self.nodes[node].depth))
    }

    /// Lazily scan `text` for mentions.
    pub fn find_mentions<'m, 't>(&'m self, text: &'t str) -> Mentions<'m, 't> {
        Mentions {
            matcher: self,
            tokens: text.split_whitespace().collect(),
            pos: 0,
        }
    }

    /// Sum the vectors of every mention (repeats count each time) and scale
    /// the sum to unit length. A zero sum is returned as the zero vector.
    pub fn embed(&self, text: &str) -> Vector {
        let mut sum = Vector::zeros(self.dim);
        for mention in self.find_mentions(text) {
            sum += mention.vector;
        }
        sum.normalized()
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[EntityEntry] {
        &self.entries
    }
}

/// Iterator returned by [`EntityMatcher::find_mentions`].
pub struct Mentions<'m, 't> {
    matcher: &'m EntityMatcher,
    tokens: Vec<&'t str>,
    pos: usize,
}

impl<'m, 't> Iterator for Mentions<'m, 't> {
    type Item = Mention<'m>;

    fn next(&mut self) -> Option<Self::Item> {
        let m = self.matcher;
        let mut state = ROOT;
        let mut i = self.pos;
        // (start, end, entry)
        let mut best: Option<(usize, usize, usize)> = None;

        while i < self.tokens.len() {
            state = m.step(state, m.symbols.get(self.tokens[i]).copied());
            i += 1;

            // No later match can start before the current state's prefix.
            let reach = i - m.nodes[state].depth;
            if matches!(best, Some((start, _, _)) if reach > start) {
                break;
            }

            if let Some((entry, len)) = m.longest_output(state) {
                let start = i - len;
                let better = match best {
                    None => true,
                    Some((s, e, _)) => start < s || (start == s && i - start > e - s),
                };
                if better {
                    best = Some((start, i, entry));
                }
            }
        }

        match best {
            Some((start, end, entry)) => {
                self.pos = end;
                let e = &m.entries[entry];
                Some(Mention {
                    surface: &e.surface,
                    entity: &e.entity,
                    vector: &e.vector,
                    start,
                    end,
                })
            }
            None => {
                self.pos = self.tokens.len();
                None
            }
        }
    }
}

impl std::iter::FusedIterator for Mentions<'_, '_> {}
