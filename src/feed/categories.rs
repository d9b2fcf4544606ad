use crate::feed::parser::FeedCategory;
use std::collections::{HashMap, HashSet};

/// Defensive bound on ancestor-chain length. Parent links are
/// author-supplied data and may form cycles; the walk stops here instead of
/// looping.
const MAX_CHAIN_DEPTH: usize = 64;

/// Outcome of walking one category's ancestor chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryWalk {
    /// Full root-first chain for the leaf.
    Resolved(Vec<String>),
    /// The walk hit the depth bound or revisited a name. Carries the partial
    /// chain gathered so far; callers degrade to a root-only path.
    CycleDetected(Vec<String>),
}

/// Reconstructs root-to-leaf category paths from the feed's flat
/// parent-link declarations.
///
/// The name→parent lookup is built once per feed; per-leaf chains are
/// memoised so an ancestor chain shared by several items (or several leaves
/// of one item) is only walked once.
pub struct CategoryResolver {
    parents: HashMap<String, String>,
    chains: HashMap<String, CategoryWalk>,
}

impl CategoryResolver {
    pub fn new(categories: &[FeedCategory]) -> Self {
        let mut parents = HashMap::with_capacity(categories.len());
        for cat in categories {
            // First declaration wins; names are unique keys within a feed.
            parents
                .entry(cat.name.clone())
                .or_insert_with(|| cat.parent.clone());
        }
        Self {
            parents,
            chains: HashMap::new(),
        }
    }

    /// Produces one root-first path per referenced leaf category.
    ///
    /// A referenced name that already occurs as an ancestor inside another
    /// referenced name's chain does not get its own path: tagging a post
    /// with both `lorem` and `lorem/ipsum` yields only `[lorem, ipsum]`.
    /// Paths are otherwise independent and never merged, even when they
    /// share a prefix.
    ///
    /// Cyclic or over-deep parent data degrades that leaf to a root-only
    /// single-element path, with a warning.
    pub fn paths_for(&mut self, names: &[String]) -> Vec<Vec<String>> {
        let mut chains: Vec<Vec<String>> = Vec::with_capacity(names.len());
        for name in names {
            let chain = match self.walk(name) {
                CategoryWalk::Resolved(chain) => chain,
                CategoryWalk::CycleDetected(partial) => {
                    tracing::warn!(
                        category = %name,
                        partial = ?partial,
                        "Category parent chain is cyclic or too deep, keeping it as a root category"
                    );
                    vec![name.clone()]
                }
            };
            chains.push(chain);
        }

        // Names consumed as ancestors don't also stand alone as leaves.
        let ancestors: HashSet<String> = chains
            .iter()
            .flat_map(|chain| chain[..chain.len().saturating_sub(1)].iter())
            .cloned()
            .collect();

        chains
            .into_iter()
            .filter(|chain| match chain.last() {
                Some(leaf) => !ancestors.contains(leaf),
                None => false,
            })
            .collect()
    }

    /// Walks parent links upward from `leaf`, returning the memoised chain.
    fn walk(&mut self, leaf: &str) -> CategoryWalk {
        if let Some(cached) = self.chains.get(leaf) {
            return cached.clone();
        }

        let mut chain = vec![leaf.to_string()];
        let mut seen: HashSet<&str> = HashSet::new();
        seen.insert(leaf);

        let mut current = leaf;
        let walk = loop {
            let parent = match self.parents.get(current) {
                Some(p) if !p.is_empty() => p.as_str(),
                _ => {
                    chain.reverse();
                    break CategoryWalk::Resolved(chain);
                }
            };
            if chain.len() >= MAX_CHAIN_DEPTH || seen.contains(parent) {
                chain.reverse();
                break CategoryWalk::CycleDetected(chain);
            }
            seen.insert(parent);
            chain.push(parent.to_string());
            current = parent;
        };

        self.chains.insert(leaf.to_string(), walk.clone());
        walk
    }
}
