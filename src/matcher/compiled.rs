use std::{collections::HashMap, fmt};

use crate::HttpMethod;

use super::{
    pattern::{split_path, Segment},
    Matcher, Params, Pattern, PatternError,
};

#[derive(Default)]
struct Node {
    literals: HashMap<String, Node>,
    param: Option<Box<Node>>,
    /// Routes which end at this node.
    routes: Vec<usize>,
    /// Routes with a wildcard in place of this node's children.
    wildcards: Vec<usize>,
}

impl Node {
    /// Find the lowest route index which matches `path` below this node.
    fn find(&self, path: &[&str], best: &mut Option<usize>) {
        let mut consider = |routes: &[usize]| {
            if let Some(&i) = routes.first() {
                if best.map_or(true, |b| i < b) {
                    *best = Some(i);
                }
            }
        };

        consider(&self.wildcards);

        match path.split_first() {
            None => consider(&self.routes),
            Some((head, rest)) => {
                if let Some(child) = self.literals.get(*head) {
                    child.find(rest, best);
                }
                if let Some(child) = &self.param {
                    child.find(rest, best);
                }
            }
        }
    }
}

/// Matches using a segment tree per HTTP method.
pub struct CompiledMatcher<T> {
    trees: HashMap<HttpMethod, Node>,
    routes: Vec<(Pattern, T)>,
}

impl<T> Default for CompiledMatcher<T> {
    fn default() -> Self {
        Self {
            trees: HashMap::new(),
            routes: Vec::new(),
        }
    }
}

impl<T> fmt::Debug for CompiledMatcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledMatcher")
            .field("methods", &self.trees.keys())
            .field("routes", &self.routes.len())
            .finish()
    }
}

impl<T: Send + Sync> Matcher<T> for CompiledMatcher<T> {
    fn add(&mut self, method: HttpMethod, pattern: &str, value: T) -> Result<(), PatternError> {
        let pattern = Pattern::parse(pattern)?;
        let index = self.routes.len();

        let mut node = self.trees.entry(method).or_default();
        let mut wildcard = false;
        for segment in &pattern.segments {
            node = match segment {
                Segment::Literal(literal) => node.literals.entry(literal.clone()).or_default(),
                Segment::Param(_) => &mut **node.param.get_or_insert_with(Default::default),
                Segment::Wildcard(_) => {
                    wildcard = true;
                    break;
                }
            };
        }

        match wildcard {
            true => node.wildcards.push(index),
            false => node.routes.push(index),
        }

        self.routes.push((pattern, value));
        Ok(())
    }

    fn find(&self, method: HttpMethod, path: &str) -> Option<(&T, Params)> {
        let segments = split_path(path);

        let mut best = None;
        self.trees.get(&method)?.find(&segments, &mut best);

        let (pattern, value) = self.routes.get(best?)?;
        pattern.matches(&segments).map(|params| (value, params))
    }
}
