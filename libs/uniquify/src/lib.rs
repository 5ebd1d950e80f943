//! A library for assigning unique, GDS-legal cell names.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

/// The longest structure name most GDS readers accept.
pub const MAX_NAME_LEN: usize = 32;

/// A set of unique names.
///
/// Each key of type `K` is assigned a unique name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Names<K: Hash + Eq> {
    names: HashSet<ArcStr>,
    assignments: HashMap<K, ArcStr>,
}

impl<K: Hash + Eq> Default for Names<K> {
    fn default() -> Self {
        Self {
            names: HashSet::new(),
            assignments: HashMap::new(),
        }
    }
}

impl<K: Hash + Eq> Names<K> {
    /// Creates a new, empty name set.
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns the name associated with this key, if it exists.
    pub fn name(&self, id: &K) -> Option<ArcStr> {
        self.assignments.get(id).cloned()
    }

    /// Returns `true` if `name` has already been handed out.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Allocates a new, unique name associated with the given ID.
    ///
    /// The name is derived from `base_name` after [sanitizing](sanitize) it.
    /// Collisions are resolved by appending `_1`, `_2`, and so on,
    /// clipping the base so that the result still fits in [`MAX_NAME_LEN`].
    ///
    /// ```
    /// use uniquify::Names;
    ///
    /// let mut names = Names::new();
    /// assert_eq!(names.assign_name(0, "taper"), "taper");
    /// assert_eq!(names.assign_name(1, "taper"), "taper_1");
    /// assert_eq!(names.assign_name(2, "ring r=10"), "ring_r_10");
    /// ```
    pub fn assign_name(&mut self, id: K, base_name: &str) -> ArcStr {
        let base = sanitize(base_name);
        let name = if self.names.contains(base.as_str()) {
            let mut i = 1;
            loop {
                let suffix = format!("_{}", i);
                let keep = MAX_NAME_LEN.saturating_sub(suffix.len()).min(base.len());
                let new_name = arcstr::format!("{}{}", &base[..keep], suffix);
                if !self.names.contains(&new_name) {
                    break new_name;
                }
                i += 1;
            }
        } else {
            ArcStr::from(base)
        };

        self.names.insert(name.clone());
        self.assignments.insert(id, name.clone());
        name
    }
}

/// Maps a name onto the characters GDS structure names may contain.
///
/// Letters, digits, `_`, `$` and `?` are kept; anything else becomes `_`.
/// The result is clipped to [`MAX_NAME_LEN`] characters and is never empty.
///
/// ```
/// assert_eq!(uniquify::sanitize("optimal-step(1.5)"), "optimal_step_1_5_");
/// assert_eq!(uniquify::sanitize(""), "cell");
/// ```
pub fn sanitize(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '?') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_NAME_LEN)
        .collect();
    if out.is_empty() {
        out.push_str("cell");
    }
    out
}
