//! Ordinal color assignment with first-seen-stable slots.
//!
//! Rebuilding the domain from scratch each cycle would reshuffle colors whenever
//! category order changes. Instead, assignments persist: members that stay keep
//! their slot, removed members release it, and newcomers take the least-used,
//! lowest-index slot.

use indexmap::IndexMap;

use crate::geometry::Rgba;

/// d3 `schemeSet1`.
pub const SCHEME_SET1: [&str; 9] = [
    "#e41a1c", "#377eb8", "#4daf4a", "#984ea3", "#ff7f00", "#ffff33", "#a65628", "#f781bf",
    "#999999",
];

#[derive(Clone, Debug)]
pub struct OrdinalColor {
    palette: Vec<Rgba>,
    assigned: IndexMap<String, usize>,
}

impl Default for OrdinalColor {
    fn default() -> Self {
        Self::from_hex(&SCHEME_SET1)
    }
}

impl OrdinalColor {
    /// Palette must be non-empty; an empty one falls back to Set1.
    pub fn new(palette: Vec<Rgba>) -> Self {
        if palette.is_empty() {
            return Self::default();
        }
        Self {
            palette,
            assigned: IndexMap::new(),
        }
    }

    /// Palette from `#rrggbb` strings; unparsable entries are skipped.
    pub fn from_hex<S: AsRef<str>>(hex: &[S]) -> Self {
        let palette: Vec<Rgba> = hex.iter().filter_map(|h| Rgba::from_hex(h.as_ref())).collect();
        if palette.is_empty() {
            return Self::new(SCHEME_SET1.iter().filter_map(|h| Rgba::from_hex(h)).collect());
        }
        Self::new(palette)
    }

    /// Recompute the domain from the current members (duplicates allowed).
    pub fn sync<'a>(&mut self, members: impl IntoIterator<Item = &'a str>) {
        let mut current: Vec<&str> = Vec::new();
        for m in members {
            if !current.contains(&m) {
                current.push(m);
            }
        }
        self.assigned
            .retain(|name, _| current.iter().any(|m| *m == name.as_str()));
        for m in current {
            if !self.assigned.contains_key(m) {
                let slot = self.free_slot();
                self.assigned.insert(m.to_string(), slot);
            }
        }
    }

    /// Color for a domain member, if assigned.
    pub fn get(&self, member: &str) -> Option<Rgba> {
        self.assigned.get(member).map(|&i| self.palette[i])
    }

    /// Color for a member, assigning a slot on first sight.
    pub fn color(&mut self, member: &str) -> Rgba {
        if let Some(c) = self.get(member) {
            return c;
        }
        let slot = self.free_slot();
        self.assigned.insert(member.to_string(), slot);
        self.palette[slot]
    }

    /// Members in assignment order, with their colors (legend order).
    pub fn entries(&self) -> impl Iterator<Item = (&str, Rgba)> + '_ {
        self.assigned
            .iter()
            .map(|(name, &i)| (name.as_str(), self.palette[i]))
    }

    fn free_slot(&self) -> usize {
        let mut usage = vec![0usize; self.palette.len()];
        for &i in self.assigned.values() {
            usage[i] += 1;
        }
        usage
            .iter()
            .enumerate()
            .min_by_key(|(i, n)| (**n, *i))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_is_first_seen_and_order_independent() {
        let mut c = OrdinalColor::default();
        c.sync(["sales", "eng", "ops"]);
        let before: Vec<_> = ["sales", "eng", "ops"].iter().map(|m| c.get(m)).collect();
        assert_eq!(c.get("sales"), Rgba::from_hex("#e41a1c"));
        assert_eq!(c.get("eng"), Rgba::from_hex("#377eb8"));

        c.sync(["ops", "sales", "eng", "ops"]);
        let after: Vec<_> = ["sales", "eng", "ops"].iter().map(|m| c.get(m)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn removed_member_releases_slot_for_newcomer() {
        let mut c = OrdinalColor::default();
        c.sync(["a", "b", "c"]);
        let b = c.get("b");
        c.sync(["a", "c", "d"]);
        assert_eq!(c.get("b"), None);
        assert_eq!(c.get("d"), b);
        assert_eq!(c.get("a"), Rgba::from_hex("#e41a1c"));
    }

    #[test]
    fn wraps_when_palette_exhausted() {
        let mut c = OrdinalColor::from_hex(&["#000000", "#ffffff"]);
        c.sync(["a", "b", "c"]);
        assert_eq!(c.get("c"), c.get("a"));
        assert_eq!(c.color("zzz"), c.get("b").unwrap());
    }
}
