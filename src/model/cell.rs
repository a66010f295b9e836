use std::collections::BTreeSet;

use crate::rule::HeadRule;

/// A region of the model: a numbered CSG boundary filled with one material.
#[derive(Debug, Clone)]
pub struct Cell {
    number: i32,
    material: i32,
    temperature: f64,
    density: Option<f64>,
    rule: HeadRule,
    excluded: BTreeSet<String>,
}

impl Cell {
    /// Creates a cell. Material `0` is void.
    #[must_use]
    pub fn new(number: i32, material: i32, temperature: f64, rule: HeadRule) -> Self {
        Self {
            number,
            material,
            temperature,
            density: None,
            rule,
            excluded: BTreeSet::new(),
        }
    }

    /// Returns the cell number.
    #[must_use]
    pub fn number(&self) -> i32 {
        self.number
    }

    /// Returns the material id.
    #[must_use]
    pub fn material(&self) -> i32 {
        self.material
    }

    /// Returns `true` for void cells.
    #[must_use]
    pub fn is_void(&self) -> bool {
        self.material == 0
    }

    /// Returns the temperature in kelvin, `0.0` meaning the material default.
    #[must_use]
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Returns the density override, if any.
    #[must_use]
    pub fn density(&self) -> Option<f64> {
        self.density
    }

    /// Overrides the material density.
    pub fn set_density(&mut self, density: f64) {
        self.density = Some(density);
    }

    /// Returns the boundary expression.
    #[must_use]
    pub fn rule(&self) -> &HeadRule {
        &self.rule
    }

    /// Replaces the boundary expression; the cell keeps its number.
    pub fn set_rule(&mut self, rule: HeadRule) {
        self.rule = rule;
    }

    /// Intersects the boundary with an extra condition.
    pub fn add_intersection(&mut self, rule: &HeadRule) {
        self.rule.add_intersection(rule);
    }

    /// Subtracts an envelope from this cell once per `tag`.
    ///
    /// `exclusion` is the region outside the inserted object (the complement
    /// of its outer surface). Returns `false` if `tag` was already applied.
    pub fn exclude(&mut self, tag: &str, exclusion: &HeadRule) -> bool {
        if !self.excluded.insert(tag.to_owned()) {
            return false;
        }
        self.rule.add_intersection(exclusion);
        true
    }

    /// Tags of the objects inserted into this cell.
    pub fn inserted(&self) -> impl Iterator<Item = &str> {
        self.excluded.iter().map(String::as_str)
    }

    /// Copy of this cell under a new number with a new boundary.
    #[must_use]
    pub fn split_off(&self, number: i32, rule: HeadRule) -> Cell {
        Cell {
            number,
            material: self.material,
            temperature: self.temperature,
            density: self.density,
            rule,
            excluded: self.excluded.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn exclusion_is_applied_once() {
        let mut cell = Cell::new(101, 3, 300.0, HeadRule::parse("1 -2").unwrap());
        let outside = HeadRule::parse("-5 : 6").unwrap();
        assert!(cell.exclude("pipe:Main", &outside));
        assert!(!cell.exclude("pipe:Main", &outside));
        assert_eq!(cell.rule().display(), "1 -2 (-5 : 6)");
        assert_eq!(cell.inserted().collect::<Vec<_>>(), vec!["pipe:Main"]);
    }

    #[test]
    fn split_off_keeps_material() {
        let mut cell = Cell::new(101, 3, 300.0, HeadRule::parse("1 -2").unwrap());
        cell.set_density(7.8);
        let other = cell.split_off(102, HeadRule::parse("1 -2 4").unwrap());
        assert_eq!(other.number(), 102);
        assert_eq!(other.material(), 3);
        assert_eq!(other.density(), Some(7.8));
        assert!((other.temperature() - 300.0).abs() < 1e-12);
        assert!(!other.is_void());
    }
}
