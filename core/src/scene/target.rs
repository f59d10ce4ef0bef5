use super::Script;
use crate::value::Value;
use indexmap::IndexMap;
use std::sync::Arc;

/// A sprite or the stage, with the state scripts read and mutate
#[derive(Debug, Clone)]
pub struct Target {
    pub name: String,
    pub is_stage: bool,
    pub x: f64,
    pub y: f64,
    direction: f64,
    pub visible: bool,
    /// Index into `costumes`
    pub costume: usize,
    pub costumes: Vec<String>,
    pub variables: IndexMap<String, Value>,
    pub lists: IndexMap<String, Vec<Value>>,
    scripts: Vec<Arc<Script>>,
}

impl Target {
    fn new(name: impl Into<String>, is_stage: bool) -> Self {
        Self {
            name: name.into(),
            is_stage,
            x: 0.0,
            y: 0.0,
            direction: 90.0,
            visible: !is_stage,
            costume: 0,
            costumes: Vec::new(),
            variables: IndexMap::new(),
            lists: IndexMap::new(),
            scripts: Vec::new(),
        }
    }

    pub fn sprite(name: impl Into<String>) -> Self {
        Self::new(name, false)
    }

    pub fn stage() -> Self {
        Self::new("Stage", true)
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_direction(mut self, direction: f64) -> Self {
        self.set_direction(direction);
        self
    }

    pub fn with_costumes<I, S>(mut self, costumes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.costumes = costumes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn with_list(mut self, name: impl Into<String>, items: Vec<Value>) -> Self {
        self.lists.insert(name.into(), items);
        self
    }

    pub fn with_script(mut self, script: Arc<Script>) -> Self {
        self.scripts.push(script);
        self
    }

    pub fn add_script(&mut self, script: Arc<Script>) {
        self.scripts.push(script);
    }

    pub fn scripts(&self) -> &[Arc<Script>] {
        &self.scripts
    }

    /// Heading in degrees, in (-180, 180]
    pub fn direction(&self) -> f64 {
        self.direction
    }

    pub fn set_direction(&mut self, degrees: f64) {
        self.direction = normalize_direction(degrees);
    }

    /// Name of the current costume, if any
    pub fn costume_name(&self) -> Option<&str> {
        self.costumes.get(self.costume).map(String::as_str)
    }

    /// Select a costume by 1-based number, wrapping around
    pub fn set_costume_number(&mut self, number: f64) {
        let count = self.costumes.len();
        if count == 0 || !number.is_finite() {
            return;
        }
        let index = (number.round() as i64 - 1).rem_euclid(count as i64);
        self.costume = index as usize;
    }

    /// Select a costume by name. Returns false when no costume has that name.
    pub fn set_costume_name(&mut self, name: &str) -> bool {
        match self.costumes.iter().position(|c| c == name) {
            Some(index) => {
                self.costume = index;
                true
            }
            None => false,
        }
    }

    pub fn next_costume(&mut self) {
        if !self.costumes.is_empty() {
            self.costume = (self.costume + 1) % self.costumes.len();
        }
    }
}

/// Wrap an angle into (-180, 180]
pub fn normalize_direction(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 90.0;
    }
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_direction() {
        assert_eq!(normalize_direction(90.0), 90.0);
        assert_eq!(normalize_direction(180.0), 180.0);
        assert_eq!(normalize_direction(-180.0), 180.0);
        assert_eq!(normalize_direction(270.0), -90.0);
        assert_eq!(normalize_direction(-450.0), -90.0);
        assert_eq!(normalize_direction(360.0), 0.0);
    }

    #[test]
    fn test_costume_selection() {
        let mut sprite = Target::sprite("Cat").with_costumes(["a", "b", "c"]);
        sprite.set_costume_number(2.0);
        assert_eq!(sprite.costume_name(), Some("b"));
        sprite.set_costume_number(4.0);
        assert_eq!(sprite.costume_name(), Some("a"));
        assert!(sprite.set_costume_name("c"));
        sprite.next_costume();
        assert_eq!(sprite.costume, 0);
        assert!(!sprite.set_costume_name("zebra"));
    }
}
