use super::catalog::{DrugSpec, FormulaSpec};
use super::element::Element;
use serde::{Deserialize, Serialize};

pub type ItemId = u32;

/// Shared record for crude drugs and formulas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub element: Element,
    pub description: String,
    pub effect_value: u32,
    pub owned_count: u32,
    #[serde(default)]
    pub used_count: u32,
    pub discovered: bool,
}

impl Item {
    fn new(id: ItemId, name: &str, element: Element, description: &str, effect_value: u32) -> Self {
        Self {
            id,
            name: name.to_string(),
            element,
            description: description.to_string(),
            effect_value,
            owned_count: 0,
            used_count: 0,
            discovered: false,
        }
    }

    pub fn grant(&mut self, amount: u32) {
        if amount == 0 {
            return;
        }
        self.owned_count = self.owned_count.saturating_add(amount);
        self.discovered = true;
    }

    /// Removes `amount` units if they are all available. Leaves the count untouched
    /// otherwise.
    pub fn take(&mut self, amount: u32) -> bool {
        if self.owned_count < amount {
            return false;
        }
        self.owned_count -= amount;
        true
    }

    pub fn has(&self, amount: u32) -> bool {
        self.owned_count >= amount
    }

    fn refresh_static(&mut self, name: &str, element: Element, description: &str, effect_value: u32) {
        self.name = name.to_string();
        self.element = element;
        self.description = description.to_string();
        self.effect_value = effect_value;
        if self.owned_count > 0 {
            self.discovered = true;
        }
    }
}

pub type CrudeDrug = Item;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeEntry {
    pub drug_id: ItemId,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formula {
    pub item: Item,
    pub recipe: Vec<RecipeEntry>,
}

impl From<&DrugSpec> for CrudeDrug {
    fn from(spec: &DrugSpec) -> Self {
        Item::new(spec.id, spec.name, spec.element, spec.description, spec.effect_value)
    }
}

impl From<&FormulaSpec> for Formula {
    fn from(spec: &FormulaSpec) -> Self {
        Self {
            item: Item::new(spec.id, spec.name, spec.element, spec.description, spec.effect_value),
            recipe: recipe_from_spec(spec),
        }
    }
}

fn recipe_from_spec(spec: &FormulaSpec) -> Vec<RecipeEntry> {
    spec.recipe
        .iter()
        .map(|&(drug_id, count)| RecipeEntry { drug_id, count })
        .collect()
}

pub fn refresh_drug(drug: &mut CrudeDrug, spec: &DrugSpec) {
    drug.refresh_static(spec.name, spec.element, spec.description, spec.effect_value);
}

pub fn refresh_formula(formula: &mut Formula, spec: &FormulaSpec) {
    formula
        .item
        .refresh_static(spec.name, spec.element, spec.description, spec.effect_value);
    formula.recipe = recipe_from_spec(spec);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::catalog::CRUDE_DRUGS;

    #[test]
    fn take_refuses_to_go_negative() {
        let mut drug = CrudeDrug::from(&CRUDE_DRUGS[0]);
        drug.grant(2);
        assert!(!drug.take(3));
        assert_eq!(drug.owned_count, 2);
        assert!(drug.take(2));
        assert_eq!(drug.owned_count, 0);
        assert!(drug.discovered);
    }

    #[test]
    fn granting_nothing_does_not_discover() {
        let mut drug = CrudeDrug::from(&CRUDE_DRUGS[1]);
        drug.grant(0);
        assert!(!drug.discovered);
    }
}
