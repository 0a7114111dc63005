//! In-progress order: a base and a set of toppings.

use super::selector::{Base, Topping};

/// Shown in a summary when no topping was picked. Display only.
pub const FALLBACK_TOPPING: Topping = Topping::Cheese;

/// Shown in a summary when no base was picked. Display only.
pub const DEFAULT_BASE: Base = Base::Classic;

/// What a toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Added,
    Removed,
}

/// Accumulated, not-yet-finalized pizza.
///
/// Toppings are unique and kept in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderDraft {
    base: Option<Base>,
    toppings: Vec<Topping>,
}

impl OrderDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base(&self) -> Option<Base> {
        self.base
    }

    pub fn toppings(&self) -> &[Topping] {
        &self.toppings
    }

    pub fn contains(&self, topping: Topping) -> bool {
        self.toppings.contains(&topping)
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_none() && self.toppings.is_empty()
    }

    pub fn set_base(&mut self, base: Base) {
        self.base = Some(base);
    }

    /// Add `topping` if absent, remove it if present.
    pub fn toggle(&mut self, topping: Topping) -> Toggle {
        if let Some(pos) = self.toppings.iter().position(|t| *t == topping) {
            self.toppings.remove(pos);
            Toggle::Removed
        } else {
            self.toppings.push(topping);
            Toggle::Added
        }
    }

    pub fn clear_toppings(&mut self) {
        self.toppings.clear();
    }

    /// Drop both base and toppings.
    pub fn clear(&mut self) {
        self.base = None;
        self.toppings.clear();
    }

    /// Snapshot for the final summary. Leaves the draft untouched.
    pub fn summary(&self) -> OrderSummary {
        let used_fallback = self.toppings.is_empty();
        let toppings = if used_fallback {
            vec![FALLBACK_TOPPING]
        } else {
            self.toppings.clone()
        };

        OrderSummary {
            base: self.base.unwrap_or(DEFAULT_BASE),
            toppings,
            used_fallback,
        }
    }
}

/// A finalized order as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSummary {
    pub base: Base,
    pub toppings: Vec<Topping>,
    /// True when `toppings` holds the display fallback rather than a choice.
    pub used_fallback: bool,
}
