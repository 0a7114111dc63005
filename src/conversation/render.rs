//! Render instructions handed to the transport.

use super::selector::Selector;

/// Which selectors the user can pick next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// Rows of selectors, laid out as the transport sees fit.
    Selectors(Vec<Vec<Selector>>),
    /// Hide any previously shown keyboard.
    Remove,
}

impl Keyboard {
    /// Flattened selectors, row by row.
    pub fn selectors(&self) -> Vec<Selector> {
        match self {
            Self::Selectors(rows) => rows.iter().flatten().copied().collect(),
            Self::Remove => Vec::new(),
        }
    }

    pub fn offers(&self, selector: Selector) -> bool {
        self.selectors().contains(&selector)
    }
}

/// One outbound message for a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Render {
    pub user_id: String,
    pub body: String,
    pub keyboard: Keyboard,
}

impl Render {
    pub fn new(user_id: impl Into<String>, body: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            user_id: user_id.into(),
            body: body.into(),
            keyboard,
        }
    }
}
