//! Stable input vocabulary for the dialog.
//!
//! Selectors are routing keys only. Display labels live in [`crate::menu`],
//! which maps them back to selectors for transports that echo label text.

use serde::{Deserialize, Serialize};

/// Pizza base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Base {
    Classic,
    Thin,
    Thick,
}

impl Base {
    pub const ALL: [Base; 3] = [Base::Classic, Base::Thin, Base::Thick];

    pub fn token(&self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Thin => "thin",
            Self::Thick => "thick",
        }
    }
}

/// Topping that can be toggled onto a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topping {
    TomatoSauce,
    Cheese,
    Pepperoni,
    Mushrooms,
}

impl Topping {
    pub const ALL: [Topping; 4] = [
        Topping::TomatoSauce,
        Topping::Cheese,
        Topping::Pepperoni,
        Topping::Mushrooms,
    ];

    pub fn token(&self) -> &'static str {
        match self {
            Self::TomatoSauce => "tomato_sauce",
            Self::Cheese => "cheese",
            Self::Pepperoni => "pepperoni",
            Self::Mushrooms => "mushrooms",
        }
    }
}

/// Static recipe card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recipe {
    Margherita,
    Pepperoni,
    Mushroom,
    Hawaiian,
}

impl Recipe {
    pub const ALL: [Recipe; 4] = [
        Recipe::Margherita,
        Recipe::Pepperoni,
        Recipe::Mushroom,
        Recipe::Hawaiian,
    ];

    pub fn token(&self) -> &'static str {
        match self {
            Self::Margherita => "recipe_margherita",
            Self::Pepperoni => "recipe_pepperoni",
            Self::Mushroom => "recipe_mushroom",
            Self::Hawaiian => "recipe_hawaiian",
        }
    }
}

/// Read-only sub-view reachable from the main menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrowseView {
    Recipes,
    About,
}

/// Slash-style commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Start,
}

/// A menu selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selector {
    CreateOrder,
    Recipes,
    About,
    Cancel,
    Back,
    MainMenu,
    Done,
    Base(Base),
    Topping(Topping),
    Recipe(Recipe),
}

impl Selector {
    pub fn token(&self) -> &'static str {
        match self {
            Self::CreateOrder => "create_order",
            Self::Recipes => "recipes",
            Self::About => "about",
            Self::Cancel => "cancel",
            Self::Back => "back",
            Self::MainMenu => "main_menu",
            Self::Done => "done",
            Self::Base(base) => base.token(),
            Self::Topping(topping) => topping.token(),
            Self::Recipe(recipe) => recipe.token(),
        }
    }

    /// Every selector, in a stable order.
    pub fn all() -> Vec<Selector> {
        let mut all = vec![
            Self::CreateOrder,
            Self::Recipes,
            Self::About,
            Self::Cancel,
            Self::Back,
            Self::MainMenu,
            Self::Done,
        ];
        all.extend(Base::ALL.map(Self::Base));
        all.extend(Topping::ALL.map(Self::Topping));
        all.extend(Recipe::ALL.map(Self::Recipe));
        all
    }

    /// Look a selector up by its token.
    pub fn from_token(token: &str) -> Option<Selector> {
        Self::all().into_iter().find(|s| s.token() == token)
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// One classified inbound event payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Command(Command),
    Select(Selector),
    /// Free text that matched nothing. Never an error.
    Unrecognized(String),
}

impl Input {
    /// Classify raw text by token.
    ///
    /// Case-insensitive; spaces and dashes count as underscores, a leading
    /// `/` is ignored and a Telegram `@botname` suffix is dropped.
    pub fn parse(raw: &str) -> Input {
        let normalized = normalize(raw);

        if normalized == "start" {
            return Input::Command(Command::Start);
        }

        match Selector::from_token(&normalized) {
            Some(selector) => Input::Select(selector),
            None => Input::Unrecognized(raw.to_string()),
        }
    }
}

fn normalize(raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches('/');
    let without_bot = trimmed.split('@').next().unwrap_or(trimmed);
    without_bot
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .replace('-', "_")
        .to_lowercase()
}
