//! Presentation: button labels, keyboard layouts and message copy.
//!
//! The engine only speaks [`Selector`]s; everything user-visible is here.

use crate::conversation::draft::{OrderSummary, Toggle};
use crate::conversation::render::Keyboard;
use crate::conversation::selector::{Base, Input, Recipe, Selector, Topping};

pub const WELCOME: &str = "🍕 *PIZZAMASTER* 🍕\n\n\
Your personal chef for the perfect pizza!\n\n*Pick an action:* 👇";
pub const MAIN_MENU: &str = "Main menu:";
pub const CHOOSE_BASE: &str = "🎉 *LET'S MAKE A PIZZA!*\n\nPick a base: 🍞";
pub const BASE_REPROMPT: &str = "Please pick one of the bases below 👇";
pub const CHOOSE_TOPPINGS: &str = "🥗 *PICK YOUR TOPPINGS:*\n\nYou can pick several! ✅";
pub const RECIPES: &str = "📖 *POPULAR RECIPES*\n\nPick a recipe: 👇";
pub const ABOUT: &str = "ℹ️ *ABOUT PIZZAMASTER*\n\n\
Build the perfect pizza quickly and easily! 🍕\n\n\
*What the bot can do:*\n\
• Build your own recipes\n\
• Show classic combinations\n\
• Help you pick ingredients";
pub const FAREWELL: &str = "Goodbye! 👋";

/// Button label for a selector.
pub fn label(selector: Selector) -> &'static str {
    match selector {
        Selector::CreateOrder => "🍕 Create pizza",
        Selector::Recipes => "📖 Recipes",
        Selector::About => "ℹ️ About",
        Selector::Cancel => "❌ Exit",
        Selector::Back => "🔙 Back",
        Selector::MainMenu => "🔙 Main menu",
        Selector::Done => "✅ Done",
        Selector::Base(Base::Classic) => "🧂 Classic",
        Selector::Base(Base::Thin) => "🌾 Thin",
        Selector::Base(Base::Thick) => "🍕 Thick",
        Selector::Topping(Topping::TomatoSauce) => "🍅 Tomato",
        Selector::Topping(Topping::Cheese) => "🧀 Cheese",
        Selector::Topping(Topping::Pepperoni) => "🍖 Pepperoni",
        Selector::Topping(Topping::Mushrooms) => "🍄 Mushrooms",
        Selector::Recipe(Recipe::Margherita) => "🍕 Margherita",
        Selector::Recipe(Recipe::Pepperoni) => "🍕 Pepperoni",
        Selector::Recipe(Recipe::Mushroom) => "🍕 Mushroom",
        Selector::Recipe(Recipe::Hawaiian) => "🍕 Hawaiian",
    }
}

/// Reverse of [`label`]. Exact match after trimming.
pub fn parse_label(text: &str) -> Option<Selector> {
    let text = text.trim();
    Selector::all().into_iter().find(|s| label(*s) == text)
}

/// Classify raw user text: button labels first, then tokens and commands.
pub fn parse_input(text: &str) -> Input {
    match parse_label(text) {
        Some(selector) => Input::Select(selector),
        None => Input::parse(text),
    }
}

// ── Keyboards ───────────────────────────────────────────────────────

pub fn main_menu_keyboard() -> Keyboard {
    Keyboard::Selectors(vec![
        vec![Selector::CreateOrder, Selector::Recipes],
        vec![Selector::About, Selector::Cancel],
    ])
}

pub fn base_keyboard() -> Keyboard {
    Keyboard::Selectors(vec![
        vec![Selector::Base(Base::Classic), Selector::Base(Base::Thin)],
        vec![Selector::Base(Base::Thick), Selector::Back],
    ])
}

pub fn topping_keyboard() -> Keyboard {
    Keyboard::Selectors(vec![
        vec![
            Selector::Topping(Topping::TomatoSauce),
            Selector::Topping(Topping::Cheese),
        ],
        vec![
            Selector::Topping(Topping::Pepperoni),
            Selector::Topping(Topping::Mushrooms),
        ],
        vec![Selector::Done, Selector::Back],
    ])
}

pub fn recipe_keyboard() -> Keyboard {
    Keyboard::Selectors(vec![
        vec![
            Selector::Recipe(Recipe::Margherita),
            Selector::Recipe(Recipe::Pepperoni),
        ],
        vec![
            Selector::Recipe(Recipe::Mushroom),
            Selector::Recipe(Recipe::Hawaiian),
        ],
        vec![Selector::MainMenu],
    ])
}

pub fn back_only_keyboard() -> Keyboard {
    Keyboard::Selectors(vec![vec![Selector::MainMenu]])
}

// ── Copy ────────────────────────────────────────────────────────────

pub fn base_name(base: Base) -> &'static str {
    match base {
        Base::Classic => "Classic dough",
        Base::Thin => "Thin dough",
        Base::Thick => "Thick dough",
    }
}

pub fn topping_name(topping: Topping) -> &'static str {
    match topping {
        Topping::TomatoSauce => "Tomato sauce",
        Topping::Cheese => "Mozzarella cheese",
        Topping::Pepperoni => "Pepperoni",
        Topping::Mushrooms => "Mushrooms",
    }
}

/// Feedback after a topping toggle, listing the current selection.
pub fn toggle_text(topping: Topping, outcome: Toggle, current: &[Topping]) -> String {
    let head = match outcome {
        Toggle::Added => format!("✅ *{}* added", topping_name(topping)),
        Toggle::Removed => format!("❌ *{}* removed", topping_name(topping)),
    };
    let selected = if current.is_empty() {
        "nothing yet".to_string()
    } else {
        join_toppings(current)
    };
    format!("{head}\n\n🥗 *Selected:* {selected}")
}

pub fn summary_text(summary: &OrderSummary) -> String {
    format!(
        "🎊 *YOUR PIZZA IS READY!* 🎊\n\n🍕 *Base:* {}\n🥗 *Toppings:* {}\n\nEnjoy! 😋",
        base_name(summary.base),
        join_toppings(&summary.toppings)
    )
}

pub fn recipe_card(recipe: Recipe) -> String {
    let (title, ingredients): (&str, &[&str]) = match recipe {
        Recipe::Margherita => (
            "MARGHERITA",
            &["Tomato sauce", "Mozzarella cheese", "Basil", "Olive oil"],
        ),
        Recipe::Pepperoni => (
            "PEPPERONI",
            &["Tomato sauce", "Mozzarella cheese", "Pepperoni", "Oregano"],
        ),
        Recipe::Mushroom => (
            "MUSHROOM",
            &["Tomato sauce", "Mozzarella cheese", "Mushrooms", "Garlic"],
        ),
        Recipe::Hawaiian => (
            "HAWAIIAN",
            &["Tomato sauce", "Mozzarella cheese", "Ham", "Pineapple"],
        ),
    };

    let lines: Vec<String> = ingredients.iter().map(|i| format!("• {i}")).collect();
    format!("🍕 *{title}*\n\n*Ingredients:*\n{}", lines.join("\n"))
}

fn join_toppings(toppings: &[Topping]) -> String {
    toppings
        .iter()
        .map(|t| topping_name(*t))
        .collect::<Vec<_>>()
        .join(", ")
}
