//! Conversation system: menu-driven ordering dialog.
//!
//! A user says "start", opens the order flow, picks a base, toggles
//! toppings and confirms. Each user has one in-memory [`Session`] owned by
//! the [`ConversationEngine`]; nothing here survives a restart.

pub mod draft;
pub mod engine;
pub mod render;
pub mod selector;
pub mod session;

pub use draft::{OrderDraft, OrderSummary, Toggle, FALLBACK_TOPPING};
pub use engine::{ConversationEngine, InboundEvent};
pub use render::{Keyboard, Render};
pub use selector::{Base, BrowseView, Command, Input, Recipe, Selector, Topping};
pub use session::{DialogState, Session};
