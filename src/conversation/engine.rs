//! Conversation engine: the per-user dialog state machine.
//!
//! Events are handled one at a time by a single owner, so the session map
//! needs no locking. The only side effect that escapes the engine is
//! scheduling enrichment on "start", which never blocks.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::draft::OrderDraft;
use super::render::{Keyboard, Render};
use super::selector::{BrowseView, Command, Input, Selector};
use super::session::{DialogState, Session};
use crate::enrichment::EnrichmentScheduler;
use crate::menu;

/// One inbound event from a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub user_id: String,
    pub display_name: Option<String>,
    pub input: Input,
}

impl InboundEvent {
    pub fn new(user_id: impl Into<String>, input: Input) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: None,
            input,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// Result of one transition, before it is applied to the registry.
struct Step {
    /// `None` ends the session.
    next: Option<DialogState>,
    body: String,
    keyboard: Keyboard,
}

impl Step {
    fn to(next: DialogState, body: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            next: Some(next),
            body: body.into(),
            keyboard,
        }
    }

    fn end(body: impl Into<String>) -> Self {
        Self {
            next: None,
            body: body.into(),
            keyboard: Keyboard::Remove,
        }
    }

    fn main_menu() -> Self {
        Self::to(DialogState::MainMenu, menu::MAIN_MENU, menu::main_menu_keyboard())
    }
}

/// Owns every live [`Session`] and drives their transitions.
pub struct ConversationEngine {
    sessions: HashMap<String, Session>,
    enrichment: Arc<dyn EnrichmentScheduler>,
}

impl ConversationEngine {
    pub fn new(enrichment: Arc<dyn EnrichmentScheduler>) -> Self {
        Self {
            sessions: HashMap::new(),
            enrichment,
        }
    }

    /// Apply one event and return what to show the user.
    ///
    /// Always yields exactly one render; unknown input degrades to a
    /// re-prompt or the main menu.
    pub fn handle(&mut self, event: InboundEvent) -> Render {
        let InboundEvent {
            user_id,
            display_name,
            input,
        } = event;

        let session = self
            .sessions
            .entry(user_id.clone())
            .or_insert_with(|| Session::new(user_id.clone()));

        if input == Input::Command(Command::Start) {
            session.restart();
            self.enrichment.schedule(&user_id, display_name.as_deref());
            tracing::info!(user_id = %user_id, "Session started");
            return Render::new(user_id, menu::WELCOME, menu::main_menu_keyboard());
        }

        session.touch();
        let from = session.state;
        let step = transition(from, &mut session.draft, &input);

        match step.next {
            Some(next) => {
                session.state = next;
                tracing::debug!(user_id = %user_id, from = %from, to = %next, "Dialog transition");
            }
            None => {
                self.sessions.remove(&user_id);
                tracing::info!(user_id = %user_id, from = %from, "Session ended");
            }
        }

        Render::new(user_id, step.body, step.keyboard)
    }

    /// Current state for a user; `Idle` when there is no session.
    pub fn state_of(&self, user_id: &str) -> DialogState {
        self.sessions
            .get(user_id)
            .map(|s| s.state)
            .unwrap_or(DialogState::Idle)
    }

    pub fn session(&self, user_id: &str) -> Option<&Session> {
        self.sessions.get(user_id)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Drop sessions idle for longer than `max_idle`. Returns how many.
    pub fn prune_idle(&mut self, max_idle: Duration) -> usize {
        self.prune_idle_at(Utc::now(), max_idle)
    }

    /// [`Self::prune_idle`] against an explicit clock.
    pub fn prune_idle_at(&mut self, now: DateTime<Utc>, max_idle: Duration) -> usize {
        let Ok(max_idle) = chrono::Duration::from_std(max_idle) else {
            return 0;
        };
        let cutoff = now - max_idle;

        let before = self.sessions.len();
        self.sessions.retain(|_, s| !s.is_idle_since(cutoff));
        let pruned = before - self.sessions.len();
        if pruned > 0 {
            tracing::info!(pruned, remaining = self.sessions.len(), "Pruned idle sessions");
        }
        pruned
    }
}

/// Compute the next state for any input other than "start".
fn transition(state: DialogState, draft: &mut OrderDraft, input: &Input) -> Step {
    use DialogState::*;

    let Input::Select(selector) = *input else {
        return match state {
            ChoosingBase => Step::to(ChoosingBase, menu::BASE_REPROMPT, menu::base_keyboard()),
            _ => Step::main_menu(),
        };
    };

    match (state, selector) {
        (s, sel) if s.accepts_menu() => menu_transition(draft, sel),

        (ChoosingBase, Selector::Base(base)) => {
            draft.set_base(base);
            Step::to(ChoosingToppings, menu::CHOOSE_TOPPINGS, menu::topping_keyboard())
        }
        (ChoosingBase, Selector::Back) => {
            draft.clear();
            Step::main_menu()
        }
        (ChoosingBase, _) => Step::to(ChoosingBase, menu::BASE_REPROMPT, menu::base_keyboard()),

        (ChoosingToppings, Selector::Topping(topping)) => {
            let outcome = draft.toggle(topping);
            Step::to(
                ChoosingToppings,
                menu::toggle_text(topping, outcome, draft.toppings()),
                menu::topping_keyboard(),
            )
        }
        (ChoosingToppings, Selector::Done) => {
            let summary = draft.summary();
            Step::to(MainMenu, menu::summary_text(&summary), menu::main_menu_keyboard())
        }
        (ChoosingToppings, Selector::Back) => {
            draft.clear_toppings();
            Step::to(ChoosingBase, menu::CHOOSE_BASE, menu::base_keyboard())
        }

        _ => Step::main_menu(),
    }
}

/// Main menu and browse views share these rules.
fn menu_transition(draft: &mut OrderDraft, selector: Selector) -> Step {
    use DialogState::*;

    match selector {
        Selector::CreateOrder => {
            draft.clear();
            Step::to(ChoosingBase, menu::CHOOSE_BASE, menu::base_keyboard())
        }
        Selector::Recipes => Step::to(
            Browsing(BrowseView::Recipes),
            menu::RECIPES,
            menu::recipe_keyboard(),
        ),
        Selector::Recipe(recipe) => Step::to(
            Browsing(BrowseView::Recipes),
            menu::recipe_card(recipe),
            menu::recipe_keyboard(),
        ),
        Selector::About => Step::to(
            Browsing(BrowseView::About),
            menu::ABOUT,
            menu::back_only_keyboard(),
        ),
        Selector::Cancel => Step::end(menu::FAREWELL),
        _ => Step::main_menu(),
    }
}
