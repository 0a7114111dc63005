//! Per-user dialog state.

use chrono::{DateTime, Utc};

use super::draft::OrderDraft;
use super::selector::BrowseView;

/// Node of the dialog state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DialogState {
    /// Session exists but the user has not said "start" yet.
    #[default]
    Idle,
    MainMenu,
    ChoosingBase,
    ChoosingToppings,
    /// Read-only recipe or about view. Follows the main-menu rules.
    Browsing(BrowseView),
}

impl DialogState {
    /// Whether main-menu selections apply in this state.
    pub fn accepts_menu(&self) -> bool {
        matches!(self, Self::MainMenu | Self::Browsing(_))
    }
}

impl std::fmt::Display for DialogState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::MainMenu => "main_menu",
            Self::ChoosingBase => "choosing_base",
            Self::ChoosingToppings => "choosing_toppings",
            Self::Browsing(BrowseView::Recipes) => "browsing_recipes",
            Self::Browsing(BrowseView::About) => "browsing_about",
        };
        write!(f, "{s}")
    }
}

/// Conversational state for one user.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub state: DialogState,
    pub draft: OrderDraft,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            state: DialogState::Idle,
            draft: OrderDraft::new(),
            last_activity: Utc::now(),
        }
    }

    /// Back to the main menu with an empty draft.
    pub fn restart(&mut self) {
        self.state = DialogState::MainMenu;
        self.draft.clear();
        self.touch();
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// True if the last activity happened before `cutoff`.
    pub fn is_idle_since(&self, cutoff: DateTime<Utc>) -> bool {
        self.last_activity < cutoff
    }
}
