//! Screen navigation as an explicit state machine.

use std::fmt;

use thiserror::Error;

use crate::catalog::KnotCatalogEntry;

/// The screen currently shown. Exactly one is active at a time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Home,
    Scanner,
    Catalog,
    CatalogDetail(KnotCatalogEntry),
}

impl Screen {
    fn kind(&self) -> &'static str {
        match self {
            Screen::Home => "home",
            Screen::Scanner => "scanner",
            Screen::Catalog => "catalog",
            Screen::CatalogDetail(_) => "catalog detail",
        }
    }
}

/// User intents that move between screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    OpenScanner,
    OpenCatalog,
    SelectEntry,
    Back,
}

impl fmt::Display for NavAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NavAction::OpenScanner => "open scanner",
            NavAction::OpenCatalog => "open catalog",
            NavAction::SelectEntry => "select entry",
            NavAction::Back => "back",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("cannot {action} from the {from} screen")]
    InvalidTransition { from: &'static str, action: NavAction },
}

/// Holds the active screen and applies transitions. A rejected transition
/// leaves the current screen unchanged.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    current: Screen,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &Screen {
        &self.current
    }

    /// Home -> Scanner.
    pub fn open_scanner(&mut self) -> Result<&Screen, NavigationError> {
        match self.current {
            Screen::Home => self.go(Screen::Scanner),
            _ => Err(self.invalid(NavAction::OpenScanner)),
        }
    }

    /// Home or Scanner -> Catalog.
    pub fn open_catalog(&mut self) -> Result<&Screen, NavigationError> {
        match self.current {
            Screen::Home | Screen::Scanner => self.go(Screen::Catalog),
            _ => Err(self.invalid(NavAction::OpenCatalog)),
        }
    }

    /// Catalog -> CatalogDetail(entry).
    pub fn select_entry(&mut self, entry: KnotCatalogEntry) -> Result<&Screen, NavigationError> {
        match self.current {
            Screen::Catalog => self.go(Screen::CatalogDetail(entry)),
            _ => Err(self.invalid(NavAction::SelectEntry)),
        }
    }

    /// CatalogDetail -> Catalog, Scanner or Catalog -> Home.
    pub fn back(&mut self) -> Result<&Screen, NavigationError> {
        match self.current {
            Screen::CatalogDetail(_) => self.go(Screen::Catalog),
            Screen::Scanner | Screen::Catalog => self.go(Screen::Home),
            Screen::Home => Err(self.invalid(NavAction::Back)),
        }
    }

    fn go(&mut self, next: Screen) -> Result<&Screen, NavigationError> {
        tracing::debug!(from = self.current.kind(), to = next.kind(), "navigate");
        self.current = next;
        Ok(&self.current)
    }

    fn invalid(&self, action: NavAction) -> NavigationError {
        NavigationError::InvalidTransition {
            from: self.current.kind(),
            action,
        }
    }
}
