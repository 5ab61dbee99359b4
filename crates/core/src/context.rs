use crate::domain::entry::EntryId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_CONFIDENCE: u8 = 50;
const LOW_CONFIDENCE_MAX: u8 = 33;
const MEDIUM_CONFIDENCE_MAX: u8 = 66;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FocusMode {
    #[default]
    #[serde(rename = "Learning Center")]
    LearningCenter,
    #[serde(rename = "MyGPS")]
    MyGps,
    #[serde(rename = "Investopedia")]
    Investopedia,
    #[serde(rename = "My Accounts")]
    MyAccounts,
}

impl FocusMode {
    pub const ALL: [FocusMode; 4] = [
        FocusMode::LearningCenter,
        FocusMode::MyGps,
        FocusMode::Investopedia,
        FocusMode::MyAccounts,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FocusMode::LearningCenter => "Learning Center",
            FocusMode::MyGps => "MyGPS",
            FocusMode::Investopedia => "Investopedia",
            FocusMode::MyAccounts => "My Accounts",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.label().eq_ignore_ascii_case(label.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    pub fn from_confidence(confidence: u8) -> Self {
        if confidence <= LOW_CONFIDENCE_MAX {
            ConfidenceLevel::Low
        } else if confidence <= MEDIUM_CONFIDENCE_MAX {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::High
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultTab {
    #[default]
    Overview,
    Charts,
    News,
}

/// Per-session UI state handed to the render layer by reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionContext {
    sidebar_collapsed: bool,
    confidence: u8,
    focus_mode: FocusMode,
    active_tabs: HashMap<EntryId, ResultTab>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            sidebar_collapsed: false,
            confidence: DEFAULT_CONFIDENCE,
            focus_mode: FocusMode::default(),
            active_tabs: HashMap::new(),
        }
    }
}

impl SessionContext {
    pub fn sidebar_collapsed(&self) -> bool {
        self.sidebar_collapsed
    }

    pub fn toggle_sidebar(&mut self) -> bool {
        self.sidebar_collapsed = !self.sidebar_collapsed;
        self.sidebar_collapsed
    }

    pub fn set_sidebar_collapsed(&mut self, collapsed: bool) {
        self.sidebar_collapsed = collapsed;
    }

    pub fn confidence(&self) -> u8 {
        self.confidence
    }

    /// Clamped to 0..=100.
    pub fn set_confidence(&mut self, confidence: i64) {
        self.confidence = confidence.clamp(0, 100) as u8;
    }

    pub fn confidence_level(&self) -> ConfidenceLevel {
        ConfidenceLevel::from_confidence(self.confidence)
    }

    pub fn focus_mode(&self) -> FocusMode {
        self.focus_mode
    }

    pub fn set_focus_mode(&mut self, mode: FocusMode) {
        self.focus_mode = mode;
    }

    pub fn active_tab(&self, entry: EntryId) -> ResultTab {
        self.active_tabs.get(&entry).copied().unwrap_or_default()
    }

    pub fn set_active_tab(&mut self, entry: EntryId, tab: ResultTab) {
        self.active_tabs.insert(entry, tab);
    }
}
