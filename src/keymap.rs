//! Context-based keymap.
//!
//! Bindings are matched against a context stack, with more specific contexts winning.
//! Example: ConfirmDelete > Input > Thread > Global

use crate::ports::{KeyCode, KeyModifiers};

/// Contexts that can be active. Forms a specificity hierarchy.
/// More specific contexts (higher discriminant) take precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    /// Always active - lowest precedence
    Global = 0,
    /// Browsing the thread
    Thread = 1,
    /// The selected comment belongs to the current user
    OwnComment = 2,
    /// Typing a comment, reply or edit
    Input = 3,
    /// Delete confirmation modal is shown
    ConfirmDelete = 4,
    /// Help overlay is shown
    Help = 5,
}

/// Categories for grouping keybindings in help display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HelpCategory {
    Navigation = 0,
    Comments = 1,
    General = 2,
}

impl HelpCategory {
    pub fn display_name(self) -> &'static str {
        match self {
            HelpCategory::Navigation => "Navigation",
            HelpCategory::Comments => "Comments",
            HelpCategory::General => "General",
        }
    }
}

impl Context {
    /// Specificity for precedence ordering. Higher = more specific.
    pub fn specificity(self) -> u8 {
        self as u8
    }
}

/// Actions that can be triggered by key bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    // Navigation
    MoveDown,
    MoveUp,
    PageDown,
    PageUp,
    GotoTop,
    GotoBottom,

    // Comment actions
    Upvote,
    Downvote,
    Reply,
    Edit,
    Delete,
    Compose,

    // Input mode
    SubmitInput,
    CancelInput,
    InputBackspace,

    // Delete confirmation
    ConfirmDelete,
    CancelDelete,

    // General
    Reset,
    ShowHelp,
    DismissHelp,
    Quit,
}

/// A single key binding with optional context requirement.
#[derive(Debug, Clone)]
pub struct KeyBinding {
    pub key: KeyCode,
    pub modifiers: KeyModifiers,
    /// If Some, binding only active in this context. None = Global.
    pub context: Option<Context>,
    pub action: Action,
    /// Description for help display. If None, binding is hidden from help.
    pub help_text: Option<&'static str>,
    /// Category for grouping in help display.
    pub category: Option<HelpCategory>,
}

impl KeyBinding {
    pub fn new(key: KeyCode, action: Action) -> Self {
        Self {
            key,
            modifiers: KeyModifiers::default(),
            context: None,
            action,
            help_text: None,
            category: None,
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.modifiers.ctrl = true;
        self
    }

    pub fn in_context(mut self, ctx: Context) -> Self {
        self.context = Some(ctx);
        self
    }

    /// Add help text and category for display in help menu.
    pub fn help(mut self, category: HelpCategory, text: &'static str) -> Self {
        self.category = Some(category);
        self.help_text = Some(text);
        self
    }
}

/// The keymap holds all bindings and dispatches key events.
pub struct Keymap {
    bindings: Vec<KeyBinding>,
}

impl Keymap {
    pub fn new() -> Self {
        Self { bindings: Vec::new() }
    }

    /// Add a binding. Later bindings take precedence at same specificity.
    pub fn bind(&mut self, binding: KeyBinding) {
        self.bindings.push(binding);
    }

    /// Look up the action for a key event given active contexts.
    /// Returns the action from the most specific matching context.
    pub fn lookup(
        &self,
        key: KeyCode,
        modifiers: KeyModifiers,
        active_contexts: &[Context],
    ) -> Option<Action> {
        let mut best_match: Option<(u8, Action)> = None;

        // Iterate in reverse so later bindings win at same specificity
        for binding in self.bindings.iter().rev() {
            if !Self::key_matches(binding, key, modifiers) {
                continue;
            }

            let specificity = match binding.context {
                None => 0,
                Some(ctx) if active_contexts.contains(&ctx) => ctx.specificity(),
                Some(_) => continue,
            };

            match best_match {
                None => best_match = Some((specificity, binding.action)),
                Some((best_spec, _)) if specificity > best_spec => {
                    best_match = Some((specificity, binding.action));
                }
                _ => {}
            }
        }

        best_match.map(|(_, action)| action)
    }

    /// Case-sensitive for chars; ctrl must agree, alt is ignored.
    fn key_matches(binding: &KeyBinding, key: KeyCode, modifiers: KeyModifiers) -> bool {
        binding.key == key && binding.modifiers.ctrl == modifiers.ctrl
    }

    /// Generate help entries grouped by category.
    pub fn help_entries(&self) -> Vec<(HelpCategory, Vec<HelpEntry>)> {
        use std::collections::{BTreeMap, HashSet};

        let mut by_category: BTreeMap<HelpCategory, Vec<HelpEntry>> = BTreeMap::new();
        let mut seen_keys: HashSet<String> = HashSet::new();

        for binding in &self.bindings {
            if let (Some(category), Some(text)) = (binding.category, binding.help_text) {
                let key_display = format_key_display(&binding.key, &binding.modifiers);

                // Deduplicate by key display string (first one wins)
                if !seen_keys.insert(key_display.clone()) {
                    continue;
                }

                by_category.entry(category).or_default().push(HelpEntry {
                    key_display,
                    description: text,
                    context_hint: binding.context.and_then(format_context_hint),
                });
            }
        }

        by_category.into_iter().collect()
    }
}

/// Entry for help display.
#[derive(Debug, Clone)]
pub struct HelpEntry {
    pub key_display: String,
    pub description: &'static str,
    pub context_hint: Option<&'static str>,
}

fn format_key_display(key: &KeyCode, modifiers: &KeyModifiers) -> String {
    let mut parts = Vec::new();

    if modifiers.ctrl {
        parts.push("Ctrl+".to_string());
    }

    let key_str = match key {
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Up => "↑".to_string(),
        KeyCode::Down => "↓".to_string(),
        KeyCode::PageUp => "PgUp".to_string(),
        KeyCode::PageDown => "PgDn".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
    };

    parts.push(key_str);
    parts.concat()
}

fn format_context_hint(ctx: Context) -> Option<&'static str> {
    match ctx {
        Context::OwnComment => Some("yours"),
        Context::Input => Some("input"),
        Context::ConfirmDelete => Some("confirm"),
        _ => None,
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the default keymap with all bindings.
pub fn build_default_keymap() -> Keymap {
    use HelpCategory::*;

    let mut km = Keymap::new();

    let key = |k: KeyCode, a: Action| KeyBinding::new(k, a);
    let ch = |c: char, a: Action| KeyBinding::new(KeyCode::Char(c), a);

    // === Navigation (shown in help) ===
    km.bind(ch('j', Action::MoveDown).help(Navigation, "Next comment"));
    km.bind(ch('k', Action::MoveUp).help(Navigation, "Previous comment"));
    km.bind(ch('g', Action::GotoTop).help(Navigation, "First comment"));
    km.bind(ch('G', Action::GotoBottom).help(Navigation, "Last comment"));
    km.bind(key(KeyCode::PageDown, Action::PageDown).help(Navigation, "Page down"));
    km.bind(key(KeyCode::PageUp, Action::PageUp).help(Navigation, "Page up"));

    // === Comments (shown in help) ===
    km.bind(ch('+', Action::Upvote).help(Comments, "Upvote (again to undo)"));
    km.bind(ch('-', Action::Downvote).help(Comments, "Downvote (again to undo)"));
    km.bind(ch('r', Action::Reply).in_context(Context::Thread).help(Comments, "Reply"));
    km.bind(ch('e', Action::Edit).in_context(Context::OwnComment).help(Comments, "Edit comment"));
    km.bind(ch('D', Action::Delete).in_context(Context::OwnComment).help(Comments, "Delete comment"));
    km.bind(ch('c', Action::Compose).in_context(Context::Thread).help(Comments, "New comment"));
    km.bind(key(KeyCode::Enter, Action::SubmitInput).in_context(Context::Input).help(Comments, "Send / update"));
    km.bind(key(KeyCode::Esc, Action::CancelInput).in_context(Context::Input).help(Comments, "Cancel"));

    // === General (shown in help) ===
    km.bind(ch('r', Action::Reset).with_ctrl().help(General, "Reset to sample thread"));
    km.bind(ch('?', Action::ShowHelp).help(General, "Toggle help"));
    km.bind(ch('q', Action::Quit).help(General, "Quit"));

    // === Additional bindings (not shown in help - duplicates or internal) ===
    km.bind(key(KeyCode::Down, Action::MoveDown));
    km.bind(key(KeyCode::Up, Action::MoveUp));
    km.bind(key(KeyCode::Home, Action::GotoTop));
    km.bind(key(KeyCode::End, Action::GotoBottom));
    km.bind(ch('=', Action::Upvote));
    km.bind(ch('c', Action::Quit).with_ctrl());

    // === Input mode ===
    // Plain characters never reach the keymap here; the app inserts them.
    km.bind(key(KeyCode::Backspace, Action::InputBackspace).in_context(Context::Input));

    // === Delete confirmation ===
    km.bind(ch('y', Action::ConfirmDelete).in_context(Context::ConfirmDelete));
    km.bind(key(KeyCode::Enter, Action::ConfirmDelete).in_context(Context::ConfirmDelete));
    km.bind(ch('n', Action::CancelDelete).in_context(Context::ConfirmDelete));
    km.bind(key(KeyCode::Esc, Action::CancelDelete).in_context(Context::ConfirmDelete));
    km.bind(ch('q', Action::CancelDelete).in_context(Context::ConfirmDelete));

    // === Help mode - highest precedence for dismissal ===
    km.bind(key(KeyCode::Esc, Action::DismissHelp).in_context(Context::Help));
    km.bind(ch('?', Action::DismissHelp).in_context(Context::Help));
    km.bind(ch('q', Action::DismissHelp).in_context(Context::Help));
    km.bind(key(KeyCode::Enter, Action::DismissHelp).in_context(Context::Help));

    km
}
