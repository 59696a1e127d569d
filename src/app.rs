//! Application state machine.
//! Generic over the terminal (the port is not dyn-compatible) so tests can
//! drive it with a scripted backend.

use crate::domain::{tree, AppState, Comment, CommentId, VoteDirection};
use crate::keymap::{build_default_keymap, Action, Context, Keymap};
use crate::ports::{KeyCode, KeyModifiers, Terminal, TerminalEvent};
use crate::store::{ReplyOutcome, Store};
use crate::ui::{self, composer::ComposerView};
use anyhow::Result;
use ratatui::widgets::ListState;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use tracing::debug;

const PAGE: usize = 5;

/// Where typed text goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputTarget {
    /// The top-level draft.
    NewComment,
    /// A placeholder reply under `parent`.
    Reply { id: CommentId, parent: CommentId },
    /// An existing comment. `original` is restored on cancel.
    Edit { id: CommentId, original: String },
}

/// Application state.
pub struct App {
    pub store: Store,
    pub keymap: Keymap,
    pub selected: usize,
    pub input: Option<InputTarget>,
    pub show_help: bool,
    pub should_quit: bool,
    pub list_state: ListState,
    refresh_interval: Duration,
    dirty: Rc<Cell<bool>>,
}

impl App {
    pub fn new(mut store: Store, refresh_interval: Duration) -> Self {
        let dirty = Rc::new(Cell::new(true));
        let flag = Rc::clone(&dirty);
        store.subscribe(move |_| flag.set(true));

        Self {
            store,
            keymap: build_default_keymap(),
            selected: 0,
            input: None,
            show_help: false,
            should_quit: false,
            list_state: ListState::default(),
            refresh_interval,
            dirty,
        }
    }

    /// Redraws only after a publish or a terminal event. A poll timeout is
    /// the tick that keeps relative times current.
    pub fn run<T: Terminal>(&mut self, terminal: &mut T) -> Result<()> {
        while !self.should_quit {
            self.store.refresh_display_text();

            if self.dirty.replace(false) {
                self.draw(terminal)?;
            }

            if let Some(event) = terminal.poll_event(self.refresh_interval)? {
                self.handle_event(event);
            }
        }
        Ok(())
    }

    fn draw<T: Terminal>(&mut self, terminal: &mut T) -> Result<()> {
        let state = self.store.state();
        let rows = tree::count(&state.comments);
        self.selected = self.selected.min(rows.saturating_sub(1));
        self.list_state
            .select(if rows == 0 { None } else { Some(self.selected) });

        let composer = self.composer_view(&state);
        let screen = ui::Screen {
            state: &state,
            composer: &composer,
            keymap: &self.keymap,
            show_help: self.show_help,
        };
        let list_state = &mut self.list_state;

        terminal.draw(|frame| ui::render(frame, &screen, list_state))
    }

    fn composer_view(&self, state: &AppState) -> ComposerView {
        let title = match &self.input {
            None | Some(InputTarget::NewComment) => "Add a comment".to_string(),
            Some(InputTarget::Reply { id, .. }) => tree::find(&state.comments, *id)
                .and_then(|c| c.replying_to.as_deref())
                .map(|name| format!("Reply to @{}", name))
                .unwrap_or_else(|| "Reply".to_string()),
            Some(InputTarget::Edit { .. }) => "Edit comment".to_string(),
        };

        let text = match &self.input {
            None => state.new_comment_draft.clone(),
            Some(_) => self.input_text(state),
        };

        ComposerView {
            title,
            text,
            focused: self.input.is_some(),
        }
    }

    fn handle_event(&mut self, event: TerminalEvent) {
        self.dirty.set(true);
        match event {
            TerminalEvent::Key(key) => self.handle_key(key.code, key.modifiers),
            TerminalEvent::Resize(_, _) => {}
        }
    }

    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        if let KeyCode::Char(c) = code {
            if !modifiers.ctrl && !modifiers.alt && self.typing() {
                self.update_input(|text| text.push(c));
                return;
            }
        }

        let contexts = self.active_contexts();
        match self.keymap.lookup(code, modifiers, &contexts) {
            Some(action) => self.handle_action(action),
            // Any unbound key closes help.
            None if self.show_help => self.show_help = false,
            None => {}
        }
    }

    fn typing(&self) -> bool {
        self.input.is_some() && !self.show_help && self.store.state().requested_delete.is_none()
    }

    fn active_contexts(&self) -> Vec<Context> {
        let mut contexts = vec![Context::Global];
        if self.show_help {
            contexts.push(Context::Help);
            return contexts;
        }
        if self.store.state().requested_delete.is_some() {
            contexts.push(Context::ConfirmDelete);
            return contexts;
        }
        if self.input.is_some() {
            contexts.push(Context::Input);
            return contexts;
        }

        contexts.push(Context::Thread);
        let state = self.store.state();
        if self
            .selected_comment(&state)
            .is_some_and(|c| c.is_authored_by(&state.current_user))
        {
            contexts.push(Context::OwnComment);
        }
        contexts
    }

    fn handle_action(&mut self, action: Action) {
        let confirming = self.store.state().requested_delete.is_some();

        match action {
            Action::Quit => self.should_quit = true,
            Action::ShowHelp => self.show_help = true,
            Action::DismissHelp => self.show_help = false,
            _ if self.show_help => self.show_help = false,

            Action::ConfirmDelete => self.confirm_delete(),
            Action::CancelDelete => {
                self.store.request_delete(None);
            }
            // Only the modal's own keys act while it is open.
            _ if confirming => {}

            Action::MoveDown => self.select(self.selected.saturating_add(1)),
            Action::MoveUp => self.select(self.selected.saturating_sub(1)),
            Action::PageDown => self.select(self.selected.saturating_add(PAGE)),
            Action::PageUp => self.select(self.selected.saturating_sub(PAGE)),
            Action::GotoTop => self.select(0),
            Action::GotoBottom => self.select(usize::MAX),

            Action::Upvote => self.vote(VoteDirection::Up),
            Action::Downvote => self.vote(VoteDirection::Down),
            Action::Reply => self.start_reply(),
            Action::Edit => self.start_edit(),
            Action::Delete => {
                if let Some(id) = self.selected_id() {
                    self.store.request_delete(Some(id));
                }
            }
            Action::Compose => self.input = Some(InputTarget::NewComment),

            Action::SubmitInput => self.submit_input(),
            Action::CancelInput => self.cancel_input(),
            Action::InputBackspace => self.update_input(|text| {
                text.pop();
            }),

            Action::Reset => {
                self.input = None;
                self.selected = 0;
                self.store.reset();
            }
        }
    }

    // ─── Selection ───

    fn select(&mut self, index: usize) {
        let rows = self.store.state().comment_count();
        self.selected = index.min(rows.saturating_sub(1));
    }

    fn select_id(&mut self, id: CommentId) {
        let state = self.store.state();
        if let Some(index) = tree::walk(&state.comments).position(|(_, c)| c.id == id) {
            self.selected = index;
        }
    }

    fn selected_comment<'a>(&self, state: &'a AppState) -> Option<&'a Comment> {
        tree::walk(&state.comments)
            .nth(self.selected)
            .map(|(_, c)| c)
    }

    pub fn selected_id(&self) -> Option<CommentId> {
        let state = self.store.state();
        self.selected_comment(&state).map(|c| c.id)
    }

    // ─── Comment actions ───

    fn vote(&mut self, direction: VoteDirection) {
        if let Some(id) = self.selected_id() {
            self.store.vote(id, direction);
        }
    }

    fn start_reply(&mut self) {
        let state = self.store.state();
        let Some(comment) = self.selected_comment(&state) else {
            return;
        };
        // A placeholder left unfinished by an earlier session resumes as is.
        if comment.pending_reply && comment.is_authored_by(&state.current_user) {
            if let Some(parent) = tree::parent_of(&state.comments, comment.id) {
                self.input = Some(InputTarget::Reply {
                    id: comment.id,
                    parent: parent.id,
                });
            }
            return;
        }
        if comment.is_authored_by(&state.current_user) || comment.has_pending_reply() {
            debug!(id = comment.id, "reply not available");
            return;
        }

        let parent = comment.id;
        if let Some(id) = self.store.add_reply(parent) {
            self.input = Some(InputTarget::Reply { id, parent });
            self.select_id(id);
        }
    }

    fn start_edit(&mut self) {
        let state = self.store.state();
        let Some(comment) = self.selected_comment(&state) else {
            return;
        };
        if !comment.is_authored_by(&state.current_user) || comment.pending_reply {
            return;
        }

        let id = comment.id;
        let original = comment.content.clone();
        // A comment left in edit mode by an earlier session resumes as is.
        if comment.pending_edit || self.store.begin_edit(id) {
            self.input = Some(InputTarget::Edit { id, original });
        }
    }

    fn confirm_delete(&mut self) {
        let Some(id) = self.store.state().requested_delete else {
            return;
        };
        self.store.delete_comment(id);
        self.store.request_delete(None);
        self.select(self.selected);
    }

    // ─── Input ───

    fn input_text(&self, state: &AppState) -> String {
        match &self.input {
            Some(InputTarget::NewComment) => state.new_comment_draft.clone(),
            Some(InputTarget::Reply { id, .. }) | Some(InputTarget::Edit { id, .. }) => {
                tree::find(&state.comments, *id)
                    .map(|c| c.content.clone())
                    .unwrap_or_default()
            }
            None => String::new(),
        }
    }

    fn update_input(&mut self, change: impl FnOnce(&mut String)) {
        let Some(target) = self.input.clone() else {
            return;
        };
        let mut text = self.input_text(&self.store.state());
        change(&mut text);

        match target {
            InputTarget::NewComment => self.store.set_new_comment_content(text),
            InputTarget::Reply { id, .. } => self.store.set_reply_content(id, text),
            InputTarget::Edit { id, .. } => self.store.edit_content(id, text),
        };
    }

    fn submit_input(&mut self) {
        let Some(target) = self.input.clone() else {
            return;
        };

        match target {
            InputTarget::NewComment => {
                if let Some(id) = self.store.add_comment() {
                    self.input = None;
                    self.select_id(id);
                }
            }
            InputTarget::Reply { id, parent } => {
                self.input = None;
                match self.store.submit_reply(id) {
                    ReplyOutcome::Submitted | ReplyOutcome::AlreadyFinal => self.select_id(id),
                    ReplyOutcome::Cancelled | ReplyOutcome::Missing => self.select_id(parent),
                }
            }
            InputTarget::Edit { id, .. } => {
                // Blank edits stay open.
                if self.store.finish_edit(id) {
                    self.input = None;
                }
            }
        }
    }

    fn cancel_input(&mut self) {
        let Some(target) = self.input.take() else {
            return;
        };

        match target {
            // The draft is kept for next time.
            InputTarget::NewComment => {}
            InputTarget::Reply { id, parent } => {
                self.store.set_reply_content(id, "");
                self.store.submit_reply(id);
                self.select_id(parent);
            }
            InputTarget::Edit { id, original } => {
                self.store.edit_content(id, original);
                self.store.finish_edit(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::KeyEvent;
    use crate::test_support::seeded_store;
    use ratatui::backend::TestBackend;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    fn app() -> App {
        App::new(seeded_store(), Duration::from_millis(10))
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(code, KeyModifiers::NONE);
    }

    fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn content(app: &App, id: CommentId) -> Option<String> {
        tree::find(&app.store.state().comments, id).map(|c| c.content.clone())
    }

    /// Scripted terminal: replays events, then asks to quit.
    struct FakeTerminal {
        terminal: ratatui::Terminal<TestBackend>,
        events: RefCell<VecDeque<TerminalEvent>>,
        draws: usize,
    }

    impl FakeTerminal {
        fn new(events: Vec<KeyCode>) -> Self {
            let events = events
                .into_iter()
                .map(|code| {
                    TerminalEvent::Key(KeyEvent {
                        code,
                        modifiers: KeyModifiers::NONE,
                    })
                })
                .collect();
            Self {
                terminal: ratatui::Terminal::new(TestBackend::new(100, 40)).unwrap(),
                events: RefCell::new(events),
                draws: 0,
            }
        }

        fn screen_text(&self) -> String {
            let buffer = self.terminal.backend().buffer();
            buffer.content().iter().map(|cell| cell.symbol()).collect()
        }
    }

    impl Terminal for FakeTerminal {
        fn draw<F>(&mut self, f: F) -> Result<()>
        where
            F: FnOnce(&mut ratatui::Frame),
        {
            self.draws += 1;
            self.terminal.draw(f)?;
            Ok(())
        }

        fn poll_event(&self, _timeout: Duration) -> Result<Option<TerminalEvent>> {
            let next = self.events.borrow_mut().pop_front();
            Ok(Some(next.unwrap_or(TerminalEvent::Key(KeyEvent {
                code: KeyCode::Char('q'),
                modifiers: KeyModifiers::NONE,
            }))))
        }
    }

    #[test]
    fn test_starts_on_first_comment() {
        let app = app();
        assert_eq!(app.selected_id(), Some(1));
        assert!(app.input.is_none());
    }

    #[test]
    fn test_navigation_follows_thread_order() {
        let mut app = app();
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Down);
        assert_eq!(app.selected_id(), Some(3));

        press(&mut app, KeyCode::Char('G'));
        assert_eq!(app.selected_id(), Some(4));
        // Should not go past the last comment
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.selected_id(), Some(4));

        press(&mut app, KeyCode::Char('g'));
        press(&mut app, KeyCode::Up);
        assert_eq!(app.selected_id(), Some(1));
    }

    #[test]
    fn test_votes_apply_to_selection() {
        let mut app = app();
        press(&mut app, KeyCode::Char('+'));
        assert_eq!(tree::find(&app.store.state().comments, 1).unwrap().score, 13);
        press(&mut app, KeyCode::Char('-'));
        assert_eq!(tree::find(&app.store.state().comments, 1).unwrap().score, 11);
    }

    #[test]
    fn test_reply_flow() {
        let mut app = app();
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.input, Some(InputTarget::Reply { id: 5, parent: 1 }));
        assert_eq!(app.selected_id(), Some(5));

        type_str(&mut app, "nice!x");
        press(&mut app, KeyCode::Backspace);
        assert_eq!(content(&app, 5).as_deref(), Some("nice!"));

        press(&mut app, KeyCode::Enter);
        assert!(app.input.is_none());
        let state = app.store.state();
        let reply = tree::find(&state.comments, 5).unwrap();
        assert!(!reply.pending_reply);
        assert_eq!(reply.replying_to.as_deref(), Some("amyrobson"));
    }

    #[test]
    fn test_cancelled_reply_is_removed() {
        let mut app = app();
        press(&mut app, KeyCode::Char('r'));
        type_str(&mut app, "never mind");
        press(&mut app, KeyCode::Esc);

        assert!(app.input.is_none());
        assert_eq!(content(&app, 5), None);
        assert_eq!(app.selected_id(), Some(1));
    }

    #[test]
    fn test_no_reply_to_own_comment_or_twice() {
        let mut app = app();
        press(&mut app, KeyCode::Char('G'));
        press(&mut app, KeyCode::Char('r'));
        assert!(app.input.is_none());
        assert_eq!(app.store.state().comment_count(), 4);

        press(&mut app, KeyCode::Char('g'));
        press(&mut app, KeyCode::Char('r'));
        press(&mut app, KeyCode::Esc);
        // Leave a pending placeholder behind through the store directly.
        app.store.add_reply(1);
        press(&mut app, KeyCode::Char('r'));
        assert!(app.input.is_none());
    }

    #[test]
    fn test_saved_pending_reply_reopens() {
        let mut store = seeded_store();
        let id = store.add_reply(1).unwrap();
        store.set_reply_content(id, "half a tho");
        let mut app = App::new(store, Duration::from_millis(10));

        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.selected_id(), Some(id));
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.input, Some(InputTarget::Reply { id, parent: 1 }));
        assert_eq!(app.store.state().comment_count(), 5);

        type_str(&mut app, "ught");
        press(&mut app, KeyCode::Enter);
        assert!(app.input.is_none());
        let state = app.store.state();
        let reply = tree::find(&state.comments, id).unwrap();
        assert!(!reply.pending_reply);
        assert_eq!(reply.content, "half a thought");
        assert_eq!(app.selected_id(), Some(id));
    }

    #[test]
    fn test_compose_flow() {
        let mut app = app();
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.input, Some(InputTarget::NewComment));

        // Keys bound in the thread are plain text here.
        type_str(&mut app, "q and r");
        assert!(!app.should_quit);
        press(&mut app, KeyCode::Enter);

        assert!(app.input.is_none());
        let state = app.store.state();
        assert_eq!(state.comments.last().unwrap().content, "q and r");
        assert_eq!(app.selected_id(), Some(5));
        assert_eq!(state.new_comment_draft, "");
    }

    #[test]
    fn test_blank_compose_stays_open() {
        let mut app = app();
        press(&mut app, KeyCode::Char('c'));
        type_str(&mut app, "  ");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.input, Some(InputTarget::NewComment));
    }

    #[test]
    fn test_cancelled_compose_keeps_draft() {
        let mut app = app();
        press(&mut app, KeyCode::Char('c'));
        type_str(&mut app, "later");
        press(&mut app, KeyCode::Esc);
        assert!(app.input.is_none());
        assert_eq!(app.store.state().new_comment_draft, "later");
    }

    #[test]
    fn test_edit_only_own_comments() {
        let mut app = app();
        press(&mut app, KeyCode::Char('e'));
        assert!(app.input.is_none());

        press(&mut app, KeyCode::Char('G'));
        press(&mut app, KeyCode::Char('e'));
        assert!(matches!(app.input, Some(InputTarget::Edit { id: 4, .. })));
    }

    #[test]
    fn test_edit_cancel_restores_original() {
        let mut app = app();
        let original = content(&app, 4).unwrap();
        press(&mut app, KeyCode::Char('G'));
        press(&mut app, KeyCode::Char('e'));
        type_str(&mut app, " (edited)");
        assert_eq!(content(&app, 4).unwrap(), format!("{} (edited)", original));

        press(&mut app, KeyCode::Esc);
        let state = app.store.state();
        let comment = tree::find(&state.comments, 4).unwrap();
        assert_eq!(comment.content, original);
        assert!(!comment.pending_edit);
    }

    #[test]
    fn test_blank_edit_is_not_submitted() {
        let mut app = app();
        press(&mut app, KeyCode::Char('G'));
        press(&mut app, KeyCode::Char('e'));
        let len = content(&app, 4).unwrap().chars().count();
        for _ in 0..len {
            press(&mut app, KeyCode::Backspace);
        }
        press(&mut app, KeyCode::Enter);
        assert!(app.input.is_some());
        assert!(tree::find(&app.store.state().comments, 4).unwrap().pending_edit);
    }

    #[test]
    fn test_delete_needs_confirmation() {
        let mut app = app();
        press(&mut app, KeyCode::Char('G'));
        press(&mut app, KeyCode::Char('D'));
        assert_eq!(app.store.state().requested_delete, Some(4));

        // Navigation is blocked by the modal.
        press(&mut app, KeyCode::Char('k'));
        assert_eq!(app.selected_id(), Some(4));

        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.store.state().requested_delete, None);
        assert!(content(&app, 4).is_some());

        press(&mut app, KeyCode::Char('D'));
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(content(&app, 4), None);
        assert_eq!(app.store.state().requested_delete, None);
        assert_eq!(app.selected_id(), Some(3));
    }

    #[test]
    fn test_cannot_delete_others() {
        let mut app = app();
        press(&mut app, KeyCode::Char('D'));
        assert_eq!(app.store.state().requested_delete, None);
    }

    #[test]
    fn test_help_toggle() {
        let mut app = app();
        press(&mut app, KeyCode::Char('?'));
        assert!(app.show_help);

        // 'q' closes help rather than quitting
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.show_help);
        assert!(!app.should_quit);

        press(&mut app, KeyCode::Char('?'));
        press(&mut app, KeyCode::Char('x'));
        assert!(!app.show_help);
    }

    #[test]
    fn test_reset_restores_seed() {
        let mut app = app();
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('D')); // not own, ignored
        app.store.delete_comment(1);
        app.handle_key(KeyCode::Char('r'), KeyModifiers::CTRL);
        assert_eq!(app.store.state().comment_count(), 4);
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn test_q_quits() {
        let mut app = app();
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_run_renders_thread_and_quits() {
        let mut app = app();
        let mut terminal = FakeTerminal::new(vec![KeyCode::Char('+')]);
        app.run(&mut terminal).unwrap();

        assert!(app.should_quit);
        // Initial frame plus one after the vote.
        assert_eq!(terminal.draws, 2);
        let screen = terminal.screen_text();
        assert!(screen.contains("Comments (4)"));
        assert!(screen.contains("[+13-]  amyrobson"));
        assert!(screen.contains("juliusomo (you)"));
        assert!(screen.contains("@maxblagun"));
    }
}
