use crate::{
    app::{AppState, View},
    panel::{Intent, Panel},
    tasks::{self, EventSender},
};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Handles terminal key events.
/// Returns `true` if the application should quit.
pub fn handle_key_event(key: KeyEvent, panel: &mut Panel, tx: &EventSender) -> bool {
    if key.kind != KeyEventKind::Press && key.kind != KeyEventKind::Repeat {
        return false;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') => return true,
            KeyCode::Char('l') => dispatch(panel, Intent::ListModels, tx),
            // Ctrl+Enter only reaches us on terminals that report it.
            KeyCode::Enter if panel.state().view != View::Run => {}
            KeyCode::Char('r') | KeyCode::Enter => {
                let intent = run_intent(panel.state());
                dispatch(panel, intent, tx);
            }
            KeyCode::Char('s') => {
                let update = panel.state().settings.to_update();
                dispatch(panel, Intent::SaveConfig(update), tx);
            }
            KeyCode::Char('k') => panel.state_mut().clear_output(),
            KeyCode::Char('w') => {
                let state = panel.state_mut();
                state.wrap_output = !state.wrap_output;
            }
            _ => {}
        }
        return false;
    }

    let state = panel.state_mut();
    match key.code {
        KeyCode::Tab if !state.is_filtering => {
            state.switch_view(state.view.next());
            return false;
        }
        KeyCode::BackTab if !state.is_filtering => {
            state.switch_view(state.view.previous());
            return false;
        }
        _ => {}
    }

    let view = state.view;
    match view {
        View::Models => return handle_models_key(key.code, panel, tx),
        View::Run => handle_run_key(key.code, state),
        View::Pull => {
            if key.code == KeyCode::Enter {
                let model = state.pull_model.trim().to_string();
                dispatch(panel, Intent::PullModel { model }, tx);
            } else {
                edit_focused(key.code, state);
            }
        }
        View::Settings => handle_settings_key(key.code, state),
    }
    false
}

/// Starts an intent unless another call is still in flight.
fn dispatch(panel: &mut Panel, intent: Intent, tx: &EventSender) {
    if panel.is_busy() {
        return;
    }
    tasks::spawn_call(panel.begin(intent), tx.clone());
}

fn run_intent(state: &AppState) -> Intent {
    Intent::RunPrompt {
        model: state.run_model.trim().to_string(),
        prompt: state.prompt.clone(),
    }
}

fn handle_models_key(code: KeyCode, panel: &mut Panel, tx: &EventSender) -> bool {
    let state = panel.state_mut();
    if state.is_filtering {
        match code {
            KeyCode::Char(c) => state.filter_input_char(c),
            KeyCode::Backspace => state.filter_input_backspace(),
            KeyCode::Enter => state.is_filtering = false,
            KeyCode::Esc => state.clear_filter(),
            _ => {}
        }
        return false;
    }

    match code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('j') | KeyCode::Down => state.next_model(),
        KeyCode::Char('k') | KeyCode::Up => state.previous_model(),
        KeyCode::Char('/') => state.is_filtering = true,
        KeyCode::Esc => state.clear_filter(),
        KeyCode::Char('l') => dispatch(panel, Intent::ListModels, tx),
        KeyCode::Enter => {
            if state.use_selected_model() {
                state.switch_view(View::Run);
                state.focus = 1;
            }
        }
        KeyCode::Char('p') => {
            if state.use_selected_model() {
                state.switch_view(View::Pull);
            }
        }
        KeyCode::Char(c @ '1'..='4') => {
            let index = c as usize - '1' as usize;
            state.switch_view(View::ALL[index]);
        }
        _ => {}
    }
    false
}

fn handle_run_key(code: KeyCode, state: &mut AppState) {
    match code {
        KeyCode::Up => state.focus_previous(),
        KeyCode::Down => state.focus_next(),
        KeyCode::Enter if state.focus == 0 => state.focus_next(),
        KeyCode::Enter => state.prompt.push('\n'),
        _ => edit_focused(code, state),
    }
}

fn handle_settings_key(code: KeyCode, state: &mut AppState) {
    match code {
        KeyCode::Up => state.focus_previous(),
        KeyCode::Down => state.focus_next(),
        KeyCode::Enter | KeyCode::Char(' ') if state.focused_text_mut().is_none() => {
            let focus = state.focus;
            state.settings.toggle(focus);
        }
        _ => edit_focused(code, state),
    }
}

fn edit_focused(code: KeyCode, state: &mut AppState) {
    match code {
        KeyCode::Esc => state.switch_view(View::Models),
        KeyCode::Char(c) => {
            if let Some(field) = state.focused_text_mut() {
                field.push(c);
            }
        }
        KeyCode::Backspace => {
            if let Some(field) = state.focused_text_mut() {
                field.pop();
            }
        }
        _ => {}
    }
}
