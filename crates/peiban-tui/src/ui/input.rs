//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes. Screens with text fields do not take the
//! single-letter global shortcuts; Esc leaves them instead.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use peiban_core::auth::{Resolved, Route};
use peiban_core::models::Gender;
use peiban_core::validate;

use crate::app::{
    can_add_code_char, can_add_path_char, can_add_phone_char, can_add_text_char, App, AppState,
    ComposeField, LoginFocus, LoginStep, ProfileField,
};

/// Answer to a yes/no overlay
enum Confirm {
    Yes,
    No,
    Undecided,
}

fn confirm_key(key: &KeyEvent) -> Confirm {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => Confirm::Yes,
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Confirm::No,
        _ => Confirm::Undecided,
    }
}

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return Ok(false);
    }

    // Handle confirmation overlays
    if matches!(
        app.state,
        AppState::ConfirmingQuit | AppState::ConfirmingLogout | AppState::ConfirmingDelete
    ) {
        return Ok(handle_confirmation(app, key));
    }

    let route = match app.view {
        Resolved::Waiting => {
            // Nothing to interact with until the session settles
            if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                app.state = AppState::ConfirmingQuit;
            }
            return Ok(false);
        }
        Resolved::Screen(route) => route,
    };

    match route {
        Route::Login => handle_login_input(app, key).await,
        Route::Home => Ok(handle_home_input(app, key)),
        Route::Profile => {
            handle_profile_input(app, key);
            Ok(false)
        }
        Route::Compose => {
            handle_compose_input(app, key);
            Ok(false)
        }
        Route::History => Ok(handle_history_input(app, key)),
        Route::LogDetail(_) => Ok(handle_detail_input(app, key)),
    }
}

fn handle_confirmation(app: &mut App, key: KeyEvent) -> bool {
    match confirm_key(&key) {
        Confirm::Yes => {
            let state = app.state;
            app.state = AppState::Normal;
            match state {
                AppState::ConfirmingQuit => {
                    app.state = AppState::Quitting;
                    return true;
                }
                AppState::ConfirmingLogout => app.logout(),
                AppState::ConfirmingDelete => app.delete_current_log(),
                _ => {}
            }
        }
        Confirm::No => app.state = AppState::Normal,
        Confirm::Undecided => {}
    }
    false
}

/// `q` and `?` on screens without text input. Returns true if consumed.
fn handle_global_key(app: &mut App, key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
            true
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
            true
        }
        _ => false,
    }
}

// ============================================================================
// Login
// ============================================================================

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            if app.login.step == LoginStep::Code {
                // Back to the phone number
                app.login.step = LoginStep::Phone;
                app.login.code.clear();
                app.login.error = None;
            } else {
                // Quit if on login screen
                app.state = AppState::Quitting;
                return Ok(true);
            }
        }
        KeyCode::Down | KeyCode::Up | KeyCode::Tab | KeyCode::BackTab => {
            app.login.focus = match app.login.focus {
                LoginFocus::Input => LoginFocus::Wechat,
                LoginFocus::Wechat => LoginFocus::Input,
            };
        }
        KeyCode::Enter => match (app.login.focus, app.login.step) {
            (LoginFocus::Wechat, _) => app.wechat_login().await,
            (LoginFocus::Input, LoginStep::Phone) => app.send_code().await,
            (LoginFocus::Input, LoginStep::Code) => app.verify_code().await,
        },
        KeyCode::Backspace => {
            if app.login.focus == LoginFocus::Input {
                match app.login.step {
                    LoginStep::Phone => app.login.phone.pop(),
                    LoginStep::Code => app.login.code.pop(),
                };
            }
        }
        KeyCode::Char(c) => {
            if app.login.focus == LoginFocus::Input {
                match app.login.step {
                    LoginStep::Phone => {
                        if can_add_phone_char(app.login.phone.len(), c) {
                            app.login.phone.push(c);
                        }
                    }
                    LoginStep::Code => {
                        if can_add_code_char(app.login.code.len(), c) {
                            app.login.code.push(c);
                        }
                    }
                }
            }
        }
        _ => {}
    }
    Ok(false)
}

// ============================================================================
// Home
// ============================================================================

fn handle_home_input(app: &mut App, key: KeyEvent) -> bool {
    if handle_global_key(app, &key) {
        return false;
    }
    match key.code {
        KeyCode::Char('c') | KeyCode::Enter => app.checkin(),
        KeyCode::Char('p') => app.navigate(Route::Profile),
        KeyCode::Char('n') => app.navigate(Route::Compose),
        KeyCode::Char('h') => app.navigate(Route::History),
        KeyCode::Char('o') => app.state = AppState::ConfirmingLogout,
        KeyCode::Char('r') => app.load_overview(),
        KeyCode::Left => app.home.shift_month(-1),
        KeyCode::Right => app.home.shift_month(1),
        _ => {}
    }
    false
}

// ============================================================================
// Profile
// ============================================================================

fn handle_profile_input(app: &mut App, key: KeyEvent) {
    let form = &mut app.profile;
    match key.code {
        KeyCode::Esc => app.go_back(),
        KeyCode::Down | KeyCode::Tab => form.focus = form.focus.next(),
        KeyCode::Up | KeyCode::BackTab => form.focus = form.focus.prev(),
        KeyCode::Enter => match form.focus {
            ProfileField::Gender => form.gender = Gender::cycle(form.gender),
            ProfileField::AvatarPath => app.upload_avatar(),
            ProfileField::Save => app.save_profile(),
            ProfileField::Nickname | ProfileField::Signature => form.focus = form.focus.next(),
        },
        KeyCode::Backspace => {
            match form.focus {
                ProfileField::Nickname => form.nickname.pop(),
                ProfileField::Signature => form.signature.pop(),
                ProfileField::AvatarPath => form.avatar_path.pop(),
                ProfileField::Gender => {
                    form.gender = None;
                    None
                }
                ProfileField::Save => None,
            };
        }
        KeyCode::Left if form.focus == ProfileField::Gender => {
            form.gender = Gender::cycle(form.gender);
        }
        KeyCode::Right if form.focus == ProfileField::Gender => {
            form.gender = Gender::cycle(form.gender);
        }
        KeyCode::Char(c) => match form.focus {
            ProfileField::Nickname => {
                if can_add_text_char(&form.nickname, validate::MAX_NICKNAME_CHARS, c) {
                    form.nickname.push(c);
                }
            }
            ProfileField::Signature => {
                if can_add_text_char(&form.signature, validate::MAX_SIGNATURE_CHARS, c) {
                    form.signature.push(c);
                }
            }
            ProfileField::AvatarPath => {
                if can_add_path_char(form.avatar_path.len(), c) {
                    form.avatar_path.push(c);
                }
            }
            ProfileField::Gender => {
                if c == ' ' {
                    form.gender = Gender::cycle(form.gender);
                }
            }
            ProfileField::Save => {}
        },
        _ => {}
    }
}

// ============================================================================
// Compose
// ============================================================================

fn handle_compose_input(app: &mut App, key: KeyEvent) {
    let form = &mut app.compose;
    match key.code {
        KeyCode::Esc => app.go_back(),
        KeyCode::Down | KeyCode::Tab => form.focus = form.focus.next(),
        KeyCode::Up | KeyCode::BackTab => form.focus = form.focus.prev(),
        KeyCode::Enter => match form.focus {
            ComposeField::Content => form.focus = form.focus.next(),
            ComposeField::ImagePath => {
                if form.image_input.trim().is_empty() {
                    form.focus = form.focus.next();
                } else {
                    form.add_image();
                }
            }
            ComposeField::Submit => app.submit_log(),
        },
        KeyCode::Delete => {
            // Drop the most recently added image
            form.images.pop();
        }
        KeyCode::Backspace => {
            match form.focus {
                ComposeField::Content => form.content.pop(),
                ComposeField::ImagePath => form.image_input.pop(),
                ComposeField::Submit => None,
            };
        }
        KeyCode::Char(c) => match form.focus {
            ComposeField::Content => {
                if can_add_text_char(&form.content, validate::MAX_CONTENT_CHARS, c) {
                    form.content.push(c);
                }
            }
            ComposeField::ImagePath => {
                if can_add_path_char(form.image_input.len(), c) {
                    form.image_input.push(c);
                }
            }
            ComposeField::Submit => {}
        },
        _ => {}
    }
}

// ============================================================================
// Journal history and detail
// ============================================================================

fn handle_history_input(app: &mut App, key: KeyEvent) -> bool {
    if handle_global_key(app, &key) {
        return false;
    }
    let count = app.history.logs.len();
    match key.code {
        KeyCode::Esc => app.go_back(),
        KeyCode::Up | KeyCode::Char('k') => {
            app.history.selection = app.history.selection.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if app.history.selection + 1 < count {
                app.history.selection += 1;
            } else {
                // At the bottom: fetch the next page
                app.load_more_logs();
            }
        }
        KeyCode::Home => app.history.selection = 0,
        KeyCode::End => app.history.selection = count.saturating_sub(1),
        KeyCode::Char('m') => app.load_more_logs(),
        KeyCode::Char('r') => app.load_logs(1),
        KeyCode::Char('n') => app.navigate(Route::Compose),
        KeyCode::Enter => {
            if let Some(entry) = app.history.logs.get(app.history.selection) {
                let id = entry.id;
                app.detail = Some(entry.clone());
                app.navigate(Route::LogDetail(id));
            }
        }
        _ => {}
    }
    false
}

fn handle_detail_input(app: &mut App, key: KeyEvent) -> bool {
    if handle_global_key(app, &key) {
        return false;
    }
    match key.code {
        KeyCode::Esc | KeyCode::Backspace => app.go_back(),
        KeyCode::Char('d') | KeyCode::Delete => {
            if app.detail.is_some() {
                app.state = AppState::ConfirmingDelete;
            }
        }
        _ => {}
    }
    false
}
