use crate::app::InputMode;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    NextPage,
    PrevPage,
    SwitchPage(u8),
    Down,
    Up,
    Top,
    Bottom,
    NextNamespace,
    PrevNamespace,
    ToggleWatch,
    CycleEventFilter,
    OpenSelected,
    Back,
    Refresh,
    SwitchLocale,
    ToggleAutoStep,
    ToggleHelp,
    StartCommand,
    SubmitInput,
    CancelInput,
    Backspace,
    InputChar(char),
}

pub fn map_key(mode: InputMode, key: KeyEvent) -> Option<Action> {
    match mode {
        InputMode::Normal => map_normal_mode_key(key),
        InputMode::Command => map_input_mode_key(key),
    }
}

fn map_normal_mode_key(key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Action::Quit),
            KeyCode::Char('m') | KeyCode::Char('j') => Some(Action::OpenSelected),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char(c @ '1'..='4') => c.to_digit(10).map(|digit| Action::SwitchPage(digit as u8)),
        KeyCode::Char('j') | KeyCode::Down => Some(Action::Down),
        KeyCode::Char('k') | KeyCode::Up => Some(Action::Up),
        KeyCode::Char('g') | KeyCode::Home => Some(Action::Top),
        KeyCode::Char('G') | KeyCode::End => Some(Action::Bottom),
        KeyCode::Left | KeyCode::BackTab => Some(Action::PrevPage),
        KeyCode::Right | KeyCode::Tab => Some(Action::NextPage),
        KeyCode::Char('[') => Some(Action::PrevNamespace),
        KeyCode::Char(']') => Some(Action::NextNamespace),
        KeyCode::Char('w') => Some(Action::ToggleWatch),
        KeyCode::Char('t') => Some(Action::CycleEventFilter),
        KeyCode::Char('a') => Some(Action::ToggleAutoStep),
        KeyCode::Char('L') => Some(Action::SwitchLocale),
        KeyCode::Char('r') | KeyCode::F(5) => Some(Action::Refresh),
        KeyCode::Char('?') => Some(Action::ToggleHelp),
        KeyCode::Char(':') => Some(Action::StartCommand),
        KeyCode::Enter => Some(Action::OpenSelected),
        KeyCode::Esc | KeyCode::Backspace => Some(Action::Back),
        _ => None,
    }
}

fn map_input_mode_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Enter => Some(Action::SubmitInput),
        KeyCode::Char('m') | KeyCode::Char('j')
            if key.modifiers.contains(KeyModifiers::CONTROL) =>
        {
            Some(Action::SubmitInput)
        }
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::CancelInput)
        }
        KeyCode::Esc => Some(Action::CancelInput),
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::InputChar(c))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, map_key};
    use crate::app::InputMode;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    #[test]
    fn normal_mode_maps_quit() {
        let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Normal, key), Some(Action::Quit));
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(InputMode::Normal, key), Some(Action::Quit));
    }

    #[test]
    fn normal_mode_maps_digits_to_pages() {
        let key = KeyEvent::new(KeyCode::Char('3'), KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Normal, key), Some(Action::SwitchPage(3)));
        let key = KeyEvent::new(KeyCode::Char('7'), KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Normal, key), None);
    }

    #[test]
    fn normal_mode_maps_namespace_keys() {
        let key = KeyEvent::new(KeyCode::Char(']'), KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Normal, key), Some(Action::NextNamespace));
        let key = KeyEvent::new(KeyCode::Char('w'), KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Normal, key), Some(Action::ToggleWatch));
    }

    #[test]
    fn shift_l_switches_locale() {
        let key = KeyEvent::new(KeyCode::Char('L'), KeyModifiers::SHIFT);
        assert_eq!(map_key(InputMode::Normal, key), Some(Action::SwitchLocale));
    }

    #[test]
    fn input_mode_maps_char() {
        let key = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Command, key), Some(Action::InputChar('x')));
    }

    #[test]
    fn input_mode_rejects_ctrl_chars() {
        let key = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::CONTROL);
        assert_eq!(map_key(InputMode::Command, key), None);
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(InputMode::Command, key), Some(Action::CancelInput));
    }

    #[test]
    fn input_mode_maps_ctrl_m_and_ctrl_j_to_submit() {
        let key = KeyEvent::new(KeyCode::Char('m'), KeyModifiers::CONTROL);
        assert_eq!(map_key(InputMode::Command, key), Some(Action::SubmitInput));
        let key = KeyEvent::new(KeyCode::Char('j'), KeyModifiers::CONTROL);
        assert_eq!(map_key(InputMode::Command, key), Some(Action::SubmitInput));
    }
}
