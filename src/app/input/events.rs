//! Raw platform input and the domain events derived from it

use std::fmt;
use std::str::FromStr;

use winit::event::{ElementState, WindowEvent};
use winit::keyboard::PhysicalKey;

/// Who produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventSource {
    Player,
}

/// What an event asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Stop the render loop
    Quit,
    /// Rebuild the shader program at the next tick
    Reload,
    /// A key with no bound action
    Keyboard(KeyCode),
}

/// Domain event sent from the poller to the handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Event {
    pub source: EventSource,
    pub kind: EventKind,
}

impl Event {
    pub fn from_player(kind: EventKind) -> Self {
        Self {
            source: EventSource::Player,
            kind,
        }
    }

    pub fn quit() -> Self {
        Self::from_player(EventKind::Quit)
    }

    pub fn reload() -> Self {
        Self::from_player(EventKind::Reload)
    }
}

/// Platform input, reduced to the shapes the core distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawEvent {
    /// Window close or platform quit
    QuitRequested,
    /// Key went down (repeats excluded)
    KeyPressed(KeyCode),
    /// Any other input
    Other,
}

impl RawEvent {
    /// Converts a winit window event
    ///
    /// Returns `None` for window-management events that are not input
    /// (resize, redraw, focus, ...).
    pub fn from_window_event(event: &WindowEvent) -> Option<Self> {
        match event {
            WindowEvent::CloseRequested => Some(Self::QuitRequested),
            WindowEvent::KeyboardInput { event, .. } => {
                Some(Self::from_key(event.state, event.repeat, event.physical_key))
            }
            WindowEvent::MouseInput { .. }
            | WindowEvent::MouseWheel { .. }
            | WindowEvent::CursorMoved { .. }
            | WindowEvent::ModifiersChanged(_) => Some(Self::Other),
            _ => None,
        }
    }

    /// Classifies one keyboard transition; only fresh presses of an
    /// identified key count as `KeyPressed`
    pub fn from_key(state: ElementState, repeat: bool, key: PhysicalKey) -> Self {
        if !state.is_pressed() || repeat {
            return Self::Other;
        }
        match key {
            PhysicalKey::Code(code) => Self::KeyPressed(code.into()),
            PhysicalKey::Unidentified(_) => Self::Other,
        }
    }
}

/// Error parsing a key name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown key name `{0}`")]
pub struct UnknownKey(pub String);

macro_rules! key_codes {
    ($($variant:ident => $winit:ident, $name:literal;)*) => {
        /// Key identifier
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum KeyCode {
            $($variant,)*
            Other,
        }

        impl From<winit::keyboard::KeyCode> for KeyCode {
            fn from(key: winit::keyboard::KeyCode) -> Self {
                match key {
                    $(winit::keyboard::KeyCode::$winit => Self::$variant,)*
                    _ => Self::Other,
                }
            }
        }

        impl FromStr for KeyCode {
            type Err = UnknownKey;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_uppercase().as_str() {
                    $($name => Ok(Self::$variant),)*
                    _ => Err(UnknownKey(s.to_string())),
                }
            }
        }

        impl fmt::Display for KeyCode {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($name),)*
                    Self::Other => f.write_str("OTHER"),
                }
            }
        }
    };
}

key_codes! {
    A => KeyA, "A"; B => KeyB, "B"; C => KeyC, "C"; D => KeyD, "D";
    E => KeyE, "E"; F => KeyF, "F"; G => KeyG, "G"; H => KeyH, "H";
    I => KeyI, "I"; J => KeyJ, "J"; K => KeyK, "K"; L => KeyL, "L";
    M => KeyM, "M"; N => KeyN, "N"; O => KeyO, "O"; P => KeyP, "P";
    Q => KeyQ, "Q"; R => KeyR, "R"; S => KeyS, "S"; T => KeyT, "T";
    U => KeyU, "U"; V => KeyV, "V"; W => KeyW, "W"; X => KeyX, "X";
    Y => KeyY, "Y"; Z => KeyZ, "Z";
    F1 => F1, "F1"; F2 => F2, "F2"; F3 => F3, "F3"; F4 => F4, "F4";
    F5 => F5, "F5"; F6 => F6, "F6"; F7 => F7, "F7"; F8 => F8, "F8";
    F9 => F9, "F9"; F10 => F10, "F10"; F11 => F11, "F11"; F12 => F12, "F12";
    Escape => Escape, "ESCAPE";
    Space => Space, "SPACE";
    Enter => Enter, "ENTER";
}

impl<'de> serde::Deserialize<'de> for KeyCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

impl serde::Serialize for KeyCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_winit() {
        assert_eq!(KeyCode::from(winit::keyboard::KeyCode::KeyR), KeyCode::R);
        assert_eq!(KeyCode::from(winit::keyboard::KeyCode::F5), KeyCode::F5);
        assert_eq!(
            KeyCode::from(winit::keyboard::KeyCode::NumpadAdd),
            KeyCode::Other
        );
    }

    #[test]
    fn test_key_names_parse_case_insensitively() {
        assert_eq!("r".parse::<KeyCode>(), Ok(KeyCode::R));
        assert_eq!(" Escape ".parse::<KeyCode>(), Ok(KeyCode::Escape));
        assert_eq!(KeyCode::F12.to_string().parse::<KeyCode>(), Ok(KeyCode::F12));
        assert!("Hyper".parse::<KeyCode>().is_err());
    }

    #[test]
    fn test_close_request_is_quit() {
        assert_eq!(
            RawEvent::from_window_event(&WindowEvent::CloseRequested),
            Some(RawEvent::QuitRequested)
        );
        assert_eq!(
            RawEvent::from_window_event(&WindowEvent::RedrawRequested),
            None
        );
    }

    #[test]
    fn test_only_fresh_identified_presses_count() {
        use winit::keyboard::{KeyCode as WinitKey, NativeKeyCode};

        let r = PhysicalKey::Code(WinitKey::KeyR);
        assert_eq!(
            RawEvent::from_key(ElementState::Pressed, false, r),
            RawEvent::KeyPressed(KeyCode::R)
        );
        assert_eq!(RawEvent::from_key(ElementState::Pressed, true, r), RawEvent::Other);
        assert_eq!(RawEvent::from_key(ElementState::Released, false, r), RawEvent::Other);
        assert_eq!(
            RawEvent::from_key(
                ElementState::Pressed,
                false,
                PhysicalKey::Unidentified(NativeKeyCode::Unidentified)
            ),
            RawEvent::Other
        );
    }

    #[test]
    fn test_event_constructors_come_from_player() {
        assert_eq!(Event::reload().source, EventSource::Player);
        assert_eq!(Event::quit().kind, EventKind::Quit);
    }
}
