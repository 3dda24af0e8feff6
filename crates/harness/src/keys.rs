use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};

/// Numeric key code in the X11 keysym space.
///
/// Printable keys carry their lowercase ASCII value; navigation and control
/// keys use the `0xffxx` keysym block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCode(pub u32);

impl KeyCode {
    pub const UNKNOWN: KeyCode = KeyCode(0);
    pub const SPACE: KeyCode = KeyCode(32);
    pub const RETURN: KeyCode = KeyCode(0xff0d);
    pub const ESCAPE: KeyCode = KeyCode(0xff1b);
    pub const LEFT: KeyCode = KeyCode(0xff51);
    pub const UP: KeyCode = KeyCode(0xff52);
    pub const RIGHT: KeyCode = KeyCode(0xff53);
    pub const DOWN: KeyCode = KeyCode(0xff54);

    pub const fn from_char(ch: char) -> KeyCode {
        KeyCode(ch as u32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Pressed,
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: KeyCode,
    pub state: KeyState,
    pub repeat: bool,
}

impl KeyEvent {
    pub fn pressed(key: KeyCode) -> Self {
        Self {
            key,
            state: KeyState::Pressed,
            repeat: false,
        }
    }

    pub fn released(key: KeyCode) -> Self {
        Self {
            key,
            state: KeyState::Released,
            repeat: false,
        }
    }
}

pub fn key_code_from_physical(key: PhysicalKey) -> KeyCode {
    let PhysicalKey::Code(code) = key else {
        return KeyCode::UNKNOWN;
    };
    match code {
        WinitKeyCode::ArrowLeft => KeyCode::LEFT,
        WinitKeyCode::ArrowUp => KeyCode::UP,
        WinitKeyCode::ArrowRight => KeyCode::RIGHT,
        WinitKeyCode::ArrowDown => KeyCode::DOWN,
        WinitKeyCode::Enter | WinitKeyCode::NumpadEnter => KeyCode::RETURN,
        WinitKeyCode::Space => KeyCode::SPACE,
        WinitKeyCode::Escape => KeyCode::ESCAPE,
        other => printable_char(other).map_or(KeyCode::UNKNOWN, KeyCode::from_char),
    }
}

fn printable_char(code: WinitKeyCode) -> Option<char> {
    let ch = match code {
        WinitKeyCode::Digit0 | WinitKeyCode::Numpad0 => '0',
        WinitKeyCode::Digit1 | WinitKeyCode::Numpad1 => '1',
        WinitKeyCode::Digit2 | WinitKeyCode::Numpad2 => '2',
        WinitKeyCode::Digit3 | WinitKeyCode::Numpad3 => '3',
        WinitKeyCode::Digit4 | WinitKeyCode::Numpad4 => '4',
        WinitKeyCode::Digit5 | WinitKeyCode::Numpad5 => '5',
        WinitKeyCode::Digit6 | WinitKeyCode::Numpad6 => '6',
        WinitKeyCode::Digit7 | WinitKeyCode::Numpad7 => '7',
        WinitKeyCode::Digit8 | WinitKeyCode::Numpad8 => '8',
        WinitKeyCode::Digit9 | WinitKeyCode::Numpad9 => '9',
        WinitKeyCode::KeyA => 'a',
        WinitKeyCode::KeyB => 'b',
        WinitKeyCode::KeyC => 'c',
        WinitKeyCode::KeyD => 'd',
        WinitKeyCode::KeyE => 'e',
        WinitKeyCode::KeyF => 'f',
        WinitKeyCode::KeyG => 'g',
        WinitKeyCode::KeyH => 'h',
        WinitKeyCode::KeyI => 'i',
        WinitKeyCode::KeyJ => 'j',
        WinitKeyCode::KeyK => 'k',
        WinitKeyCode::KeyL => 'l',
        WinitKeyCode::KeyM => 'm',
        WinitKeyCode::KeyN => 'n',
        WinitKeyCode::KeyO => 'o',
        WinitKeyCode::KeyP => 'p',
        WinitKeyCode::KeyQ => 'q',
        WinitKeyCode::KeyR => 'r',
        WinitKeyCode::KeyS => 's',
        WinitKeyCode::KeyT => 't',
        WinitKeyCode::KeyU => 'u',
        WinitKeyCode::KeyV => 'v',
        WinitKeyCode::KeyW => 'w',
        WinitKeyCode::KeyX => 'x',
        WinitKeyCode::KeyY => 'y',
        WinitKeyCode::KeyZ => 'z',
        _ => return None,
    };
    Some(ch)
}
