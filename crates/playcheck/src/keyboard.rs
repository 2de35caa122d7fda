//! Key definitions and chord parsing for keyboard input.
//!
//! Key names follow the `KeyboardEvent.key` / `KeyboardEvent.code` vocabulary
//! (`Enter`, `ArrowUp`, `Numpad5`, `KeyA`, `a`, `+`) on a US layout. A chord
//! such as `Shift+A` or `Control+Backspace` expands into the down/up event
//! sequence a physical keyboard would produce.

use crate::result::{PlaycheckError, PlaycheckResult};
use serde::{Deserialize, Serialize};

/// Location of a key on the keyboard (`KeyboardEvent.location`)
pub const LOCATION_STANDARD: u8 = 0;
/// Left-hand modifier keys
pub const LOCATION_LEFT: u8 = 1;
/// Numeric keypad keys
pub const LOCATION_NUMPAD: u8 = 3;

/// Static description of one key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDefinition {
    /// `KeyboardEvent.key`
    pub key: &'static str,
    /// `KeyboardEvent.code`
    pub code: &'static str,
    /// Windows virtual key code
    pub key_code: u32,
    /// Text produced by the key, if any
    pub text: Option<&'static str>,
    /// `KeyboardEvent.location`
    pub location: u8,
}

const fn named(key: &'static str, code: &'static str, key_code: u32) -> KeyDefinition {
    KeyDefinition {
        key,
        code,
        key_code,
        text: None,
        location: LOCATION_STANDARD,
    }
}

const fn numpad(key: &'static str, code: &'static str, key_code: u32) -> KeyDefinition {
    KeyDefinition {
        key,
        code,
        key_code,
        text: Some(key),
        location: LOCATION_NUMPAD,
    }
}

const fn modifier(key: &'static str, code: &'static str, key_code: u32) -> KeyDefinition {
    KeyDefinition {
        key,
        code,
        key_code,
        text: None,
        location: LOCATION_LEFT,
    }
}

/// Non-printable and keypad keys, looked up by `key` or `code`
const NAMED_KEYS: &[KeyDefinition] = &[
    KeyDefinition {
        key: "Enter",
        code: "Enter",
        key_code: 13,
        text: Some("\r"),
        location: LOCATION_STANDARD,
    },
    KeyDefinition {
        key: " ",
        code: "Space",
        key_code: 32,
        text: Some(" "),
        location: LOCATION_STANDARD,
    },
    named("Backspace", "Backspace", 8),
    named("Tab", "Tab", 9),
    named("Escape", "Escape", 27),
    named("PageUp", "PageUp", 33),
    named("PageDown", "PageDown", 34),
    named("End", "End", 35),
    named("Home", "Home", 36),
    named("ArrowLeft", "ArrowLeft", 37),
    named("ArrowUp", "ArrowUp", 38),
    named("ArrowRight", "ArrowRight", 39),
    named("ArrowDown", "ArrowDown", 40),
    named("Insert", "Insert", 45),
    named("Delete", "Delete", 46),
    named("CapsLock", "CapsLock", 20),
    named("F1", "F1", 112),
    named("F2", "F2", 113),
    named("F3", "F3", 114),
    named("F4", "F4", 115),
    named("F5", "F5", 116),
    named("F6", "F6", 117),
    named("F7", "F7", 118),
    named("F8", "F8", 119),
    named("F9", "F9", 120),
    named("F10", "F10", 121),
    named("F11", "F11", 122),
    named("F12", "F12", 123),
    modifier("Shift", "ShiftLeft", 16),
    modifier("Control", "ControlLeft", 17),
    modifier("Alt", "AltLeft", 18),
    modifier("Meta", "MetaLeft", 91),
    numpad("0", "Numpad0", 96),
    numpad("1", "Numpad1", 97),
    numpad("2", "Numpad2", 98),
    numpad("3", "Numpad3", 99),
    numpad("4", "Numpad4", 100),
    numpad("5", "Numpad5", 101),
    numpad("6", "Numpad6", 102),
    numpad("7", "Numpad7", 103),
    numpad("8", "Numpad8", 104),
    numpad("9", "Numpad9", 105),
    numpad("*", "NumpadMultiply", 106),
    numpad("+", "NumpadAdd", 107),
    numpad("-", "NumpadSubtract", 109),
    numpad(".", "NumpadDecimal", 110),
    numpad("/", "NumpadDivide", 111),
];

/// US-layout punctuation: (unshifted, shifted, code, key code)
const PUNCTUATION: &[(char, char, &str, u32)] = &[
    ('-', '_', "Minus", 189),
    ('=', '+', "Equal", 187),
    ('[', '{', "BracketLeft", 219),
    (']', '}', "BracketRight", 221),
    ('\\', '|', "Backslash", 220),
    (';', ':', "Semicolon", 186),
    ('\'', '"', "Quote", 222),
    (',', '<', "Comma", 188),
    ('.', '>', "Period", 190),
    ('/', '?', "Slash", 191),
    ('`', '~', "Backquote", 192),
];

/// Shifted digit row: `!` is Shift+1 and so on
const SHIFTED_DIGITS: &str = ")!@#$%^&*(";

/// A resolved key, owning its strings so single characters can be described
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    /// `KeyboardEvent.key`
    pub key: String,
    /// `KeyboardEvent.code`
    pub code: String,
    /// Windows virtual key code
    pub key_code: u32,
    /// Text produced by the key, if any
    pub text: Option<String>,
    /// `KeyboardEvent.location`
    pub location: u8,
}

impl From<&KeyDefinition> for Key {
    fn from(def: &KeyDefinition) -> Self {
        Self {
            key: def.key.to_string(),
            code: def.code.to_string(),
            key_code: def.key_code,
            text: def.text.map(str::to_string),
            location: def.location,
        }
    }
}

impl Key {
    fn printable(c: char, code: String, key_code: u32) -> Self {
        Self {
            key: c.to_string(),
            code,
            key_code,
            text: Some(c.to_string()),
            location: LOCATION_STANDARD,
        }
    }

    /// Modifier bit for this key, if it is a modifier
    #[must_use]
    pub fn modifier(&self) -> Option<Modifier> {
        Modifier::from_key(&self.key)
    }
}

/// Look up a key by `key` or `code` name
///
/// # Errors
///
/// Returns an input error for names that are not on the US layout
pub fn lookup_key(name: &str) -> PlaycheckResult<Key> {
    // Keypad keys share `key` with the main row, so they resolve by code only
    if let Some(def) = NAMED_KEYS
        .iter()
        .find(|d| d.code == name || (d.key == name && d.location != LOCATION_NUMPAD))
    {
        return Ok(Key::from(def));
    }
    if let Some(letter) = name.strip_prefix("Key").filter(|s| s.len() == 1) {
        return lookup_key(&letter.to_ascii_lowercase());
    }
    if let Some(digit) = name.strip_prefix("Digit").filter(|s| s.len() == 1) {
        return lookup_key(digit);
    }

    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => printable_key(c)
            .ok_or_else(|| PlaycheckError::input(format!("Unknown key: {name:?}"))),
        _ => Err(PlaycheckError::input(format!("Unknown key: {name:?}"))),
    }
}

fn printable_key(c: char) -> Option<Key> {
    if c.is_ascii_alphabetic() {
        let upper = c.to_ascii_uppercase();
        return Some(Key::printable(c, format!("Key{upper}"), u32::from(upper)));
    }
    if c.is_ascii_digit() {
        return Some(Key::printable(c, format!("Digit{c}"), u32::from(c)));
    }
    if let Some(index) = SHIFTED_DIGITS.find(c) {
        return Some(Key::printable(c, format!("Digit{index}"), 48 + index as u32));
    }
    PUNCTUATION
        .iter()
        .find(|(plain, shifted, _, _)| *plain == c || *shifted == c)
        .map(|(_, _, code, key_code)| Key::printable(c, (*code).to_string(), *key_code))
}

/// Keyboard modifier with its CDP bitmask value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modifier {
    /// Alt / Option
    Alt,
    /// Control
    Control,
    /// Meta / Command
    Meta,
    /// Shift
    Shift,
}

impl Modifier {
    /// Bit used in `Input.dispatchKeyEvent` / `Input.dispatchMouseEvent`
    #[must_use]
    pub const fn bit(self) -> u32 {
        match self {
            Self::Alt => 1,
            Self::Control => 2,
            Self::Meta => 4,
            Self::Shift => 8,
        }
    }

    /// Parse a modifier name; `ControlOrMeta` resolves to Control
    #[must_use]
    pub fn from_key(name: &str) -> Option<Self> {
        match name {
            "Alt" => Some(Self::Alt),
            "Control" | "ControlOrMeta" => Some(Self::Control),
            "Meta" => Some(Self::Meta),
            "Shift" => Some(Self::Shift),
            _ => None,
        }
    }

    /// Key name for the modifier
    #[must_use]
    pub const fn key_name(self) -> &'static str {
        match self {
            Self::Alt => "Alt",
            Self::Control => "Control",
            Self::Meta => "Meta",
            Self::Shift => "Shift",
        }
    }
}

/// Combine modifiers into a CDP bitmask
#[must_use]
pub fn modifier_mask(modifiers: &[Modifier]) -> u32 {
    modifiers.iter().fold(0, |mask, m| mask | m.bit())
}

/// A parsed chord such as `Shift+A`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyChord {
    /// Modifiers, in press order
    pub modifiers: Vec<Modifier>,
    /// Main key
    pub key: Key,
}

impl KeyChord {
    /// Parse a chord. A trailing `+` is the plus key itself (`Shift++`).
    ///
    /// # Errors
    ///
    /// Returns an input error for empty chords, a dangling `+`, unknown keys
    /// or non-modifiers before the final key
    pub fn parse(chord: &str) -> PlaycheckResult<Self> {
        if chord.is_empty() {
            return Err(PlaycheckError::input("Empty key chord"));
        }
        let mut tokens: Vec<&str> = chord.split('+').collect();
        if chord == "+" || chord.ends_with("++") {
            // "Shift++" splits into ["Shift", "", ""]
            tokens.truncate(tokens.len() - 2);
            tokens.push("+");
        } else if chord.ends_with('+') {
            return Err(PlaycheckError::input(format!("Chord {chord:?} has no key after '+'")));
        }
        let (last, init) = tokens
            .split_last()
            .ok_or_else(|| PlaycheckError::input(format!("Invalid chord {chord:?}")))?;

        let mut modifiers = Vec::with_capacity(init.len());
        for token in init {
            let m = Modifier::from_key(token).ok_or_else(|| {
                PlaycheckError::input(format!("{token:?} is not a modifier in chord {chord:?}"))
            })?;
            if !modifiers.contains(&m) {
                modifiers.push(m);
            }
        }
        Ok(Self {
            modifiers,
            key: lookup_key(last)?,
        })
    }

    /// Expand into the down/up sequence for this chord
    #[must_use]
    pub fn events(&self) -> Vec<KeyEvent> {
        let mut events = Vec::with_capacity(self.modifiers.len() * 2 + 2);
        let mut held: Vec<Modifier> = Vec::new();

        for m in &self.modifiers {
            held.push(*m);
            let key = Key::from(
                NAMED_KEYS
                    .iter()
                    .find(|d| d.key == m.key_name())
                    .unwrap_or(&NAMED_KEYS[0]),
            );
            events.push(KeyEvent::down(&key, modifier_mask(&held), None));
        }

        let main_mask = modifier_mask(&held);
        let text = if held.iter().any(|m| *m != Modifier::Shift) {
            None
        } else {
            self.key.text.clone()
        };
        events.push(KeyEvent::down(&self.key, main_mask, text));
        events.push(KeyEvent::up(&self.key, main_mask));

        while let Some(m) = held.pop() {
            let key = Key::from(
                NAMED_KEYS
                    .iter()
                    .find(|d| d.key == m.key_name())
                    .unwrap_or(&NAMED_KEYS[0]),
            );
            events.push(KeyEvent::up(&key, modifier_mask(&held)));
        }
        events
    }
}

/// Direction of a key event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyEventKind {
    /// Key pressed
    Down,
    /// Key released
    Up,
}

/// One key event ready for dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// Down or up
    pub kind: KeyEventKind,
    /// `KeyboardEvent.key`
    pub key: String,
    /// `KeyboardEvent.code`
    pub code: String,
    /// Windows virtual key code
    pub key_code: u32,
    /// Text inserted by a key-down, if any
    pub text: Option<String>,
    /// Modifier bitmask held during the event
    pub modifiers: u32,
    /// `KeyboardEvent.location`
    pub location: u8,
}

impl KeyEvent {
    /// Key-down event
    #[must_use]
    pub fn down(key: &Key, modifiers: u32, text: Option<String>) -> Self {
        Self {
            kind: KeyEventKind::Down,
            key: key.key.clone(),
            code: key.code.clone(),
            key_code: key.key_code,
            text,
            modifiers,
            location: key.location,
        }
    }

    /// Key-up event
    #[must_use]
    pub fn up(key: &Key, modifiers: u32) -> Self {
        Self {
            kind: KeyEventKind::Up,
            key: key.key.clone(),
            code: key.code.clone(),
            key_code: key.key_code,
            text: None,
            modifiers,
            location: key.location,
        }
    }

    /// Whether the key sits on the numeric keypad
    #[must_use]
    pub const fn is_keypad(&self) -> bool {
        self.location == LOCATION_NUMPAD
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    mod lookup_tests {
        use super::*;

        #[test]
        fn test_named_keys() {
            let enter = lookup_key("Enter").unwrap();
            assert_eq!(enter.key_code, 13);
            assert_eq!(enter.text.as_deref(), Some("\r"));

            let back = lookup_key("Backspace").unwrap();
            assert_eq!(back.key_code, 8);
            assert!(back.text.is_none());

            assert_eq!(lookup_key("ArrowUp").unwrap().key_code, 38);
            assert_eq!(lookup_key("F1").unwrap().key_code, 112);
            assert_eq!(lookup_key("F12").unwrap().key_code, 123);
        }

        #[test]
        fn test_space_by_code_and_key() {
            let by_code = lookup_key("Space").unwrap();
            let by_key = lookup_key(" ").unwrap();
            assert_eq!(by_code, by_key);
            assert_eq!(by_code.key, " ");
            assert_eq!(by_code.key_code, 32);
        }

        #[test]
        fn test_numpad_keys() {
            let zero = lookup_key("Numpad0").unwrap();
            assert_eq!(zero.key, "0");
            assert_eq!(zero.key_code, 96);
            assert_eq!(zero.location, LOCATION_NUMPAD);

            let add = lookup_key("NumpadAdd").unwrap();
            assert_eq!(add.key, "+");
            assert_eq!(add.key_code, 107);
        }

        #[test]
        fn test_letters() {
            let upper = lookup_key("A").unwrap();
            assert_eq!(upper.key, "A");
            assert_eq!(upper.code, "KeyA");
            assert_eq!(upper.key_code, 65);
            assert_eq!(upper.text.as_deref(), Some("A"));

            let lower = lookup_key("a").unwrap();
            assert_eq!(lower.key_code, 65);
            assert_eq!(lower.text.as_deref(), Some("a"));

            assert_eq!(lookup_key("KeyB").unwrap().key, "b");
        }

        #[test]
        fn test_digits_and_punctuation() {
            assert_eq!(lookup_key("7").unwrap().key_code, 55);
            assert_eq!(lookup_key("Digit3").unwrap().key, "3");
            assert_eq!(lookup_key("!").unwrap().code, "Digit1");
            assert_eq!(lookup_key("?").unwrap().code, "Slash");
            assert_eq!(lookup_key("-").unwrap().key_code, 189);
            assert_eq!(lookup_key("+").unwrap().code, "Equal");
        }

        #[test]
        fn test_unknown_key() {
            let err = lookup_key("Hyper").unwrap_err();
            assert!(matches!(err, PlaycheckError::InputError { .. }));
            assert!(lookup_key("é").is_err());
        }
    }

    mod chord_tests {
        use super::*;

        #[test]
        fn test_single_key() {
            let chord = KeyChord::parse("Enter").unwrap();
            assert!(chord.modifiers.is_empty());
            let events = chord.events();
            assert_eq!(events.len(), 2);
            assert_eq!(events[0].kind, KeyEventKind::Down);
            assert_eq!(events[0].text.as_deref(), Some("\r"));
            assert_eq!(events[1].kind, KeyEventKind::Up);
        }

        #[test]
        fn test_shift_keeps_text() {
            let events = KeyChord::parse("Shift+A").unwrap().events();
            assert_eq!(events.len(), 4);
            assert_eq!(events[0].key, "Shift");
            assert_eq!(events[0].modifiers, Modifier::Shift.bit());
            assert_eq!(events[1].key, "A");
            assert_eq!(events[1].text.as_deref(), Some("A"));
            assert_eq!(events[1].modifiers, 8);
            assert_eq!(events[3].key, "Shift");
            assert_eq!(events[3].modifiers, 0);
        }

        #[test]
        fn test_control_suppresses_text() {
            let events = KeyChord::parse("Control+A").unwrap().events();
            assert_eq!(events[1].key, "A");
            assert!(events[1].text.is_none());
            assert_eq!(events[1].modifiers, Modifier::Control.bit());
        }

        #[test]
        fn test_release_order_is_reversed() {
            let events = KeyChord::parse("Control+Shift+ArrowLeft").unwrap().events();
            let keys: Vec<_> = events.iter().map(|e| (e.kind, e.key.as_str())).collect();
            assert_eq!(
                keys,
                vec![
                    (KeyEventKind::Down, "Control"),
                    (KeyEventKind::Down, "Shift"),
                    (KeyEventKind::Down, "ArrowLeft"),
                    (KeyEventKind::Up, "ArrowLeft"),
                    (KeyEventKind::Up, "Shift"),
                    (KeyEventKind::Up, "Control"),
                ]
            );
            assert_eq!(events[2].modifiers, 2 | 8);
        }

        #[test]
        fn test_plus_key() {
            let chord = KeyChord::parse("Shift++").unwrap();
            assert_eq!(chord.modifiers, vec![Modifier::Shift]);
            assert_eq!(chord.key.key, "+");

            let chord = KeyChord::parse("+").unwrap();
            assert!(chord.modifiers.is_empty());
            assert_eq!(chord.key.key, "+");
        }

        #[test]
        fn test_invalid_chords() {
            assert!(KeyChord::parse("").is_err());
            assert!(KeyChord::parse("A+B").is_err());
            assert!(KeyChord::parse("Shift+Nope").is_err());
        }

        #[test]
        fn test_dangling_separator_rejected() {
            let err = KeyChord::parse("Shift+").unwrap_err();
            assert!(matches!(err, PlaycheckError::InputError { .. }));
            assert!(err.to_string().contains("no key after"));
            assert!(KeyChord::parse("Control+Shift+").is_err());
            assert_eq!(KeyChord::parse("Control++").unwrap().key.key, "+");
        }

        #[test]
        fn test_keypad_flag() {
            let events = KeyChord::parse("Numpad5").unwrap().events();
            assert!(events[0].is_keypad());
            assert!(!KeyChord::parse("5").unwrap().events()[0].is_keypad());
        }
    }

    proptest! {
        #[test]
        fn prop_letter_chords_balance(
            letter in "[a-zA-Z]",
            shift in any::<bool>(),
            control in any::<bool>(),
            alt in any::<bool>(),
        ) {
            let mut chord = String::new();
            if control { chord.push_str("Control+"); }
            if alt { chord.push_str("Alt+"); }
            if shift { chord.push_str("Shift+"); }
            chord.push_str(&letter);

            let events = KeyChord::parse(&chord).unwrap().events();
            let downs = events.iter().filter(|e| e.kind == KeyEventKind::Down).count();
            let ups = events.iter().filter(|e| e.kind == KeyEventKind::Up).count();
            prop_assert_eq!(downs, ups);
            prop_assert_eq!(events.last().unwrap().modifiers, 0);
            prop_assert_eq!(downs, 1 + usize::from(shift) + usize::from(control) + usize::from(alt));
        }
    }
}
