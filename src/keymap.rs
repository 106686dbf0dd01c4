use std::sync::{Arc, Mutex};
use std::thread;

use chip8vm::{Key, NUM_KEYS};
use rdev::{Event, EventType};

/// Maps the left-hand block of a QWERTY keyboard onto the hex keypad:
///
/// ```text
/// 1 2 3 4        1 2 3 C
/// Q W E R   ->   4 5 6 D
/// A S D F        7 8 9 E
/// Z X C V        A 0 B F
/// ```
pub fn map_key(key: rdev::Key) -> Option<Key> {
    let key = match key {
        rdev::Key::Num1 => Key::Key1,
        rdev::Key::Num2 => Key::Key2,
        rdev::Key::Num3 => Key::Key3,
        rdev::Key::Num4 => Key::KeyC,
        rdev::Key::KeyQ => Key::Key4,
        rdev::Key::KeyW => Key::Key5,
        rdev::Key::KeyE => Key::Key6,
        rdev::Key::KeyR => Key::KeyD,
        rdev::Key::KeyA => Key::Key7,
        rdev::Key::KeyS => Key::Key8,
        rdev::Key::KeyD => Key::Key9,
        rdev::Key::KeyF => Key::KeyE,
        rdev::Key::KeyZ => Key::KeyA,
        rdev::Key::KeyX => Key::Key0,
        rdev::Key::KeyC => Key::KeyB,
        rdev::Key::KeyV => Key::KeyF,
        _ => return None,
    };
    Some(key)
}

#[derive(Default)]
struct KeyState {
    pressed: [bool; NUM_KEYS],
    escape: bool,
}

impl KeyState {
    fn apply(&mut self, event: &Event) {
        let (key, down) = match event.event_type {
            EventType::KeyPress(key) => (key, true),
            EventType::KeyRelease(key) => (key, false),
            _ => return,
        };
        if key == rdev::Key::Escape {
            self.escape = down;
        } else if let Some(key) = map_key(key) {
            self.pressed[usize::from(key.index())] = down;
        }
    }
}

/// Physical key state, kept current by a background listener thread. Terminals report
/// presses but not releases, so keys are read from the OS instead.
#[derive(Clone, Default)]
pub struct HostKeys {
    state: Arc<Mutex<KeyState>>,
}

impl HostKeys {
    pub fn listen() -> Self {
        let keys = HostKeys::default();
        let shared = Arc::clone(&keys.state);
        thread::spawn(move || {
            let result = rdev::listen(move |event| {
                if let Ok(mut state) = shared.lock() {
                    state.apply(&event);
                }
            });
            if let Err(e) = result {
                log::error!("keyboard listener stopped: {e:?}");
            }
        });
        keys
    }

    pub fn snapshot(&self) -> [bool; NUM_KEYS] {
        self.state
            .lock()
            .map(|state| state.pressed)
            .unwrap_or_default()
    }

    pub fn is_escape_pressed(&self) -> bool {
        self.state.lock().map(|state| state.escape).unwrap_or(false)
    }
}
