//! X11 action sink.
//!
//! Warps the pointer with core protocol requests and synthesizes key and
//! button events through the XTEST extension.

use crate::{
    action::{ActionEvent, ActionKind, ActionSink, ActionTarget, MetaAction, MouseButton},
    tracking::TrackingPoint,
    Error, Result,
};
use log::{debug, info};
use x11rb::{
    connection::Connection,
    protocol::{
        xproto::{
            ConnectionExt, Keycode, Keysym, Screen, BUTTON_PRESS_EVENT, BUTTON_RELEASE_EVENT, KEY_PRESS_EVENT,
            KEY_RELEASE_EVENT,
        },
        xtest::ConnectionExt as XTestExt,
    },
    rust_connection::RustConnection,
};

/// Keysym for a key name as used in bindings
pub fn keysym_for(name: &str) -> Option<Keysym> {
    let lowered = name.trim().to_lowercase();

    let mut chars = lowered.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        // Latin-1 keysyms equal their code point
        return (c.is_ascii_graphic()).then(|| u32::from(c));
    }

    if let Some(n) = lowered.strip_prefix('f').and_then(|n| n.parse::<u32>().ok()) {
        return (1..=12).contains(&n).then(|| 0xffbe + n - 1);
    }

    let keysym = match lowered.as_str() {
        "space" => 0x0020,
        "enter" | "return" => 0xff0d,
        "tab" => 0xff09,
        "escape" | "esc" => 0xff1b,
        "backspace" => 0xff08,
        "delete" => 0xffff,
        "home" => 0xff50,
        "left" => 0xff51,
        "up" => 0xff52,
        "right" => 0xff53,
        "down" => 0xff54,
        "pageup" | "page_up" => 0xff55,
        "pagedown" | "page_down" => 0xff56,
        "end" => 0xff57,
        "shift" => SHIFT_KEYSYM,
        "ctrl" | "control" => 0xffe3,
        "alt" => 0xffe9,
        _ => return None,
    };
    Some(keysym)
}

const SHIFT_KEYSYM: Keysym = 0xffe1;

/// Core protocol button number
const fn button_number(button: MouseButton) -> u8 {
    match button {
        MouseButton::Left => 1,
        MouseButton::Middle => 2,
        MouseButton::Right => 3,
    }
}

/// Clamp a pixel coordinate onto a screen axis
#[allow(clippy::cast_possible_truncation)]
fn to_screen_coord(value: f64, extent: u16) -> i16 {
    let max = i16::try_from(extent.saturating_sub(1)).unwrap_or(i16::MAX);
    if !value.is_finite() {
        return 0;
    }
    // clamped into i16 range before the cast
    value.round().clamp(0.0, f64::from(max)) as i16
}

/// Keycode plus whether Shift must be held to produce the keysym
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct KeyStroke {
    keycode: Keycode,
    shifted: bool,
}

/// Find `keysym` in a keyboard mapping. Unshifted (column 0) entries win
/// over shifted (column 1) ones; other columns need modifiers we do not send.
fn lookup_keysym(keysyms: &[Keysym], per_keycode: u8, min_keycode: Keycode, keysym: Keysym) -> Option<KeyStroke> {
    let per = usize::from(per_keycode).max(1);
    [false, true]
        .into_iter()
        .filter(|&shifted| per > 1 || !shifted)
        .find_map(|shifted| {
            let column = usize::from(shifted);
            let row = keysyms.chunks(per).position(|row| row.get(column) == Some(&keysym))?;
            let keycode = min_keycode.checked_add(u8::try_from(row).ok()?)?;
            Some(KeyStroke { keycode, shifted })
        })
}

/// Sink that drives the X11 pointer and keyboard
pub struct X11Sink {
    connection: RustConnection,
    screen: Screen,
    min_keycode: Keycode,
    keysyms_per_keycode: u8,
    keysyms: Vec<Keysym>,
    paused: bool,
}

impl X11Sink {
    /// Connect to the default display
    pub fn new() -> Result<Self> {
        info!("Initializing X11 action sink");

        let (connection, screen_num) = RustConnection::connect(None)
            .map_err(|e| Error::CursorControl(format!("Failed to connect to X11: {e}")))?;

        let screen = connection
            .setup()
            .roots
            .get(screen_num)
            .ok_or_else(|| Error::CursorControl("Failed to get screen".to_string()))?
            .clone();

        let min_keycode = connection.setup().min_keycode;
        let max_keycode = connection.setup().max_keycode;
        let mapping = connection
            .get_keyboard_mapping(min_keycode, max_keycode - min_keycode + 1)
            .map_err(|e| Error::CursorControl(format!("Failed to request keyboard mapping: {e}")))?
            .reply()
            .map_err(|e| Error::CursorControl(format!("Failed to read keyboard mapping: {e}")))?;

        info!(
            "Connected to X11 display, screen: {}x{}",
            screen.width_in_pixels, screen.height_in_pixels
        );

        Ok(Self {
            connection,
            screen,
            min_keycode,
            keysyms_per_keycode: mapping.keysyms_per_keycode,
            keysyms: mapping.keysyms,
            paused: false,
        })
    }

    /// Get screen dimensions
    pub const fn screen_size(&self) -> (u16, u16) {
        (self.screen.width_in_pixels, self.screen.height_in_pixels)
    }

    /// Whether pointer movement is paused by a meta action
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    fn keycode_for(&self, keysym: Keysym) -> Option<KeyStroke> {
        lookup_keysym(&self.keysyms, self.keysyms_per_keycode, self.min_keycode, keysym)
    }

    fn warp(&self, x: i16, y: i16) -> Result<()> {
        debug!("Setting cursor position to ({}, {})", x, y);
        self.connection
            .warp_pointer(x11rb::NONE, self.screen.root, 0, 0, 0, 0, x, y)
            .map_err(|e| Error::CursorControl(format!("Failed to warp pointer: {e}")))?;
        self.flush()
    }

    fn fake_input(&self, event_type: u8, detail: u8) -> Result<()> {
        self.connection
            .xtest_fake_input(event_type, detail, x11rb::CURRENT_TIME, self.screen.root, 0, 0, 0)
            .map_err(|e| Error::SinkDispatch(format!("Failed to send fake input: {e}")))?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.connection
            .flush()
            .map_err(|e| Error::CursorControl(format!("Failed to flush connection: {e}")))?;
        Ok(())
    }

    /// Press, release or tap one key or button
    fn press(&self, press_type: u8, release_type: u8, detail: u8, kind: ActionKind) -> Result<()> {
        match kind {
            ActionKind::Activate => self.fake_input(press_type, detail)?,
            ActionKind::Deactivate => self.fake_input(release_type, detail)?,
            ActionKind::Fire => {
                self.fake_input(press_type, detail)?;
                self.fake_input(release_type, detail)?;
            }
        }
        self.flush()
    }

    /// Like [`Self::press`] for a key, holding Shift around it when needed
    fn stroke(&self, stroke: KeyStroke, kind: ActionKind) -> Result<()> {
        if !stroke.shifted {
            return self.press(KEY_PRESS_EVENT, KEY_RELEASE_EVENT, stroke.keycode, kind);
        }
        let shift = self
            .keycode_for(SHIFT_KEYSYM)
            .filter(|s| !s.shifted)
            .ok_or_else(|| Error::SinkDispatch("No keycode for Shift".to_string()))?
            .keycode;

        match kind {
            ActionKind::Activate => {
                self.fake_input(KEY_PRESS_EVENT, shift)?;
                self.fake_input(KEY_PRESS_EVENT, stroke.keycode)?;
            }
            ActionKind::Deactivate => {
                self.fake_input(KEY_RELEASE_EVENT, stroke.keycode)?;
                self.fake_input(KEY_RELEASE_EVENT, shift)?;
            }
            ActionKind::Fire => {
                self.fake_input(KEY_PRESS_EVENT, shift)?;
                self.fake_input(KEY_PRESS_EVENT, stroke.keycode)?;
                self.fake_input(KEY_RELEASE_EVENT, stroke.keycode)?;
                self.fake_input(KEY_RELEASE_EVENT, shift)?;
            }
        }
        self.flush()
    }

    fn meta(&mut self, action: MetaAction, kind: ActionKind) -> Result<()> {
        // meta actions happen on activation; their release is a no-op
        if kind == ActionKind::Deactivate {
            return Ok(());
        }
        match action {
            MetaAction::Pause => {
                self.paused = !self.paused;
                info!("Pointer movement {}", if self.paused { "paused" } else { "resumed" });
                Ok(())
            }
            MetaAction::Reset => {
                let (w, h) = self.screen_size();
                self.warp(to_screen_coord(f64::from(w) / 2.0, w), to_screen_coord(f64::from(h) / 2.0, h))
            }
            MetaAction::Middle => self.press(
                BUTTON_PRESS_EVENT,
                BUTTON_RELEASE_EVENT,
                button_number(MouseButton::Middle),
                ActionKind::Fire,
            ),
            MetaAction::Cycle => Err(Error::SinkDispatch(
                "monitor cycling needs more than one screen root".to_string(),
            )),
        }
    }
}

impl ActionSink for X11Sink {
    fn dispatch(&mut self, event: &ActionEvent) -> Result<()> {
        match &event.target {
            ActionTarget::Key(name) => {
                let stroke = keysym_for(name)
                    .and_then(|keysym| self.keycode_for(keysym))
                    .ok_or_else(|| Error::SinkDispatch(format!("No keycode for key '{name}'")))?;
                self.stroke(stroke, event.kind)
            }
            ActionTarget::Mouse(button) => {
                self.press(BUTTON_PRESS_EVENT, BUTTON_RELEASE_EVENT, button_number(*button), event.kind)
            }
            ActionTarget::Meta(action) => self.meta(*action, event.kind),
        }
    }

    fn move_pointer(&mut self, point: TrackingPoint) -> Result<()> {
        if self.paused {
            return Ok(());
        }
        let (w, h) = self.screen_size();
        self.warp(to_screen_coord(point.x, w), to_screen_coord(point.y, h))
    }
}
