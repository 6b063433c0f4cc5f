//! Fire-and-forget side-effect notifications. The battle core publishes sound
//! cues, screen-transition requests and battle-log lines through this trait;
//! hosts subscribe by injecting an implementation. Nothing here is awaited and
//! no result flows back into the resolver.

/// Sound-effect cues, one per original audio event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sfx {
    Appear,
    Correct,
    Wrong,
    Damage,
    Heal,
    Defeat,
    LevelUp,
}

/// Screen-transition requests the core can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenRequest {
    GameOver,
    StageClear,
}

pub trait Notifier {
    fn play_se(&mut self, _sfx: Sfx) {}
    fn change_screen(&mut self, _req: ScreenRequest) {}
    /// Human-readable battle log line (Japanese, shown verbatim in the UI).
    fn log_line(&mut self, _line: &str) {}
}

/// Drops every notification; useful default for tests and headless runs.
pub struct NullNotifier;

impl Notifier for NullNotifier {}

/// Records everything for assertion in tests.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sounds: Vec<Sfx>,
    pub screens: Vec<ScreenRequest>,
    pub lines: Vec<String>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Notifier for RecordingNotifier {
    fn play_se(&mut self, sfx: Sfx) {
        self.sounds.push(sfx);
    }

    fn change_screen(&mut self, req: ScreenRequest) {
        self.screens.push(req);
    }

    fn log_line(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}

// Shared handle so a test can keep inspecting the recorder after handing it
// to a battle session.
impl Notifier for std::rc::Rc<std::cell::RefCell<RecordingNotifier>> {
    fn play_se(&mut self, sfx: Sfx) {
        self.borrow_mut().play_se(sfx);
    }

    fn change_screen(&mut self, req: ScreenRequest) {
        self.borrow_mut().change_screen(req);
    }

    fn log_line(&mut self, line: &str) {
        self.borrow_mut().log_line(line);
    }
}
