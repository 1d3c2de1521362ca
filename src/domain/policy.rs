use crate::domain::status::ManualOverride;

/// Consecutive positive samples before "phone present" is acted on.
pub const TRIGGER_FRAMES: u32 = 3;

/// Consecutive negative samples before "phone absent" is acted on.
pub const IDLE_FRAMES: u32 = 100;

/// Command the orchestrator sends to the audio link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkCommand {
    Connect,
    Disconnect,
}

/// Consecutive-sample counters. Per-frame detection is noisy, so a sample
/// only becomes an automatic decision after a run of identical ones:
///
/// ```text
/// sample=true  x TRIGGER_FRAMES  ->  auto wants the link ON
/// sample=false x IDLE_FRAMES     ->  auto wants the link OFF
/// anything shorter               ->  undecided, nothing happens
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Debouncer {
    trigger_counter: u32,
    idle_counter: u32,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one detector sample and return the automatic decision, if any.
    ///
    /// When auto-detection is off both counters are held at zero and no
    /// decision is ever produced.
    pub fn observe(&mut self, auto_enabled: bool, detected: bool) -> Option<bool> {
        if !auto_enabled {
            self.reset();
            return None;
        }

        if detected {
            self.idle_counter = 0;
            self.trigger_counter = self.trigger_counter.saturating_add(1);
        } else {
            self.trigger_counter = 0;
            self.idle_counter = self.idle_counter.saturating_add(1);
        }

        if self.trigger_counter >= TRIGGER_FRAMES {
            Some(true)
        } else if self.idle_counter >= IDLE_FRAMES {
            Some(false)
        } else {
            None
        }
    }

    pub fn reset(&mut self) {
        self.trigger_counter = 0;
        self.idle_counter = 0;
    }

    pub fn trigger_counter(&self) -> u32 {
        self.trigger_counter
    }

    pub fn idle_counter(&self) -> u32 {
        self.idle_counter
    }
}

/// Decide what to do with the audio link.
///
/// Manual ON pins the link on regardless of the detector. Manual OFF only
/// cancels an earlier manual decision: the automatic decision still applies,
/// exactly as when no override is set. Overrides are honoured only while
/// keybinds are enabled.
pub fn decide(
    keybind_enabled: bool,
    manual_override: Option<ManualOverride>,
    auto_wants_on: Option<bool>,
    audio_active: bool,
) -> Option<LinkCommand> {
    match (keybind_enabled, manual_override) {
        (true, Some(ManualOverride::On)) => (!audio_active).then_some(LinkCommand::Connect),
        _ => follow_auto(auto_wants_on, audio_active),
    }
}

fn follow_auto(auto_wants_on: Option<bool>, audio_active: bool) -> Option<LinkCommand> {
    match auto_wants_on {
        Some(true) if !audio_active => Some(LinkCommand::Connect),
        Some(false) if audio_active => Some(LinkCommand::Disconnect),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_requires_consecutive_positives() {
        let mut debouncer = Debouncer::new();
        assert_eq!(debouncer.observe(true, true), None);
        assert_eq!(debouncer.observe(true, true), None);
        assert_eq!(debouncer.observe(true, true), Some(true));
        assert_eq!(debouncer.trigger_counter(), 3);
    }

    #[test]
    fn test_negative_sample_breaks_trigger_run() {
        let mut debouncer = Debouncer::new();
        debouncer.observe(true, true);
        debouncer.observe(true, true);
        assert_eq!(debouncer.observe(true, false), None);
        assert_eq!(debouncer.trigger_counter(), 0);
        assert_eq!(debouncer.observe(true, true), None);
        assert_eq!(debouncer.observe(true, true), None);
        assert_eq!(debouncer.observe(true, true), Some(true));
    }

    #[test]
    fn test_idle_requires_full_run() {
        let mut debouncer = Debouncer::new();
        for _ in 0..IDLE_FRAMES - 1 {
            assert_eq!(debouncer.observe(true, false), None);
        }
        assert_eq!(debouncer.observe(true, false), Some(false));
    }

    #[test]
    fn test_disabled_holds_counters_at_zero() {
        let mut debouncer = Debouncer::new();
        debouncer.observe(true, true);
        debouncer.observe(true, true);
        assert_eq!(debouncer.observe(false, true), None);
        assert_eq!(debouncer.trigger_counter(), 0);
        assert_eq!(debouncer.idle_counter(), 0);
    }

    #[test]
    fn test_hysteresis_never_fires_early() {
        // Alternating noise never reaches either threshold.
        let mut debouncer = Debouncer::new();
        for i in 0..500 {
            let sample = i % 3 != 0;
            assert_eq!(debouncer.observe(true, sample), None);
        }
    }

    #[test]
    fn test_no_override_follows_auto() {
        assert_eq!(decide(true, None, Some(true), false), Some(LinkCommand::Connect));
        assert_eq!(decide(true, None, Some(true), true), None);
        assert_eq!(
            decide(true, None, Some(false), true),
            Some(LinkCommand::Disconnect)
        );
        assert_eq!(decide(true, None, Some(false), false), None);
        assert_eq!(decide(true, None, None, true), None);
    }

    #[test]
    fn test_manual_on_pins_link() {
        let on = Some(ManualOverride::On);
        assert_eq!(decide(true, on, Some(false), true), None);
        assert_eq!(decide(true, on, None, false), Some(LinkCommand::Connect));
        assert_eq!(decide(true, on, Some(false), false), Some(LinkCommand::Connect));
    }

    #[test]
    fn test_manual_off_does_not_block_auto() {
        let off = Some(ManualOverride::Off);
        assert_eq!(decide(true, off, Some(true), false), Some(LinkCommand::Connect));
        assert_eq!(
            decide(true, off, Some(false), true),
            Some(LinkCommand::Disconnect)
        );
    }

    #[test]
    fn test_override_ignored_without_keybinds() {
        let on = Some(ManualOverride::On);
        assert_eq!(decide(false, on, None, false), None);
        assert_eq!(
            decide(false, on, Some(false), true),
            Some(LinkCommand::Disconnect)
        );
    }
}
