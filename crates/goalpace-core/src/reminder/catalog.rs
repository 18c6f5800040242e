//! Message catalog for generated reminders.

use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;

/// Group of interchangeable message lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageTheme {
    Morning,
    Progress,
    MissedTask,
    Completion,
    Weekly,
    Encouragement,
}

impl MessageTheme {
    pub fn lines(&self) -> &'static [&'static str] {
        match self {
            MessageTheme::Morning => &[
                "Ready to make today count?",
                "A fresh day for your goals. Where do you want to start?",
                "Small steps add up. What's the first one today?",
                "Your goals are waiting. Let's pick something doable.",
            ],
            MessageTheme::Progress => &[
                "You're making real headway. Keep the momentum going!",
                "Nice progress so far. The next task is within reach.",
                "Steady work is paying off. One more step?",
                "Look how far you've come already.",
            ],
            MessageTheme::MissedTask => &[
                "No worries about yesterday. Today is a new chance.",
                "Missed a task? Pick it back up whenever you're ready.",
                "Plans slip sometimes. A short session gets you back on track.",
                "It's fine to restart. Even ten minutes counts.",
            ],
            MessageTheme::Completion => &[
                "Task done! That's how goals get finished.",
                "Another one checked off. Well earned.",
                "Great work finishing that one!",
                "Done and dusted. Enjoy the win.",
            ],
            MessageTheme::Weekly => &[
                "Time to look back at your week and plan the next one.",
                "A quick weekly review keeps your goals realistic.",
                "How did this week go? Take a moment to reflect.",
            ],
            MessageTheme::Encouragement => &[
                "Progress, not perfection.",
                "Consistency beats intensity. Show up today.",
                "Every finished task moves the needle.",
                "You've got this. Start small.",
            ],
        }
    }
}

/// Chooses one line from a theme.
pub trait MessagePicker {
    /// Index in `0..len`. `len` is never zero.
    fn index(&mut self, len: usize) -> usize;

    fn pick(&mut self, theme: MessageTheme) -> &'static str {
        let lines = theme.lines();
        let index = self.index(lines.len()).min(lines.len() - 1);
        lines[index]
    }
}

/// Uniformly random picker, reproducible when seeded.
#[derive(Debug, Clone)]
pub struct RandomPicker {
    rng: Mcg128Xsl64,
}

impl RandomPicker {
    pub fn new() -> Self {
        Self {
            rng: Mcg128Xsl64::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mcg128Xsl64::seed_from_u64(seed),
        }
    }
}

impl Default for RandomPicker {
    fn default() -> Self {
        Self::new()
    }
}

impl MessagePicker for RandomPicker {
    fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }
}

/// Always picks the first line.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstPicker;

impl MessagePicker for FirstPicker {
    fn index(&mut self, _len: usize) -> usize {
        0
    }
}
