mod calculator;

pub use calculator::{LevelCalculator, XpProgress};
