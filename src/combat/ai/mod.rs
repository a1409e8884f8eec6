//! Combat domain: AI intent sources.

mod boss;

pub use boss::BossBrain;
