pub mod command;
pub mod event;
pub mod rule;
pub mod theme;
pub mod window;

pub use command::{Command, Response};
pub use event::{EventFilter, StateEvent, SubscribeRequest};
pub use rule::{FloatReason, FloatRule, RuleValidation, RulesInfo};
pub use theme::{
    Color, Palette, ReloadResult, SpecialColors, ThemeColors, ThemeSource, ThemeStatus,
    WatchState, PALETTE_SIZE,
};
pub use window::{
    ProblematicWindow, SizeHints, WindowAttributes, WindowId, WindowInfo, WindowStats,
};
