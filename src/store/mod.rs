pub mod notice;
pub mod settings;
pub mod signals;

pub use notice::ErrorNotice;
pub use settings::{Settings, Theme};
pub use signals::SignalStore;
