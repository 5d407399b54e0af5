pub mod catalog;
pub mod economy;
pub mod element;
pub mod game;
pub mod items;
pub mod mode;
pub mod presets;
pub mod progress;
pub mod requests;
pub mod spirits;
