//! UIコンポーネント

pub mod header;
pub mod settings_panel;
pub mod input_panel;
pub mod upload_area;
pub mod mode_buttons;
pub mod progress_bar;
pub mod result_view;
pub mod quiz_view;
pub mod history_panel;
