pub mod code_view;
pub mod progress_bar;
pub mod status_panel;
pub mod virtual_keyboard;
