pub mod pane_chrome;
pub mod status_bar;
pub mod text_input;
pub mod toast;
pub mod wrap;
