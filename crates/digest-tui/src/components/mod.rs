pub mod alert;
pub mod help_overlay;
pub mod log_panel;
pub mod login;
pub mod query_panel;
pub mod scrape_form;
pub mod summary_list;
