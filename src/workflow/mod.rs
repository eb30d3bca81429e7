pub mod folders;
pub mod runner;

pub use folders::{next_task_folder, save_output};
pub use runner::{run_local_search, run_search, search_and_save, search_with_local_browser};
