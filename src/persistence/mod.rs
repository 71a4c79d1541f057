pub mod files;

pub use files::{
    account_file, atomic_write, config_file, ensure_data_dir, init_local_dir, log_file, read_file,
    tasks_file,
};
