mod load;
mod types;

pub use load::{apply_env_overrides, get_sweep_data_dir, load, load_default};
pub use types::*;
