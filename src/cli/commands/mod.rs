//! CLI command implementations

pub mod activate;
pub mod buckets;
pub mod config;
pub mod fetch;
pub mod install;
pub mod status;
pub mod update;
pub mod verify;

pub use activate::execute as activate;
pub use buckets::execute as buckets;
pub use config::execute as config;
pub use fetch::execute as fetch;
pub use install::execute as install;
pub use status::execute as status;
pub use update::execute as update;
pub use verify::execute as verify;
