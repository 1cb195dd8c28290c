//! CLI command implementations.
//!
//! | Module   | Commands handled            |
//! |----------|-----------------------------|
//! | `setup`  | `Setup`                     |
//! | `issue`  | `Lookup`                    |
//! | `vcs`    | `Branch`, `Commit`, `Push`  |

pub mod issue;
pub mod setup;
pub mod vcs;

pub use issue::cmd_lookup;
pub use setup::cmd_setup;
pub use vcs::{cmd_branch, cmd_commit, cmd_push};
