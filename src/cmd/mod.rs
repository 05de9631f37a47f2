//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module      | Commands handled                          |
//! |-------------|-------------------------------------------|
//! | `project`   | `Init`, `Reset`, `Matrix`                 |
//! | `generate`  | `Generate`, `Analytics`                   |
//! | `overrides` | `Pin`, `Unpin`, `Exclude`, `Unexclude`    |
//! | `flows`     | `Flows`, `Catalog`                        |
//! | `status`    | `Status`                                  |
//! | `plan`      | `Plan`                                    |

pub mod flows;
pub mod generate;
pub mod overrides;
pub mod plan;
pub mod project;
pub mod status;

pub use flows::{cmd_catalog, cmd_flows};
pub use generate::{cmd_analytics, cmd_generate};
pub use overrides::{cmd_exclude, cmd_pin, cmd_unexclude, cmd_unpin};
pub use plan::cmd_plan;
pub use project::{cmd_init, cmd_matrix, cmd_reset};
pub use status::{cmd_status_set, cmd_status_show};
