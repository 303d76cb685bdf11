pub mod rhelp;

pub use crate::commands::rhelp::{
    ARHELP_COMMAND,
    RHELP_COMMAND,
};
