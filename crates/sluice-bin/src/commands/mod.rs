// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Command implementations.

mod run;
mod validate;
mod version;

pub use run::run;
pub use validate::validate;
pub use version::version;

use crate::cli::{Cli, Commands};
use crate::error::BinResult;

/// Dispatches the CLI to the selected command.
pub async fn dispatch(cli: Cli) -> BinResult<()> {
    match cli.effective_command() {
        Commands::Run => run(&cli).await,
        Commands::Validate(args) => validate(&cli, args),
        Commands::Version => {
            version();
            Ok(())
        }
    }
}
