// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `version` command.

/// Prints detailed version information.
pub fn version() {
    println!("SLUICE v{}", sluice_core::VERSION);
    println!("OPC UA to HTTP process-value bridge");
    println!();
    println!("Components:");
    println!("  sluice-core   {}", sluice_core::VERSION);
    println!("  sluice-opcua  {}", sluice_opcua::VERSION);
    println!("  sluice-api    {}", sluice_api::VERSION);
    println!("  sluice-config {}", sluice_config::VERSION);
    println!();
    println!(
        "OPC UA client: {}",
        if cfg!(feature = "opcua-client") {
            "enabled"
        } else {
            "disabled"
        }
    );
}
