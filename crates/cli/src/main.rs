// Copyright 2025 LLM Calibrate Contributors
// SPDX-License-Identifier: Apache-2.0

//! LLM Calibrate CLI entry point.

fn main() {
    if let Err(e) = llm_calibrate_cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
