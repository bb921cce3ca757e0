//! `matchload roster` subcommands

use super::output::{print_error, print_success, print_warning};
use anyhow::Result;
use matchload_core::Roster;
use std::path::Path;

/// Load and validate a roster, reporting its size and gender split
pub fn handle_roster_check(path: &Path) -> Result<Roster> {
    match Roster::load(path) {
        Ok(roster) => {
            let (male, female) = roster.gender_split();
            print_success(&format!(
                "Roster {:?} is valid: {} identities ({} male, {} female)",
                path,
                roster.len(),
                male,
                female
            ));
            if male == 0 || female == 0 {
                print_warning("Roster holds a single gender; no pair can ever match");
            }
            Ok(roster)
        }
        Err(e) => {
            print_error(&format!("Roster check failed: {}", e));
            Err(e.into())
        }
    }
}
