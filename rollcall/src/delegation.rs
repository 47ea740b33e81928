//! Contact resolution through the roster's delegation pointers
//!
//! Resolution is single-hop. An entry that cannot be contacted directly is
//! reached at its delegate's own address; if the delegate has delegated
//! further, that second pointer is not followed. Any delegation that cannot
//! be honored is a fatal data error.

use crate::error::{EngineError, Result};
use crate::model::{ContactPolicy, EngineConfig, RosterEntry, RosterId};
use std::collections::HashMap;
use tracing::debug;

/// Roster entries keyed by id
pub type RosterIndex = HashMap<RosterId, RosterEntry>;

/// Index the roster by id; a repeated id is a data error
pub fn build_index(roster: &[RosterEntry]) -> Result<RosterIndex> {
    let mut index = RosterIndex::with_capacity(roster.len());
    for entry in roster {
        if index.insert(entry.id, entry.clone()).is_some() {
            return Err(EngineError::DataIntegrity(format!(
                "roster id {} appears more than once",
                entry.id
            )));
        }
    }
    Ok(index)
}

/// Final contact address for `entry`
pub fn resolve_contact(
    entry: &RosterEntry,
    roster_index: &RosterIndex,
    config: &EngineConfig,
) -> Result<String> {
    match entry.policy {
        ContactPolicy::Direct => resolve_direct(entry, config),
        ContactPolicy::Delegated { delegate_id } => {
            resolve_delegate(entry, delegate_id, roster_index, config)
        }
        ContactPolicy::Inactive => Err(EngineError::DataIntegrity(format!(
            "{} (id {}) is inactive and has no contact",
            entry.full_name, entry.id
        ))),
    }
}

fn resolve_direct(entry: &RosterEntry, config: &EngineConfig) -> Result<String> {
    let address = normalize_address(&entry.contact_address, &config.region_code);
    if !address.is_empty() {
        return Ok(address);
    }

    let fallback = config
        .operator_address
        .as_deref()
        .map(|a| normalize_address(a, &config.region_code))
        .unwrap_or_default();

    if fallback.is_empty() {
        return Err(EngineError::DataIntegrity(format!(
            "{} (id {}) has no contact address and no operator address is configured",
            entry.full_name, entry.id
        )));
    }

    debug!(
        entry = %entry.id,
        "No contact address, reminder goes to operator"
    );
    Ok(fallback)
}

fn resolve_delegate(
    entry: &RosterEntry,
    delegate_id: RosterId,
    roster_index: &RosterIndex,
    config: &EngineConfig,
) -> Result<String> {
    if delegate_id == entry.id {
        return Err(EngineError::DataIntegrity(format!(
            "{} (id {}) delegates to itself",
            entry.full_name, entry.id
        )));
    }

    let delegate = roster_index.get(&delegate_id).ok_or_else(|| {
        EngineError::DataIntegrity(format!(
            "{} (id {}) should delegate to id {} - but it is not in the roster",
            entry.full_name, entry.id, delegate_id
        ))
    })?;

    if !delegate.is_active() {
        return Err(EngineError::DataIntegrity(format!(
            "{} (id {}) delegates to inactive entry {} (id {})",
            entry.full_name, entry.id, delegate.full_name, delegate.id
        )));
    }

    let address = normalize_address(&delegate.contact_address, &config.region_code);
    if address.is_empty() {
        return Err(EngineError::DataIntegrity(format!(
            "{} (id {}) should delegate to id {} - but its contact address is empty",
            entry.full_name, entry.id, delegate_id
        )));
    }

    if delegate.delegate_id().is_some() {
        debug!(
            entry = %entry.id,
            delegate = %delegate.id,
            "Delegate has its own delegate; using delegate's address (single hop)"
        );
    }

    Ok(address)
}

/// Check every delegation pointer in the roster, not only those of gap entries
///
/// Each active entry that delegates must reach an active delegate with a
/// usable address. The error names every entry that fails.
pub fn check_delegations(roster_index: &RosterIndex, config: &EngineConfig) -> Result<()> {
    let mut delegating: Vec<&RosterEntry> = roster_index
        .values()
        .filter(|entry| entry.delegate_id().is_some())
        .collect();
    delegating.sort_by_key(|entry| entry.id);

    let problems: Vec<String> = delegating
        .into_iter()
        .filter_map(|entry| match resolve_contact(entry, roster_index, config) {
            Err(EngineError::DataIntegrity(msg)) => Some(msg),
            _ => None,
        })
        .collect();

    if problems.is_empty() {
        Ok(())
    } else {
        Err(EngineError::DataIntegrity(problems.join("; ")))
    }
}

/// Strip formatting from a raw address and prefix the region code
///
/// Removes directional/format control characters, whitespace, parentheses,
/// dashes and dots. Addresses that already start with `+` keep their own
/// code. An address with nothing left normalizes to the empty string.
pub fn normalize_address(raw: &str, region_code: &str) -> String {
    let stripped: String = raw
        .chars()
        .filter(|c| !is_format_control(*c))
        .filter(|c| !c.is_whitespace())
        .filter(|c| !matches!(c, '(' | ')' | '-' | '.'))
        .collect();

    if stripped.is_empty() || stripped.starts_with('+') {
        stripped
    } else {
        format!("{}{}", region_code, stripped)
    }
}

/// Bidi embedding/override/isolate marks that spreadsheets paste into numbers
fn is_format_control(c: char) -> bool {
    matches!(
        c,
        '\u{200B}'..='\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2066}'..='\u{2069}' | '\u{FEFF}'
    )
}
