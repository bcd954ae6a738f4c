//! # Domain Invariants
//!
//! Fail-fast checks on the network declaration. Nothing here touches the
//! filesystem or spawns a process.

use std::collections::HashSet;
use std::path::PathBuf;

use super::entities::{NetworkDeclaration, RootInfo, ValidatorSpec};
use super::errors::ValidationError;
use super::value_objects::ValidatorField;
use crate::algorithms::address::expand_home;

/// Required validator fields, in the order they are checked.
pub const REQUIRED_VALIDATOR_FIELDS: [ValidatorField; 7] = [
    ValidatorField::Ip,
    ValidatorField::Home,
    ValidatorField::P2pAddress,
    ValidatorField::RpcAddress,
    ValidatorField::Moniker,
    ValidatorField::CommitTimeout,
    ValidatorField::BondedStake,
];

/// Validate a declaration and resolve its root validator.
///
/// On success every validator home has `~` and environment variables
/// expanded, and the root name and home are returned. A home that cannot be
/// expanded fails with [`ValidationError::UnresolvedHome`].
pub fn validate(declaration: &mut NetworkDeclaration) -> Result<RootInfo, ValidationError> {
    invariant_declaration(declaration)?;

    for validator in &mut declaration.validators {
        validator.home =
            expand_home(&validator.home).map_err(|source| ValidationError::UnresolvedHome {
                validator: validator.name.clone(),
                path: validator.home.clone(),
                source,
            })?;
    }

    let root = declaration
        .root()
        .ok_or(ValidationError::EmptyValidatorSet)?;
    Ok(RootInfo {
        name: root.name.clone(),
        home: PathBuf::from(&root.home),
    })
}

/// Invariant: all declaration-level rules hold. Does not modify anything.
pub fn invariant_declaration(declaration: &NetworkDeclaration) -> Result<(), ValidationError> {
    if declaration.validators.is_empty() {
        return Err(ValidationError::EmptyValidatorSet);
    }
    if declaration.accounts.is_empty() {
        return Err(ValidationError::EmptyAccountSet);
    }
    if declaration.validators.len() > declaration.accounts.len() {
        return Err(ValidationError::ValidatorExceedsAccounts {
            validators: declaration.validators.len(),
            accounts: declaration.accounts.len(),
        });
    }

    invariant_unique_accounts(declaration)?;

    let mut seen = HashSet::new();
    for validator in &declaration.validators {
        if !seen.insert(validator.name.as_str()) {
            return Err(ValidationError::DuplicateValidator {
                name: validator.name.clone(),
            });
        }
        if declaration.account(&validator.name).is_none() {
            return Err(ValidationError::UnmatchedValidatorAccount {
                name: validator.name.clone(),
            });
        }
        invariant_required_fields(validator)?;
    }

    for account in &declaration.accounts {
        if account.coins.iter().all(|coin| coin.trim().is_empty()) {
            return Err(ValidationError::EmptyAccountBalance {
                name: account.name.clone(),
            });
        }
    }
    Ok(())
}

/// Invariant: account names are unique.
pub fn invariant_unique_accounts(declaration: &NetworkDeclaration) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for account in &declaration.accounts {
        if !seen.insert(account.name.as_str()) {
            return Err(ValidationError::DuplicateAccount {
                name: account.name.clone(),
            });
        }
    }
    Ok(())
}

/// Invariant: every required validator field is non-empty.
pub fn invariant_required_fields(validator: &ValidatorSpec) -> Result<(), ValidationError> {
    match REQUIRED_VALIDATOR_FIELDS
        .iter()
        .find(|field| validator.field(**field).is_none())
    {
        Some(field) => Err(ValidationError::MissingField {
            validator: validator.name.clone(),
            field: *field,
        }),
        None => Ok(()),
    }
}
