use anyhow::{bail, Result};
use fern_support::join_alternatives;

use super::{base_name, TypeChecker};
use crate::ast::{Branch, BranchPattern};
use crate::types::Type;

impl TypeChecker<'_> {
    /// Case statements over a union must name every variant, unless a `default`
    /// branch is present, and may not name variants the union does not have.
    pub(crate) fn validate_all_branches_covered(
        &self,
        predicate_type: &Type,
        branches: &[Branch],
    ) -> Result<()> {
        let Type::Fixed(fixed) = predicate_type else {
            return Ok(());
        };

        let (declared, covered) = if let Some(union) = self.find_union(&fixed.name) {
            let declared = union.tags.iter().map(|tag| tag.name.clone()).collect::<Vec<_>>();
            let covered = branches
                .iter()
                .filter_map(|branch| match &branch.pattern {
                    BranchPattern::Destructure(destructure) => {
                        Some(base_name(&destructure.constructor).to_string())
                    }
                    _ => None,
                })
                .collect::<Vec<_>>();
            (declared, covered)
        } else if let Some(union) = self.find_untagged(&fixed.name) {
            let declared = union
                .values
                .iter()
                .map(|value| format!("\"{}\"", value.body))
                .collect::<Vec<_>>();
            let covered = branches
                .iter()
                .filter_map(|branch| match &branch.pattern {
                    BranchPattern::StringValue(value) => Some(format!("\"{}\"", value.body)),
                    _ => None,
                })
                .collect::<Vec<_>>();
            (declared, covered)
        } else {
            return Ok(());
        };

        let has_default = branches
            .iter()
            .any(|branch| matches!(branch.pattern, BranchPattern::Default));

        let missing = declared
            .iter()
            .filter(|name| !covered.contains(name))
            .collect::<Vec<_>>();
        let mut impossible: Vec<&String> = Vec::new();
        for name in &covered {
            if !declared.contains(name) && !impossible.contains(&name) {
                impossible.push(name);
            }
        }

        let mut messages = Vec::new();
        if !missing.is_empty() && !has_default {
            messages.push(format!(
                "All possible branches of a case statement must be covered. Expected branches for `{}` that are missing: {}",
                fixed.name,
                join_alternatives(&missing)
            ));
        }
        if !impossible.is_empty() {
            messages.push(format!(
                "Impossible branches in case statement on `{}`, these are not part of the type: {}",
                fixed.name,
                join_alternatives(&impossible)
            ));
        }
        if !messages.is_empty() {
            bail!(messages.join("\n"));
        }
        Ok(())
    }
}
