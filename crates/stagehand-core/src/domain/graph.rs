//! Feature graph resolution and preflight reference checks.
//!
//! Resolution is purely structural and runs once, fully, before any
//! execution: a dangling `depends_on` reference or a cycle fails here, and
//! nothing has touched the filesystem yet. Ties among independent features
//! are broken by declaration order so the output is deterministic.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::domain::error::DomainError;
use crate::domain::feature::{Feature, FeatureRegistry};

/// Topologically order the registry's features.
///
/// Depth-first post-order with a recursion-stack cycle check: every feature
/// appears after all features in its `depends_on`. The outer loop walks
/// features in declaration order and dependencies in their declared order,
/// which makes the tie-break deterministic.
pub fn resolve_order(registry: &FeatureRegistry) -> Result<Vec<String>, DomainError> {
    let mut order = Vec::with_capacity(registry.len());
    let mut done: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&str> = Vec::new();

    for feature in registry.iter() {
        visit(feature, registry, &mut done, &mut stack, &mut order)?;
    }

    Ok(order)
}

fn visit<'a>(
    feature: &'a Feature,
    registry: &'a FeatureRegistry,
    done: &mut HashSet<&'a str>,
    stack: &mut Vec<&'a str>,
    order: &mut Vec<String>,
) -> Result<(), DomainError> {
    if done.contains(feature.id.as_str()) {
        return Ok(());
    }
    if let Some(pos) = stack.iter().position(|id| *id == feature.id) {
        // Back-edge: the cycle is the stack suffix plus the closing node.
        let mut path: Vec<String> = stack[pos..].iter().map(|s| s.to_string()).collect();
        path.push(feature.id.clone());
        return Err(DomainError::DependencyCycle { path });
    }

    stack.push(&feature.id);
    for dep_id in &feature.depends_on {
        let dep = registry
            .get(dep_id)
            .ok_or_else(|| DomainError::UnknownDependency {
                feature: feature.id.clone(),
                dependency: dep_id.clone(),
            })?;
        visit(dep, registry, done, stack, order)?;
    }
    stack.pop();

    done.insert(&feature.id);
    order.push(feature.id.clone());
    Ok(())
}

/// Reject predicates that read answer keys no option declares.
///
/// Covers feature activation predicates, stage predicates, and option
/// `show_if` conditions. A miss here is a contract violation, fatal at
/// resolution time — never a silent "absent" default.
pub fn validate_predicate_keys(registry: &FeatureRegistry) -> Result<(), DomainError> {
    let declared: HashSet<&str> = registry.declared_option_ids().into_iter().collect();

    let check = |predicate: &crate::domain::Predicate, location: String| {
        let mut keys = BTreeSet::new();
        predicate.referenced_keys(&mut keys);
        for key in keys {
            if !declared.contains(key.as_str()) {
                return Err(DomainError::UndeclaredPredicateKey { key, location });
            }
        }
        Ok(())
    };

    for feature in registry.iter() {
        if let Some(pred) = &feature.activated_by {
            check(pred, format!("feature '{}'", feature.id))?;
        }
        for option in &feature.options {
            for pred in &option.show_if {
                check(pred, format!("option '{}'", option.id))?;
            }
        }
        for stage in &feature.stages {
            if let Some(pred) = &stage.activated_by {
                check(
                    pred,
                    format!("feature '{}' stage '{}'", feature.id, stage.name),
                )?;
            }
        }
    }
    Ok(())
}

/// Reject stage codemod references that do not resolve.
///
/// `known` is the set of registered codemod names; the caller (the stage
/// executor) supplies it from its registry so the domain stays free of
/// application types.
pub fn validate_codemod_refs(
    registry: &FeatureRegistry,
    known: &HashSet<String>,
) -> Result<(), DomainError> {
    for feature in registry.iter() {
        for stage in &feature.stages {
            for target in &stage.mods {
                for name in &target.mods {
                    if !known.contains(name) {
                        return Err(DomainError::UnknownCodeMod {
                            feature: feature.id.clone(),
                            stage: stage.name.clone(),
                            name: name.clone(),
                        });
                    }
                }
            }
        }
    }
    Ok(())
}

/// Cheap index from feature id to declaration position; used by the
/// executor to report unattempted features deterministically.
pub fn declaration_index(registry: &FeatureRegistry) -> HashMap<String, usize> {
    registry
        .iter()
        .enumerate()
        .map(|(i, f)| (f.id.clone(), i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Predicate;
    use crate::domain::feature::{Feature, ModTarget, Stage};
    use crate::domain::options::ConfigOption;

    fn registry(features: Vec<Feature>) -> FeatureRegistry {
        FeatureRegistry::new(features).unwrap()
    }

    #[test]
    fn independent_features_keep_declaration_order() {
        let reg = registry(vec![Feature::new("z"), Feature::new("a"), Feature::new("m")]);
        assert_eq!(resolve_order(&reg).unwrap(), ["z", "a", "m"]);
    }

    #[test]
    fn dependencies_come_first() {
        let reg = registry(vec![
            Feature::new("a"),
            Feature::new("b").depends_on("a"),
            Feature::new("c").depends_on("a"),
        ]);
        let order = resolve_order(&reg).unwrap();
        assert_eq!(order, ["a", "b", "c"]);
    }

    #[test]
    fn transitive_dependency_ordering() {
        let reg = registry(vec![
            Feature::new("app").depends_on("lib"),
            Feature::new("lib").depends_on("base"),
            Feature::new("base"),
        ]);
        let order = resolve_order(&reg).unwrap();
        let pos = |id: &str| order.iter().position(|x| x == id).unwrap();
        assert!(pos("base") < pos("lib"));
        assert!(pos("lib") < pos("app"));
    }

    #[test]
    fn every_feature_appears_after_its_dependencies() {
        let reg = registry(vec![
            Feature::new("d").depends_on("b").depends_on("c"),
            Feature::new("c").depends_on("a"),
            Feature::new("b").depends_on("a"),
            Feature::new("a"),
        ]);
        let order = resolve_order(&reg).unwrap();
        assert_eq!(order.len(), 4);
        for feature in reg.iter() {
            let pos = |id: &str| order.iter().position(|x| x == id).unwrap();
            for dep in &feature.depends_on {
                assert!(pos(dep) < pos(&feature.id), "{dep} before {}", feature.id);
            }
        }
    }

    #[test]
    fn two_node_cycle_is_a_graph_error() {
        let reg = registry(vec![
            Feature::new("a").depends_on("b"),
            Feature::new("b").depends_on("a"),
        ]);
        match resolve_order(&reg) {
            Err(DomainError::DependencyCycle { path }) => {
                assert_eq!(path.first(), path.last());
                assert!(path.contains(&"a".to_string()));
                assert!(path.contains(&"b".to_string()));
            }
            other => panic!("expected cycle error, got {other:?}"),
        }
    }

    #[test]
    fn self_cycle_detected() {
        let reg = registry(vec![Feature::new("a").depends_on("a")]);
        assert!(matches!(
            resolve_order(&reg),
            Err(DomainError::DependencyCycle { .. })
        ));
    }

    #[test]
    fn dangling_dependency_is_a_graph_error() {
        let reg = registry(vec![Feature::new("a").depends_on("ghost")]);
        assert_eq!(
            resolve_order(&reg).unwrap_err(),
            DomainError::UnknownDependency {
                feature: "a".into(),
                dependency: "ghost".into(),
            }
        );
    }

    #[test]
    fn shared_dependency_visited_once() {
        let reg = registry(vec![
            Feature::new("base"),
            Feature::new("x").depends_on("base"),
            Feature::new("y").depends_on("base"),
        ]);
        let order = resolve_order(&reg).unwrap();
        assert_eq!(order, ["base", "x", "y"]);
    }

    #[test]
    fn predicate_over_declared_key_passes() {
        let reg = registry(vec![
            Feature::new("a")
                .with_option(ConfigOption::text("mode"))
                .activated_by(Predicate::equals("mode", "advanced")),
        ]);
        assert!(validate_predicate_keys(&reg).is_ok());
    }

    #[test]
    fn predicate_over_undeclared_key_fails() {
        let reg = registry(vec![
            Feature::new("a").activated_by(Predicate::equals("ghost", "x")),
        ]);
        assert!(matches!(
            validate_predicate_keys(&reg),
            Err(DomainError::UndeclaredPredicateKey { key, .. }) if key == "ghost"
        ));
    }

    #[test]
    fn stage_predicate_keys_are_checked_too() {
        let reg = registry(vec![Feature::new("a").with_stage(
            Stage::new("s").activated_by(Predicate::equals("nope", true)),
        )]);
        assert!(validate_predicate_keys(&reg).is_err());
    }

    #[test]
    fn unknown_codemod_reference_rejected() {
        let reg = registry(vec![Feature::new("a").with_stage(
            Stage::new("s").with_mods(ModTarget::new("file.json", ["missing-mod"])),
        )]);
        let known = HashSet::new();
        assert!(matches!(
            validate_codemod_refs(&reg, &known),
            Err(DomainError::UnknownCodeMod { name, .. }) if name == "missing-mod"
        ));
    }
}
