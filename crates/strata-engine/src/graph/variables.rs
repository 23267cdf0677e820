//! `{{ name }}` placeholders in template structure items.

use once_cell::sync::Lazy;
use regex::Regex;

use super::MergedDefinition;
use crate::violation::{field_path, Violation, ViolationKind};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("valid placeholder regex")
});

/// Variable names referenced by `text`, in order of appearance.
pub fn placeholders(text: &str) -> Vec<&str> {
    PLACEHOLDER
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect()
}

/// Placeholders in the template's own structure items that name no merged
/// variable. Inherited items were checked when their own template merged.
pub(crate) fn undefined_variables(template: &MergedDefinition) -> Vec<Violation> {
    let mut violations = Vec::new();
    for item in template
        .structure
        .iter()
        .filter(|item| item.source == template.source_path)
    {
        for field in ["path", "content"] {
            let Some(text) = item.value.get(field).and_then(|v| v.as_str()) else {
                continue;
            };
            for name in placeholders(text) {
                if template.entry(name).is_none() {
                    violations.push(Violation::new(
                        ViolationKind::UndefinedVariable,
                        &item.source,
                        field_path(&item.field_path, field),
                        format!("`{{{{ {name} }}}}` does not name a variable of {}", template.key),
                    ));
                }
            }
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentKind;
    use crate::graph::tests::definition;
    use crate::graph::{Category, DefinitionSet, GraphResolver};

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders("src/{{name}}/{{ module_name }}.rs"), vec!["name", "module_name"]);
        assert!(placeholders("{{ }} {{ not-valid }} plain").is_empty());
    }

    #[test]
    fn test_undefined_variable_in_own_structure() {
        let mut set = DefinitionSet::new();
        set.insert(definition(
            DocumentKind::Template,
            "svc.yaml",
            "name: svc\nvariables:\n  - name: service\nstructure:\n  - path: \"src/{{ service }}.rs\"\n    content: \"port = {{ port }}\"\n",
        ))
        .unwrap();
        let r = GraphResolver::new().resolve(&set);
        assert_eq!(r.violations.len(), 1);
        let v = &r.violations[0];
        assert_eq!(v.kind, ViolationKind::UndefinedVariable);
        assert_eq!(v.field_path, "structure[0].content");
        assert!(v.message.contains("{{ port }}"));
        assert!(r.get(Category::Template, "svc").is_some());
    }

    #[test]
    fn test_inherited_variables_are_visible_to_children() {
        let mut set = DefinitionSet::new();
        set.insert(definition(
            DocumentKind::Template,
            "base.yaml",
            "name: base\nvariables:\n  - name: service\n",
        ))
        .unwrap();
        set.insert(definition(
            DocumentKind::Template,
            "svc.yaml",
            "name: svc\nextends: base\nstructure:\n  - path: \"{{ service }}/main.rs\"\n",
        ))
        .unwrap();
        assert!(GraphResolver::new().resolve(&set).violations.is_empty());
    }
}
