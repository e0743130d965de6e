//! Project templates
//!
//! Templates use `${name}` (or `$name`) placeholders; `$$` produces a literal
//! dollar sign. Every placeholder must have a value.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

/// Build configuration written by `mcpack init`
pub const CONFIG_TEMPLATE: &str = include_str!("../templates/mcpack.yaml");

/// Forge mod metadata
pub const MCMOD_INFO_TEMPLATE: &str = include_str!("../templates/mcmod.info");

/// Java mod class
pub const JAVA_MOD_TEMPLATE: &str = include_str!("../templates/mod.java");

/// Python mod class
pub const PYTHON_MOD_TEMPLATE: &str = include_str!("../templates/mod.py");

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("No value for template placeholder ${{{0}}}")]
    MissingValue(String),
}

/// Replace placeholders in `template` with `values`
pub fn substitute(template: &str, values: &HashMap<&str, String>) -> Result<String, TemplateError> {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let re = PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\$(?:(\$)|\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))")
            .expect("placeholder pattern is valid")
    });

    let mut output = String::with_capacity(template.len());
    let mut last = 0;
    for caps in re.captures_iter(template) {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        output.push_str(&template[last..whole.start]);
        last = whole.end;

        if caps.get(1).is_some() {
            output.push('$');
            continue;
        }

        let name = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
        let value = values
            .get(name)
            .ok_or_else(|| TemplateError::MissingValue(name.to_string()))?;
        output.push_str(value);
    }
    output.push_str(&template[last..]);

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&'static str, &str)]) -> HashMap<&'static str, String> {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn test_substitute_forms() {
        let out = substitute(
            "class ${mod_class} costs $$5 in $mod_id",
            &values(&[("mod_class", "ExampleMod"), ("mod_id", "example")]),
        )
        .unwrap();
        assert_eq!(out, "class ExampleMod costs $5 in example");
    }

    #[test]
    fn test_missing_value() {
        let err = substitute("${nope}", &HashMap::new()).unwrap_err();
        assert_eq!(err.to_string(), "No value for template placeholder ${nope}");
    }

    #[test]
    fn test_lone_dollar_is_kept() {
        let out = substitute("cost: $ 5", &HashMap::new()).unwrap();
        assert_eq!(out, "cost: $ 5");
    }

    #[test]
    fn test_embedded_templates_have_placeholders() {
        assert!(CONFIG_TEMPLATE.contains("${build_dir}"));
        assert!(MCMOD_INFO_TEMPLATE.contains("${mc_version}"));
        assert!(JAVA_MOD_TEMPLATE.contains("${mod_package}"));
        assert!(PYTHON_MOD_TEMPLATE.contains("${mod_class}"));
    }

    #[test]
    fn test_config_template_renders() {
        let out = substitute(
            CONFIG_TEMPLATE,
            &values(&[
                ("mod_id", "\"example\""),
                ("build_dir", "\"build\""),
                ("forge_dir", "\"forge\""),
                ("library_dir", "\"lib\""),
                ("source_dir", "\"src\""),
            ]),
        )
        .unwrap();
        assert!(out.contains("# $VARIABLES are expanded"));
        assert!(out.contains("name: \"example\""));
    }
}
