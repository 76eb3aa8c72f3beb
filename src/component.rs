//! Component path to table-name prefix mapping.
//!
//! Implied-link inference tries `<prefix><name>` table names, where the prefix
//! comes from the component the tables belong to (`mod/forum` -> `forum_`).
//! Only activity-module paths have a known mapping; every other path falls
//! back to the empty prefix.

/// Maps a logical component identifier to the prefix its tables share
pub trait PrefixResolver {
    /// Prefix including its trailing `_`, or `None` when the component
    /// shape is not recognised
    fn resolve(&self, component: &str) -> Option<String>;
}

/// Resolver for plugin paths of the form `mod/<name>` (or the `mod_<name>`
/// spelling of the same component)
#[derive(Debug, Clone, Copy, Default)]
pub struct PluginPathResolver;

impl PrefixResolver for PluginPathResolver {
    fn resolve(&self, component: &str) -> Option<String> {
        let component = component.trim().trim_matches('/');
        let name = component
            .strip_prefix("mod/")
            .or_else(|| component.strip_prefix("mod_"))?;

        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return None;
        }
        Some(format!("{}_", name))
    }
}

/// Resolver that always yields the same prefix
#[derive(Debug, Clone, Default)]
pub struct FixedPrefix(pub String);

impl PrefixResolver for FixedPrefix {
    fn resolve(&self, _component: &str) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Resolve the prefix for an optional component, falling back to `""`
pub fn component_prefix(resolver: &dyn PrefixResolver, component: Option<&str>) -> String {
    resolver.resolve(component.unwrap_or("")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_path() {
        assert_eq!(PluginPathResolver.resolve("mod/forum"), Some("forum_".into()));
        assert_eq!(PluginPathResolver.resolve("mod/forum/"), Some("forum_".into()));
        assert_eq!(PluginPathResolver.resolve("mod_quiz"), Some("quiz_".into()));
    }

    #[test]
    fn test_unmapped_paths_fall_back_to_empty() {
        let resolver = PluginPathResolver;
        assert_eq!(component_prefix(&resolver, Some("admin/tool/erdiagram")), "");
        assert_eq!(component_prefix(&resolver, Some("mod/")), "");
        assert_eq!(component_prefix(&resolver, None), "");
    }

    #[test]
    fn test_fixed_prefix() {
        let resolver = FixedPrefix("tool_erd_".to_string());
        assert_eq!(component_prefix(&resolver, Some("anything")), "tool_erd_");
        assert_eq!(component_prefix(&resolver, None), "tool_erd_");
    }
}
