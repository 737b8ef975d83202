//! Alias resolution: map what a user typed to the entities they meant
//!
//! Matching runs in two phases. An exact alias hit (a single meaningful word
//! from the entity's label or id) always wins; substring matching against
//! the full id and label is tried only when no entity declares the term as
//! an alias. This keeps `kitchen` from also picking up `kitchenette_fan`
//! when a `Kitchen Lamp` exists.

use std::collections::HashSet;

/// Words too generic to identify a single entity
pub const DEFAULT_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "at", "by", "for", "in", "of", "on", "the", "to", "with", "light", "lights",
    "lamp", "lamps", "switch", "switches", "sensor", "sensors", "plug", "socket", "device",
    "entity",
];

/// Anything the resolver can match against
pub trait Aliased {
    /// Stable identifier, e.g. `light.kitchen_lamp`
    fn alias_id(&self) -> &str;

    /// Human-readable label, if any
    fn alias_label(&self) -> Option<&str>;
}

/// Term-to-entity matcher with a configurable stop-word set
#[derive(Debug, Clone)]
pub struct AliasResolver {
    stop_words: HashSet<String>,
}

impl Default for AliasResolver {
    fn default() -> Self {
        Self::with_stop_words(DEFAULT_STOP_WORDS.iter().copied())
    }
}

impl AliasResolver {
    /// Resolver with the built-in stop words
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver with a custom stop-word set
    #[must_use]
    pub fn with_stop_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            stop_words: words
                .into_iter()
                .map(|w| w.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Meaningful lowercase words of `label`, in label order, without duplicates
    ///
    /// Punctuation is trimmed from both ends of each word. Numbers, words
    /// with non-ASCII-letters and stop words are dropped.
    #[must_use]
    pub fn extract_aliases(&self, label: &str) -> Vec<String> {
        let mut aliases: Vec<String> = Vec::new();

        for raw in label.split_whitespace() {
            let token = raw
                .trim_matches(|c: char| c.is_ascii_punctuation())
                .to_lowercase();

            if token.is_empty()
                || token.chars().all(|c| c.is_ascii_digit())
                || !token.chars().all(|c| c.is_ascii_alphabetic())
                || self.stop_words.contains(&token)
            {
                continue;
            }

            if !aliases.contains(&token) {
                aliases.push(token);
            }
        }

        aliases
    }

    /// Entities matching `term`, in input order
    ///
    /// Returns the exact-alias matches when there are any, otherwise the
    /// substring matches. An empty result means nothing matched; more than
    /// one means the term is ambiguous.
    #[must_use]
    pub fn find_by_alias<'a, E: Aliased>(&self, entities: &'a [E], term: &str) -> Vec<&'a E> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return Vec::new();
        }

        let exact: Vec<&E> = entities
            .iter()
            .filter(|e| self.has_alias(*e, &term))
            .collect();

        if !exact.is_empty() {
            return exact;
        }

        entities
            .iter()
            .filter(|e| {
                e.alias_id().to_lowercase().contains(&term)
                    || e.alias_label()
                        .is_some_and(|l| l.to_lowercase().contains(&term))
            })
            .collect()
    }

    /// Entities `term` names outright, falling back to [`Self::find_by_alias`]
    ///
    /// A term equal to an entity's full id or its whole label (case and
    /// spacing ignored) selects that entity alone, so a name that is a
    /// prefix of another entity's name stays reachable.
    #[must_use]
    pub fn resolve<'a, E: Aliased>(&self, entities: &'a [E], term: &str) -> Vec<&'a E> {
        let term = collapse(term);
        if term.is_empty() {
            return Vec::new();
        }

        let named: Vec<&E> = entities
            .iter()
            .filter(|e| {
                e.alias_id().to_lowercase() == term
                    || e.alias_label().is_some_and(|l| collapse(l) == term)
            })
            .collect();

        if named.is_empty() {
            self.find_by_alias(entities, &term)
        } else {
            named
        }
    }

    fn has_alias<E: Aliased>(&self, entity: &E, term: &str) -> bool {
        id_tokens(entity.alias_id()).any(|t| t == term)
            || entity
                .alias_label()
                .is_some_and(|l| self.extract_aliases(l).iter().any(|a| a == term))
    }
}

/// Lowercase `text` with runs of whitespace collapsed to one space
fn collapse(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Underscore-separated words of the id's object part
fn id_tokens(id: &str) -> impl Iterator<Item = String> + '_ {
    let object = id.rsplit('.').next().unwrap_or(id);
    object
        .split('_')
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Item(&'static str, Option<&'static str>);

    impl Aliased for Item {
        fn alias_id(&self) -> &str {
            self.0
        }

        fn alias_label(&self) -> Option<&str> {
            self.1
        }
    }

    fn ids<'a>(found: &[&'a Item]) -> Vec<&'a str> {
        found.iter().map(|i| i.0).collect()
    }

    #[test]
    fn test_extract_aliases_filters_noise() {
        let resolver = AliasResolver::new();
        assert_eq!(
            resolver.extract_aliases("Kitchen Ceiling Lamp"),
            vec!["kitchen", "ceiling"]
        );
        assert_eq!(
            resolver.extract_aliases("The Living-Room (Lamp) 2"),
            Vec::<String>::new()
        );
        assert_eq!(
            resolver.extract_aliases("\"Office\", desk; office!"),
            vec!["office", "desk"]
        );
        assert_eq!(resolver.extract_aliases("Café Bar"), vec!["bar"]);
        assert!(resolver.extract_aliases("").is_empty());
    }

    #[test]
    fn test_custom_stop_words() {
        let resolver = AliasResolver::with_stop_words(["Kitchen"]);
        assert_eq!(
            resolver.extract_aliases("Kitchen Ceiling Lamp"),
            vec!["ceiling", "lamp"]
        );
    }

    #[test]
    fn test_exact_alias_beats_substring() {
        let entities = [
            Item("fan.kitchenette_fan", Some("Kitchenette Fan")),
            Item("light.kitchen_lamp", Some("Kitchen Lamp")),
            Item("light.office_lamp", Some("Office Lamp")),
        ];
        let found = AliasResolver::new().find_by_alias(&entities, "kitchen");
        assert_eq!(ids(&found), vec!["light.kitchen_lamp"]);
    }

    #[test]
    fn test_substring_fallback_when_no_alias_matches() {
        let entities = [
            Item("light.kitchen_lamp", Some("Kitchen Lamp")),
            Item("light.office_lamp", Some("Office Lamp")),
        ];
        let resolver = AliasResolver::new();

        assert_eq!(
            ids(&resolver.find_by_alias(&entities, "  Kitchen Lamp ")),
            vec!["light.kitchen_lamp"]
        );
        assert_eq!(
            ids(&resolver.find_by_alias(&entities, "offi")),
            vec!["light.office_lamp"]
        );
    }

    #[test]
    fn test_ambiguous_and_missing_terms() {
        let entities = [
            Item("light.kitchen_lamp", Some("Kitchen Lamp")),
            Item("switch.kitchen_kettle", None),
            Item("light.office_lamp", Some("Office Lamp")),
        ];
        let resolver = AliasResolver::new();

        assert_eq!(
            ids(&resolver.find_by_alias(&entities, "KITCHEN")),
            vec!["light.kitchen_lamp", "switch.kitchen_kettle"]
        );
        assert!(resolver.find_by_alias(&entities, "garage").is_empty());
        assert!(resolver.find_by_alias(&entities, "   ").is_empty());
    }

    #[test]
    fn test_substring_fallback_can_return_several() {
        let entities = [
            Item("switch.foo", Some("Foo")),
            Item("switch.foobar", Some("Foobar")),
            Item("switch.baz", Some("Baz")),
        ];
        let found = AliasResolver::new().find_by_alias(&entities, "oob");
        assert_eq!(ids(&found), vec!["switch.foobar"]);

        let found = AliasResolver::new().find_by_alias(&entities, "fo");
        assert_eq!(ids(&found), vec!["switch.foo", "switch.foobar"]);
    }

    #[test]
    fn test_resolve_prefers_full_name() {
        let entities = [
            Item("light.kitchen", Some("Kitchen")),
            Item("light.kitchen_ceiling", Some("Kitchen Ceiling")),
        ];
        let resolver = AliasResolver::new();

        assert_eq!(ids(&resolver.resolve(&entities, "kitchen")), vec!["light.kitchen"]);
        assert_eq!(
            ids(&resolver.resolve(&entities, "Light.Kitchen")),
            vec!["light.kitchen"]
        );
        assert_eq!(
            ids(&resolver.resolve(&entities, " kitchen   CEILING ")),
            vec!["light.kitchen_ceiling"]
        );
        assert_eq!(
            ids(&resolver.resolve(&entities, "ceiling")),
            vec!["light.kitchen_ceiling"]
        );
        assert!(resolver.resolve(&entities, "  ").is_empty());
    }

    #[test]
    fn test_id_tokens_use_object_part() {
        let tokens: Vec<String> = id_tokens("sensor.outdoor_temp_2").collect();
        assert_eq!(tokens, vec!["outdoor", "temp", "2"]);
        let tokens: Vec<String> = id_tokens("no_domain").collect();
        assert_eq!(tokens, vec!["no", "domain"]);
    }
}
