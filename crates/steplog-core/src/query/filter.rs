//! Entity path filters
//!
//! A filter is a list of include/exclude rules:
//!
//! ```text
//! + /robot/**          # everything under /robot...
//! - /robot/debug/**    # ...except the debug subtree...
//! + /robot/debug/fps   # ...but keep this one
//! ```
//!
//! The most specific matching rule wins. An exact rule is more specific than
//! a subtree rule on the same path. Between equally specific rules the last
//! one wins. A path no rule matches is excluded.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::recording::EntityPath;

/// Suffix that turns a rule into a subtree rule
const SUBTREE_SUFFIX: &str = "/**";

/// Whether a rule adds or removes paths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleEffect {
    /// Matching paths are selected
    Include,
    /// Matching paths are dropped
    Exclude,
}

/// A single filter rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRule {
    /// Path the rule is anchored at
    pub path: EntityPath,
    /// Whether the rule also covers every descendant of `path`
    pub include_subtree: bool,
}

impl PathRule {
    fn parse(rule: &str) -> Result<Self> {
        let (path, include_subtree) = match rule.strip_suffix(SUBTREE_SUFFIX) {
            Some("") => ("/", true),
            Some(prefix) => (prefix, true),
            None => (rule, false),
        };
        if path.contains('*') {
            return Err(Error::InvalidFilter(format!(
                "'{rule}': '*' is only supported as a trailing '/**'"
            )));
        }
        let path = EntityPath::parse(path).map_err(|e| Error::InvalidFilter(e.to_string()))?;
        Ok(Self {
            path,
            include_subtree,
        })
    }

    /// Whether the rule applies to `path`
    pub fn matches(&self, path: &EntityPath) -> bool {
        if self.include_subtree {
            path.is_descendant_of_or_equal(&self.path)
        } else {
            *path == self.path
        }
    }

    fn specificity(&self) -> (usize, bool) {
        (self.path.depth(), !self.include_subtree)
    }
}

impl fmt::Display for PathRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.include_subtree, self.path.depth()) {
            (true, 0) => f.write_str(SUBTREE_SUFFIX),
            (true, _) => write!(f, "{}{SUBTREE_SUFFIX}", self.path),
            (false, _) => write!(f, "{}", self.path),
        }
    }
}

/// A set of include/exclude rules over entity paths
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntityPathFilter {
    rules: Vec<(PathRule, RuleEffect)>,
}

impl EntityPathFilter {
    /// Filter that selects every path
    pub fn all() -> Self {
        Self {
            rules: vec![(
                PathRule {
                    path: EntityPath::root(),
                    include_subtree: true,
                },
                RuleEffect::Include,
            )],
        }
    }

    /// Parse whitespace-separated rules; `#` starts a comment
    pub fn parse(filter: &str) -> Result<Self> {
        let mut rules = Vec::new();
        let mut pending: Option<RuleEffect> = None;

        let tokens = filter
            .lines()
            .map(|line| line.split('#').next().unwrap_or_default())
            .flat_map(str::split_whitespace);

        for token in tokens {
            let (effect, rule) = match token.as_bytes()[0] {
                b'+' => (RuleEffect::Include, &token[1..]),
                b'-' => (RuleEffect::Exclude, &token[1..]),
                _ => (pending.take().unwrap_or(RuleEffect::Include), token),
            };
            if rule.is_empty() {
                if pending.replace(effect).is_some() {
                    return Err(Error::InvalidFilter(format!("'{filter}': dangling '{token}'")));
                }
                continue;
            }
            if token.starts_with(['+', '-']) && pending.take().is_some() {
                return Err(Error::InvalidFilter(format!("'{filter}': repeated sign")));
            }
            rules.push((PathRule::parse(rule)?, effect));
        }

        if pending.is_some() {
            return Err(Error::InvalidFilter(format!(
                "'{filter}': sign without a path"
            )));
        }
        Ok(Self { rules })
    }

    /// Rules in the order they were given
    pub fn rules(&self) -> &[(PathRule, RuleEffect)] {
        &self.rules
    }

    /// Check if there are no rules (nothing is selected)
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether `path` is selected
    pub fn matches(&self, path: &EntityPath) -> bool {
        self.rules
            .iter()
            .enumerate()
            .filter(|(_, (rule, _))| rule.matches(path))
            .max_by_key(|(i, (rule, _))| (rule.specificity(), *i))
            .is_some_and(|(_, (_, effect))| *effect == RuleEffect::Include)
    }
}

impl FromStr for EntityPathFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for EntityPathFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (rule, effect)) in self.rules.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            let sign = match effect {
                RuleEffect::Include => '+',
                RuleEffect::Exclude => '-',
            };
            write!(f, "{sign} {rule}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(p: &str) -> EntityPath {
        EntityPath::parse(p).unwrap()
    }

    #[test]
    fn test_all() {
        let filter: EntityPathFilter = "/**".parse().unwrap();
        assert_eq!(filter, EntityPathFilter::all());
        assert!(filter.matches(&path("/control")));
        assert!(filter.matches(&path("/a/b/c")));
        assert!(filter.matches(&EntityPath::root()));
    }

    #[test]
    fn test_exact_rule() {
        let filter = EntityPathFilter::parse("/control").unwrap();
        assert!(filter.matches(&path("/control")));
        assert!(!filter.matches(&path("/control/raw")));
        assert!(!filter.matches(&path("/velocity")));
    }

    #[test]
    fn test_most_specific_rule_wins() {
        let filter = EntityPathFilter::parse(
            "+ /world/**
             - /world
             - /world/car/**
             + /world/car/driver",
        )
        .unwrap();

        assert!(filter.matches(&path("/world/car/driver")));
        assert!(!filter.matches(&path("/world/car/hood")));
        assert!(!filter.matches(&path("/world")));
        assert!(filter.matches(&path("/world/house")));
        assert!(!filter.matches(&path("/elsewhere")));
    }

    #[test]
    fn test_last_rule_wins_on_tie() {
        let filter = EntityPathFilter::parse("+/a -/a").unwrap();
        assert!(!filter.matches(&path("/a")));
        let filter = EntityPathFilter::parse("-/a +/a").unwrap();
        assert!(filter.matches(&path("/a")));
    }

    #[test]
    fn test_comments_and_display() {
        let filter = EntityPathFilter::parse("+ /robot/** # all\n-/robot/debug").unwrap();
        assert_eq!(filter.to_string(), "+ /robot/**\n- /robot/debug");
        assert_eq!(EntityPathFilter::all().to_string(), "+ /**");
    }

    #[test]
    fn test_invalid_filters() {
        assert!(EntityPathFilter::parse("/robot/*").is_err());
        assert!(EntityPathFilter::parse("robot").is_err());
        assert!(EntityPathFilter::parse("+").is_err());
        assert!(EntityPathFilter::parse("+ - /a").is_err());
    }

    #[test]
    fn test_empty_filter_selects_nothing() {
        let filter = EntityPathFilter::parse("").unwrap();
        assert!(filter.is_empty());
        assert!(!filter.matches(&path("/control")));
    }
}
