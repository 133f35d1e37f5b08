//! Grouping a project's requirement strings by feature flag.

use std::collections::HashSet;

use crate::core::marker::Marker;
use crate::core::name::normalize;
use crate::core::requirement::{split_marker, Requirement, RequirementError};

/// Rules for requirements that never reach generated output.
#[derive(Debug, Clone)]
pub struct Exclusions {
    /// Feature flags that denote packaging-only groupings (normalized)
    blocked_extras: HashSet<String>,

    /// Projects that are always dropped (normalized)
    removed_projects: HashSet<String>,

    /// Name prefixes of obsolete compatibility shims (normalized)
    obsolete_prefixes: Vec<String>,
}

impl Default for Exclusions {
    fn default() -> Self {
        Exclusions::new(["dev"], ["backports.lzma"], ["backports"])
    }
}

impl Exclusions {
    /// Build an exclusion set. All names are normalized on the way in.
    pub fn new<A, B, C>(blocked_extras: A, removed_projects: B, obsolete_prefixes: C) -> Self
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        B: IntoIterator,
        B::Item: AsRef<str>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        Exclusions {
            blocked_extras: blocked_extras
                .into_iter()
                .map(|s| normalize(s.as_ref()))
                .collect(),
            removed_projects: removed_projects
                .into_iter()
                .map(|s| normalize(s.as_ref()))
                .collect(),
            obsolete_prefixes: obsolete_prefixes
                .into_iter()
                .map(|s| normalize(s.as_ref()))
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// No exclusions at all.
    pub fn none() -> Self {
        Exclusions::new(
            std::iter::empty::<&str>(),
            std::iter::empty::<&str>(),
            std::iter::empty::<&str>(),
        )
    }

    /// Whether a feature flag is blocked.
    pub fn blocks_extra(&self, flag: &str) -> bool {
        self.blocked_extras.contains(&normalize(flag))
    }

    /// Whether a project is dropped regardless of its marker.
    pub fn drops_project(&self, project: &str) -> bool {
        let key = normalize(project);
        self.removed_projects.contains(&key)
            || self
                .obsolete_prefixes
                .iter()
                .any(|prefix| key.starts_with(prefix.as_str()))
    }
}

/// Requirements of one project, bucketed by feature flag.
///
/// The unconditional bucket always exists. Feature buckets keep the order in
/// which their flags were first seen, and every bucket keeps insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementGroup {
    default: Vec<Requirement>,
    features: Vec<(String, Vec<Requirement>)>,
}

impl RequirementGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and group raw requirement strings.
    ///
    /// `None` means the project declares no dependencies. Lines that cannot be
    /// used are logged and returned alongside the group; they never abort
    /// the batch.
    pub fn build(
        requires_dist: Option<&[String]>,
        exclusions: &Exclusions,
    ) -> (Self, Vec<RequirementError>) {
        let mut group = RequirementGroup::new();
        let mut skipped = Vec::new();

        for raw in requires_dist.unwrap_or_default() {
            let project = leading_name(raw);
            if exclusions.drops_project(project) {
                tracing::debug!("dropping obsolete requirement `{}`", raw);
                continue;
            }

            let (head, marker) = split_marker(raw);
            let flag = match Marker::classify(marker) {
                Marker::Unsupported(marker) => {
                    tracing::warn!("unsupported marker in `{}`, skipping", raw);
                    skipped.push(RequirementError::UnsupportedMarker {
                        requirement: raw.clone(),
                        marker,
                    });
                    continue;
                }
                Marker::Extra(flag) if exclusions.blocks_extra(&flag) => continue,
                Marker::Extra(flag) => Some(flag),
                Marker::PythonVersion { .. } | Marker::Unconditional => None,
            };

            let requirement = match Requirement::parse(head) {
                Ok(req) => req,
                Err(_) => {
                    tracing::warn!("cannot parse requirement `{}`, skipping", raw);
                    skipped.push(RequirementError::Malformed {
                        requirement: raw.clone(),
                    });
                    continue;
                }
            };

            tracing::debug!("requirement {} -> {:?}", requirement, flag);
            match flag {
                Some(flag) => group.push_feature(flag, requirement),
                None => group.push_default(requirement),
            }
        }

        (group, skipped)
    }

    /// Append to the unconditional bucket.
    pub fn push_default(&mut self, requirement: Requirement) {
        self.default.push(requirement);
    }

    /// Append to a feature bucket, creating it on first use.
    pub fn push_feature(&mut self, flag: impl Into<String>, requirement: Requirement) {
        let flag = flag.into();
        match self.features.iter_mut().find(|(name, _)| *name == flag) {
            Some((_, bucket)) => bucket.push(requirement),
            None => self.features.push((flag, vec![requirement])),
        }
    }

    /// The always-required requirements.
    pub fn default_requirements(&self) -> &[Requirement] {
        &self.default
    }

    /// Requirements gated by `flag`, if the flag exists.
    pub fn feature(&self, flag: &str) -> Option<&[Requirement]> {
        self.features
            .iter()
            .find(|(name, _)| name == flag)
            .map(|(_, bucket)| bucket.as_slice())
    }

    /// Feature buckets in first-seen order.
    pub fn features(&self) -> impl Iterator<Item = (&str, &[Requirement])> {
        self.features
            .iter()
            .map(|(name, bucket)| (name.as_str(), bucket.as_slice()))
    }

    /// Feature flag names in first-seen order.
    pub fn flags(&self) -> Vec<&str> {
        self.features.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Every requirement in every bucket.
    pub fn iter(&self) -> impl Iterator<Item = &Requirement> {
        self.default
            .iter()
            .chain(self.features.iter().flat_map(|(_, bucket)| bucket.iter()))
    }

    /// Total number of requirements.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.default.is_empty() && self.features.is_empty()
    }
}

/// The identifier at the start of a requirement string.
fn leading_name(raw: &str) -> &str {
    let raw = raw.trim_start();
    let end = raw
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')))
        .unwrap_or(raw.len());
    &raw[..end]
}
