//! Rendering requirement groups as dependency atoms.

use crate::core::requirement::Requirement;
use crate::resolver::identity::{IdentityResolver, PackageIdentity};
use crate::resolver::requirements::RequirementGroup;

/// USE dependency appended to every atom.
pub const PYTHON_USEDEP: &str = "[${PYTHON_USEDEP}]";

/// Dependency atoms for one requirement, one per version clause.
///
/// `>=dev-python/numpy-1.20[${PYTHON_USEDEP}]`, or without a constraint
/// `dev-python/numpy[${PYTHON_USEDEP}]`.
pub fn render_atoms(identity: &PackageIdentity, requirement: &Requirement) -> Vec<String> {
    if requirement.is_unconstrained() {
        return vec![format!("{}{}", identity.atom(), PYTHON_USEDEP)];
    }
    requirement
        .clauses()
        .iter()
        .map(|clause| {
            format!(
                "{}{}-{}{}",
                clause.op.atom_prefix(),
                identity.atom(),
                atom_version(&clause.version),
                PYTHON_USEDEP
            )
        })
        .collect()
}

/// A registry prefix match `4.2.*` is written `4.2*` in an atom.
fn atom_version(version: &str) -> String {
    match version.strip_suffix(".*") {
        Some(prefix) => format!("{}*", prefix),
        None => version.to_string(),
    }
}

/// IUSE and RDEPEND content for one project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedDependencies {
    /// Feature flags, in bucket order
    pub iuse: Vec<String>,

    /// Unconditional atoms followed by `flag? ( ... )` groups
    pub entries: Vec<String>,
}

impl RenderedDependencies {
    /// The RDEPEND value body, one entry per line.
    pub fn rdepend_block(&self) -> String {
        self.entries.join("\n\t")
    }

    /// The IUSE value.
    pub fn iuse_string(&self) -> String {
        self.iuse.join(" ")
    }
}

/// Resolve every requirement in `group` and render the dependency entries.
///
/// Unresolved projects are queued on `resolver` as a side effect.
pub fn render_dependencies(
    group: &RequirementGroup,
    resolver: &mut IdentityResolver,
    default_category: &str,
) -> RenderedDependencies {
    let mut rendered = RenderedDependencies::default();

    for requirement in group.default_requirements() {
        let identity = resolver.resolve(requirement.name(), default_category);
        rendered.entries.extend(render_atoms(&identity, requirement));
    }

    for (flag, bucket) in group.features() {
        let mut atoms = Vec::new();
        for requirement in bucket {
            let identity = resolver.resolve(requirement.name(), default_category);
            atoms.extend(render_atoms(&identity, requirement));
        }
        if atoms.is_empty() {
            continue;
        }
        rendered.iuse.push(flag.to_string());
        rendered
            .entries
            .push(format!("{}? ( {} )", flag, atoms.join(" ")));
    }

    rendered
}
