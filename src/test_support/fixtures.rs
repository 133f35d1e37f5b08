//! Test fixtures for common test scenarios.

use std::path::Path;

use crate::core::ProjectDescriptor;

/// A descriptor with the given requirement strings and typical metadata.
pub fn descriptor(name: &str, version: &str, requires: &[&str]) -> ProjectDescriptor {
    let mut desc = ProjectDescriptor::new(name, version).with_requirements(requires.iter().copied());
    desc.license = "MIT".to_string();
    desc.homepage = format!("https://example.org/{}", name);
    desc.summary = format!("The {} project", name);
    desc.description = format!("Long description of {}.", name);
    desc.python_versions = vec!["3.11".to_string(), "3.12".to_string()];
    desc
}

/// metadata.xml declaring `project` as the registry upstream.
pub fn metadata_xml(project: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE pkgmetadata SYSTEM "https://www.gentoo.org/dtd/metadata.dtd">
<pkgmetadata>
	<upstream>
		<remote-id type="pypi">{}</remote-id>
	</upstream>
</pkgmetadata>
"#,
        project
    )
}

/// Create `CATEGORY/NAME` in a package tree with metadata.xml and one
/// ebuild per version.
pub fn write_tree_package(root: &Path, category: &str, name: &str, project: &str, versions: &[&str]) {
    let dir = root.join(category).join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("metadata.xml"), metadata_xml(project)).unwrap();
    for version in versions {
        std::fs::write(dir.join(format!("{}-{}.ebuild", name, version)), "EAPI=8\n").unwrap();
    }
}
