//! Reference strings between modules.
//!
//! Given an importer and an imported module, computes the specifier the
//! importer must pass to `require` once both are written to their resolved
//! locations:
//!
//! ```text
//! dist/index       -> dist/b                  => ./b
//! dist/foo/bar     -> dist/lib/x              => ../../lib/x
//! dist/index       -> dist/node_modules/uuid  => uuid
//! node_modules/uuid/v1 -> node_modules/uuid/lib/rnd => ./lib/rnd
//! ```

use tracing::trace;

use crate::error::Result;
use crate::location::{LocationResolver, PackageRoot};
use crate::module::ModuleId;

/// Outcome of [`relative_reference`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelativeReference {
    /// Specifier to write into the reference site.
    Specifier(String),
    /// The target id is not in the module set; leave the site as it was.
    Unresolved,
}

/// Specifier `from` must use to reach `to`.
///
/// The importer is placed with [`PackageRoot::AsIndex`] so its directory is
/// inside its own package; the target with [`PackageRoot::Bare`] so package
/// roots need no trailing `/index`.
pub fn relative_reference(
    resolver: &mut LocationResolver<'_>,
    from: &ModuleId,
    to: &ModuleId,
) -> Result<RelativeReference> {
    if !resolver.graph().contains(to) {
        return Ok(RelativeReference::Unresolved);
    }

    let importer = resolver.module_location(from, PackageRoot::AsIndex)?;
    let target = resolver.module_location(to, PackageRoot::Bare)?;

    let specifier = match target.package() {
        Some(package) if importer.package() != Some(package) => {
            let subpath = target.package_subpath();
            if subpath.is_empty() {
                package.to_string()
            } else {
                format!("{package}/{}", subpath.join("/"))
            }
        }
        _ => {
            let relative = relative_path(importer.dir_segments(), target.segments());
            ensure_relative_marker(relative)
        }
    };

    trace!(from = %from, to = %to, %specifier, "computed reference");
    Ok(RelativeReference::Specifier(specifier))
}

/// Lexical relative path from directory `from` to `to`, both root-relative.
pub fn relative_path<S: AsRef<str>>(from: &[S], to: &[S]) -> String {
    let common = from
        .iter()
        .zip(to)
        .take_while(|(a, b)| a.as_ref() == b.as_ref())
        .count();

    let ups = std::iter::repeat_n("..", from.len() - common);
    let downs = to[common..].iter().map(|segment| segment.as_ref());
    ups.chain(downs).collect::<Vec<_>>().join("/")
}

/// A same-directory reference must not read as a bare package name.
fn ensure_relative_marker(path: String) -> String {
    if path.is_empty() {
        ".".to_string()
    } else if path == "." || path == ".." || path.starts_with("./") || path.starts_with("../") {
        path
    } else {
        format!("./{path}")
    }
}
