//! Function and module attributes: linkage, directive tags, IR stage.

use std::fmt;

use bitflags::bitflags;

/// Linkage of a function definition.
///
/// Ordered from most to least visible, followed by the external
/// (declaration-only) forms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Linkage {
    /// Visible to all clients.
    #[default]
    Public,
    /// Public, but emitted into every client that uses it.
    PublicNonAbi,
    /// Visible within the package.
    Package,
    /// Visible within the module, across compilation units.
    Hidden,
    /// Deduplicated across units; any unit may emit its own copy.
    Shared,
    /// Visible within this compilation unit only.
    Private,
    /// Public definition that lives in another module.
    PublicExternal,
    /// Hidden definition that lives in another unit.
    HiddenExternal,
}

impl Linkage {
    /// Whether the body is a declaration of something defined elsewhere.
    pub fn is_external(self) -> bool {
        matches!(self, Linkage::PublicExternal | Linkage::HiddenExternal)
    }
}

/// Could code outside this compilation unit reference a function with
/// `linkage`?
///
/// In whole-module mode every unit of the module is visible, so only
/// package-or-wider linkage escapes. Otherwise `Hidden` functions may be
/// referenced from sibling units too.
pub fn is_possibly_used_externally(linkage: Linkage, whole_module: bool) -> bool {
    match linkage {
        Linkage::Public | Linkage::PublicNonAbi | Linkage::Package => true,
        Linkage::Hidden => !whole_module,
        Linkage::Shared
        | Linkage::Private
        | Linkage::PublicExternal
        | Linkage::HiddenExternal => false,
    }
}

bitflags! {
    /// Directive tags attached to a function by earlier passes.
    ///
    /// The set is closed: front-end tag strings are parsed with
    /// [`Directives::parse`], which rejects anything it does not know.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
    pub struct Directives: u8 {
        /// Drop the body if nothing references the function.
        const DELETE_IF_UNUSED = 1 << 0;
        /// Do not emit move-checking diagnostics; only repair.
        const NO_MOVE_ONLY_DIAGNOSTICS = 1 << 1;
    }
}

/// A directive tag string with no known meaning.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown directive tag `{0}`")]
pub struct UnknownDirective(pub String);

impl Directives {
    /// Tag spelling for `DELETE_IF_UNUSED`.
    pub const DELETE_IF_UNUSED_TAG: &'static str = "delete-if-unused";
    /// Tag spelling for `NO_MOVE_ONLY_DIAGNOSTICS`.
    pub const NO_MOVE_ONLY_DIAGNOSTICS_TAG: &'static str = "no-move-only-diagnostics";

    /// Parse a single front-end tag.
    pub fn parse(tag: &str) -> Result<Directives, UnknownDirective> {
        match tag {
            Self::DELETE_IF_UNUSED_TAG => Ok(Directives::DELETE_IF_UNUSED),
            Self::NO_MOVE_ONLY_DIAGNOSTICS_TAG => Ok(Directives::NO_MOVE_ONLY_DIAGNOSTICS),
            _ => Err(UnknownDirective(tag.to_owned())),
        }
    }

    /// Parse a list of tags, keeping the known ones.
    ///
    /// Unknown tags are logged and returned so the caller can decide
    /// whether they are fatal.
    pub fn parse_all<'a>(
        tags: impl IntoIterator<Item = &'a str>,
    ) -> (Directives, Vec<UnknownDirective>) {
        let mut directives = Directives::empty();
        let mut unknown = Vec::new();
        for tag in tags {
            match Directives::parse(tag) {
                Ok(d) => directives |= d,
                Err(e) => {
                    tracing::warn!(tag, "ignoring unknown directive tag");
                    unknown.push(e);
                }
            }
        }
        (directives, unknown)
    }
}

/// Lowering stage of a module's IR.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Stage {
    /// Straight out of the front end; mandatory passes have not run.
    #[default]
    Raw,
    /// Mandatory passes done; ready for optimization.
    Canonical,
    /// Lowered for code generation.
    Lowered,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Raw => write!(f, "raw"),
            Stage::Canonical => write!(f, "canonical"),
            Stage::Lowered => write!(f, "lowered"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_module_hides_hidden_linkage() {
        assert!(is_possibly_used_externally(Linkage::Hidden, false));
        assert!(!is_possibly_used_externally(Linkage::Hidden, true));
    }

    #[test]
    fn unit_local_linkages_never_escape() {
        for whole_module in [false, true] {
            assert!(!is_possibly_used_externally(Linkage::Shared, whole_module));
            assert!(!is_possibly_used_externally(Linkage::Private, whole_module));
            assert!(!is_possibly_used_externally(
                Linkage::PublicExternal,
                whole_module
            ));
            assert!(is_possibly_used_externally(Linkage::Public, whole_module));
        }
    }

    #[test]
    fn parse_known_tags() {
        assert_eq!(
            Directives::parse(Directives::DELETE_IF_UNUSED_TAG),
            Ok(Directives::DELETE_IF_UNUSED)
        );
        assert_eq!(
            Directives::parse(Directives::NO_MOVE_ONLY_DIAGNOSTICS_TAG),
            Ok(Directives::NO_MOVE_ONLY_DIAGNOSTICS)
        );
    }

    #[test]
    fn parse_all_reports_unknown_tags() {
        let (directives, unknown) = Directives::parse_all([
            Directives::DELETE_IF_UNUSED_TAG,
            "inline-always",
        ]);
        assert_eq!(directives, Directives::DELETE_IF_UNUSED);
        assert_eq!(
            unknown,
            vec![UnknownDirective("inline-always".to_owned())]
        );
    }

    #[test]
    fn stage_display() {
        assert_eq!(Stage::Raw.to_string(), "raw");
        assert_eq!(Stage::Canonical.to_string(), "canonical");
    }
}
