//! Wildcard expansion against the live hierarchy.
//!
//! Requested paths may contain glob segments. Resolution lists the hierarchy
//! at each glob position, keeps the entries that exist, and then closes the
//! result over ancestors so every resolved cgroup has its full parent chain.

use std::collections::{BTreeSet, HashSet};

use globset::{Glob, GlobMatcher};
use tracing::{debug, trace};

use crate::collector::Sampler;
use crate::error::CoreError;
use crate::path::{CgroupPath, is_glob_segment};

/// Outcome of resolving a set of requested paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedCgroups {
    /// Concrete cgroups matched by a requested pattern.
    matched: BTreeSet<CgroupPath>,
    /// Matched cgroups plus all of their ancestors.
    all: BTreeSet<CgroupPath>,
}

impl ResolvedCgroups {
    /// Concrete cgroups matched by a requested pattern.
    pub fn matched(&self) -> &BTreeSet<CgroupPath> {
        &self.matched
    }

    /// Every resolved cgroup, parents before children.
    pub fn iter(&self) -> impl Iterator<Item = &CgroupPath> {
        self.all.iter()
    }

    pub fn contains(&self, path: &CgroupPath) -> bool {
        self.all.contains(path)
    }

    /// True if the cgroup is present only as an ancestor of a match.
    pub fn is_synthesized(&self, path: &CgroupPath) -> bool {
        self.all.contains(path) && !self.matched.contains(path)
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}

/// Resolves requested paths into concrete cgroups plus their ancestors.
///
/// Fails with [`CoreError::HierarchyUnavailable`] if any requested root is
/// missing or cannot be listed, and with [`CoreError::InvalidPattern`] on a
/// malformed glob. A pattern that matches nothing contributes nothing.
pub fn resolve<S: Sampler + ?Sized>(
    sampler: &S,
    requested: &HashSet<CgroupPath>,
) -> Result<ResolvedCgroups, CoreError> {
    let roots: BTreeSet<&str> = requested.iter().map(CgroupPath::root).collect();
    for root in roots {
        if !sampler.exists(&CgroupPath::root_of(root)) {
            return Err(CoreError::HierarchyUnavailable {
                root: root.to_string(),
            });
        }
    }

    let mut matched = BTreeSet::new();
    for pattern in requested {
        let expanded = expand_pattern(sampler, pattern)?;
        trace!("{} matched {} cgroups", pattern, expanded.len());
        matched.extend(expanded);
    }

    let all = with_ancestors(matched.iter().cloned());
    Ok(ResolvedCgroups { matched, all })
}

/// Expands one pattern into the concrete cgroups that currently exist.
pub fn expand_pattern<S: Sampler + ?Sized>(
    sampler: &S,
    pattern: &CgroupPath,
) -> Result<Vec<CgroupPath>, CoreError> {
    let mut frontier = vec![CgroupPath::root_of(pattern.root())];

    for segment in pattern.segments() {
        let mut next = Vec::new();

        if is_glob_segment(segment) {
            let matcher = compile_segment(segment)?;
            for parent in &frontier {
                match sampler.list_children(parent) {
                    Ok(children) => next.extend(
                        children
                            .iter()
                            .filter(|name| matcher.is_match(name.as_str()))
                            .map(|name| parent.child(name)),
                    ),
                    Err(_) if parent.is_root() => {
                        return Err(CoreError::HierarchyUnavailable {
                            root: parent.root().to_string(),
                        });
                    }
                    // Removed between listing its parent and listing it
                    Err(e) => debug!("Skipping {}: {}", parent, e),
                }
            }
        } else {
            next.extend(
                frontier
                    .iter()
                    .map(|parent| parent.child(segment))
                    .filter(|child| sampler.exists(child)),
            );
        }

        frontier = next;
        if frontier.is_empty() {
            break;
        }
    }

    frontier.retain(|path| !path.is_root());
    Ok(frontier)
}

/// Closes a set of concrete paths over their strict ancestors.
pub fn with_ancestors<I>(paths: I) -> BTreeSet<CgroupPath>
where
    I: IntoIterator<Item = CgroupPath>,
{
    let mut closed = BTreeSet::new();
    for path in paths {
        closed.extend(path.ancestors());
        closed.insert(path);
    }
    closed
}

fn compile_segment(segment: &str) -> Result<GlobMatcher, CoreError> {
    Glob::new(segment)
        .map(|glob| glob.compile_matcher())
        .map_err(|e| CoreError::InvalidPattern {
            pattern: segment.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{CgroupSampler, MockFs};

    fn system_sampler() -> CgroupSampler<MockFs> {
        CgroupSampler::new(MockFs::system_hierarchy())
    }

    fn patterns(root: &str, relatives: &[&str]) -> HashSet<CgroupPath> {
        relatives.iter().map(|r| CgroupPath::new(root, r)).collect()
    }

    fn relatives(paths: impl IntoIterator<Item = CgroupPath>) -> Vec<String> {
        paths.into_iter().map(|p| p.relative_path()).collect()
    }

    #[test]
    fn test_resolve_single_wildcard() {
        let resolved = resolve(
            &system_sampler(),
            &patterns(MockFs::CGROUP_ROOT, &["system.slice/*"]),
        )
        .unwrap();

        // Four services and slice1.slice, but not the job nested in it
        assert_eq!(resolved.matched().len(), 5);
        assert_eq!(resolved.len(), 6);
        let slice = CgroupPath::new(MockFs::CGROUP_ROOT, "system.slice");
        assert!(resolved.is_synthesized(&slice));
        assert!(!resolved.is_synthesized(&slice.child("service1.service")));
    }

    #[test]
    fn test_resolve_overlapping_patterns_dedup() {
        let sampler = system_sampler();
        let separate = resolve(
            &sampler,
            &patterns(MockFs::CGROUP_ROOT, &["system.slice/*", "workload.slice/*"]),
        )
        .unwrap();
        let overlapping = resolve(
            &sampler,
            &patterns(MockFs::CGROUP_ROOT, &["*.slice/*", "workload.slice/*"]),
        )
        .unwrap();

        assert_eq!(separate.matched().len(), 6);
        assert_eq!(separate.len(), 8);
        assert_eq!(separate, overlapping);
    }

    #[test]
    fn test_resolve_matching_slice_itself() {
        let resolved = resolve(
            &system_sampler(),
            &patterns(MockFs::CGROUP_ROOT, &["*.slice", "system.slice/*"]),
        )
        .unwrap();

        // The slices are both matched and ancestors, never counted twice
        assert_eq!(resolved.len(), 7);
        let slice = CgroupPath::new(MockFs::CGROUP_ROOT, "system.slice");
        assert!(!resolved.is_synthesized(&slice));
    }

    #[test]
    fn test_resolve_nested_slice() {
        let resolved = resolve(
            &system_sampler(),
            &patterns(MockFs::CGROUP_ROOT, &["system.slice/*/*"]),
        )
        .unwrap();

        assert_eq!(
            relatives(resolved.matched().iter().cloned()),
            vec!["system.slice/slice1.slice/job.service"]
        );
        assert_eq!(
            relatives(resolved.iter().cloned()),
            vec![
                "system.slice",
                "system.slice/slice1.slice",
                "system.slice/slice1.slice/job.service"
            ]
        );
    }

    #[test]
    fn test_resolve_multiple_wildcards() {
        let sampler = CgroupSampler::new(MockFs::protection_overage_hierarchy());
        let resolved = resolve(&sampler, &patterns(MockFs::OVERAGE_ROOT, &["*/*"])).unwrap();

        assert_eq!(
            relatives(resolved.matched().iter().cloned()),
            vec!["A/A1", "A/A2", "B/B1", "B/B2"]
        );
        assert_eq!(
            relatives(resolved.iter().cloned()),
            vec!["A", "A/A1", "A/A2", "B", "B/B1", "B/B2"]
        );
    }

    #[test]
    fn test_resolve_partial_glob_segment() {
        let resolved = resolve(
            &system_sampler(),
            &patterns(MockFs::CGROUP_ROOT, &["system.slice/service[12].service"]),
        )
        .unwrap();
        assert_eq!(
            relatives(resolved.matched().iter().cloned()),
            vec![
                "system.slice/service1.service",
                "system.slice/service2.service"
            ]
        );
    }

    #[test]
    fn test_resolve_no_match_is_not_error() {
        let resolved = resolve(
            &system_sampler(),
            &patterns(
                MockFs::CGROUP_ROOT,
                &["nothing.slice/*", "system.slice/absent.service"],
            ),
        )
        .unwrap();
        assert!(resolved.is_empty());
    }

    #[test]
    fn test_resolve_literal_path() {
        let resolved = resolve(
            &system_sampler(),
            &patterns(MockFs::CGROUP_ROOT, &["workload.slice/service1.service"]),
        )
        .unwrap();
        assert_eq!(resolved.matched().len(), 1);
        assert_eq!(resolved.len(), 2);
    }

    #[test]
    fn test_resolve_missing_root() {
        let err = resolve(
            &system_sampler(),
            &patterns("/does/not/exist", &["system.slice/*"]),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::HierarchyUnavailable { root } if root == "/does/not/exist"));
    }

    #[test]
    fn test_resolve_invalid_glob() {
        let err = resolve(
            &system_sampler(),
            &patterns(MockFs::CGROUP_ROOT, &["system.slice/[abc"]),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidPattern { .. }));
    }

    #[test]
    fn test_with_ancestors_is_closed() {
        let closed = with_ancestors([
            CgroupPath::new("/cg", "a/b/c"),
            CgroupPath::new("/cg", "a/d"),
        ]);
        assert_eq!(
            relatives(closed),
            vec!["a", "a/b", "a/b/c", "a/d"]
        );
    }
}
