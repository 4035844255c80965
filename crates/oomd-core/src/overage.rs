//! Hierarchical protection overage.
//!
//! Mirrors cgroup v2 `memory.low` distribution. A cgroup can only claim the
//! protection it actually uses, `min(usage, limit)`. A top-level cgroup's
//! effective protection is its claim. Below that, a parent's effective
//! protection is split among its children:
//!
//! 1. If the children's claims exceed the parent's budget, each child gets
//!    the budget scaled by its share of the total claim.
//! 2. Otherwise each child gets its full claim, and what is left of the
//!    parent's budget spills over to protected children still using more
//!    than they got, in proportion to that unprotected usage and never more
//!    than it.
//!
//! Overage is `usage - effective_protection`, floored at zero. Children
//! without a configured limit never receive protection, so their overage is
//! their whole usage.
//!
//! The tree is an arena keyed by path; nodes refer to parent and children by
//! path, so it can be rebuilt from a flat map every tick.

use std::collections::BTreeMap;

use crate::error::CoreError;
use crate::path::CgroupPath;

/// Raw inputs for one cgroup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemorySample {
    pub usage: i64,
    pub protection_limit: i64,
}

impl MemorySample {
    pub fn new(usage: i64, protection_limit: i64) -> Self {
        Self {
            usage,
            protection_limit,
        }
    }

    /// Protection actually in use.
    pub fn claimed(&self) -> i64 {
        self.usage.max(0).min(self.protection_limit.max(0))
    }
}

/// Outcome for one cgroup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Protection {
    pub effective: i64,
    pub overage: i64,
}

impl Protection {
    fn for_sample(sample: &MemorySample, effective: i64) -> Self {
        Self {
            effective,
            overage: (sample.usage - effective).max(0),
        }
    }
}

#[derive(Debug)]
struct Node {
    sample: MemorySample,
    parent: Option<CgroupPath>,
    children: Vec<CgroupPath>,
}

/// Arena of cgroups linked by path.
#[derive(Debug)]
pub struct CgroupTree {
    nodes: BTreeMap<CgroupPath, Node>,
    roots: Vec<CgroupPath>,
    orphans: Vec<CgroupPath>,
}

impl CgroupTree {
    /// Builds the tree from a flat sample map.
    ///
    /// Cgroups directly below the hierarchy root become subtree roots. Any
    /// deeper cgroup whose parent is missing from `samples` fails with
    /// [`CoreError::BrokenHierarchy`].
    pub fn build(samples: &BTreeMap<CgroupPath, MemorySample>) -> Result<Self, CoreError> {
        let tree = Self::link(samples);
        match tree.orphans.first() {
            Some(path) => Err(CoreError::BrokenHierarchy { path: path.clone() }),
            None => Ok(tree),
        }
    }

    /// Builds the tree, scoring any cgroup whose parent is missing from
    /// `samples` as a top-level cgroup. Such cgroups are listed by
    /// [`CgroupTree::orphans`].
    pub fn build_detached(samples: &BTreeMap<CgroupPath, MemorySample>) -> Self {
        Self::link(samples)
    }

    fn link(samples: &BTreeMap<CgroupPath, MemorySample>) -> Self {
        let mut nodes: BTreeMap<CgroupPath, Node> = BTreeMap::new();
        let mut roots = Vec::new();
        let mut orphans = Vec::new();

        // BTreeMap order puts every parent before its children
        for (path, sample) in samples {
            let parent = match path.parent() {
                Some(parent) if samples.contains_key(&parent) => Some(parent),
                Some(parent) if !parent.is_root() => {
                    orphans.push(path.clone());
                    None
                }
                _ => None,
            };

            match &parent {
                Some(parent) => {
                    if let Some(node) = nodes.get_mut(parent) {
                        node.children.push(path.clone());
                    }
                }
                None => roots.push(path.clone()),
            }

            nodes.insert(
                path.clone(),
                Node {
                    sample: *sample,
                    parent,
                    children: Vec::new(),
                },
            );
        }

        Self {
            nodes,
            roots,
            orphans,
        }
    }

    /// Top-level cgroups, in path order.
    pub fn roots(&self) -> &[CgroupPath] {
        &self.roots
    }

    /// Roots whose parent is not the hierarchy root, in path order.
    pub fn orphans(&self) -> &[CgroupPath] {
        &self.orphans
    }

    pub fn parent(&self, path: &CgroupPath) -> Option<&CgroupPath> {
        self.nodes.get(path).and_then(|node| node.parent.as_ref())
    }

    pub fn children(&self, path: &CgroupPath) -> &[CgroupPath] {
        self.nodes
            .get(path)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Effective protection and overage for every cgroup in the tree.
    pub fn protection(&self) -> BTreeMap<CgroupPath, Protection> {
        let mut out = BTreeMap::new();
        for root in &self.roots {
            if let Some(node) = self.nodes.get(root) {
                let effective = node.sample.claimed();
                self.distribute(root, node, effective, &mut out);
            }
        }
        out
    }

    fn distribute(
        &self,
        path: &CgroupPath,
        node: &Node,
        effective: i64,
        out: &mut BTreeMap<CgroupPath, Protection>,
    ) {
        out.insert(path.clone(), Protection::for_sample(&node.sample, effective));
        if node.children.is_empty() {
            return;
        }

        let children: Vec<(&CgroupPath, &Node)> = node
            .children
            .iter()
            .filter_map(|child| self.nodes.get(child).map(|n| (child, n)))
            .collect();
        let samples: Vec<MemorySample> = children.iter().map(|(_, n)| n.sample).collect();
        let shares = split_protection(effective, &samples);

        for ((child, child_node), share) in children.into_iter().zip(shares) {
            self.distribute(child, child_node, share, out);
        }
    }
}

/// Splits a parent's effective protection among its children.
///
/// Returns one effective protection per child, in input order.
pub fn split_protection(parent_effective: i64, children: &[MemorySample]) -> Vec<i64> {
    let budget = i128::from(parent_effective.max(0));
    let claimed: Vec<i128> = children.iter().map(|c| i128::from(c.claimed())).collect();
    let total_claimed: i128 = claimed.iter().sum();

    if total_claimed == 0 {
        return vec![0; children.len()];
    }

    if total_claimed >= budget {
        return claimed
            .iter()
            .map(|&c| (budget * c / total_claimed) as i64)
            .collect();
    }

    // Every claim fits; spill what is left to protected children that
    // still use more than they were given.
    let leftover = budget - total_claimed;
    let needs: Vec<i128> = children
        .iter()
        .zip(&claimed)
        .map(|(child, &base)| {
            if child.protection_limit > 0 {
                (i128::from(child.usage) - base).max(0)
            } else {
                0
            }
        })
        .collect();
    let total_need: i128 = needs.iter().sum();

    claimed
        .iter()
        .zip(&needs)
        .map(|(&base, &need)| {
            let spill = if total_need == 0 {
                0
            } else if leftover >= total_need {
                need
            } else {
                leftover * need / total_need
            };
            (base + spill) as i64
        })
        .collect()
}

/// Computes effective protection and overage for every sampled cgroup.
pub fn calculate_protection_overage(
    samples: &BTreeMap<CgroupPath, MemorySample>,
) -> Result<BTreeMap<CgroupPath, Protection>, CoreError> {
    Ok(CgroupTree::build(samples)?.protection())
}
