//! Branch matching.
//!
//! The search always starts from the config's root branch list and walks
//! the whole forest depth-first in document order. It is not scoped to the
//! descendants of whichever branch produced the previous phase, so any
//! node whose own condition matches `(phase, correct_count)` can be
//! selected. The first match wins; overlapping ranges are not detected.

use crate::branch::Branch;
use crate::phase::Phase;

/// Find the first branch matching `phase` and `correct_count`.
///
/// For each branch in order: a matching branch is returned without looking
/// at its own sub-branches; a non-matching branch has its sub-branches
/// searched recursively, and a hit there ends the search.
#[must_use]
pub fn find_match(branches: &[Branch], phase: Phase, correct_count: u32) -> Option<&Branch> {
    find_match_path(branches, phase, correct_count).map(|(_, branch)| branch)
}

/// Like [`find_match`], also returning the index path to the matched node.
///
/// `[1, 0]` means `branches[1].sub_branches[0]`.
#[must_use]
pub fn find_match_path(
    branches: &[Branch],
    phase: Phase,
    correct_count: u32,
) -> Option<(Vec<usize>, &Branch)> {
    let mut path = Vec::new();
    let found = search(branches, phase, correct_count, &mut path)?;
    path.reverse();
    Some((path, found))
}

// Indices are pushed while unwinding, so `path` comes back leaf-first.
fn search<'a>(
    branches: &'a [Branch],
    phase: Phase,
    correct_count: u32,
    path: &mut Vec<usize>,
) -> Option<&'a Branch> {
    for (i, branch) in branches.iter().enumerate() {
        if branch.condition.matches(phase, correct_count) {
            path.push(i);
            return Some(branch);
        }

        if !branch.sub_branches.is_empty()
            && let Some(found) = search(&branch.sub_branches, phase, correct_count, path)
        {
            path.push(i);
            return Some(found);
        }
    }
    None
}

/// Render an index path in the authored field names.
#[must_use]
pub fn describe_path(path: &[usize]) -> String {
    path.iter()
        .enumerate()
        .map(|(depth, i)| {
            if depth == 0 {
                format!("branches[{i}]")
            } else {
                format!("subBranches[{i}]")
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::branch::QuestionSpec;

    fn terminal(name: &str, phase: Phase, range: (u32, u32), level: u32) -> Branch {
        Branch::terminal(name, phase, range, level).unwrap()
    }

    fn continuing(name: &str, phase: Phase, range: (u32, u32), next: Phase) -> Branch {
        Branch::continuing(name, phase, range, next, vec![QuestionSpec::new(2, 4)]).unwrap()
    }

    #[test]
    fn selects_zero_correct_branch() {
        let branches = vec![
            terminal("none", Phase::Initial, (0, 0), 1),
            continuing("some", Phase::Initial, (1, 8), Phase::Followup),
        ];

        let found = find_match(&branches, Phase::Initial, 0).unwrap();
        assert_eq!(found.name, "none");
    }

    #[test]
    fn selects_range_containing_count() {
        let branches = vec![
            continuing("low", Phase::Initial, (1, 4), Phase::Followup),
            continuing("mid", Phase::Initial, (5, 6), Phase::Followup),
            continuing("high", Phase::Initial, (7, 8), Phase::Final),
        ];

        let found = find_match(&branches, Phase::Initial, 6).unwrap();
        assert_eq!(found.name, "mid");
    }

    #[test]
    fn phase_must_be_equal() {
        let branches = vec![terminal("followup-only", Phase::Followup, (0, 10), 2)];

        assert!(find_match(&branches, Phase::Initial, 3).is_none());
        assert!(find_match(&branches, Phase::Final, 3).is_none());
        assert!(find_match(&branches, Phase::Followup, 3).is_some());
    }

    #[test]
    fn no_match_returns_none() {
        let branches = vec![
            terminal("low", Phase::Initial, (0, 2), 1),
            terminal("high", Phase::Initial, (4, 8), 3),
        ];

        assert!(find_match(&branches, Phase::Initial, 3).is_none());
        assert!(find_match(&[], Phase::Initial, 0).is_none());
    }

    #[test]
    fn first_match_in_document_order_wins() {
        let branches = vec![
            terminal("first", Phase::Initial, (2, 6), 2),
            terminal("second", Phase::Initial, (4, 8), 3),
        ];

        for _ in 0..3 {
            let found = find_match(&branches, Phase::Initial, 5).unwrap();
            assert_eq!(found.name, "first");
        }
    }

    #[test]
    fn matched_parent_shadows_its_children() {
        let parent = continuing("parent", Phase::Initial, (0, 8), Phase::Followup)
            .with_sub_branches(vec![terminal("child", Phase::Initial, (0, 8), 5)]);

        let (path, found) = find_match_path(std::slice::from_ref(&parent), Phase::Initial, 3).unwrap();
        assert_eq!(found.name, "parent");
        assert_eq!(path, vec![0]);
    }

    #[test]
    fn searches_subtree_of_non_matching_branch() {
        let branches = vec![
            continuing("screening", Phase::Initial, (3, 5), Phase::Followup).with_sub_branches(vec![
                terminal("settle-low", Phase::Followup, (0, 1), 2),
                terminal("settle-high", Phase::Followup, (2, 4), 3),
            ]),
        ];

        let (path, found) = find_match_path(&branches, Phase::Followup, 3).unwrap();
        assert_eq!(found.name, "settle-high");
        assert_eq!(path, vec![0, 1]);
    }

    #[test]
    fn subtree_hit_short_circuits_later_siblings() {
        let branches = vec![
            terminal("a", Phase::Initial, (9, 9), 1)
                .with_sub_branches(vec![terminal("a.deep", Phase::Followup, (0, 4), 2)]),
            terminal("b", Phase::Followup, (0, 4), 3),
        ];

        let found = find_match(&branches, Phase::Followup, 2).unwrap();
        assert_eq!(found.name, "a.deep");
    }

    #[test]
    fn search_is_not_scoped_to_previous_branch() {
        // "left" produced the followup questions, but the followup result is
        // found under "right" because the whole forest is searched.
        let branches = vec![
            continuing("left", Phase::Initial, (0, 3), Phase::Followup)
                .with_sub_branches(vec![terminal("left.settle", Phase::Followup, (0, 1), 1)]),
            continuing("right", Phase::Initial, (4, 8), Phase::Followup)
                .with_sub_branches(vec![terminal("right.settle", Phase::Followup, (2, 5), 4)]),
        ];

        let found = find_match(&branches, Phase::Followup, 3).unwrap();
        assert_eq!(found.name, "right.settle");
    }

    #[test]
    fn traversal_order_is_depth_first_pre_order() {
        // Every node matches (followup, 1); record which one wins as nodes
        // are disabled one by one in pre-order.
        let tree = || {
            vec![
                terminal("0", Phase::Followup, (1, 1), 1).with_sub_branches(vec![
                    terminal("0.0", Phase::Followup, (1, 1), 1).with_sub_branches(vec![
                        terminal("0.0.0", Phase::Followup, (1, 1), 1),
                    ]),
                    terminal("0.1", Phase::Followup, (1, 1), 1),
                ]),
                terminal("1", Phase::Followup, (1, 1), 1),
            ]
        };

        let mut order = Vec::new();
        let mut branches = tree();
        while let Some((path, found)) = find_match_path(&branches, Phase::Followup, 1) {
            order.push(found.name.clone());
            let mut node = &mut branches[path[0]];
            for &i in &path[1..] {
                node = &mut node.sub_branches[i];
            }
            node.condition.from_phase = Phase::Final;
        }

        assert_eq!(order, vec!["0", "0.0", "0.0.0", "0.1", "1"]);
    }

    #[test]
    fn describe_path_uses_authored_names() {
        assert_eq!(describe_path(&[2]), "branches[2]");
        assert_eq!(describe_path(&[0, 1, 3]), "branches[0].subBranches[1].subBranches[3]");
        assert_eq!(describe_path(&[]), "");
    }
}
