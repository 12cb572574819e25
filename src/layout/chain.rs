//! Dependency-chain grouping.
//!
//! The layout pass resolves positions for the estimated heights, but the
//! drawing collaborator may still measure text differently. To keep pushed
//! components attached to their pusher at draw time, components linked by
//! push relationships are emitted as a single vertical flow instead of
//! independent absolute boxes: the chain's whitespace is preserved as
//! explicit gaps from the designed geometry, so an expanding member
//! naturally displaces everything after it.
//!
//! Grouping is a bidirectional reachability walk over the push edges: a
//! component's chain includes everything it pushes and everything that
//! pushes it, recursively. Components with no push relationship at all
//! stay out of the flow machinery and are planned absolutely.

use std::collections::{HashMap, VecDeque};

use super::engine::{LayoutComponent, should_push_down};
use crate::document::plan::{FlowItem, Frame, PlanItem};

/// For every expand-and-push-enabled component, the components it would
/// displace. Keys and values are indices into the sorted slice.
pub fn build_dependency_map(components: &[LayoutComponent]) -> HashMap<usize, Vec<usize>> {
    let mut map = HashMap::new();
    for (i, pusher) in components.iter().enumerate() {
        if !pusher.is_auto_expand() || !pusher.pushes_siblings() {
            continue;
        }
        let pushed: Vec<usize> = components
            .iter()
            .enumerate()
            .filter(|(j, target)| {
                *j != i && should_push_down(&pusher.component, &target.component)
            })
            .map(|(j, _)| j)
            .collect();
        map.insert(i, pushed);
    }
    map
}

/// Partition the components into disjoint connected groups under the
/// undirected closure of the push edges. Each group lists its member
/// indices in `(y, x)` order; groups are ordered by their first member.
pub fn group_by_dependency(
    components: &[LayoutComponent],
    dependencies: &HashMap<usize, Vec<usize>>,
) -> Vec<Vec<usize>> {
    let mut adjacency = vec![Vec::new(); components.len()];
    for (&from, targets) in dependencies {
        for &to in targets {
            adjacency[from].push(to);
            adjacency[to].push(from);
        }
    }

    let mut visited = vec![false; components.len()];
    let mut groups = Vec::new();
    for start in 0..components.len() {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        let mut group = vec![start];
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for &next in &adjacency[current] {
                if !visited[next] {
                    visited[next] = true;
                    group.push(next);
                    queue.push_back(next);
                }
            }
        }
        // The slice is sorted by (y, x), so index order is reading order.
        group.sort_unstable();
        groups.push(group);
    }
    groups
}

/// Turn resolved layout components into plan items.
///
/// Singleton non-expanding groups become [`PlanItem::Absolute`] with their
/// phase-2 position and height. Everything else becomes a
/// [`PlanItem::Flow`] anchored at the group's first member, with gaps
/// sized from the designed geometry.
pub fn build_page_plan(resolved: Vec<LayoutComponent>) -> Vec<PlanItem> {
    let dependencies = build_dependency_map(&resolved);
    let groups = group_by_dependency(&resolved, &dependencies);

    let mut slots: Vec<Option<LayoutComponent>> = resolved.into_iter().map(Some).collect();
    let mut items = Vec::with_capacity(groups.len());
    for group in groups {
        let mut members: Vec<LayoutComponent> =
            group.into_iter().filter_map(|i| slots[i].take()).collect();
        let Some(first) = members.first() else {
            continue;
        };

        if members.len() == 1 && !first.is_auto_expand() {
            let lc = members.swap_remove(0);
            items.push(PlanItem::Absolute {
                frame: Frame::new(
                    lc.component.position.x,
                    lc.adjusted_y,
                    lc.component.size.width,
                    lc.actual_height,
                ),
                component: lc.component,
            });
            continue;
        }

        let start_y = first.component.position.y;
        let mut running_y = start_y;
        let mut flow_items = Vec::with_capacity(members.len());
        for lc in members {
            let gap = lc.component.position.y - running_y;
            if gap > 0.0 {
                flow_items.push(FlowItem::Gap(gap));
            }
            running_y = lc.component.position.y + lc.component.size.height;
            flow_items.push(FlowItem::Component {
                auto_expand: lc.is_auto_expand(),
                estimated_frame: Frame::new(
                    lc.component.position.x,
                    lc.adjusted_y,
                    lc.component.size.width,
                    lc.actual_height,
                ),
                component: lc.component,
            });
        }
        items.push(PlanItem::Flow {
            start_y,
            items: flow_items,
        });
    }
    items
}
