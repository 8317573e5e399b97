/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Association graph between IO sources, IO actors and routes.
//!
//! Pure bookkeeping: callers apply the returned [`RouteChanges`] to transport
//! subscriptions and IO-state streams.

use crate::event::data::AssociateEvent;
use crate::event::IoState;
use std::collections::{BTreeSet, HashMap, HashSet};
use uuid::Uuid;

/// Active association of one locally owned IO source.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct SourceRoute {
    pub(crate) route: String,
    pub(crate) update_rate: Option<u64>,
    pub(crate) actor_ids: Vec<Uuid>,
}

/// Side effects of one table mutation.
#[derive(Debug, Default, Eq, PartialEq)]
pub(crate) struct RouteChanges {
    pub(crate) affected_points: BTreeSet<Uuid>,
    pub(crate) subscribed_routes: Vec<String>,
    pub(crate) released_routes: Vec<String>,
}

/// route -> local actor -> feeding source -> update rate
type ActorRoutes = HashMap<String, HashMap<Uuid, HashMap<Uuid, Option<u64>>>>;

pub(crate) struct IoRouteTable {
    local_sources: HashSet<Uuid>,
    local_actors: HashSet<Uuid>,
    source_routes: HashMap<Uuid, SourceRoute>,
    actor_routes: ActorRoutes,
}

impl IoRouteTable {
    pub(crate) fn new(local_sources: HashSet<Uuid>, local_actors: HashSet<Uuid>) -> Self {
        Self {
            local_sources,
            local_actors,
            source_routes: HashMap::new(),
            actor_routes: HashMap::new(),
        }
    }

    /// Applies one Associate event. `owns_source`/`owns_actor` state which side of the
    /// event this agent hosts; with neither nothing changes and `None` is returned.
    pub(crate) fn apply(
        &mut self,
        event: &AssociateEvent,
        owns_source: bool,
        owns_actor: bool,
    ) -> Option<RouteChanges> {
        if !owns_source && !owns_actor {
            return None;
        }
        let mut changes = RouteChanges::default();
        if owns_source {
            self.apply_source(event, &mut changes);
        }
        if owns_actor {
            self.apply_actor(event, &mut changes);
        }
        let local_sources = &self.local_sources;
        let local_actors = &self.local_actors;
        changes
            .affected_points
            .retain(|id| local_sources.contains(id) || local_actors.contains(id));
        Some(changes)
    }

    fn apply_source(&mut self, event: &AssociateEvent, changes: &mut RouteChanges) {
        let source = event.io_source_id;
        let actor = event.io_actor_id;
        changes.affected_points.insert(source);

        let Some(route) = &event.associating_route else {
            if let Some(entry) = self.source_routes.get_mut(&source) {
                entry.actor_ids.retain(|id| *id != actor);
                if entry.actor_ids.is_empty() {
                    self.source_routes.remove(&source);
                }
            }
            return;
        };

        let route_changed = self
            .source_routes
            .get(&source)
            .is_some_and(|entry| entry.route != *route);
        if route_changed {
            if let Some(previous) = self.source_routes.remove(&source) {
                for old_actor in previous.actor_ids {
                    changes.affected_points.insert(old_actor);
                    if self.local_actors.contains(&old_actor) {
                        self.remove_membership(&previous.route, old_actor, source, changes);
                    }
                }
            }
        }

        let entry = self
            .source_routes
            .entry(source)
            .or_insert_with(|| SourceRoute {
                route: route.clone(),
                update_rate: event.update_rate,
                actor_ids: Vec::new(),
            });
        entry.update_rate = event.update_rate;
        if !entry.actor_ids.contains(&actor) {
            entry.actor_ids.push(actor);
        }
        changes.affected_points.insert(actor);
    }

    fn apply_actor(&mut self, event: &AssociateEvent, changes: &mut RouteChanges) {
        let source = event.io_source_id;
        let actor = event.io_actor_id;
        changes.affected_points.insert(actor);

        let keep_route = event.associating_route.as_deref();
        let stale_routes: Vec<String> = self
            .actor_routes
            .iter()
            .filter(|(route, actors)| {
                Some(route.as_str()) != keep_route
                    && actors
                        .get(&actor)
                        .is_some_and(|sources| sources.contains_key(&source))
            })
            .map(|(route, _)| route.clone())
            .collect();
        for route in stale_routes {
            self.remove_membership(&route, actor, source, changes);
        }

        if let Some(route) = keep_route {
            let route_actors = self
                .actor_routes
                .entry(route.to_string())
                .or_insert_with(|| {
                    changes.subscribed_routes.push(route.to_string());
                    HashMap::new()
                });
            route_actors
                .entry(actor)
                .or_default()
                .insert(source, event.update_rate);
        }
    }

    fn remove_membership(
        &mut self,
        route: &str,
        actor: Uuid,
        source: Uuid,
        changes: &mut RouteChanges,
    ) {
        let Some(route_actors) = self.actor_routes.get_mut(route) else {
            return;
        };
        if let Some(sources) = route_actors.get_mut(&actor) {
            sources.remove(&source);
            if sources.is_empty() {
                route_actors.remove(&actor);
            }
        }
        if route_actors.is_empty() {
            self.actor_routes.remove(route);
            changes.released_routes.push(route.to_string());
        }
        changes.affected_points.insert(actor);
    }

    pub(crate) fn source_route(&self, source: Uuid) -> Option<&SourceRoute> {
        self.source_routes.get(&source)
    }

    pub(crate) fn actor_has_route(&self, actor: Uuid, route: &str) -> bool {
        self.actor_routes
            .get(route)
            .is_some_and(|actors| actors.contains_key(&actor))
    }

    /// Derived state of a local IO point. An actor fed on several routes reports the
    /// smallest requested update rate.
    pub(crate) fn io_state(&self, point: Uuid) -> IoState {
        if self.local_sources.contains(&point) {
            return self
                .source_routes
                .get(&point)
                .map(|entry| IoState {
                    has_associations: true,
                    update_rate: entry.update_rate,
                })
                .unwrap_or_default();
        }

        let mut memberships = self
            .actor_routes
            .values()
            .filter_map(|actors| actors.get(&point))
            .flat_map(|sources| sources.values())
            .peekable();
        let has_associations = memberships.peek().is_some();
        let update_rate = memberships.filter_map(|rate| *rate).min();
        IoState {
            has_associations,
            update_rate,
        }
    }

    /// Forgets every association; all routes are released.
    pub(crate) fn clear(&mut self) -> RouteChanges {
        let changes = RouteChanges {
            affected_points: self
                .local_sources
                .iter()
                .chain(self.local_actors.iter())
                .copied()
                .collect(),
            subscribed_routes: Vec::new(),
            released_routes: self.actor_routes.keys().cloned().collect(),
        };
        self.source_routes.clear();
        self.actor_routes.clear();
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Points {
        source: Uuid,
        actors: [Uuid; 3],
    }

    fn table() -> (IoRouteTable, Points) {
        let points = Points {
            source: Uuid::new_v4(),
            actors: [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()],
        };
        let table = IoRouteTable::new(
            HashSet::from([points.source]),
            HashSet::from(points.actors),
        );
        (table, points)
    }

    fn associate(table: &mut IoRouteTable, source: Uuid, actor: Uuid, route: &str) -> RouteChanges {
        table
            .apply(&AssociateEvent::associate(source, actor, route), true, true)
            .unwrap()
    }

    #[test]
    fn unrelated_events_are_ignored() {
        let (mut table, _) = table();
        let event = AssociateEvent::associate(Uuid::new_v4(), Uuid::new_v4(), "r");
        assert_eq!(table.apply(&event, false, false), None);
    }

    #[test]
    fn route_change_cascades_to_previous_actors() {
        let (mut table, points) = table();
        let [a, b, c] = points.actors;

        let first = associate(&mut table, points.source, a, "r1");
        assert_eq!(first.subscribed_routes, vec!["r1".to_string()]);
        let second = associate(&mut table, points.source, b, "r1");
        assert!(second.subscribed_routes.is_empty());

        let moved = associate(&mut table, points.source, c, "r2");

        assert_eq!(moved.released_routes, vec!["r1".to_string()]);
        assert_eq!(moved.subscribed_routes, vec!["r2".to_string()]);
        assert!(moved.affected_points.contains(&a));
        assert!(moved.affected_points.contains(&b));
        assert!(!table.io_state(a).has_associations);
        assert!(!table.io_state(b).has_associations);
        assert!(table.io_state(c).has_associations);
        assert_eq!(
            table.source_route(points.source).map(|entry| entry.actor_ids.clone()),
            Some(vec![c])
        );
    }

    #[test]
    fn repeated_association_is_a_no_op() {
        let (mut table, points) = table();
        let [a, _, _] = points.actors;

        associate(&mut table, points.source, a, "r1");
        let repeat = associate(&mut table, points.source, a, "r1");

        assert!(repeat.subscribed_routes.is_empty());
        assert!(repeat.released_routes.is_empty());
        assert_eq!(
            table.source_route(points.source).map(|entry| entry.actor_ids.len()),
            Some(1)
        );
    }

    #[test]
    fn disassociation_removes_entry_when_last_actor_leaves() {
        let (mut table, points) = table();
        let [a, _, _] = points.actors;
        associate(&mut table, points.source, a, "r1");

        let changes = table
            .apply(&AssociateEvent::disassociate(points.source, a), true, true)
            .unwrap();

        assert_eq!(changes.released_routes, vec!["r1".to_string()]);
        assert!(table.source_route(points.source).is_none());
        assert_eq!(table.io_state(points.source), IoState::default());
    }

    #[test]
    fn remote_source_moving_an_actor_releases_the_old_route() {
        let (mut table, points) = table();
        let [a, _, _] = points.actors;
        let remote = Uuid::new_v4();

        table.apply(&AssociateEvent::associate(remote, a, "r1"), false, true);
        let changes = table
            .apply(&AssociateEvent::associate(remote, a, "r2"), false, true)
            .unwrap();

        assert_eq!(changes.released_routes, vec!["r1".to_string()]);
        assert_eq!(changes.subscribed_routes, vec!["r2".to_string()]);
        assert!(table.actor_has_route(a, "r2"));
        assert!(!table.actor_has_route(a, "r1"));
    }

    #[test]
    fn actor_update_rate_is_the_smallest_requested() {
        let (mut table, points) = table();
        let [a, _, _] = points.actors;
        let (s1, s2) = (Uuid::new_v4(), Uuid::new_v4());

        table.apply(
            &AssociateEvent::associate(s1, a, "r1").with_update_rate(500),
            false,
            true,
        );
        table.apply(
            &AssociateEvent::associate(s2, a, "r2").with_update_rate(200),
            false,
            true,
        );

        assert_eq!(
            table.io_state(a),
            IoState {
                has_associations: true,
                update_rate: Some(200)
            }
        );
    }

    #[test]
    fn clear_releases_every_route() {
        let (mut table, points) = table();
        let [a, b, _] = points.actors;
        associate(&mut table, points.source, a, "r1");
        table.apply(&AssociateEvent::associate(Uuid::new_v4(), b, "r2"), false, true);

        let mut released = table.clear().released_routes;
        released.sort();

        assert_eq!(released, vec!["r1".to_string(), "r2".to_string()]);
        assert!(!table.io_state(a).has_associations);
    }
}
