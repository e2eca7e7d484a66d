/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
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

//! Ordered first-match dispatch over registered routes.

use crate::routing::route::Route;
use std::sync::{Arc, PoisonError, RwLock};

/// Outcome of [`Router::distribute`].
#[derive(Debug, Eq, PartialEq)]
pub enum Dispatch<T> {
    /// A route accepted the message.
    Routed,
    /// No route matched; ownership of the message returns to the caller.
    Unrouted(T),
}

impl<T> Dispatch<T> {
    pub fn is_routed(&self) -> bool {
        matches!(self, Dispatch::Routed)
    }
}

/// Ordered collection of routes. Registration order is priority order.
pub struct Router<T> {
    routes: RwLock<Vec<Arc<Route<T>>>>,
}

impl<T> Router<T> {
    /// Creates a router with no routes.
    pub fn new() -> Self {
        Self {
            routes: RwLock::new(Vec::new()),
        }
    }

    /// Appends a route at the lowest priority.
    pub fn register(&self, route: Arc<Route<T>>) {
        let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
        routes.push(route);
    }

    /// Removes a route by identity. Returns `true` only when the route was registered.
    pub fn unregister(&self, route: &Arc<Route<T>>) -> bool {
        let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
        match routes.iter().position(|r| Arc::ptr_eq(r, route)) {
            Some(index) => {
                routes.remove(index);
                true
            }
            None => false,
        }
    }

    /// Delivers the message to the first matching route, if any.
    pub fn distribute(&self, message: T) -> Dispatch<T> {
        let routes = self.routes.read().unwrap_or_else(PoisonError::into_inner);
        match routes.iter().find(|route| route.matches(&message)) {
            Some(route) => {
                route.offer(message);
                Dispatch::Routed
            }
            None => Dispatch::Unrouted(message),
        }
    }

    pub fn len(&self) -> usize {
        self.routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}
