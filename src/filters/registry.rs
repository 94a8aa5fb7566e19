//! Startup registration table for request filters.

use std::collections::HashMap;
use std::sync::Arc;

use crate::filters::{FilterDescriptor, RequestFilter};

/// Request filters declared per request type and per handler type.
#[derive(Debug, Clone, Default)]
pub struct FilterRegistry {
    by_type: HashMap<String, Vec<FilterDescriptor>>,
}

impl FilterRegistry {
    pub fn builder() -> FilterRegistryBuilder {
        FilterRegistryBuilder::default()
    }

    /// Filters for a route: request-type filters, then handler-type filters,
    /// stably sorted by ascending priority.
    pub fn filters_for(&self, request_type: &str, handler_type: &str) -> Vec<FilterDescriptor> {
        let mut filters: Vec<FilterDescriptor> = self
            .by_type
            .get(request_type)
            .cloned()
            .unwrap_or_default();

        if handler_type != request_type {
            if let Some(handler_filters) = self.by_type.get(handler_type) {
                filters.extend(handler_filters.iter().cloned());
            }
        }

        filters.sort_by_key(|f| f.priority);
        filters
    }
}

/// Builder collecting filter declarations in discovery order.
#[derive(Debug, Default)]
pub struct FilterRegistryBuilder {
    by_type: HashMap<String, Vec<FilterDescriptor>>,
}

impl FilterRegistryBuilder {
    /// Attach `filter` to the request or handler type named `type_name`.
    pub fn register<F>(mut self, type_name: &str, name: &str, priority: i32, filter: F) -> Self
    where
        F: RequestFilter + 'static,
    {
        self.by_type
            .entry(type_name.to_string())
            .or_default()
            .push(FilterDescriptor::new(name, priority, Arc::new(filter)));
        self
    }

    /// Attach an already shared filter.
    pub fn register_shared(
        mut self,
        type_name: &str,
        name: &str,
        priority: i32,
        filter: Arc<dyn RequestFilter>,
    ) -> Self {
        self.by_type
            .entry(type_name.to_string())
            .or_default()
            .push(FilterDescriptor::new(name, priority, filter));
        self
    }

    pub fn build(self) -> FilterRegistry {
        FilterRegistry {
            by_type: self.by_type,
        }
    }
}
