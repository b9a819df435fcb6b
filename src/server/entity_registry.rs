//! Registry of resource route tables

use axum::Router;

/// How a resource contributes its routes
///
/// Routes are declared with their full path below `/api` (for example
/// `/products/{id}`), each with its own access policy.
pub trait EntityDescriptor: Send + Sync {
    /// Resource name used in logs (singular, e.g. "product")
    fn entity_type(&self) -> &str;

    /// First path segment of the resource's routes (e.g. "products")
    fn plural(&self) -> &str;

    /// Build the router for this resource, with its state applied
    fn build_routes(&self) -> Router;
}

/// Every resource registered with the server, in registration order
#[derive(Default)]
pub struct EntityRegistry {
    descriptors: Vec<Box<dyn EntityDescriptor>>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor; a second descriptor for the same path segment
    /// replaces the first
    pub fn register(&mut self, descriptor: Box<dyn EntityDescriptor>) {
        if let Some(existing) = self
            .descriptors
            .iter_mut()
            .find(|d| d.plural() == descriptor.plural())
        {
            tracing::warn!(resource = descriptor.plural(), "resource registered twice, replacing");
            *existing = descriptor;
        } else {
            self.descriptors.push(descriptor);
        }
    }

    /// Merge the routes of every registered resource
    pub fn build_routes(&self) -> Router {
        self.descriptors
            .iter()
            .fold(Router::new(), |router, descriptor| {
                tracing::debug!(
                    entity = descriptor.entity_type(),
                    path = descriptor.plural(),
                    "routes registered"
                );
                router.merge(descriptor.build_routes())
            })
    }

    pub fn entity_types(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.entity_type()).collect()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
