use crate::component::descriptors;
use crate::component::kind::KindDescriptor;
use crate::page::element::RawElement;

/// Ordered lookup of capability descriptors.
///
/// Classification asks descriptors in registration order and the first
/// claim wins, so more specific kinds are registered before generic ones.
#[derive(Debug, Clone, Default)]
pub struct KindRegistry {
    descriptors: Vec<KindDescriptor>,
}

impl KindRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with every built-in component kind.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for descriptor in descriptors::builtin() {
            registry.register(descriptor);
        }
        registry
    }

    /// Add a descriptor, replacing any descriptor of the same name in place.
    pub fn register(&mut self, descriptor: KindDescriptor) {
        match self.descriptors.iter_mut().find(|d| d.name == descriptor.name) {
            Some(existing) => *existing = descriptor,
            None => self.descriptors.push(descriptor),
        }
    }

    pub fn get(&self, name: &str) -> Option<&KindDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Name of the first kind that claims `el`.
    pub fn classify(&self, el: &RawElement) -> Option<&'static str> {
        self.descriptors
            .iter()
            .find(|d| (d.classify)(el))
            .map(|d| d.name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.descriptors.iter().map(|d| d.name).collect()
    }
}
