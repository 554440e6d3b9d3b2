use std::collections::HashMap;
use std::sync::Arc;

use super::{FilterError, FilterHandle, Operation, Pipeline};

pub type FilterFactory = fn() -> FilterHandle;

/// Startup-time table of named filters.
///
/// Identifiers are lowercase. Lookups also accept dotted class-style names
/// (`filters.Sepia`) and resolve them by their last segment.
#[derive(Clone, Default)]
pub struct FilterRegistry {
    factories: HashMap<String, FilterFactory>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("grayscale", || Arc::new(Operation::Grayscale));
        registry.register("invert", || Arc::new(Operation::Invert));
        registry.register("sepia", || Arc::new(Operation::Sepia));
        registry.register("blur", || Arc::new(Operation::Blur { sigma: 3.0 }));
        registry.register("sharpen", || {
            Arc::new(Operation::Sharpen {
                sigma: 1.5,
                threshold: 2,
            })
        });
        registry.register("edges", || {
            Arc::new(Operation::Edges {
                low: 50.0,
                high: 100.0,
            })
        });
        registry.register("mirror", || Arc::new(Operation::FlipHorizontal));
        registry.register("noir", || {
            Arc::new(Pipeline::new(
                "noir",
                vec![Operation::Grayscale, Operation::Contrast { amount: 35.0 }],
            ))
        });
        registry.register("vivid", || {
            Arc::new(Pipeline::new(
                "vivid",
                vec![
                    Operation::Contrast { amount: 20.0 },
                    Operation::Sharpen {
                        sigma: 1.0,
                        threshold: 1,
                    },
                ],
            ))
        });
        registry.register("fade", || {
            Arc::new(Pipeline::new(
                "fade",
                vec![
                    Operation::Contrast { amount: -25.0 },
                    Operation::Brighten { amount: 20 },
                ],
            ))
        });
        registry.register("vintage", || {
            Arc::new(Pipeline::new(
                "vintage",
                vec![
                    Operation::Sepia,
                    Operation::Contrast { amount: -10.0 },
                    Operation::Blur { sigma: 0.6 },
                ],
            ))
        });
        registry
    }

    pub fn register(&mut self, name: &str, factory: FilterFactory) {
        self.factories.insert(name.to_lowercase(), factory);
    }

    pub fn create(&self, identifier: &str) -> Result<FilterHandle, FilterError> {
        let wanted = identifier.trim().to_lowercase();
        let short = wanted.rsplit('.').next().unwrap_or(wanted.as_str());

        self.factories
            .get(&wanted)
            .or_else(|| self.factories.get(short))
            .map(|factory| factory())
            .ok_or_else(|| FilterError::UnknownFilter(identifier.to_string()))
    }

    /// Registered identifiers, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }
}
