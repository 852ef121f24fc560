use std::collections::BTreeMap;

use arbor_module::Listener;
use arbor_types::ModulePath;

/// A listener bound to the module that declared it.
#[derive(Clone, Debug)]
pub struct Route {
    pub context: ModulePath,
    pub listener: Listener,
}

/// Cross-module listeners, keyed by the reducer or action path they follow.
///
/// Handlers for one target are kept in declaration order and fire in that
/// order, each seeing the state left by the ones before it.
#[derive(Clone, Debug, Default)]
pub struct ListenerRouter {
    routes: BTreeMap<ModulePath, Vec<Route>>,
}

impl ListenerRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, target: ModulePath, route: Route) {
        self.routes.entry(target).or_default().push(route);
    }

    pub fn routes(&self, target: &ModulePath) -> &[Route] {
        self.routes.get(target).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn targets(&self) -> impl Iterator<Item = (&ModulePath, &[Route])> {
        self.routes.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Number of registered handlers across all targets.
    pub fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> ModulePath {
        ModulePath::parse(s).unwrap()
    }

    #[test]
    fn keeps_declaration_order_per_target() {
        let mut router = ListenerRouter::new();
        for context in ["b", "a", "c"] {
            router.add(
                path("counter/inc"),
                Route {
                    context: path(context),
                    listener: Listener::new(|_, _, _| None),
                },
            );
        }
        let contexts: Vec<String> = router
            .routes(&path("counter/inc"))
            .iter()
            .map(|r| r.context.to_string())
            .collect();
        assert_eq!(contexts, ["b", "a", "c"]);
        assert_eq!(router.len(), 3);
        assert!(router.routes(&path("counter/dec")).is_empty());
        assert_eq!(router.targets().count(), 1);
    }
}
