use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

/// Address bar and routing requests. Both are fire-and-forget.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NavigationOperation {
    /// Replace the query string of the current entry without adding history
    /// and without reloading. An empty query clears it.
    ReplaceQuery { query: String },
    /// Push a new route, e.g. `/listing/abc` or `/sign-in`.
    Navigate { path: String },
}

impl Operation for NavigationOperation {
    type Output = ();
}

pub struct Navigation<Ev> {
    context: CapabilityContext<NavigationOperation, Ev>,
}

impl<Ev> Capability<Ev> for Navigation<Ev> {
    type Operation = NavigationOperation;
    type MappedSelf<MappedEv> = Navigation<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Navigation::new(self.context.map_event(f))
    }
}

impl<Ev> Navigation<Ev>
where
    Ev: 'static,
{
    #[must_use]
    pub fn new(context: CapabilityContext<NavigationOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn replace_query(&self, query: impl Into<String>) {
        self.notify(NavigationOperation::ReplaceQuery {
            query: query.into(),
        });
    }

    pub fn navigate(&self, path: impl Into<String>) {
        self.notify(NavigationOperation::Navigate { path: path.into() });
    }

    fn notify(&self, operation: NavigationOperation) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(operation).await;
        });
    }
}
