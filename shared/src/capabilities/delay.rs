use std::time::Duration;

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

/// Asks the shell to wait. The shell resolves the request once `millis`
/// have elapsed; it never cancels one, so stale wake-ups must be ignored by
/// whoever receives them.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DelayOperation {
    pub millis: u64,
}

impl Operation for DelayOperation {
    type Output = ();
}

pub struct Delay<Ev> {
    context: CapabilityContext<DelayOperation, Ev>,
}

impl<Ev> Capability<Ev> for Delay<Ev> {
    type Operation = DelayOperation;
    type MappedSelf<MappedEv> = Delay<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Delay::new(self.context.map_event(f))
    }
}

impl<Ev> Delay<Ev>
where
    Ev: 'static + Send,
{
    #[must_use]
    pub fn new(context: CapabilityContext<DelayOperation, Ev>) -> Self {
        Self { context }
    }

    /// Dispatches `event` after `duration`.
    pub fn start(&self, duration: Duration, event: Ev) {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.request_from_shell(DelayOperation { millis }).await;
            ctx.update_app(event);
        });
    }
}
