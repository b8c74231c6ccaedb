//! Blocking yes/no confirmation, modeled as a capability so the core
//! receives the answer as an event instead of blocking on the shell.

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogOperation {
    Confirm { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogOutput {
    Confirmed,
    Declined,
}

impl Operation for DialogOperation {
    type Output = DialogOutput;
}

pub struct Dialog<Ev> {
    context: CapabilityContext<DialogOperation, Ev>,
}

impl<Ev> Capability<Ev> for Dialog<Ev> {
    type Operation = DialogOperation;
    type MappedSelf<MappedEv> = Dialog<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Dialog::new(self.context.map_event(f))
    }
}

impl<Ev> Dialog<Ev> {
    #[must_use]
    pub fn new(context: CapabilityContext<DialogOperation, Ev>) -> Self {
        Self { context }
    }
}

impl<Ev> Dialog<Ev>
where
    Ev: Send + 'static,
{
    /// Asks the shell for confirmation; `make_event` receives true when
    /// the user confirmed.
    pub fn confirm<F>(&self, message: impl Into<String>, make_event: F)
    where
        F: FnOnce(bool) -> Ev + Send + 'static,
    {
        let message = message.into();
        let context = self.context.clone();
        self.context.spawn(async move {
            let response = context
                .request_from_shell(DialogOperation::Confirm { message })
                .await;
            context.update_app(make_event(matches!(response, DialogOutput::Confirmed)));
        });
    }
}
