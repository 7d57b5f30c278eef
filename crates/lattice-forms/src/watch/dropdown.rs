//! Provider-driven choice lists.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use lattice_forms_core::UiQueue;
use lattice_forms_core::async_runtime::AsyncRuntime;

use super::{WatchHandler, WatchState};
use crate::context::SharedModel;
use crate::error::{FormError, Result};
use crate::layout::PropertyGridItem;
use crate::logging::targets;
use crate::provider::{Choice, ChoiceFetch, DropdownProvider};
use crate::widget::ComboBox;

/// Repopulates a combo box from a [`DropdownProvider`].
///
/// The previous selection survives a refresh when the new choices still
/// contain it; otherwise the selection is cleared (the model keeps its
/// value). Asynchronous fetches run on the runtime and are applied on the UI
/// queue; a result is dropped when a newer fetch was started in the
/// meantime.
pub struct DropdownHandler {
    state: WatchState,
    item: Arc<PropertyGridItem>,
    provider: Arc<dyn DropdownProvider>,
    runtime: Option<AsyncRuntime>,
    queue: UiQueue,
    sequence: Arc<AtomicU64>,
}

impl DropdownHandler {
    /// Create a handler filling `item` from `provider`.
    pub fn new(
        item: Arc<PropertyGridItem>,
        provider: Arc<dyn DropdownProvider>,
        runtime: Option<AsyncRuntime>,
        queue: UiQueue,
    ) -> Self {
        let state = WatchState::new(item.property().clone());
        for dependency in provider.dependencies() {
            state.add_dependency(&dependency);
        }
        Self {
            state,
            item,
            provider,
            runtime,
            queue,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    fn apply(item: &PropertyGridItem, choices: Vec<Choice>) {
        let Some(combo) = item.widget().downcast_ref::<ComboBox>() else {
            tracing::warn!(
                target: targets::WATCH,
                property = item.property().name(),
                widget = %item.widget().kind(),
                "dropdown property is not bound to a combo box"
            );
            return;
        };
        let count = choices.len();
        let kept = combo.set_choices(choices);
        tracing::trace!(
            target: targets::WATCH,
            property = item.property().name(),
            count,
            kept,
            "choices updated"
        );
    }
}

impl WatchHandler for DropdownHandler {
    fn kind(&self) -> &'static str {
        "dropdown"
    }

    fn state(&self) -> &WatchState {
        &self.state
    }

    fn on_initialize(&self, _model: &SharedModel) -> Result<()> {
        self.provider.initialize(self.item.property());
        Ok(())
    }

    fn on_refresh(&self, model: &SharedModel, _first_call: bool) -> Result<()> {
        let fetch = {
            let guard = model.read();
            self.provider.items(&**guard)
        };
        let ticket = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;

        match fetch {
            ChoiceFetch::Ready(choices) => {
                Self::apply(&self.item, choices);
                Ok(())
            }
            ChoiceFetch::Pending(future) => {
                let Some(runtime) = &self.runtime else {
                    return Err(FormError::handler(
                        self.item.property().name(),
                        "asynchronous dropdown provider needs an async runtime",
                    ));
                };
                let item = self.item.clone();
                let sequence = self.sequence.clone();
                runtime.spawn_with_callback(&self.queue, future, move |choices| {
                    if sequence.load(Ordering::SeqCst) != ticket {
                        tracing::trace!(
                            target: targets::WATCH,
                            property = item.property().name(),
                            ticket,
                            "discarding superseded choices"
                        );
                        return;
                    }
                    Self::apply(&item, choices);
                });
                Ok(())
            }
        }
    }

    fn dispose(&self) {
        // Invalidate fetches still in flight.
        self.sequence.fetch_add(1, Ordering::SeqCst);
    }
}
