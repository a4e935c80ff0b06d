use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use grada_core::{ColorGradingSettings, ImageBuf};

use crate::metrics::PerformanceMetrics;

/// Lifecycle notifications from a [`Grader`](crate::Grader).
///
/// Delivered synchronously, in call order, from the method that caused
/// them. Exactly one `ProcessingStart` precedes each
/// `ProcessingComplete` or `Error` of a render.
#[derive(Clone, Debug)]
pub enum GradingEvent {
    ProcessingStart {
        generation: u64,
    },
    ProcessingComplete {
        generation: u64,
        image: Arc<ImageBuf>,
        metrics: PerformanceMetrics,
    },
    /// Carries the settings that are current after the change.
    SettingsChange(ColorGradingSettings),
    Error(String),
}

pub trait GradingObserver: Send + Sync {
    fn on_event(&self, event: &GradingEvent);
}

/// A channel is an observer; the receiver drains events at its own pace.
impl GradingObserver for UnboundedSender<GradingEvent> {
    fn on_event(&self, event: &GradingEvent) {
        // A dropped receiver just stops listening.
        let _ = self.send(event.clone());
    }
}

impl<F> GradingObserver for F
where
    F: Fn(&GradingEvent) + Send + Sync,
{
    fn on_event(&self, event: &GradingEvent) {
        self(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_receives_clones() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        tx.on_event(&GradingEvent::ProcessingStart { generation: 3 });
        match rx.try_recv().unwrap() {
            GradingEvent::ProcessingStart { generation } => assert_eq!(generation, 3),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn closed_channel_is_ignored() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);
        tx.on_event(&GradingEvent::Error("boom".into()));
    }

    #[test]
    fn closures_are_observers() {
        let seen = std::sync::Mutex::new(Vec::new());
        let observer = |e: &GradingEvent| {
            if let GradingEvent::Error(msg) = e {
                seen.lock().unwrap().push(msg.clone());
            }
        };
        observer.on_event(&GradingEvent::Error("a".into()));
        assert_eq!(*seen.lock().unwrap(), vec!["a".to_string()]);
    }
}
